use crate::config::SimulatedAnnealingConfig;
use crate::utils::{FloatCompare, Random};

/// Exponential-cooling simulated annealing acceptance criterion.
/// Temperature cools as `T_i+1 = T_i * (1 - step)`, floored at
/// `end_temperature`. A candidate is accepted outright when it is at
/// least as good as the incumbent, otherwise with probability
/// `exp((incumbent - candidate) / T)`. A candidate objective of
/// `f64::INFINITY` (a stalled repair) is always rejected.
pub struct SimulatedAnnealing {
    temperature: f64,
    end_temperature: f64,
    step: f64,
}

impl SimulatedAnnealing {
    pub fn new(config: &SimulatedAnnealingConfig) -> Self {
        Self {
            temperature: config.start_temperature,
            end_temperature: config.end_temperature,
            step: config.step,
        }
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn accept(&self, incumbent: f64, candidate: f64, random: &Random) -> bool {
        if candidate.is_infinite() {
            return false;
        }
        if candidate.approx_lte(incumbent) {
            return true;
        }
        let probability = ((incumbent - candidate) / self.temperature).exp();
        random.real() < probability
    }

    pub fn cool(&mut self) {
        self.temperature = (self.temperature * (1.0 - self.step)).max(self.end_temperature);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> SimulatedAnnealingConfig {
        SimulatedAnnealingConfig {
            start_temperature: 100.0,
            end_temperature: 1.0,
            step: 0.1,
            method: "exponential".to_owned(),
        }
    }

    #[test]
    fn always_accepts_an_equal_or_better_candidate() {
        let sa = SimulatedAnnealing::new(&config());
        let random = Random::from_seed(1);
        assert!(sa.accept(100.0, 90.0, &random));
        assert!(sa.accept(100.0, 100.0, &random));
    }

    #[test]
    fn never_accepts_an_infinite_candidate() {
        let sa = SimulatedAnnealing::new(&config());
        let random = Random::from_seed(1);
        assert!(!sa.accept(100.0, f64::INFINITY, &random));
    }

    #[test]
    fn cooling_is_monotonic_and_floors_at_end_temperature() {
        let mut sa = SimulatedAnnealing::new(&config());
        let mut previous = sa.temperature();
        for _ in 0..10_000 {
            sa.cool();
            assert!(sa.temperature() <= previous + 1e-9);
            previous = sa.temperature();
        }
        assert!(sa.temperature() >= 1.0 - 1e-9);
    }

    #[test]
    fn worse_candidates_are_accepted_less_often_as_temperature_cools() {
        let mut sa = SimulatedAnnealing::new(&config());
        let random = Random::from_seed(7);
        let hot_accepts: usize = (0..1000).filter(|_| sa.accept(100.0, 110.0, &random)).count();
        for _ in 0..200 {
            sa.cool();
        }
        let cold_accepts: usize = (0..1000).filter(|_| sa.accept(100.0, 110.0, &random)).count();
        assert!(cold_accepts <= hot_accepts);
    }
}
