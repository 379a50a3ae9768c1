use crate::config::SelectorConfig;
use crate::utils::Random;

/// How an iteration's candidate solution fared against the incumbent
/// and the best-known solution, used to look up the reward in
/// `SelectorConfig::scores`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Best,
    Better,
    Accepted,
    Rejected,
}

impl Outcome {
    fn score(self, scores: &[f64; 4]) -> f64 {
        match self {
            Outcome::Best => scores[0],
            Outcome::Better => scores[1],
            Outcome::Accepted => scores[2],
            Outcome::Rejected => scores[3],
        }
    }
}

/// Segmented roulette-wheel adaptive operator selection: destroy and
/// repair operators each carry a weight. Scores accumulate per operator
/// for `seg_length` iterations, then weights decay toward the
/// segment's average reward per use.
pub struct Selector {
    destroy_weights: Vec<f64>,
    repair_weights: Vec<f64>,
    destroy_scores: Vec<f64>,
    repair_scores: Vec<f64>,
    destroy_uses: Vec<u64>,
    repair_uses: Vec<u64>,
    decay: f64,
    seg_length: u64,
    scores: [f64; 4],
    iterations_in_segment: u64,
}

impl Selector {
    pub fn new(config: &SelectorConfig) -> Self {
        Self {
            destroy_weights: vec![1.0; config.num_destroy],
            repair_weights: vec![1.0; config.num_repair],
            destroy_scores: vec![0.0; config.num_destroy],
            repair_scores: vec![0.0; config.num_repair],
            destroy_uses: vec![0; config.num_destroy],
            repair_uses: vec![0; config.num_repair],
            decay: config.decay,
            seg_length: config.seg_length,
            scores: config.scores,
            iterations_in_segment: 0,
        }
    }

    fn roulette_pick(weights: &[f64], random: &Random) -> usize {
        let total: f64 = weights.iter().sum();
        if total <= 0.0 {
            return random.range_usize(0, weights.len());
        }
        let mut target = random.real() * total;
        for (i, &weight) in weights.iter().enumerate() {
            if target < weight {
                return i;
            }
            target -= weight;
        }
        weights.len() - 1
    }

    pub fn select_destroy(&self, random: &Random) -> usize {
        Self::roulette_pick(&self.destroy_weights, random)
    }

    pub fn select_repair(&self, random: &Random) -> usize {
        Self::roulette_pick(&self.repair_weights, random)
    }

    /// Records the result of one iteration and, every `seg_length`
    /// iterations, folds accumulated scores into the operator weights.
    pub fn record(&mut self, destroy: usize, repair: usize, outcome: Outcome) {
        let reward = outcome.score(&self.scores);
        self.destroy_scores[destroy] += reward;
        self.repair_scores[repair] += reward;
        self.destroy_uses[destroy] += 1;
        self.repair_uses[repair] += 1;

        self.iterations_in_segment += 1;
        if self.iterations_in_segment >= self.seg_length {
            self.update_weights();
            self.iterations_in_segment = 0;
        }
    }

    fn update_weights(&mut self) {
        for i in 0..self.destroy_weights.len() {
            let average = if self.destroy_uses[i] > 0 {
                self.destroy_scores[i] / self.destroy_uses[i] as f64
            } else {
                0.0
            };
            self.destroy_weights[i] = self.destroy_weights[i] * (1.0 - self.decay) + self.decay * average;
            self.destroy_scores[i] = 0.0;
            self.destroy_uses[i] = 0;
        }
        for i in 0..self.repair_weights.len() {
            let average = if self.repair_uses[i] > 0 {
                self.repair_scores[i] / self.repair_uses[i] as f64
            } else {
                0.0
            };
            self.repair_weights[i] = self.repair_weights[i] * (1.0 - self.decay) + self.decay * average;
            self.repair_scores[i] = 0.0;
            self.repair_uses[i] = 0;
        }
    }

    pub fn destroy_weights(&self) -> &[f64] {
        &self.destroy_weights
    }

    pub fn repair_weights(&self) -> &[f64] {
        &self.repair_weights
    }
}
