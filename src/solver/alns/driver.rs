use std::time::{Duration, Instant};

use crate::config::Config;
use crate::models::{Instance, Solution};
use crate::solver::alns::acceptance::SimulatedAnnealing;
use crate::solver::alns::destroy::{
    nearest_customers_removal, random_customer_removal, worst_customer_removal, worst_station_removal,
};
use crate::solver::alns::repair::{greedy_repair, regret_repair};
use crate::solver::alns::selector::{Outcome, Selector};
use crate::solver::alns::state::ALNSState;
use crate::utils::{FloatCompare, Random};

type DestroyOp = fn(&Instance, &ALNSState, &Random, f64, f64) -> ALNSState;
type RepairOp = fn(&Instance, ALNSState, &Random, f64) -> ALNSState;

const DESTROY_OPS: [DestroyOp; 4] = [
    random_customer_removal,
    nearest_customers_removal,
    worst_customer_removal,
    worst_station_removal,
];

const REPAIR_OPS: [RepairOp; 2] = [greedy_repair, regret_repair];

/// Outcome counts for one operator pair, indexed the same way as
/// `SelectorConfig::scores`: `[best, better, accepted, rejected]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OutcomeCounts {
    pub best: u64,
    pub better: u64,
    pub accepted: u64,
    pub rejected: u64,
}

impl OutcomeCounts {
    fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Best => self.best += 1,
            Outcome::Better => self.better += 1,
            Outcome::Accepted => self.accepted += 1,
            Outcome::Rejected => self.rejected += 1,
        }
    }
}

/// One row of the per-iteration log: which operator pair ran, how the
/// outcome was classified, the resulting objective, and how long the
/// iteration took.
#[derive(Clone, Copy, Debug)]
pub struct IterationRecord {
    pub iteration: u64,
    pub destroy_index: usize,
    pub repair_index: usize,
    pub outcome: Outcome,
    pub objective: f64,
    pub runtime: Duration,
}

/// Run-level statistics reported alongside the returned solution: a
/// per-iteration log, per-operator-pair outcome counts, and the
/// aggregate counters a caller typically wants without scanning the
/// log.
#[derive(Clone, Debug)]
pub struct Statistics {
    pub iterations: u64,
    pub best_objective: f64,
    pub final_objective: f64,
    pub best_found_at: u64,
    pub accepted_count: u64,
    pub stalled_count: u64,
    pub per_iteration: Vec<IterationRecord>,
    /// `operator_outcomes[destroy_index][repair_index]`.
    pub operator_outcomes: Vec<Vec<OutcomeCounts>>,
    pub total_runtime: Duration,
}

/// Runs the ALNS metaheuristic from `initial` for
/// `config.num_iterations` iterations, selecting a destroy/repair
/// operator pair each iteration via the segmented roulette-wheel
/// selector, repairing with them, and accepting the result under a
/// simulated-annealing criterion.
///
/// `config` is assumed valid; callers run `Config::validate()` first.
pub fn run_alns(instance: &Instance, initial: &Solution, config: &Config) -> (Solution, Statistics) {
    let run_start = Instant::now();
    let random = match config.seed {
        Some(seed) => Random::from_seed(seed),
        None => Random::new(),
    };
    let mut selector = Selector::new(&config.selector);
    let mut sa = SimulatedAnnealing::new(&config.simulated_annealing);

    let mut current = ALNSState::from_routes(initial.routes.clone());
    let mut current_objective = current.objective(instance);
    let mut best = current.clone();
    let mut best_objective = current_objective;
    let mut best_found_at = 0;
    let mut accepted_count = 0;
    let mut stalled_count = 0;
    let mut per_iteration = Vec::with_capacity(config.num_iterations as usize);
    let mut operator_outcomes =
        vec![vec![OutcomeCounts::default(); config.selector.num_repair]; config.selector.num_destroy];

    for iteration in 0..config.num_iterations {
        let iteration_start = Instant::now();
        let destroy_idx = selector.select_destroy(&random);
        let repair_idx = selector.select_repair(&random);

        let destroyed = DESTROY_OPS[destroy_idx](instance, &current, &random, config.xi, config.p);
        let repaired = REPAIR_OPS[repair_idx](instance, destroyed, &random, config.p);

        let objective = if repaired.unassigned.is_empty() {
            repaired.objective(instance)
        } else {
            stalled_count += 1;
            f64::INFINITY
        };

        let outcome = if objective.approx_lt(best_objective) {
            Outcome::Best
        } else if objective.approx_lt(current_objective) {
            Outcome::Better
        } else if sa.accept(current_objective, objective, &random) {
            Outcome::Accepted
        } else {
            Outcome::Rejected
        };

        if !matches!(outcome, Outcome::Rejected) {
            current = repaired.clone();
            current_objective = objective;
            accepted_count += 1;
        }
        if matches!(outcome, Outcome::Best) {
            best = repaired;
            best_objective = objective;
            best_found_at = iteration;
            log::debug!("alns: new best objective {:.2} at iteration {}", best_objective, iteration);
        }

        selector.record(destroy_idx, repair_idx, outcome);
        operator_outcomes[destroy_idx][repair_idx].record(outcome);
        per_iteration.push(IterationRecord {
            iteration,
            destroy_index: destroy_idx,
            repair_index: repair_idx,
            outcome,
            objective,
            runtime: iteration_start.elapsed(),
        });
        sa.cool();
    }

    let mut solution = Solution::new(instance, best.routes);
    solution.prune_empty_routes();
    solution.recompute_total_distance(instance);

    log::info!(
        "alns: finished {} iterations, best objective {:.2}",
        config.num_iterations,
        best_objective
    );

    let statistics = Statistics {
        iterations: config.num_iterations,
        best_objective,
        final_objective: current_objective,
        best_found_at,
        accepted_count,
        stalled_count,
        per_iteration,
        operator_outcomes,
        total_runtime: run_start.elapsed(),
    };
    (solution, statistics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::instance::tests_support::two_customer_instance;

    #[test]
    fn run_alns_never_worsens_the_best_known_objective() {
        let instance = two_customer_instance(1000.0);
        let config = Config { num_iterations: 50, seed: Some(1), ..Config::default() };
        assert!(config.validate().is_ok());

        let initial = Solution::new(&instance, vec![vec![0, 1, 0], vec![0, 2, 0]]);
        let (solution, stats) = run_alns(&instance, &initial, &config);

        assert!(stats.best_objective.approx_lte(initial.total_distance + 1e-6));
        assert!(solution.covers_all_customers_exactly_once(&instance));
    }

    #[test]
    fn run_alns_is_deterministic_with_a_fixed_seed() {
        let instance = two_customer_instance(1000.0);
        let config = Config { num_iterations: 30, seed: Some(99), ..Config::default() };
        let initial = Solution::new(&instance, vec![vec![0, 1, 2, 0]]);

        let (first, _) = run_alns(&instance, &initial, &config);
        let (second, _) = run_alns(&instance, &initial, &config);
        assert!((first.total_distance - second.total_distance).abs() < 1e-9);
    }

    #[test]
    fn statistics_carry_a_full_per_iteration_and_per_operator_log() {
        let instance = two_customer_instance(1000.0);
        let config = Config { num_iterations: 20, seed: Some(3), ..Config::default() };
        let initial = Solution::new(&instance, vec![vec![0, 1, 2, 0]]);

        let (_, stats) = run_alns(&instance, &initial, &config);

        assert_eq!(stats.per_iteration.len(), 20);
        assert_eq!(stats.operator_outcomes.len(), config.selector.num_destroy);
        assert!(stats.operator_outcomes.iter().all(|row| row.len() == config.selector.num_repair));

        let total_recorded: u64 = stats
            .operator_outcomes
            .iter()
            .flatten()
            .map(|counts| counts.best + counts.better + counts.accepted + counts.rejected)
            .sum();
        assert_eq!(total_recorded, 20);
    }
}
