use std::collections::HashMap;

use crate::models::{route_distance, Instance, Route};
use crate::solver::alns::state::ALNSState;
use crate::solver::feasibility::evaluate_route;
use crate::solver::station::best_station_insertion;
use crate::utils::{FloatCompare, Random};

/// A single way to reinsert a customer: either into an existing route
/// (`route_index`) or as the start of a brand new one (`None`), with
/// the resulting route and the distance it adds to the solution.
#[derive(Clone)]
struct InsertionOption {
    route_index: Option<usize>,
    route: Route,
    delta: f64,
}

/// Every feasible way to insert `customer` into `route`: a direct
/// insertion at each interior position when it is fully feasible, or,
/// when only energy feasibility fails there, a station repair before
/// and/or after the customer at that position. Every position
/// contributes its own entries rather than only the cheapest.
fn insertion_options_in_route(instance: &Instance, route: &Route, customer: usize) -> Vec<InsertionOption> {
    let base_distance = route_distance(instance, route);
    let mut options = Vec::new();

    for pos in 1..route.len() {
        let mut direct = route.clone();
        direct.insert(pos, customer);
        let report = evaluate_route(instance, &direct);
        if !(report.time_ok && report.capacity_ok) {
            continue;
        }

        if report.energy_ok {
            let delta = route_distance(instance, &direct) - base_distance;
            options.push(InsertionOption { route_index: None, route: direct, delta });
            continue;
        }

        for before in [true, false] {
            if let Some(repaired) = best_station_insertion(instance, route, customer, pos, before) {
                let delta = route_distance(instance, &repaired) - base_distance;
                options.push(InsertionOption { route_index: None, route: repaired, delta });
            }
        }
    }

    options
}

/// Opens a new route for `customer` alone: a direct entry if it is
/// fully feasible, otherwise a station repair before and/or after the
/// customer on an empty `[depot, depot]` route.
fn new_route_options(instance: &Instance, customer: usize) -> Vec<InsertionOption> {
    let depot = instance.depot();
    let direct = vec![depot, customer, depot];
    if evaluate_route(instance, &direct).is_feasible() {
        let delta = route_distance(instance, &direct);
        return vec![InsertionOption { route_index: None, route: direct, delta }];
    }

    let empty = vec![depot, depot];
    let mut options = Vec::new();
    for before in [true, false] {
        if let Some(route) = best_station_insertion(instance, &empty, customer, 1, before) {
            let delta = route_distance(instance, &route);
            options.push(InsertionOption { route_index: None, route, delta });
        }
    }
    options
}

/// Every feasible two-station bracket `[depot, s1, customer, s2, depot]`.
/// Tried only when no direct or single-station option exists anywhere
/// for this customer.
fn two_station_fallback_options(instance: &Instance, customer: usize) -> Vec<InsertionOption> {
    let depot = instance.depot();
    let mut options = Vec::new();
    for s1 in instance.station_ids() {
        for s2 in instance.station_ids() {
            let route = vec![depot, s1, customer, s2, depot];
            if !evaluate_route(instance, &route).is_feasible() {
                continue;
            }
            let delta = route_distance(instance, &route);
            options.push(InsertionOption { route_index: None, route, delta });
        }
    }
    options
}

/// Memoizes the feasible insertion options per `(customer, route)` pair
/// so that repairing several customers in a row does not re-scan every
/// route from scratch. Inserting a customer into route `k` only
/// changes the costs of that one route, so only `k`'s entries need
/// invalidating afterward.
struct InsertionCache {
    by_route: HashMap<usize, HashMap<usize, Vec<InsertionOption>>>,
    new_route: HashMap<usize, Vec<InsertionOption>>,
    fallback: HashMap<usize, Vec<InsertionOption>>,
}

impl InsertionCache {
    fn new() -> Self {
        Self {
            by_route: HashMap::new(),
            new_route: HashMap::new(),
            fallback: HashMap::new(),
        }
    }

    fn invalidate_route(&mut self, route_index: usize) {
        for per_route in self.by_route.values_mut() {
            per_route.remove(&route_index);
        }
    }

    /// All feasible options for `customer`, sorted ascending by delta.
    /// Falls back to the two-station bracket only when every existing
    /// route and the new-route option are infeasible for this customer.
    fn options_for(&mut self, instance: &Instance, state: &ALNSState, customer: usize) -> Vec<InsertionOption> {
        let per_route = self.by_route.entry(customer).or_insert_with(HashMap::new);
        let mut options = Vec::new();

        for (route_index, route) in state.routes.iter().enumerate() {
            let route_options = per_route
                .entry(route_index)
                .or_insert_with(|| insertion_options_in_route(instance, route, customer))
                .clone();
            for mut option in route_options {
                option.route_index = Some(route_index);
                options.push(option);
            }
        }

        let new_route = self
            .new_route
            .entry(customer)
            .or_insert_with(|| new_route_options(instance, customer))
            .clone();
        options.extend(new_route);

        if options.is_empty() {
            let fallback = self
                .fallback
                .entry(customer)
                .or_insert_with(|| two_station_fallback_options(instance, customer))
                .clone();
            options.extend(fallback);
        }

        options.sort_by(|a, b| a.delta.partial_cmp(&b.delta).unwrap());
        options
    }
}

fn apply_option(state: &mut ALNSState, cache: &mut InsertionCache, option: InsertionOption) {
    match option.route_index {
        Some(idx) => {
            state.routes[idx] = option.route;
            cache.invalidate_route(idx);
        }
        None => {
            state.routes.push(option.route);
        }
    }
}

/// Repeatedly: for every unassigned customer, sort its options
/// ascending by cost and draw one via the biased index; among these
/// per-customer picks, insert the customer whose picked option is
/// cheapest overall. Stops when no customer has any feasible option
/// left, leaving the rest in `state.unassigned` for the ALNS driver to
/// treat as an infinite objective for this iteration.
pub fn greedy_repair(instance: &Instance, mut state: ALNSState, random: &Random, p: f64) -> ALNSState {
    let mut cache = InsertionCache::new();
    let mut stalled = Vec::new();
    let mut pending = std::mem::take(&mut state.unassigned);

    while !pending.is_empty() {
        let mut best_pick: Option<(usize, InsertionOption)> = None; // (index into pending, picked option)

        for (i, &customer) in pending.iter().enumerate() {
            let options = cache.options_for(instance, &state, customer);
            if options.is_empty() {
                continue;
            }
            let picked = options[random.biased_index(p, options.len())].clone();
            let replace = match &best_pick {
                Some((_, current)) => picked.delta.approx_lt(current.delta),
                None => true,
            };
            if replace {
                best_pick = Some((i, picked));
            }
        }

        match best_pick {
            Some((i, option)) => {
                pending.remove(i);
                apply_option(&mut state, &mut cache, option);
            }
            None => {
                log::warn!("greedy repair stalled with {} customers left", pending.len());
                stalled.append(&mut pending);
                break;
            }
        }
    }

    state.unassigned = stalled;
    state
}

/// Regret repair: each round scores every customer by the gap between
/// its second-best and best insertion cost (0 if it has only one
/// option), sorts customers descending by regret and draws one via the
/// biased index, then inserts that customer's cheapest option.
pub fn regret_repair(instance: &Instance, mut state: ALNSState, random: &Random, p: f64) -> ALNSState {
    let mut cache = InsertionCache::new();
    let mut stalled = Vec::new();
    let mut pending = std::mem::take(&mut state.unassigned);

    while !pending.is_empty() {
        let mut scored: Vec<(f64, usize, Vec<InsertionOption>)> = Vec::new();
        for (i, &customer) in pending.iter().enumerate() {
            let options = cache.options_for(instance, &state, customer);
            if options.is_empty() {
                continue;
            }
            let regret = if options.len() == 1 {
                0.0
            } else {
                options[1].delta - options[0].delta
            };
            scored.push((regret, i, options));
        }

        if scored.is_empty() {
            log::warn!("regret repair stalled with {} customers left", pending.len());
            stalled.append(&mut pending);
            break;
        }

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap());
        let pick = random.biased_index(p, scored.len());
        let (_, pending_index, options) = scored.swap_remove(pick);
        pending.remove(pending_index);
        apply_option(&mut state, &mut cache, options.into_iter().next().unwrap());
    }

    state.unassigned = stalled;
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Node;

    fn line_instance() -> Instance {
        let nodes = vec![
            Node::depot(0, 0.0, 0.0, 1000.0),
            Node::customer(1, 1.0, 0.0, 1.0, 0.0, 1000.0, 0.0),
            Node::customer(2, 2.0, 0.0, 1.0, 0.0, 1000.0, 0.0),
        ];
        Instance::new(nodes, 10.0, 1000.0, 1.0, 1.0)
    }

    #[test]
    fn greedy_repair_reinserts_every_customer() {
        let instance = line_instance();
        let random = Random::from_seed(7);
        let mut state = ALNSState::from_routes(vec![vec![0, 0]]);
        state.unassigned = vec![1, 2];
        let repaired = greedy_repair(&instance, state, &random, 10.0);
        assert!(repaired.unassigned.is_empty());
        assert!(repaired.routes.iter().any(|r| r.contains(&1)));
        assert!(repaired.routes.iter().any(|r| r.contains(&2)));
    }

    #[test]
    fn regret_repair_reinserts_every_customer() {
        let instance = line_instance();
        let random = Random::from_seed(8);
        let mut state = ALNSState::from_routes(vec![vec![0, 0]]);
        state.unassigned = vec![1, 2];
        let repaired = regret_repair(&instance, state, &random, 10.0);
        assert!(repaired.unassigned.is_empty());
        assert!(repaired.routes.iter().any(|r| r.contains(&1)));
        assert!(repaired.routes.iter().any(|r| r.contains(&2)));
    }

    #[test]
    fn repair_opens_a_new_route_with_station_when_needed() {
        let instance = crate::models::instance::tests_support::two_customer_instance(12.0);
        let random = Random::from_seed(9);
        let mut state = ALNSState::from_routes(vec![vec![0, 0]]);
        state.unassigned = vec![1, 2];
        let repaired = greedy_repair(&instance, state, &random, 10.0);
        assert!(repaired.unassigned.is_empty());
        for route in &repaired.routes {
            assert!(evaluate_route(&instance, route).is_feasible());
        }
    }

    #[test]
    fn insertion_options_cover_every_feasible_position() {
        // Two candidate insertion positions around the interior
        // customer; the full option list should carry both, not a
        // single collapsed best.
        let instance = line_instance();
        let route = vec![0, 2, 0];
        let options = insertion_options_in_route(&instance, &route, 1);
        assert_eq!(options.len(), 2, "expected one option per insertion position");
    }
}
