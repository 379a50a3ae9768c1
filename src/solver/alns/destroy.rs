use ahash::AHashSet;

use crate::models::{route_distance, Instance};
use crate::solver::alns::state::ALNSState;
use crate::utils::Random;

/// Draws a removal count from `[1, max(1, floor(xi * n))]`, the bound
/// shared by every destroy operator.
fn removal_count(random: &Random, xi: f64, n: usize) -> usize {
    let max_to_remove = (1usize).max((xi * n as f64).floor() as usize);
    random.range_usize(1, max_to_remove + 1)
}

fn customers_in_solution(instance: &Instance, state: &ALNSState) -> Vec<usize> {
    state
        .routes
        .iter()
        .flatten()
        .copied()
        .filter(|&node| instance.is_customer(node))
        .collect()
}

fn remove_customer(state: &mut ALNSState, customer: usize) {
    let route_idx = state.find_route(customer);
    let route = &mut state.routes[route_idx];
    let pos = route.iter().position(|&n| n == customer).unwrap();
    route.remove(pos);
    state.unassigned.push(customer);
}

/// Removes a uniformly random fraction of the customers currently on
/// the solution.
pub fn random_customer_removal(
    instance: &Instance,
    state: &ALNSState,
    random: &Random,
    xi: f64,
    _p: f64,
) -> ALNSState {
    let mut destroyed = state.clone();
    let customers = customers_in_solution(instance, &destroyed);
    if customers.is_empty() {
        return destroyed;
    }

    let k = removal_count(random, xi, customers.len());
    let to_remove = random.sample_without_replacement(&customers, k);
    for customer in to_remove {
        remove_customer(&mut destroyed, customer);
    }
    destroyed.prune_empty_routes();
    destroyed
}

/// Removes a uniformly random "central" customer (drawn only from
/// customers currently present in the solution) plus its nearest
/// neighbors by distance.
pub fn nearest_customers_removal(
    instance: &Instance,
    state: &ALNSState,
    random: &Random,
    xi: f64,
    _p: f64,
) -> ALNSState {
    let mut destroyed = state.clone();
    let customers = customers_in_solution(instance, &destroyed);
    if customers.is_empty() {
        return destroyed;
    }

    let central = customers[random.range_usize(0, customers.len())];
    let mut others: Vec<usize> = customers.iter().copied().filter(|&c| c != central).collect();
    others.sort_by(|&a, &b| {
        instance
            .distance(central, a)
            .partial_cmp(&instance.distance(central, b))
            .unwrap()
    });

    let k = removal_count(random, xi, customers.len());
    let mut to_remove = vec![central];
    to_remove.extend(others.into_iter().take(k.saturating_sub(1)));

    for customer in to_remove {
        remove_customer(&mut destroyed, customer);
    }
    destroyed.prune_empty_routes();
    destroyed
}

fn removal_gain(instance: &Instance, route: &[usize], position: usize) -> f64 {
    let prev = route[position - 1];
    let node = route[position];
    let next = route[position + 1];
    instance.distance(prev, node) + instance.distance(node, next) - instance.distance(prev, next)
}

/// Removes the customers whose removal shortens their route the most,
/// biased toward the largest gains via `biased_index`.
pub fn worst_customer_removal(
    instance: &Instance,
    state: &ALNSState,
    random: &Random,
    xi: f64,
    p: f64,
) -> ALNSState {
    let mut destroyed = state.clone();

    let mut removable: Vec<(f64, usize)> = Vec::new();
    for route in &destroyed.routes {
        for i in 1..route.len().saturating_sub(1) {
            if instance.is_customer(route[i]) {
                removable.push((removal_gain(instance, route, i), route[i]));
            }
        }
    }
    if removable.is_empty() {
        return destroyed;
    }
    removable.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap());

    let k = removal_count(random, xi, removable.len());
    let mut removed: AHashSet<usize> = AHashSet::default();

    for _ in 0..k {
        if removable.is_empty() {
            break;
        }
        let idx = random.biased_index(p, removable.len());
        let (_, customer) = removable.remove(idx);
        if removed.contains(&customer) {
            continue;
        }
        remove_customer(&mut destroyed, customer);
        removed.insert(customer);
    }

    destroyed.prune_empty_routes();
    destroyed
}

fn check_energy_feasibility(instance: &Instance, route: &[usize]) -> bool {
    let mut soc = instance.battery_capacity();
    let mut last = route[0];
    for &node in &route[1..] {
        let energy = instance.energy_consumption(last, node);
        if soc - energy < 0.0 {
            return false;
        }
        soc = if instance.is_station(node) {
            instance.battery_capacity()
        } else {
            soc - energy
        };
        last = node;
    }
    true
}

/// Gain list of every interior station, as `(gain, route_idx,
/// position_in_route, station)`.
fn removable_stations(instance: &Instance, state: &ALNSState) -> Vec<(f64, usize, usize, usize)> {
    let mut result = Vec::new();
    for (route_idx, route) in state.routes.iter().enumerate() {
        for i in 1..route.len().saturating_sub(1) {
            let node = route[i];
            if !instance.is_station(node) {
                continue;
            }
            let mut without = route.clone();
            without.remove(i);
            let gain = route_distance(instance, route) - route_distance(instance, &without);
            result.push((gain, route_idx, i, node));
        }
    }
    result
}

/// Removes customers from `route[start..=end]`, scanning from the end
/// of the segment toward the start and then from the start toward the
/// end, until the route is energy-feasible or the segment is
/// exhausted.
fn remove_customers_until_energy_feasible(
    instance: &Instance,
    route: &mut Vec<usize>,
    start: usize,
    mut end: usize,
    unassigned: &mut Vec<usize>,
) {
    while !check_energy_feasibility(instance, route) {
        let mut removed = false;

        let mut i = end as isize;
        while i >= start as isize {
            let idx = i as usize;
            if instance.is_customer(route[idx]) {
                unassigned.push(route[idx]);
                route.remove(idx);
                end = end.min(route.len().saturating_sub(1));
                removed = true;
                break;
            }
            i -= 1;
        }
        if removed {
            continue;
        }

        let upper = (end + 1).min(route.len());
        for idx in start..upper {
            if instance.is_customer(route[idx]) {
                unassigned.push(route[idx]);
                route.remove(idx);
                end = end.min(route.len().saturating_sub(1));
                removed = true;
                break;
            }
        }

        if !removed {
            break;
        }
    }
}

/// Removes stations whose removal shortens the route the most. The
/// removal count is bounded by `len(routes)`, not `len(stations)`.
/// After each removal, customers in the affected segment are stripped
/// out (from both ends inward) until the segment is energy-feasible
/// again.
pub fn worst_station_removal(
    instance: &Instance,
    state: &ALNSState,
    random: &Random,
    xi: f64,
    p: f64,
) -> ALNSState {
    let mut destroyed = state.clone();
    let num_to_remove = removal_count(random, xi, destroyed.routes.len().max(1));
    let mut removed_stations: AHashSet<usize> = AHashSet::default();

    for _ in 0..num_to_remove {
        let mut candidates = removable_stations(instance, &destroyed);
        if candidates.is_empty() {
            break;
        }
        candidates.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap());

        let idx = random.biased_index(p, candidates.len());
        let (_, route_idx, station_index, station) = candidates[idx];
        if removed_stations.contains(&station) {
            continue;
        }

        let route = &mut destroyed.routes[route_idx];

        let mut start = station_index;
        while start > 0 {
            if instance.is_station(route[start - 1]) || instance.is_depot(route[start - 1]) {
                break;
            }
            start -= 1;
        }

        let mut end = station_index;
        while end + 1 < route.len() {
            if instance.is_station(route[end + 1]) || instance.is_depot(route[end + 1]) {
                break;
            }
            end += 1;
        }
        end = end.max(start);

        route.remove(station_index);
        removed_stations.insert(station);
        if station_index < end {
            end -= 1;
        }
        end = end.min(route.len().saturating_sub(1));

        remove_customers_until_energy_feasible(
            instance,
            route,
            start.min(route.len().saturating_sub(1)),
            end,
            &mut destroyed.unassigned,
        );
    }

    destroyed.prune_empty_routes();
    destroyed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Node;

    fn line_instance() -> Instance {
        let nodes = vec![
            Node::depot(0, 0.0, 0.0, 1000.0),
            Node::customer(1, 1.0, 0.0, 1.0, 0.0, 1000.0, 0.0),
            Node::customer(2, 10.0, 0.0, 1.0, 0.0, 1000.0, 0.0),
        ];
        Instance::new(nodes, 10.0, 1000.0, 1.0, 1.0)
    }

    #[test]
    fn random_removal_moves_customers_to_unassigned() {
        let instance = line_instance();
        let random = Random::from_seed(1);
        let state = ALNSState::from_routes(vec![vec![0, 1, 2, 0]]);
        let destroyed = random_customer_removal(&instance, &state, &random, 1.0, 10.0);
        assert!(!destroyed.unassigned.is_empty());
        // Every removed customer is absent from whichever routes remain.
        for &c in &destroyed.unassigned {
            assert!(destroyed.routes.iter().all(|r| !r.contains(&c)));
        }
    }

    #[test]
    fn nearest_removal_draws_central_from_solution_only() {
        let instance = line_instance();
        let random = Random::from_seed(2);
        // Only customer 1 is present in the solution; customer 2 is not
        // on any route. Central must still be drawable (customer 1).
        let state = ALNSState::from_routes(vec![vec![0, 1, 0]]);
        let destroyed = nearest_customers_removal(&instance, &state, &random, 1.0, 10.0);
        assert!(destroyed.unassigned.contains(&1));
    }

    #[test]
    fn worst_customer_removal_picks_highest_gain_with_large_p() {
        // Coordinates chosen so removing `a` yields a much larger gain
        // than removing `b`.
        let nodes = vec![
            Node::depot(0, 0.0, 0.0, 1000.0),
            Node::customer(1, 0.0, 50.0, 1.0, 0.0, 1000.0, 0.0), // a: big detour
            Node::customer(2, 1.0, 0.0, 1.0, 0.0, 1000.0, 0.0),  // b: small detour
        ];
        let instance = Instance::new(nodes, 10.0, 1000.0, 1.0, 1.0);
        let random = Random::from_seed(3);
        let state = ALNSState::from_routes(vec![vec![0, 1, 2, 0]]);
        let destroyed = worst_customer_removal(&instance, &state, &random, 1.0, 1000.0);
        assert_eq!(destroyed.unassigned[0], 1);
    }

    #[test]
    fn removal_gain_matches_distance_difference() {
        let instance = line_instance();
        let route = vec![0, 1, 2, 0];
        let gain = removal_gain(&instance, &route, 1);
        let without: Vec<usize> = vec![0, 2, 0];
        let expected = route_distance(&instance, &route) - route_distance(&instance, &without);
        assert!((gain - expected).abs() < 1e-9);
    }
}
