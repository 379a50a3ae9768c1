use crate::models::{route_distance, Instance, Route, Solution};
use crate::solver::feasibility::evaluate_route;
use crate::solver::station::best_station_insertion;
use crate::utils::FloatCompare;

/// A single candidate relocation: remove the customer at `(i, j)` and
/// insert it at position `pos` of route `k`, yielding a full pair of
/// replacement routes.
struct Candidate {
    source_route: usize,
    dest_route: usize,
    new_source: Route,
    new_dest: Route,
    total_distance: f64,
}

fn evaluate_candidate(
    instance: &Instance,
    solution: &Solution,
    source_route: usize,
    new_source: &Route,
    dest_route: usize,
    new_dest: &Route,
) -> f64 {
    solution
        .routes
        .iter()
        .enumerate()
        .map(|(idx, route)| {
            if idx == source_route {
                route_distance(instance, new_source)
            } else if idx == dest_route {
                route_distance(instance, new_dest)
            } else {
                route_distance(instance, route)
            }
        })
        .sum()
}

/// One best-improvement pass over every (source route, customer,
/// destination route, position) triple. Returns `(improved,
/// best_solution)`: when no triple improves on the input, returns
/// `(false, solution.clone())`.
fn relocate_pass(instance: &Instance, solution: &Solution) -> (bool, Solution) {
    let mut best_candidate: Option<Candidate> = None;
    let mut best_distance = solution.total_distance;

    for (i, route_i) in solution.routes.iter().enumerate() {
        for (j, &customer) in route_i.iter().enumerate() {
            if !instance.is_customer(customer) {
                continue;
            }

            let mut new_source = route_i.clone();
            new_source.remove(j);

            for (k, route_k) in solution.routes.iter().enumerate() {
                if k == i {
                    continue;
                }

                for pos in 1..route_k.len() {
                    let mut direct = route_k.clone();
                    direct.insert(pos, customer);

                    let report = evaluate_route(instance, &direct);
                    if !(report.time_ok && report.capacity_ok) {
                        continue;
                    }

                    let mut accepted: Vec<Route> = Vec::new();
                    if report.energy_ok {
                        accepted.push(direct);
                    } else {
                        for before in [true, false] {
                            if let Some(repaired) =
                                best_station_insertion(instance, route_k, customer, pos, before)
                            {
                                accepted.push(repaired);
                            }
                        }
                    }

                    for new_dest in accepted {
                        let total = evaluate_candidate(
                            instance,
                            solution,
                            i,
                            &new_source,
                            k,
                            &new_dest,
                        );
                        if total.approx_lt(best_distance) {
                            best_distance = total;
                            best_candidate = Some(Candidate {
                                source_route: i,
                                dest_route: k,
                                new_source: new_source.clone(),
                                new_dest,
                                total_distance: total,
                            });
                        }
                    }
                }
            }
        }
    }

    match best_candidate {
        Some(candidate) => {
            let mut routes = solution.routes.clone();
            routes[candidate.source_route] = candidate.new_source;
            routes[candidate.dest_route] = candidate.new_dest;
            let mut improved = Solution::new(instance, routes);
            improved.prune_empty_routes();
            improved.recompute_total_distance(instance);
            log::debug!(
                "relocate: moved a customer, distance {:.2} -> {:.2}",
                solution.total_distance,
                candidate.total_distance
            );
            (true, improved)
        }
        None => (false, solution.clone()),
    }
}

/// Repeats best-improvement relocate passes until one finds nothing.
/// Never worsens the input (`local_search(s).total_distance <=
/// s.total_distance`).
pub fn local_search(instance: &Instance, solution: &Solution) -> Solution {
    let mut current = solution.clone();
    loop {
        let (improved, next) = relocate_pass(instance, &current);
        if !improved {
            return current;
        }
        current = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Node;

    fn two_route_instance() -> Instance {
        // R1 = [D, a, b, D], R2 = [D, c, D]. Moving b next to c strictly
        // shortens the total distance.
        let nodes = vec![
            Node::depot(0, 0.0, 0.0, 1000.0),
            Node::customer(1, 1.0, 0.0, 1.0, 0.0, 1000.0, 0.0),
            Node::customer(2, 100.0, 0.0, 1.0, 0.0, 1000.0, 0.0),
            Node::customer(3, 101.0, 0.0, 1.0, 0.0, 1000.0, 0.0),
        ];
        Instance::new(nodes, 100.0, 1000.0, 1.0, 1.0)
    }

    #[test]
    fn relocate_improves_and_then_converges() {
        let instance = two_route_instance();
        let solution = Solution::new(&instance, vec![vec![0, 1, 2, 0], vec![0, 3, 0]]);

        let (improved_once, once) = relocate_pass(&instance, &solution);
        assert!(improved_once);
        assert!(once.total_distance.approx_lt(solution.total_distance));

        let (improved_twice, _) = relocate_pass(&instance, &once);
        assert!(!improved_twice);
    }

    #[test]
    fn local_search_never_worsens() {
        let instance = two_route_instance();
        let solution = Solution::new(&instance, vec![vec![0, 1, 2, 0], vec![0, 3, 0]]);
        let result = local_search(&instance, &solution);
        assert!(result.total_distance <= solution.total_distance + 1e-9);
        assert!(result.covers_all_customers_exactly_once(&instance));
    }

    #[test]
    fn local_search_inserts_station_to_keep_moves_feasible() {
        let instance = crate::models::instance::tests_support::two_customer_instance(12.0);
        // Two single-customer routes; relocating one into the other's
        // route is only feasible with a station repair.
        let solution = Solution::new(&instance, vec![vec![0, 1, 0], vec![0, 2, 0]]);
        let result = local_search(&instance, &solution);
        for route in &result.routes {
            assert!(evaluate_route(&instance, route).is_feasible());
        }
        assert!(result.covers_all_customers_exactly_once(&instance));
    }
}
