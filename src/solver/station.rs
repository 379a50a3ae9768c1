use crate::models::{route_distance, Instance, Route};
use crate::solver::feasibility::evaluate_route;
use crate::utils::FloatCompare;

/// Given a route, a customer and a 1-based insertion position `pos`
/// (between `route[pos - 1]` and `route[pos]`), finds the station whose
/// insertion immediately before (`before = true`) or after
/// (`before = false`) the customer yields the cheapest fully-feasible
/// route. Returns `None` if no station makes the route feasible.
pub fn best_station_insertion(
    instance: &Instance,
    route: &[usize],
    customer: usize,
    pos: usize,
    before: bool,
) -> Option<Route> {
    let mut best: Option<(f64, Route)> = None;

    for station in instance.station_ids() {
        let mut candidate: Route = Vec::with_capacity(route.len() + 2);
        candidate.extend_from_slice(&route[..pos]);
        if before {
            candidate.push(station);
            candidate.push(customer);
        } else {
            candidate.push(customer);
            candidate.push(station);
        }
        candidate.extend_from_slice(&route[pos..]);

        if !evaluate_route(instance, &candidate).is_feasible() {
            continue;
        }

        let distance = route_distance(instance, &candidate);
        let replace = match &best {
            Some((best_distance, _)) => distance.approx_lt(*best_distance),
            None => true,
        };
        if replace {
            best = Some((distance, candidate));
        }
    }

    best.map(|(_, route)| route)
}
