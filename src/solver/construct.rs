use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};

use crate::config::Config;
use crate::models::{Instance, Route, Solution};
use crate::utils::FloatCompare;

/// Construction scratchpad for the route currently being built. Created
/// per route, discarded once the route is finished.
struct RouteStatus {
    current_location: usize,
    remaining_capacity: f64,
    remaining_energy: f64,
    last_service_end_time: f64,
    route: Route,
}

impl RouteStatus {
    fn new(instance: &Instance) -> Self {
        Self {
            current_location: instance.depot(),
            remaining_capacity: instance.capacity(),
            remaining_energy: instance.battery_capacity(),
            last_service_end_time: 0.0,
            route: vec![instance.depot()],
        }
    }

    /// Appends `node` to the route and advances the scratchpad state.
    /// Customers consume capacity and energy and push the clock forward
    /// to the end of service; stations fully recharge and push the clock
    /// forward by the recharge time.
    fn advance(&mut self, instance: &Instance, node: usize, is_customer: bool) {
        let distance = instance.distance(self.current_location, node);
        let energy_used = instance.energy_consumption(self.current_location, node);
        let arrival = self.last_service_end_time + distance;

        self.remaining_energy -= energy_used;
        self.current_location = node;
        self.route.push(node);

        if is_customer {
            self.remaining_capacity -= instance.demand(node);
            let start = arrival.max(instance.ready(node));
            self.last_service_end_time = start + instance.service_time(node);
        } else {
            let recharge_amount = instance.battery_capacity() - self.remaining_energy;
            self.remaining_energy = instance.battery_capacity();
            self.last_service_end_time = arrival + instance.recharge_time(recharge_amount);
        }
    }
}

/// Checks whether the depot can be reached from `from` with
/// `remaining_energy`, either directly or via some station that itself
/// can reach the depot on a full charge.
fn can_reach_depot(instance: &Instance, from: usize, remaining_energy: f64) -> bool {
    if instance.energy_consumption(from, instance.depot()) <= remaining_energy {
        return true;
    }
    instance.station_ids().any(|station| {
        instance.energy_consumption(from, station) <= remaining_energy
            && instance.energy_consumption(station, instance.depot()) <= instance.battery_capacity()
    })
}

/// Nearest station reachable with `remaining_energy` from `from`.
fn find_nearest_station(instance: &Instance, from: usize, remaining_energy: f64) -> Option<usize> {
    instance
        .station_ids()
        .filter(|&station| instance.energy_consumption(from, station) <= remaining_energy)
        .min_by(|&a, &b| {
            instance
                .distance(from, a)
                .partial_cmp(&instance.distance(from, b))
                .unwrap()
        })
}

/// Best station to visit before serving `customer`, or `None` if no
/// station lets the vehicle reach `customer` within its time window and
/// still reach the depot afterward.
fn find_best_station_before_customer(
    instance: &Instance,
    status: &RouteStatus,
    customer: usize,
) -> Option<usize> {
    let mut best: Option<(f64, usize)> = None;

    for station in instance.station_ids() {
        let energy_to_station = instance.energy_consumption(status.current_location, station);
        if energy_to_station > status.remaining_energy {
            continue;
        }
        let energy_station_to_customer = instance.energy_consumption(station, customer);
        if energy_station_to_customer > instance.battery_capacity() {
            continue;
        }

        let arrival_to_station =
            status.last_service_end_time + instance.travel_time(status.current_location, station);
        let recharge_amount =
            instance.battery_capacity() - (status.remaining_energy - energy_to_station);
        let departure_from_station = arrival_to_station + instance.recharge_time(recharge_amount);
        let arrival_to_customer = departure_from_station + instance.travel_time(station, customer);
        if arrival_to_customer > instance.due(customer) {
            continue;
        }

        let energy_after_customer = instance.battery_capacity() - energy_station_to_customer;
        if !can_reach_depot(instance, customer, energy_after_customer) {
            continue;
        }

        let total_distance =
            instance.distance(status.current_location, station) + instance.distance(station, customer);
        let replace = match &best {
            Some((best_distance, _)) => total_distance.approx_lt(*best_distance),
            None => true,
        };
        if replace {
            best = Some((total_distance, station));
        }
    }

    best.map(|(_, station)| station)
}

/// Directly-reachable customers (`None`) and customers reachable only
/// via a station (`Some(station)`), among `unserved`.
fn feasible_customers(
    instance: &Instance,
    status: &RouteStatus,
    unserved: &HashSet<usize>,
) -> HashMap<usize, Option<usize>> {
    let mut feasible = HashMap::new();

    for &customer in unserved {
        if status.remaining_capacity < instance.demand(customer) {
            continue;
        }
        let arrival = status.last_service_end_time
            + instance.travel_time(status.current_location, customer);
        if arrival > instance.due(customer) {
            continue;
        }

        let energy_needed = instance.energy_consumption(status.current_location, customer);
        if energy_needed <= status.remaining_energy {
            let remaining_after = status.remaining_energy - energy_needed;
            if can_reach_depot(instance, customer, remaining_after) {
                feasible.insert(customer, None);
                continue;
            }
        }

        if let Some(station) = find_best_station_before_customer(instance, status, customer) {
            feasible.insert(customer, Some(station));
        }
    }

    feasible
}

/// Cost used by the selection rule: distance plus a penalty for forced
/// waiting. `w` is `config.wait_time_weight`, which defaults to 0.5
/// structurally via `Config::default()`.
fn customer_cost(instance: &Instance, status: &RouteStatus, customer: usize, w: f64) -> f64 {
    let travel_time = instance.travel_time(status.current_location, customer);
    let arrival = status.last_service_end_time + travel_time;
    let wait = (instance.ready(customer) - arrival).max(0.0);
    instance.distance(status.current_location, customer) + w * wait
}

fn select_next_customer(
    instance: &Instance,
    status: &RouteStatus,
    candidates: &HashMap<usize, Option<usize>>,
    w: f64,
) -> Option<usize> {
    candidates
        .keys()
        .copied()
        .map(|c| (c, customer_cost(instance, status, c, w)))
        .min_by(|a, b| match a.1.partial_cmp(&b.1).unwrap() {
            std::cmp::Ordering::Equal => a.0.cmp(&b.0),
            other => other,
        })
        .map(|(c, _)| c)
}

/// When no customer is directly or station-reachable: either the depot
/// is already reachable (the route is simply done), or the vehicle
/// diverts to the nearest reachable station to try again. Returns
/// `true` when the extension loop should retry, `false` when it should
/// stop.
fn handle_no_feasible_customers(instance: &Instance, status: &mut RouteStatus) -> bool {
    if can_reach_depot(instance, status.current_location, status.remaining_energy) {
        return false;
    }
    match find_nearest_station(instance, status.current_location, status.remaining_energy) {
        Some(station) => {
            status.advance(instance, station, false);
            true
        }
        None => false,
    }
}

/// Attempts to return to the depot directly, or by diverting to the
/// nearest reachable station first. Returns whether the depot is now
/// reachable.
fn try_return_to_depot(instance: &Instance, status: &mut RouteStatus) -> bool {
    if can_reach_depot(instance, status.current_location, status.remaining_energy) {
        return true;
    }
    match find_nearest_station(instance, status.current_location, status.remaining_energy) {
        Some(station) => {
            status.advance(instance, station, false);
            can_reach_depot(instance, status.current_location, status.remaining_energy)
        }
        None => false,
    }
}

fn finish_route(instance: &Instance, status: &mut RouteStatus) -> bool {
    if !try_return_to_depot(instance, status) {
        return false;
    }
    status.advance(instance, instance.depot(), false);
    true
}

/// Builds an initial feasible solution route by route, inserting
/// recharging stations proactively as needed. Returns `(None, elapsed)`
/// when a feasible solution could not be found for every customer
/// (`InstanceInfeasible`).
pub fn construct(instance: &Instance, config: &Config) -> (Option<Solution>, Duration) {
    let start = Instant::now();
    let mut routes: Vec<Route> = Vec::new();
    let mut unserved: HashSet<usize> = instance.customer_ids().iter().copied().collect();

    while !unserved.is_empty() {
        let mut status = RouteStatus::new(instance);
        let initial_unserved = unserved.len();

        loop {
            let candidates = feasible_customers(instance, &status, &unserved);
            if candidates.is_empty() {
                if handle_no_feasible_customers(instance, &mut status) {
                    continue;
                }
                break;
            }

            let next = match select_next_customer(instance, &status, &candidates, config.wait_time_weight)
            {
                Some(c) => c,
                None => break,
            };

            if let Some(station) = candidates[&next] {
                status.advance(instance, station, false);
                let arrival = status.last_service_end_time
                    + instance.travel_time(status.current_location, next);
                if arrival > instance.due(next) {
                    break;
                }
            }

            status.advance(instance, next, true);
            unserved.remove(&next);
        }

        if unserved.len() == initial_unserved {
            log::debug!("greedy construction stalled with {} customers left", unserved.len());
            return (None, start.elapsed());
        }

        if !finish_route(instance, &mut status) {
            log::debug!("greedy construction could not return a route to the depot");
            return (None, start.elapsed());
        }

        routes.push(status.route);
    }

    let mut solution = Solution::new(instance, routes);
    solution.prune_empty_routes();
    solution.recompute_total_distance(instance);
    log::info!(
        "greedy construction produced {} routes, total distance {:.2}",
        solution.routes.len(),
        solution.total_distance
    );
    (Some(solution), start.elapsed())
}
