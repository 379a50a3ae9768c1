use crate::models::Instance;

/// Result of a one-pass simulation of a route. The three flags are
/// independent: energy infeasibility never short-circuits the
/// traversal, since repair code needs to know whether time/capacity are
/// also violated.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeasibilityReport {
    pub time_ok: bool,
    pub capacity_ok: bool,
    pub energy_ok: bool,
}

impl FeasibilityReport {
    pub fn is_feasible(&self) -> bool {
        self.time_ok && self.capacity_ok && self.energy_ok
    }
}

/// Left-to-right simulation of `route` maintaining (time, capacity,
/// state-of-charge, last node). A station visit always performs a full
/// recharge, even if entered at negative state-of-charge; the routine
/// reports the violation through `energy_ok` but keeps simulating so
/// time/capacity can still be judged.
pub fn evaluate_route(instance: &Instance, route: &[usize]) -> FeasibilityReport {
    let mut time = 0.0_f64;
    let mut capacity = instance.capacity();
    let mut soc = instance.battery_capacity();

    let mut time_ok = true;
    let mut capacity_ok = true;
    let mut energy_ok = true;

    let mut last = route[0];
    for &node in &route[1..] {
        let energy = instance.energy_consumption(last, node);
        let travel_time = instance.travel_time(last, node);
        let arrival = time + travel_time;

        if soc - energy < 0.0 {
            energy_ok = false;
        }

        if instance.is_customer(node) {
            let start = arrival.max(instance.ready(node));
            let end = start + instance.service_time(node);
            if start > instance.due(node) {
                time_ok = false;
            }
            if instance.demand(node) > capacity {
                capacity_ok = false;
            }
            time = end;
            capacity -= instance.demand(node);
            soc -= energy;
        } else if instance.is_station(node) {
            let recharge_amount = instance.battery_capacity() - (soc - energy).max(0.0);
            time = arrival + instance.recharge_time(recharge_amount);
            soc = instance.battery_capacity();
        } else {
            // Depot: end of route.
            time = arrival;
            soc -= energy;
            if time > instance.due(node) {
                time_ok = false;
            }
        }

        last = node;
    }

    FeasibilityReport {
        time_ok,
        capacity_ok,
        energy_ok,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::instance::tests_support::two_customer_instance;

    #[test]
    fn idempotent() {
        let instance = two_customer_instance(1000.0);
        let route = vec![0, 1, 2, 0];
        let first = evaluate_route(&instance, &route);
        let second = evaluate_route(&instance, &route);
        assert_eq!(first, second);
    }

    #[test]
    fn direct_route_feasible_with_ample_battery() {
        let instance = two_customer_instance(1000.0);
        let report = evaluate_route(&instance, &[0, 1, 2, 0]);
        assert!(report.is_feasible());
    }

    #[test]
    fn energy_infeasible_with_small_battery() {
        // E = 12, r = 1: reaching c1 costs 10, leaving 2 units; the hop
        // to c2 costs sqrt(200) ~= 14.14, which is infeasible.
        let instance = two_customer_instance(12.0);
        let report = evaluate_route(&instance, &[0, 1, 2, 0]);
        assert!(!report.energy_ok);
    }

    #[test]
    fn station_insertion_restores_energy_feasibility() {
        let instance = two_customer_instance(12.0);
        let report = evaluate_route(&instance, &[0, 1, 3, 2, 0]);
        assert!(report.energy_ok);
        assert!(report.is_feasible());
    }

    #[test]
    fn capacity_violation_detected() {
        let instance = two_customer_instance(1000.0);
        // Demand of both customers (2) exceeds a route serving them with
        // an instance capacity of 1 unit is infeasible; build directly.
        use crate::models::{Instance as Inst, Node};
        let nodes = vec![
            Node::depot(0, 0.0, 0.0, 1000.0),
            Node::customer(1, 10.0, 0.0, 5.0, 0.0, 100.0, 0.0),
        ];
        let small_capacity_instance = Inst::new(nodes, 1.0, 1000.0, 1.0, 1.0);
        let report = evaluate_route(&small_capacity_instance, &[0, 1, 0]);
        assert!(!report.capacity_ok);
    }

    #[test]
    fn time_window_violation_detected() {
        let instance = two_customer_instance(1000.0);
        use crate::models::Node;
        let nodes = vec![
            Node::depot(0, 0.0, 0.0, 1000.0),
            Node::customer(1, 1000.0, 0.0, 1.0, 0.0, 5.0, 0.0),
        ];
        let far_instance = crate::models::Instance::new(nodes, 10.0, 1000.0, 1.0, 1.0);
        let report = evaluate_route(&far_instance, &[0, 1, 0]);
        assert!(!report.time_ok);
        let _ = instance;
    }
}
