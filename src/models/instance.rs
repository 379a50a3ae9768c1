use std::collections::HashSet;

use super::matrix::Matrix;
use super::node::{Node, NodeKind};

/// Immutable problem data shared read-only by every component. An
/// `Instance` is built once per run by the (out-of-scope) loader and
/// handed by reference to `construct`, `local_search` and `run_alns`.
#[derive(Debug)]
pub struct Instance {
    nodes: Vec<Node>,
    depot: usize,
    stations: HashSet<usize>,
    customers: HashSet<usize>,
    customer_ids: Vec<usize>,
    capacity: f64,
    battery_capacity: f64,
    energy_rate: f64,
    inverse_recharge_rate: f64,
    distances: Matrix,
}

impl Instance {
    /// Builds an instance from a node list (depot first) and vehicle
    /// parameters, precomputing the Euclidean distance matrix.
    ///
    /// Panics if the node set violates an invariant: exactly one
    /// depot, disjoint customer/station index sets. A malformed instance
    /// is a programming error at the loader boundary, not a condition
    /// this crate recovers from at runtime.
    pub fn new(
        nodes: Vec<Node>,
        capacity: f64,
        battery_capacity: f64,
        energy_rate: f64,
        inverse_recharge_rate: f64,
    ) -> Self {
        let depots: Vec<usize> = nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Depot)
            .map(|n| n.index)
            .collect();
        assert_eq!(depots.len(), 1, "instance must have exactly one depot");
        let depot = depots[0];

        let stations: HashSet<usize> = nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Station)
            .map(|n| n.index)
            .collect();
        let customer_ids: Vec<usize> = nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Customer)
            .map(|n| n.index)
            .collect();
        let customers: HashSet<usize> = customer_ids.iter().copied().collect();
        assert!(
            stations.is_disjoint(&customers),
            "station and customer index sets must be disjoint"
        );

        let dim = nodes.len();
        let mut distances = Matrix::new(dim);
        for u in 0..dim {
            for v in 0..dim {
                let dx = nodes[u].x - nodes[v].x;
                let dy = nodes[u].y - nodes[v].y;
                distances.set(u, v, (dx * dx + dy * dy).sqrt());
            }
        }
        debug_assert!(distances.is_symmetric());

        Self {
            nodes,
            depot,
            stations,
            customers,
            customer_ids,
            capacity,
            battery_capacity,
            energy_rate,
            inverse_recharge_rate,
            distances,
        }
    }

    pub fn dim(&self) -> usize {
        self.nodes.len()
    }

    pub fn depot(&self) -> usize {
        self.depot
    }

    pub fn capacity(&self) -> f64 {
        self.capacity
    }

    pub fn battery_capacity(&self) -> f64 {
        self.battery_capacity
    }

    pub fn customer_ids(&self) -> &[usize] {
        &self.customer_ids
    }

    pub fn station_ids(&self) -> impl Iterator<Item = usize> + '_ {
        self.stations.iter().copied()
    }

    pub fn num_stations(&self) -> usize {
        self.stations.len()
    }

    pub fn node(&self, index: usize) -> &Node {
        &self.nodes[index]
    }

    #[inline]
    pub fn distance(&self, u: usize, v: usize) -> f64 {
        self.distances.get(u, v)
    }

    #[inline]
    pub fn travel_time(&self, u: usize, v: usize) -> f64 {
        self.distance(u, v)
    }

    #[inline]
    pub fn energy_consumption(&self, u: usize, v: usize) -> f64 {
        self.distance(u, v) * self.energy_rate
    }

    #[inline]
    pub fn recharge_time(&self, delta_energy: f64) -> f64 {
        delta_energy * self.inverse_recharge_rate
    }

    #[inline]
    pub fn is_depot(&self, u: usize) -> bool {
        u == self.depot
    }

    #[inline]
    pub fn is_station(&self, u: usize) -> bool {
        self.stations.contains(&u)
    }

    #[inline]
    pub fn is_customer(&self, u: usize) -> bool {
        self.customers.contains(&u)
    }

    pub fn demand(&self, u: usize) -> f64 {
        self.nodes[u].demand
    }

    pub fn ready(&self, u: usize) -> f64 {
        self.nodes[u].ready
    }

    pub fn due(&self, u: usize) -> f64 {
        self.nodes[u].due
    }

    pub fn service_time(&self, u: usize) -> f64 {
        self.nodes[u].service_time
    }
}

#[cfg(test)]
pub(crate) mod tests_support {
    use super::*;

    /// Builds a minimal instance used across the crate's unit tests:
    /// depot at the origin, two customers, one station.
    pub fn two_customer_instance(battery: f64) -> Instance {
        let nodes = vec![
            Node::depot(0, 0.0, 0.0, 1000.0),
            Node::customer(1, 10.0, 0.0, 1.0, 0.0, 100.0, 0.0),
            Node::customer(2, 0.0, 10.0, 1.0, 0.0, 100.0, 0.0),
            Node::station(3, 5.0, 0.0),
        ];
        Instance::new(nodes, 10.0, battery, 1.0, 1.0)
    }
}
