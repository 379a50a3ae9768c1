use super::instance::Instance;

pub type Route = Vec<usize>;

/// Total distance travelled along a single depot-to-depot route.
pub fn route_distance(instance: &Instance, route: &[usize]) -> f64 {
    route
        .windows(2)
        .map(|pair| instance.distance(pair[0], pair[1]))
        .sum()
}

/// An empty route is `[depot, depot]`, no interior nodes.
pub fn is_empty_route(route: &[usize]) -> bool {
    route.len() <= 2
}

/// A mutable list of routes plus a cache of the total distance. The
/// cache is recomputed eagerly any time the route list changes.
#[derive(Clone, Debug)]
pub struct Solution {
    pub routes: Vec<Route>,
    pub total_distance: f64,
}

impl Solution {
    pub fn new(instance: &Instance, routes: Vec<Route>) -> Self {
        let mut solution = Self {
            routes,
            total_distance: 0.0,
        };
        solution.recompute_total_distance(instance);
        solution
    }

    pub fn recompute_total_distance(&mut self, instance: &Instance) {
        self.total_distance = self
            .routes
            .iter()
            .map(|route| route_distance(instance, route))
            .sum();
    }

    pub fn prune_empty_routes(&mut self) {
        self.routes.retain(|route| !is_empty_route(route));
    }

    pub fn set_routes(&mut self, instance: &Instance, routes: Vec<Route>) {
        self.routes = routes;
        self.recompute_total_distance(instance);
    }

    /// Every customer index in the instance appears in exactly one
    /// route.
    pub fn covers_all_customers_exactly_once(&self, instance: &Instance) -> bool {
        let mut seen = std::collections::HashSet::new();
        for route in &self.routes {
            for &node in route {
                if instance.is_customer(node) && !seen.insert(node) {
                    return false;
                }
            }
        }
        instance.customer_ids().iter().all(|c| seen.contains(c))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::instance::tests_support::two_customer_instance;

    #[test]
    fn total_distance_matches_recomputation() {
        let instance = two_customer_instance(1000.0);
        let solution = Solution::new(&instance, vec![vec![0, 1, 2, 0]]);
        let expected = instance.distance(0, 1) + instance.distance(1, 2) + instance.distance(2, 0);
        assert!((solution.total_distance - expected).abs() < 1e-9);
    }

    #[test]
    fn prune_removes_empty_routes() {
        let instance = two_customer_instance(1000.0);
        let mut solution = Solution::new(&instance, vec![vec![0, 1, 0], vec![0, 0]]);
        solution.prune_empty_routes();
        assert_eq!(solution.routes.len(), 1);
    }

    #[test]
    fn covers_all_customers_detects_duplicates() {
        let instance = two_customer_instance(1000.0);
        let ok = Solution::new(&instance, vec![vec![0, 1, 2, 0]]);
        assert!(ok.covers_all_customers_exactly_once(&instance));

        let duplicate = Solution::new(&instance, vec![vec![0, 1, 0], vec![0, 1, 2, 0]]);
        assert!(!duplicate.covers_all_customers_exactly_once(&instance));
    }
}
