use crate::models::{route_distance, Instance, Route};

/// A working triple: routes plus the bag of customers a destroy
/// operator removed and a repair operator has yet to reinsert.
/// `ALNSState` never borrows the instance itself, every function that
/// needs it takes `&Instance` explicitly, since the instance outlives
/// every state copy made during a run.
#[derive(Clone, Debug)]
pub struct ALNSState {
    pub routes: Vec<Route>,
    pub unassigned: Vec<usize>,
}

impl ALNSState {
    pub fn from_routes(routes: Vec<Route>) -> Self {
        Self {
            routes,
            unassigned: Vec::new(),
        }
    }

    pub fn objective(&self, instance: &Instance) -> f64 {
        self.routes.iter().map(|r| route_distance(instance, r)).sum()
    }

    /// Looks up the route currently containing `customer`.
    ///
    /// # Panics
    /// Panics (`CustomerNotFound`) if `customer` is not on any route, a
    /// programming error, since every customer not in `unassigned` must
    /// be on exactly one route.
    pub fn find_route(&self, customer: usize) -> usize {
        self.routes
            .iter()
            .position(|route| route.contains(&customer))
            .unwrap_or_else(|| panic!("customer {} not found in any route", customer))
    }

    pub fn prune_empty_routes(&mut self) {
        self.routes.retain(|route| route.len() > 2);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn find_route_locates_customer() {
        let state = ALNSState::from_routes(vec![vec![0, 1, 2, 0], vec![0, 3, 0]]);
        assert_eq!(state.find_route(3), 1);
    }

    #[test]
    #[should_panic(expected = "not found in any route")]
    fn find_route_panics_on_missing_customer() {
        let state = ALNSState::from_routes(vec![vec![0, 1, 0]]);
        state.find_route(99);
    }

    #[test]
    fn prune_drops_empty_routes() {
        let mut state = ALNSState::from_routes(vec![vec![0, 1, 0], vec![0, 0]]);
        state.prune_empty_routes();
        assert_eq!(state.routes.len(), 1);
    }
}
