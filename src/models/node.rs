use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub enum NodeKind {
    Depot,
    Station,
    Customer,
}

/// A single node of the instance. Immutable after load: the index is
/// assigned in load order with the depot first.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Node {
    pub index: usize,
    pub kind: NodeKind,
    pub x: f64,
    pub y: f64,
    pub demand: f64,
    pub ready: f64,
    pub due: f64,
    pub service_time: f64,
}

impl Node {
    pub fn depot(index: usize, x: f64, y: f64, due: f64) -> Self {
        Self {
            index,
            kind: NodeKind::Depot,
            x,
            y,
            demand: 0.0,
            ready: 0.0,
            due,
            service_time: 0.0,
        }
    }

    pub fn station(index: usize, x: f64, y: f64) -> Self {
        Self {
            index,
            kind: NodeKind::Station,
            x,
            y,
            demand: 0.0,
            ready: 0.0,
            due: f64::INFINITY,
            service_time: 0.0,
        }
    }

    pub fn customer(
        index: usize,
        x: f64,
        y: f64,
        demand: f64,
        ready: f64,
        due: f64,
        service_time: f64,
    ) -> Self {
        Self {
            index,
            kind: NodeKind::Customer,
            x,
            y,
            demand,
            ready,
            due,
            service_time,
        }
    }
}
