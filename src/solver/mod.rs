pub mod alns;
pub mod construct;
pub mod feasibility;
pub mod relocate;
pub mod station;
