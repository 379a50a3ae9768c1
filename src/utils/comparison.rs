use std::borrow::Borrow;

const EPSILON: f64 = 1e-6;

/// Extension trait enabling epsilon-tolerant float comparison.
pub trait FloatCompare<T> {
    fn approx_lt(&self, other: T) -> bool;
    fn approx_lte(&self, other: T) -> bool;
    fn approx_gt(&self, other: T) -> bool;
    fn approx_gte(&self, other: T) -> bool;
    fn approx_eq(&self, other: T) -> bool;
}

impl<T: Borrow<f64>> FloatCompare<T> for f64 {
    fn approx_lt(&self, other: T) -> bool {
        *self < other.borrow() - EPSILON
    }

    fn approx_lte(&self, other: T) -> bool {
        self < other.borrow() || self.approx_eq(other)
    }

    fn approx_gt(&self, other: T) -> bool {
        *self > other.borrow() + EPSILON
    }

    fn approx_gte(&self, other: T) -> bool {
        self > other.borrow() || self.approx_eq(other)
    }

    fn approx_eq(&self, other: T) -> bool {
        (self - other.borrow()).abs() < EPSILON
    }
}
