/// Flat row-major square matrix, used for the precomputed distance table.
///
/// The teacher's matrix type backs itself with a raw allocation for
/// cache-friendly access in a genetic algorithm's inner loop; this crate's
/// hot path is the feasibility evaluator, not the matrix itself, so a
/// plain `Vec<f64>` is kept instead (see DESIGN.md).
#[derive(Debug, Clone)]
pub struct Matrix {
    data: Vec<f64>,
    pub dim: usize,
}

impl Matrix {
    pub fn new(dim: usize) -> Self {
        Self {
            data: vec![0.0; dim * dim],
            dim,
        }
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[row * self.dim + col]
    }

    #[inline]
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[row * self.dim + col] = value;
    }

    pub fn is_symmetric(&self) -> bool {
        (0..self.dim).all(|i| {
            (0..self.dim).all(|j| (self.get(i, j) - self.get(j, i)).abs() < 1e-9)
        })
    }
}
