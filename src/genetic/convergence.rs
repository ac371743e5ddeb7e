//! Sliding-window convergence test.
//!
//! Every generation contributes the mean of its best [`BEST_AVERAGE_SIZE`]
//! costs to a circular window. Once the window has been filled, the run has
//! converged when the population standard deviation of the window is at or
//! below the threshold.

use statrs::statistics::Statistics;

/// Number of best costs averaged per generation
pub const BEST_AVERAGE_SIZE: usize = 5;

/// Outcome of observing one generation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConvergenceStatus {
    Continue,
    Converged,
}

impl ConvergenceStatus {
    pub fn is_converged(&self) -> bool {
        matches!(self, Self::Converged)
    }
}

/// Fixed-capacity circular buffer of per-generation best-cost averages
#[derive(Debug, Clone)]
pub struct ConvergenceWindow {
    values: Vec<f64>,
    threshold: f64,
    full: bool,
}

impl ConvergenceWindow {
    pub fn new(rounds: usize, threshold: f64) -> Self {
        ConvergenceWindow {
            values: vec![0.0; rounds],
            threshold,
            full: false,
        }
    }

    /// Mean of the first [`BEST_AVERAGE_SIZE`] entries of an ascending cost vector
    pub fn best_average(sorted_costs: &[f64]) -> f64 {
        let k = BEST_AVERAGE_SIZE.min(sorted_costs.len());
        sorted_costs[..k].iter().mean()
    }

    /// Record generation `generation` (1-based) and test for convergence
    ///
    /// The standard deviation is never computed before `generation` reaches
    /// the window size.
    pub fn observe(&mut self, sorted_costs: &[f64], generation: usize) -> ConvergenceStatus {
        let rounds = self.values.len();
        let avg = Self::best_average(sorted_costs);
        self.values[(generation - 1) % rounds] = avg;

        if generation >= rounds {
            self.full = true;
        }

        match self.std_dev() {
            Some(std) if std <= self.threshold => ConvergenceStatus::Converged,
            _ => ConvergenceStatus::Continue,
        }
    }

    /// Population standard deviation of the window, once it has been filled
    pub fn std_dev(&self) -> Option<f64> {
        if self.full {
            Some(self.values.iter().population_std_dev())
        } else {
            None
        }
    }

    /// Window contents in slot order
    pub fn values(&self) -> &[f64] {
        &self.values
    }
}
