//! Solution representation for the TSP genetic algorithm.

use serde::{Deserialize, Serialize};

use crate::instance::CostMatrix;

/// Best tour found by one run of the engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    /// Closed tour as a permutation of node indices
    pub tour: Vec<usize>,
    /// Total tour cost, including the closing edge
    pub cost: f64,
    /// Whether the run stopped on the convergence criterion
    pub converged: bool,
    /// Number of generations executed
    pub iterations: usize,
    /// Computation time in seconds
    pub computation_time: f64,
    /// Seed of the run's random streams
    pub seed: u64,
}

impl Solution {
    /// Check that every node appears exactly once
    pub fn is_complete(&self, num_nodes: usize) -> bool {
        is_permutation(&self.tour, num_nodes)
    }

    /// Recompute the tour cost against a matrix
    pub fn evaluate(&self, matrix: &CostMatrix) -> f64 {
        matrix.tour_cost(&self.tour)
    }

    /// Get the position of a node in the tour
    pub fn position(&self, node: usize) -> Option<usize> {
        self.tour.iter().position(|&n| n == node)
    }

    /// Tour rotated so that it starts at `node`, for stable display
    pub fn rotated_to(&self, node: usize) -> Vec<usize> {
        let mut tour = self.tour.clone();
        if let Some(pos) = self.position(node) {
            tour.rotate_left(pos);
        }
        tour
    }
}

/// Check that `tour` is a permutation of `0..num_nodes`
pub fn is_permutation(tour: &[usize], num_nodes: usize) -> bool {
    if tour.len() != num_nodes {
        return false;
    }

    let mut seen = vec![false; num_nodes];
    for &node in tour {
        if node >= num_nodes || seen[node] {
            return false;
        }
        seen[node] = true;
    }
    true
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solution (seed {})", self.seed)?;
        writeln!(f, "  Cost: {:.2}", self.cost)?;
        writeln!(f, "  Converged: {}", self.converged)?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        writeln!(f, "  Time: {:.4}s", self.computation_time)?;
        writeln!(f, "  Tour: {:?}", self.rotated_to(0))
    }
}
