//! Engine configuration.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::genetic::convergence::BEST_AVERAGE_SIZE;

/// Genetic Algorithm configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GAConfig {
    /// Worker threads for the data-parallel phases
    pub num_threads: usize,
    /// Number of tours in the population
    pub population_size: usize,
    /// Fraction of the population kept as parents, in [0, 1]
    pub top: f64,
    /// Maximum number of generations
    pub max_iterations: usize,
    /// Probability of a swap mutation on each child, in [0, 1]
    pub mutation_prob: f64,
    /// Number of latest generations in the convergence window
    pub early_stop_rounds: usize,
    /// Standard deviation at or below which the run has converged
    pub early_stop_threshold: f64,
    /// Random seed
    pub seed: u64,
    /// Process rank when running as one island of a group
    pub rank: usize,
}

impl Default for GAConfig {
    fn default() -> Self {
        GAConfig {
            num_threads: 4,
            population_size: 100,
            top: 0.2,
            max_iterations: 500,
            mutation_prob: 0.1,
            early_stop_rounds: 20,
            early_stop_threshold: 0.0,
            seed: 42,
            rank: 0,
        }
    }
}

impl GAConfig {
    /// Number of elite rows: `floor(population_size * top)`
    pub fn best_num(&self) -> usize {
        (self.population_size as f64 * self.top).floor() as usize
    }

    /// Check every constraint on the configuration for a graph of `num_nodes` nodes
    pub fn validate(&self, num_nodes: usize) -> Result<(), ConfigError> {
        if self.num_threads < 1 {
            return Err(ConfigError::NoWorkerThreads(self.num_threads));
        }
        if num_nodes < 2 {
            return Err(ConfigError::TooFewNodes(num_nodes));
        }
        if self.population_size < BEST_AVERAGE_SIZE {
            return Err(ConfigError::PopulationTooSmall {
                min: BEST_AVERAGE_SIZE,
                actual: self.population_size,
            });
        }
        if !(0.0..=1.0).contains(&self.top) {
            return Err(ConfigError::TopOutOfRange(self.top));
        }
        if !(0.0..=1.0).contains(&self.mutation_prob) {
            return Err(ConfigError::MutationProbOutOfRange(self.mutation_prob));
        }
        if self.early_stop_rounds == 0 || self.early_stop_rounds > self.max_iterations {
            return Err(ConfigError::EarlyStopWindow {
                window: self.early_stop_rounds,
                max_iterations: self.max_iterations,
            });
        }
        if self.early_stop_threshold.is_nan() || self.early_stop_threshold < 0.0 {
            return Err(ConfigError::NegativeThreshold(self.early_stop_threshold));
        }
        if self.best_num() == 0 {
            return Err(ConfigError::EmptyElite {
                top: self.top,
                population: self.population_size,
            });
        }
        Ok(())
    }
}
