//! Island model: independent, differently seeded runs of the engine.
//!
//! Islands never exchange individuals. Each island is a complete
//! [`GeneticAlgorithm`] run with its own seed and rank; they run side by side
//! on the global rayon pool. The same engine can also be started as a single
//! rank of an external process group, in which case only the rank and seed
//! differ between processes.

use std::path::PathBuf;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::genetic::{GAConfig, GeneticAlgorithm};
use crate::instance::CostMatrix;
use crate::solution::Solution;
use crate::timing::{CsvSink, NullSink};

/// Seed of island `index` in a group started from `base_seed`
pub fn island_seed(base_seed: u64, index: usize) -> u64 {
    base_seed.wrapping_add(index as u64)
}

/// Seed derived from the wall clock and a process rank
pub fn wall_clock_seed(rank: usize) -> u64 {
    island_seed(chrono::Utc::now().timestamp() as u64, rank)
}

/// Island model configuration
#[derive(Debug, Clone)]
pub struct IslandConfig {
    /// Number of independent islands
    pub num_islands: usize,
    /// Seed of island 0; island `i` uses `base_seed + i`
    pub base_seed: u64,
    /// Directory receiving one timing CSV per island
    pub timings_dir: Option<PathBuf>,
}

impl Default for IslandConfig {
    fn default() -> Self {
        IslandConfig {
            num_islands: 4,
            base_seed: 42,
            timings_dir: None,
        }
    }
}

/// Outcome of one island
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IslandResult {
    pub island: usize,
    pub seed: u64,
    pub cost: f64,
    pub converged: bool,
    pub generations: usize,
    /// Computation time in seconds
    pub time: f64,
    #[serde(skip)]
    pub tour: Vec<usize>,
}

impl IslandResult {
    pub fn from_solution(island: usize, solution: Solution) -> Self {
        IslandResult {
            island,
            seed: solution.seed,
            cost: solution.cost,
            converged: solution.converged,
            generations: solution.iterations,
            time: solution.computation_time,
            tour: solution.tour,
        }
    }
}

/// Runs several islands of the same engine configuration
pub struct IslandModel {
    config: IslandConfig,
    ga_config: GAConfig,
}

impl IslandModel {
    pub fn new(config: IslandConfig, ga_config: GAConfig) -> Self {
        IslandModel { config, ga_config }
    }

    /// Engine configuration of island `index`
    pub fn island_config(&self, index: usize) -> GAConfig {
        GAConfig {
            seed: island_seed(self.config.base_seed, index),
            rank: index,
            ..self.ga_config.clone()
        }
    }

    /// Run every island to completion
    pub fn run(&self, matrix: &CostMatrix) -> Result<Vec<IslandResult>> {
        self.run_with_progress(matrix, |_| {})
    }

    /// Run every island, calling `on_done` as each one finishes
    ///
    /// Results are returned in island order.
    pub fn run_with_progress<F>(&self, matrix: &CostMatrix, on_done: F) -> Result<Vec<IslandResult>>
    where
        F: Fn(&IslandResult) + Sync,
    {
        self.ga_config.validate(matrix.num_nodes())?;
        log::info!(
            "Running {} islands from base seed {}",
            self.config.num_islands,
            self.config.base_seed
        );

        (0..self.config.num_islands)
            .into_par_iter()
            .map(|index| -> Result<IslandResult> {
                let mut ga = GeneticAlgorithm::new(matrix, self.island_config(index))?;

                let solution = match &self.config.timings_dir {
                    Some(dir) => {
                        let mut sink = CsvSink::append_for_rank(dir, index)?;
                        ga.run_with_sink(&mut sink)
                    }
                    None => ga.run_with_sink(&mut NullSink),
                };

                let result = IslandResult::from_solution(index, solution);
                on_done(&result);
                Ok(result)
            })
            .collect()
    }

    /// Lowest-cost island; ties go to the lower island index
    pub fn best(results: &[IslandResult]) -> Option<&IslandResult> {
        results
            .iter()
            .min_by(|a, b| a.cost.total_cmp(&b.cost).then(a.island.cmp(&b.island)))
    }
}
