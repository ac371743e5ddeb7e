//! Genetic algorithm engine for the symmetric TSP.
//!
//! Tours are permutations stored row-major in a double-buffered
//! [`Population`]. Each generation the [`ReproductionEngine`] replaces the
//! non-elite rows with offspring of the elites, the [`RankingEngine`] sorts
//! the population by cost, and the [`ConvergenceWindow`] decides whether to
//! stop. [`GeneticAlgorithm`] ties the three together.

pub mod config;
pub mod convergence;
pub mod engine;
pub mod population;
pub mod ranking;
pub mod reproduction;

pub use config::GAConfig;
pub use convergence::{ConvergenceStatus, ConvergenceWindow, BEST_AVERAGE_SIZE};
pub use engine::{GeneticAlgorithm, Phase};
pub use population::Population;
pub use ranking::RankingEngine;
pub use reproduction::{order_crossover, select_parents, swap_mutation, ReproductionEngine};
