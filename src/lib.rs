//! GA-TSP Library
//!
//! A genetic algorithm for the symmetric Traveling Salesman Problem.
//!
//! # Features
//!
//! - Flat, double-buffered population of permutation tours
//! - Elitist selection with order-preserving crossover and swap mutation
//! - Early stopping on the standard deviation of a sliding window of best costs
//! - Data-parallel cost evaluation and reproduction on a fixed worker pool,
//!   with one random stream per worker
//! - Island model: independent, differently seeded runs without migration
//! - Per-generation timing sinks and CSV benchmark reports
//!
//! # Example
//!
//! ```no_run
//! use ga_tsp::instance::CostMatrix;
//! use ga_tsp::genetic::{GAConfig, GeneticAlgorithm};
//!
//! let matrix = CostMatrix::from_file("cities.txt").unwrap();
//! let config = GAConfig {
//!     population_size: 200,
//!     top: 0.1,
//!     ..Default::default()
//! };
//!
//! let mut ga = GeneticAlgorithm::new(&matrix, config).unwrap();
//! let solution = ga.run();
//!
//! println!("Solution cost: {:.2}", solution.cost);
//! ```

pub mod benchmark;
pub mod error;
pub mod genetic;
pub mod instance;
pub mod island;
pub mod solution;
pub mod timing;

pub use error::{ConfigError, InstanceError};
pub use genetic::{GAConfig, GeneticAlgorithm};
pub use instance::CostMatrix;
pub use solution::Solution;
