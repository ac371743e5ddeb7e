//! Error types for the TSP genetic algorithm.
//!
//! Configuration errors are detected before the engine runs; instance errors
//! come from loading the cost matrix. The engine itself has no runtime
//! failure modes once its configuration is valid.

use thiserror::Error;

/// Invalid engine configuration
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("number of worker threads must be at least 1, got {0}")]
    NoWorkerThreads(usize),

    #[error("the graph needs at least 2 nodes, got {0}")]
    TooFewNodes(usize),

    #[error("population size must be at least {min} (best-cost averaging window), got {actual}")]
    PopulationTooSmall { min: usize, actual: usize },

    #[error("elite fraction must lie in [0, 1], got {0}")]
    TopOutOfRange(f64),

    #[error("mutation probability must lie in [0, 1], got {0}")]
    MutationProbOutOfRange(f64),

    #[error("early-stop window must satisfy 0 < window <= max iterations ({max_iterations}), got {window}")]
    EarlyStopWindow { window: usize, max_iterations: usize },

    #[error("early-stop threshold must be a non-negative standard deviation, got {0}")]
    NegativeThreshold(f64),

    #[error("elite fraction {top} of a population of {population} selects no parents")]
    EmptyElite { top: f64, population: usize },

    #[error("expected {expected} nodes but the cost matrix has {actual}")]
    NodeCountMismatch { expected: usize, actual: usize },

    #[error("{actual} worker seeds given for {expected} worker threads")]
    WorkerSeedCount { expected: usize, actual: usize },

    #[error("cannot start {threads} worker threads: {reason}")]
    ThreadPool { threads: usize, reason: String },
}

/// Failure while loading or validating a cost matrix
#[derive(Debug, Error)]
pub enum InstanceError {
    #[error("cannot read cost matrix: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid number {token:?} on line {line}")]
    Parse { line: usize, token: String },

    #[error("{0} values do not form a square matrix")]
    NotSquare(usize),

    #[error("row {row} has {actual} entries, expected {expected}")]
    RaggedRow { row: usize, expected: usize, actual: usize },

    #[error("cost[{i}][{j}] = {forward} differs from cost[{j}][{i}] = {backward}")]
    Asymmetric { i: usize, j: usize, forward: f64, backward: f64 },

    #[error("cost[{i}][{j}] = {value} is negative or not finite")]
    InvalidCost { i: usize, j: usize, value: f64 },

    #[error("the graph needs at least 2 nodes, got {0}")]
    TooFewNodes(usize),

    #[error("coordinate section lists {actual} nodes, header declares {declared}")]
    DimensionMismatch { declared: usize, actual: usize },
}

/// Top-level error of the command-line front end
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Instance(#[from] InstanceError),

    #[error("cannot write output: {0}")]
    Io(#[from] std::io::Error),

    #[error("cannot serialize output: {0}")]
    Json(#[from] serde_json::Error),

    #[error("cannot write csv: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
