//! GA-TSP - Command Line Interface
//!
//! Runs the genetic algorithm on a symmetric cost matrix, either as a single
//! run (optionally as one rank of an external process group) or as a set of
//! in-process islands.

use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};

use ga_tsp::benchmark::Benchmark;
use ga_tsp::error::{ConfigError, Result};
use ga_tsp::genetic::{GAConfig, GeneticAlgorithm};
use ga_tsp::instance::CostMatrix;
use ga_tsp::island::{wall_clock_seed, IslandConfig, IslandModel};
use ga_tsp::timing::{CsvSink, NullSink};

use std::fs::File;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "ga-tsp")]
#[command(version = "1.0")]
#[command(about = "Genetic algorithm for the symmetric Traveling Salesman Problem")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run one engine instance
    Solve {
        /// Cost matrix file (dense matrix or TSP-LIB coordinates)
        #[arg(short, long)]
        matrix: PathBuf,

        /// Expected number of nodes
        #[arg(short, long)]
        nodes: Option<usize>,

        #[command(flatten)]
        engine: EngineArgs,

        /// Random seed (default: wall clock + rank)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Rank of this process in a group of islands
        #[arg(long, default_value = "0")]
        rank: usize,

        /// Directory for per-generation timing CSV files
        #[arg(long)]
        timings: Option<PathBuf>,

        /// Write the solution as JSON
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Run several independent islands in this process
    Islands {
        /// Cost matrix file (dense matrix or TSP-LIB coordinates)
        #[arg(short, long)]
        matrix: PathBuf,

        /// Expected number of nodes
        #[arg(short, long)]
        nodes: Option<usize>,

        #[command(flatten)]
        engine: EngineArgs,

        /// Number of islands
        #[arg(short, long, default_value = "4")]
        islands: usize,

        /// Seed of island 0 (default: wall clock)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Directory for per-generation timing CSV files
        #[arg(long)]
        timings: Option<PathBuf>,

        /// Output CSV file with one row per island
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output CSV file with aggregated statistics
        #[arg(long)]
        stats: Option<PathBuf>,
    },

    /// Print statistics about a cost matrix
    Analyze {
        /// Cost matrix file
        #[arg(short, long)]
        matrix: PathBuf,
    },
}

#[derive(Args, Debug)]
struct EngineArgs {
    /// Worker threads per engine
    #[arg(short, long, default_value = "4")]
    threads: usize,

    /// Population size
    #[arg(short, long, default_value = "100")]
    population: usize,

    /// Elite fraction of the population, in [0, 1]
    #[arg(long, default_value = "0.2")]
    top: f64,

    /// Maximum number of generations
    #[arg(long, default_value = "500")]
    max_iterations: usize,

    /// Mutation probability, in [0, 1]
    #[arg(long, default_value = "0.1")]
    mutation_prob: f64,

    /// Number of generations in the early-stop window
    #[arg(long, default_value = "20")]
    early_stop_rounds: usize,

    /// Standard deviation threshold for early stopping
    #[arg(long, default_value = "0.0")]
    early_stop_threshold: f64,
}

impl EngineArgs {
    fn to_config(&self, seed: u64, rank: usize) -> GAConfig {
        GAConfig {
            num_threads: self.threads,
            population_size: self.population,
            top: self.top,
            max_iterations: self.max_iterations,
            mutation_prob: self.mutation_prob,
            early_stop_rounds: self.early_stop_rounds,
            early_stop_threshold: self.early_stop_threshold,
            seed,
            rank,
        }
    }
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Solve { matrix, nodes, engine, seed, rank, timings, output } => {
            solve(&matrix, nodes, &engine, seed, rank, timings, output)
        }

        Commands::Islands { matrix, nodes, engine, islands, seed, timings, output, stats } => {
            run_islands(&matrix, nodes, &engine, islands, seed, timings, output, stats)
        }

        Commands::Analyze { matrix } => analyze(&matrix),
    };

    if let Err(e) = outcome {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn load_matrix(path: &Path, nodes: Option<usize>) -> Result<CostMatrix> {
    let matrix = CostMatrix::from_file(path)?;

    if let Some(expected) = nodes {
        if expected != matrix.num_nodes() {
            return Err(ConfigError::NodeCountMismatch {
                expected,
                actual: matrix.num_nodes(),
            }
            .into());
        }
    }

    Ok(matrix)
}

fn solve(
    path: &Path,
    nodes: Option<usize>,
    engine: &EngineArgs,
    seed: Option<u64>,
    rank: usize,
    timings: Option<PathBuf>,
    output: Option<PathBuf>,
) -> Result<()> {
    let matrix = load_matrix(path, nodes)?;
    let seed = seed.unwrap_or_else(|| wall_clock_seed(rank));
    let config = engine.to_config(seed, rank);

    let mut ga = GeneticAlgorithm::new(&matrix, config)?;

    let solution = match timings {
        Some(dir) => {
            let mut sink = CsvSink::append_for_rank(&dir, rank)?;
            ga.run_with_sink(&mut sink)
        }
        None => ga.run_with_sink(&mut NullSink),
    };

    println!("{}", solution);

    if let Some(out_path) = output {
        let file = File::create(&out_path)?;
        serde_json::to_writer_pretty(file, &solution)?;
        println!("Solution saved to {:?}", out_path);
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_islands(
    path: &Path,
    nodes: Option<usize>,
    engine: &EngineArgs,
    islands: usize,
    seed: Option<u64>,
    timings: Option<PathBuf>,
    output: Option<PathBuf>,
    stats: Option<PathBuf>,
) -> Result<()> {
    let matrix = load_matrix(path, nodes)?;
    let base_seed = seed.unwrap_or_else(|| wall_clock_seed(0));

    let model = IslandModel::new(
        IslandConfig {
            num_islands: islands,
            base_seed,
            timings_dir: timings,
        },
        engine.to_config(base_seed, 0),
    );

    let progress = ProgressBar::new(islands as u64);
    progress.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] {bar:40} {pos}/{len} islands")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let results = model.run_with_progress(&matrix, |_| progress.inc(1))?;
    progress.finish_and_clear();

    let mut benchmark = Benchmark::new(&matrix.name, matrix.num_nodes());
    benchmark.extend(results);

    println!("{}", benchmark.generate_report());

    if let Some(best) = IslandModel::best(benchmark.results()) {
        println!("Best tour (island {}): {:?}", best.island, best.tour);
    }

    if let Some(out_path) = output {
        benchmark.export_to_csv(&out_path)?;
        println!("Island results saved to {:?}", out_path);
    }

    if let Some(stats_path) = stats {
        benchmark.export_statistics_csv(&stats_path)?;
        println!("Statistics saved to {:?}", stats_path);
    }

    Ok(())
}

fn analyze(path: &Path) -> Result<()> {
    let matrix = CostMatrix::from_file(path)?;
    println!("{}", matrix.statistics());
    Ok(())
}
