//! Evolution orchestrator: drives the generation loop.
//!
//! Init (random population) -> Ranked (first ranking) -> Loop (reproduce,
//! rank, test convergence) -> Done. A configuration whose elite fraction
//! covers the whole population has no room for offspring and stops right
//! after the first ranking, flagged not converged.

use std::time::Instant;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::ThreadPool;

use crate::error::ConfigError;
use crate::genetic::config::GAConfig;
use crate::genetic::convergence::{ConvergenceStatus, ConvergenceWindow};
use crate::genetic::population::Population;
use crate::genetic::ranking::RankingEngine;
use crate::genetic::reproduction::ReproductionEngine;
use crate::instance::CostMatrix;
use crate::solution::Solution;
use crate::timing::{GenerationSink, GenerationTiming, NullSink};

/// Phase of a run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Init,
    Ranked,
    Done,
}

/// Genetic Algorithm implementation
pub struct GeneticAlgorithm<'a> {
    config: GAConfig,
    matrix: &'a CostMatrix,
    population: Population,
    ranking: RankingEngine,
    reproduction: ReproductionEngine,
    window: ConvergenceWindow,
    pool: ThreadPool,
    best_num: usize,
    generation: usize,
    phase: Phase,
}

impl<'a> GeneticAlgorithm<'a> {
    /// Validate the configuration and allocate every buffer of the run
    ///
    /// Worker streams are derived from `config.seed`.
    pub fn new(matrix: &'a CostMatrix, config: GAConfig) -> Result<Self, ConfigError> {
        let reproduction = ReproductionEngine::new(
            config.seed,
            config.num_threads,
            matrix.num_nodes(),
            config.mutation_prob,
        );
        Self::build(matrix, config, reproduction)
    }

    /// Like [`new`](Self::new), with one explicit seed per worker thread
    pub fn with_worker_seeds(
        matrix: &'a CostMatrix,
        config: GAConfig,
        seeds: &[u64],
    ) -> Result<Self, ConfigError> {
        if seeds.len() != config.num_threads {
            return Err(ConfigError::WorkerSeedCount {
                expected: config.num_threads,
                actual: seeds.len(),
            });
        }
        let reproduction =
            ReproductionEngine::with_seeds(seeds, matrix.num_nodes(), config.mutation_prob);
        Self::build(matrix, config, reproduction)
    }

    fn build(
        matrix: &'a CostMatrix,
        config: GAConfig,
        reproduction: ReproductionEngine,
    ) -> Result<Self, ConfigError> {
        config.validate(matrix.num_nodes())?;

        let rank = config.rank;
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.num_threads)
            .thread_name(move |i| format!("ga-{}-worker-{}", rank, i))
            .build()
            .map_err(|e| ConfigError::ThreadPool {
                threads: config.num_threads,
                reason: e.to_string(),
            })?;

        let mut rng = ChaCha8Rng::seed_from_u64(config.seed);
        let population = Population::random(config.population_size, matrix.num_nodes(), &mut rng);

        Ok(GeneticAlgorithm {
            best_num: config.best_num(),
            ranking: RankingEngine::new(config.population_size),
            window: ConvergenceWindow::new(config.early_stop_rounds, config.early_stop_threshold),
            generation: 0,
            phase: Phase::Init,
            config,
            matrix,
            population,
            reproduction,
            pool,
        })
    }

    /// Rank the initial population, once
    pub fn initialize(&mut self) {
        if self.phase == Phase::Init {
            self.ranking.rank(&mut self.population, self.matrix, &self.pool);
            self.phase = Phase::Ranked;
        }
    }

    /// Run one generation: reproduce, rank, then test convergence
    pub fn step(&mut self, sink: &mut dyn GenerationSink) -> ConvergenceStatus {
        self.initialize();
        self.generation += 1;

        let start = Instant::now();
        self.reproduction
            .generate(&mut self.population, self.best_num, &self.pool);
        let reproduction_secs = start.elapsed().as_secs_f64();

        let start = Instant::now();
        self.ranking.rank(&mut self.population, self.matrix, &self.pool);
        let ranking_secs = start.elapsed().as_secs_f64();

        sink.record(&GenerationTiming {
            rank: self.config.rank,
            generation: self.generation,
            num_nodes: self.matrix.num_nodes(),
            population_size: self.population.len(),
            best_num: self.best_num,
            reproduction_secs,
            ranking_secs,
        });

        let status = self.window.observe(self.population.costs(), self.generation);

        log::debug!(
            "[GA {}] Gen {}  Best cost {:.3}  Window std {:?}",
            self.config.rank,
            self.generation,
            self.population.costs()[0],
            self.window.std_dev()
        );

        status
    }

    /// Run the genetic algorithm without instrumentation
    pub fn run(&mut self) -> Solution {
        self.run_with_sink(&mut NullSink)
    }

    /// Run the genetic algorithm, reporting phase timings to `sink`
    ///
    /// `sink.finish()` is called once before returning.
    pub fn run_with_sink(&mut self, sink: &mut dyn GenerationSink) -> Solution {
        let start = Instant::now();
        log::info!(
            "[GA {}] Start: {} nodes, population {}, {} elites, seed {}",
            self.config.rank,
            self.matrix.num_nodes(),
            self.population.len(),
            self.best_num,
            self.config.seed
        );

        self.initialize();

        let mut converged = false;
        if self.best_num >= self.population.len() {
            log::warn!(
                "[GA {}] Elite fraction keeps the whole population; returning the initial best tour",
                self.config.rank
            );
        } else {
            while self.phase != Phase::Done && self.generation < self.config.max_iterations {
                if self.step(sink).is_converged() {
                    converged = true;
                    break;
                }
            }
        }
        self.phase = Phase::Done;

        if let Err(e) = sink.finish() {
            log::warn!("[GA {}] Timing sink failed: {}", self.config.rank, e);
        }

        let solution = Solution {
            tour: self.population.tour(0).to_vec(),
            cost: self.population.costs()[0],
            converged,
            iterations: self.generation,
            computation_time: start.elapsed().as_secs_f64(),
            seed: self.config.seed,
        };

        log::info!(
            "[GA {}] Done after {} generations: cost {:.3}, converged {}",
            self.config.rank,
            solution.iterations,
            solution.cost,
            solution.converged
        );

        solution
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn best_num(&self) -> usize {
        self.best_num
    }

    pub fn current_generation(&self) -> usize {
        self.generation
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn config(&self) -> &GAConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solution::is_permutation;
    use crate::timing::MemorySink;

    fn scenario_matrix() -> CostMatrix {
        CostMatrix::from_rows(vec![
            vec![0.0, 10.0, 15.0, 20.0],
            vec![10.0, 0.0, 35.0, 25.0],
            vec![15.0, 35.0, 0.0, 30.0],
            vec![20.0, 25.0, 30.0, 0.0],
        ])
        .unwrap()
    }

    fn scenario_config(seed: u64) -> GAConfig {
        GAConfig {
            num_threads: 2,
            population_size: 6,
            top: 0.34,
            max_iterations: 50,
            mutation_prob: 0.1,
            early_stop_rounds: 5,
            early_stop_threshold: 0.0,
            seed,
            rank: 0,
        }
    }

    fn uniform_matrix(n: usize) -> CostMatrix {
        let mut costs = vec![1.0; n * n];
        for i in 0..n {
            costs[i * n + i] = 0.0;
        }
        CostMatrix::from_flat(n, costs).unwrap()
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let matrix = scenario_matrix();
        let config = GAConfig {
            population_size: 4,
            ..scenario_config(0)
        };
        assert!(GeneticAlgorithm::new(&matrix, config).is_err());
    }

    #[test]
    fn test_scenario_finds_optimal_tour() {
        let matrix = scenario_matrix();
        let mut optimal_converged = 0;

        // Only two tour costs exist on this graph: 80 (optimal) and 95.
        for seed in 0..16 {
            let mut ga = GeneticAlgorithm::new(&matrix, scenario_config(seed)).unwrap();
            assert_eq!(ga.best_num(), 2);

            let solution = ga.run();
            assert!(solution.is_complete(4));
            assert_eq!(matrix.tour_cost(&solution.tour), solution.cost);
            assert!(solution.cost == 80.0 || solution.cost == 95.0);
            assert!(solution.iterations <= 50);
            if solution.converged {
                assert!(solution.iterations >= 5);
                if solution.cost == 80.0 {
                    optimal_converged += 1;
                }
            }
        }

        assert!(optimal_converged > 0);
    }

    #[test]
    fn test_identical_costs_converge_when_window_fills() {
        let matrix = uniform_matrix(6);
        let config = GAConfig {
            num_threads: 3,
            population_size: 10,
            top: 0.5,
            max_iterations: 30,
            mutation_prob: 0.5,
            early_stop_rounds: 7,
            early_stop_threshold: 0.0,
            seed: 4,
            rank: 0,
        };

        let mut ga = GeneticAlgorithm::new(&matrix, config).unwrap();
        let solution = ga.run();

        assert!(solution.converged);
        assert_eq!(solution.iterations, 7);
        assert_eq!(solution.cost, 6.0);
        assert_eq!(ga.phase(), Phase::Done);
    }

    #[test]
    fn test_full_elite_returns_initial_best() {
        let matrix = scenario_matrix();
        let config = GAConfig {
            top: 1.0,
            ..scenario_config(9)
        };

        let mut ga = GeneticAlgorithm::new(&matrix, config).unwrap();
        ga.initialize();
        let initial_best = ga.population().tour(0).to_vec();
        let initial_cost = ga.population().costs()[0];

        let mut sink = MemorySink::default();
        let solution = ga.run_with_sink(&mut sink);

        assert!(!solution.converged);
        assert_eq!(solution.iterations, 0);
        assert_eq!(solution.tour, initial_best);
        assert_eq!(solution.cost, initial_cost);
        assert!(sink.records.is_empty());
        assert!(sink.finished);
    }

    #[test]
    fn test_elites_survive_into_next_generation() {
        let matrix = CostMatrix::from_coordinates(
            &(0..12)
                .map(|i| ((i as f64 * 1.7).sin() * 10.0, (i as f64 * 0.9).cos() * 10.0))
                .collect::<Vec<_>>(),
        )
        .unwrap();
        let config = GAConfig {
            num_threads: 4,
            population_size: 30,
            top: 0.2,
            max_iterations: 20,
            mutation_prob: 0.3,
            early_stop_rounds: 20,
            early_stop_threshold: 0.0,
            seed: 17,
            rank: 0,
        };

        let mut ga = GeneticAlgorithm::new(&matrix, config).unwrap();
        ga.initialize();
        let best_num = ga.best_num();
        let mut sink = NullSink;

        for _ in 0..10 {
            let elites: Vec<Vec<usize>> = ga.population().tours().take(best_num).map(|t| t.to_vec()).collect();
            let best_before = ga.population().costs()[0];

            ga.step(&mut sink);

            let tours: Vec<&[usize]> = ga.population().tours().collect();
            for elite in &elites {
                assert!(tours.iter().any(|t| *t == elite.as_slice()));
            }
            for tour in &tours {
                assert!(is_permutation(tour, 12));
            }
            assert!(ga.population().costs()[0] <= best_before);
            assert!(ga.population().costs().windows(2).all(|w| w[0] <= w[1]));
        }
    }

    #[test]
    fn test_sink_receives_every_generation() {
        let matrix = scenario_matrix();
        let config = GAConfig {
            early_stop_rounds: 50,
            rank: 3,
            ..scenario_config(1)
        };

        let mut ga = GeneticAlgorithm::new(&matrix, config).unwrap();
        let mut sink = MemorySink::default();
        let solution = ga.run_with_sink(&mut sink);

        assert_eq!(sink.records.len(), solution.iterations);
        assert!(sink.finished);
        for (k, record) in sink.records.iter().enumerate() {
            assert_eq!(record.generation, k + 1);
            assert_eq!(record.rank, 3);
            assert_eq!(record.best_num, 2);
            assert_eq!(record.population_size, 6);
            assert_eq!(record.num_nodes, 4);
        }
    }

    #[test]
    fn test_same_seed_same_result() {
        let matrix = scenario_matrix();
        let a = GeneticAlgorithm::new(&matrix, scenario_config(77)).unwrap().run();
        let b = GeneticAlgorithm::new(&matrix, scenario_config(77)).unwrap().run();
        assert_eq!(a.tour, b.tour);
        assert_eq!(a.iterations, b.iterations);
        assert_eq!(a.converged, b.converged);
    }

    #[test]
    fn test_explicit_worker_seeds() {
        let matrix = scenario_matrix();
        let config = scenario_config(5);

        assert!(matches!(
            GeneticAlgorithm::with_worker_seeds(&matrix, config.clone(), &[1]),
            Err(ConfigError::WorkerSeedCount { expected: 2, actual: 1 })
        ));

        let mut ga = GeneticAlgorithm::with_worker_seeds(&matrix, config, &[1, 2]).unwrap();
        let solution = ga.run();
        assert!(solution.is_complete(4));
    }
}
