//! Tour evaluation and ranking.

use ordered_float::OrderedFloat;
use rayon::prelude::*;
use rayon::ThreadPool;

use crate::genetic::population::Population;
use crate::instance::CostMatrix;

/// Number of rows given to each worker so that `rows` split into at most `workers` contiguous chunks
pub(crate) fn rows_per_worker(rows: usize, workers: usize) -> usize {
    rows.div_ceil(workers.max(1)).max(1)
}

/// Evaluates every tour and orders the population by ascending cost
///
/// Holds the index and cost scratch vectors so ranking never allocates
/// after construction.
#[derive(Debug, Clone)]
pub struct RankingEngine {
    order: Vec<usize>,
    sorted_costs: Vec<f64>,
}

impl RankingEngine {
    pub fn new(population_size: usize) -> Self {
        RankingEngine {
            order: Vec::with_capacity(population_size),
            sorted_costs: Vec::with_capacity(population_size),
        }
    }

    /// Compute the closed-tour cost of every row, rows statically split across the pool's workers
    pub fn evaluate(&self, population: &mut Population, matrix: &CostMatrix, pool: &ThreadPool) {
        let n = population.num_nodes();
        let chunk = rows_per_worker(population.len(), pool.current_num_threads());
        let (rows, costs) = population.rows_and_costs_mut();

        pool.install(|| {
            costs
                .par_chunks_mut(chunk)
                .zip(rows.par_chunks(chunk * n))
                .for_each(|(costs, rows)| {
                    for (cost, tour) in costs.iter_mut().zip(rows.chunks_exact(n)) {
                        *cost = matrix.tour_cost(tour);
                    }
                });
        });
    }

    /// Evaluate, then stably sort rows by ascending cost; ties keep their original row order
    ///
    /// Afterwards the cost vector is non-decreasing and row `k` holds the tour
    /// whose cost is `costs()[k]`, so the elites occupy the first rows.
    pub fn rank(&mut self, population: &mut Population, matrix: &CostMatrix, pool: &ThreadPool) {
        self.evaluate(population, matrix, pool);

        let (_, costs) = population.rows_and_costs_mut();

        self.order.clear();
        self.order.extend(0..costs.len());
        self.order.sort_by_key(|&i| OrderedFloat(costs[i]));

        self.sorted_costs.clear();
        self.sorted_costs.extend(self.order.iter().map(|&i| costs[i]));
        costs.copy_from_slice(&self.sorted_costs);

        population.reorder(&self.order);
    }

    /// Row permutation applied by the last call to [`rank`](Self::rank)
    pub fn last_order(&self) -> &[usize] {
        &self.order
    }
}
