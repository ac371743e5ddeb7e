//! Offspring generation: parent selection, order-preserving crossover and swap mutation.
//!
//! The non-elite rows are split into contiguous chunks, one per worker. Each
//! worker owns its random stream, so the offspring of a generation depend only
//! on the seed and the worker count, never on thread scheduling.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use rayon::ThreadPool;

use crate::genetic::population::Population;
use crate::genetic::ranking::rows_per_worker;

/// State owned by one reproduction worker
#[derive(Debug, Clone)]
struct Worker {
    rng: ChaCha8Rng,
    /// Nodes already copied into the child being built
    placed: Vec<bool>,
}

/// Fills the non-elite region of the population with offspring of the elites
#[derive(Debug, Clone)]
pub struct ReproductionEngine {
    workers: Vec<Worker>,
    mutation_prob: f64,
}

impl ReproductionEngine {
    /// One worker per thread, streams derived from a single run seed
    ///
    /// Stream 0 of the seed is left to the caller (initial shuffles); worker
    /// `w` uses stream `w + 1`.
    pub fn new(seed: u64, num_workers: usize, num_nodes: usize, mutation_prob: f64) -> Self {
        let seeds = vec![seed; num_workers.max(1)];
        let mut engine = Self::with_seeds(&seeds, num_nodes, mutation_prob);
        for (w, worker) in engine.workers.iter_mut().enumerate() {
            worker.rng.set_stream(w as u64 + 1);
        }
        engine
    }

    /// One worker per seed, for reproducible per-worker streams
    pub fn with_seeds(seeds: &[u64], num_nodes: usize, mutation_prob: f64) -> Self {
        let workers = seeds
            .iter()
            .map(|&seed| Worker {
                rng: ChaCha8Rng::seed_from_u64(seed),
                placed: vec![false; num_nodes],
            })
            .collect();

        ReproductionEngine {
            workers,
            mutation_prob,
        }
    }

    pub fn num_workers(&self) -> usize {
        self.workers.len()
    }

    /// Overwrite rows `best_num..` with children of rows `0..best_num`
    ///
    /// The elite rows are only read. Every child is a permutation of the
    /// node set.
    pub fn generate(&mut self, population: &mut Population, best_num: usize, pool: &ThreadPool) {
        let n = population.num_nodes();
        let children = population.len().saturating_sub(best_num);
        if children == 0 || best_num == 0 {
            return;
        }

        let chunk = rows_per_worker(children, self.workers.len());
        let mutation_prob = self.mutation_prob;
        let (elites, offspring) = population.rows_mut().split_at_mut(best_num * n);
        let elites: &[usize] = elites;

        pool.install(|| {
            offspring
                .par_chunks_mut(chunk * n)
                .zip(self.workers.par_iter_mut())
                .enumerate()
                .for_each(|(w, (rows, worker))| {
                    for (offset, child) in rows.chunks_exact_mut(n).enumerate() {
                        let slot = w * chunk + offset;
                        let (p1, p2) = select_parents(slot, best_num, &mut worker.rng);

                        order_crossover(
                            &elites[p1 * n..(p1 + 1) * n],
                            &elites[p2 * n..(p2 + 1) * n],
                            child,
                            &mut worker.placed,
                        );
                        swap_mutation(child, mutation_prob, &mut worker.rng);
                    }
                });
        });
    }
}

/// Pick the two elite parents of offspring slot `slot`
///
/// The first `best_num` slots take their own index as first parent, so every
/// elite has at least one child. The second parent is redrawn until it
/// differs from the slot index; it may equal the first parent, in which case
/// the child is a clone. With a single elite the only candidate is accepted.
pub fn select_parents<R: Rng + ?Sized>(slot: usize, best_num: usize, rng: &mut R) -> (usize, usize) {
    let parent1 = if slot < best_num {
        slot
    } else {
        rng.gen_range(0..best_num)
    };

    let parent2 = loop {
        let candidate = rng.gen_range(0..best_num);
        if candidate != slot || best_num == 1 {
            break candidate;
        }
    };

    (parent1, parent2)
}

/// Copy the first half of `parent1`, then append the nodes of `parent2` not yet placed, in order
///
/// `placed` is scratch space of length `num_nodes`.
pub fn order_crossover(parent1: &[usize], parent2: &[usize], child: &mut [usize], placed: &mut [bool]) {
    let n = child.len();
    let half = n / 2;

    placed.fill(false);
    child[..half].copy_from_slice(&parent1[..half]);
    for &node in &parent1[..half] {
        placed[node] = true;
    }

    let mut j = half;
    for &node in parent2 {
        if j == n {
            break;
        }
        if !placed[node] {
            placed[node] = true;
            child[j] = node;
            j += 1;
        }
    }
}

/// With probability `mutation_prob`, swap the nodes at two distinct random positions
///
/// Returns whether a swap happened.
pub fn swap_mutation<R: Rng + ?Sized>(tour: &mut [usize], mutation_prob: f64, rng: &mut R) -> bool {
    if tour.len() < 2 || rng.gen::<f64>() >= mutation_prob {
        return false;
    }

    let i = rng.gen_range(0..tour.len());
    let j = loop {
        let j = rng.gen_range(0..tour.len());
        if j != i {
            break j;
        }
    };

    tour.swap(i, j);
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solution::is_permutation;

    fn pool(threads: usize) -> ThreadPool {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .unwrap()
    }

    #[test]
    fn test_order_crossover() {
        let mut child = vec![0; 6];
        let mut placed = vec![false; 6];
        order_crossover(&[0, 1, 2, 3, 4, 5], &[5, 3, 1, 4, 0, 2], &mut child, &mut placed);
        assert_eq!(child, vec![0, 1, 2, 5, 3, 4]);

        let mut child = vec![0; 5];
        let mut placed = vec![false; 5];
        order_crossover(&[4, 3, 2, 1, 0], &[0, 1, 2, 3, 4], &mut child, &mut placed);
        assert_eq!(child, vec![4, 3, 0, 1, 2]);
    }

    #[test]
    fn test_crossover_of_identical_parents_clones() {
        let parent = [3, 0, 4, 1, 2];
        let mut child = vec![0; 5];
        let mut placed = vec![false; 5];
        order_crossover(&parent, &parent, &mut child, &mut placed);
        assert_eq!(child, parent);
    }

    #[test]
    fn test_swap_mutation() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let mut tour = vec![0, 1, 2, 3, 4];
        assert!(!swap_mutation(&mut tour, 0.0, &mut rng));
        assert_eq!(tour, vec![0, 1, 2, 3, 4]);

        assert!(swap_mutation(&mut tour, 1.0, &mut rng));
        assert!(is_permutation(&tour, 5));
        let moved = tour.iter().enumerate().filter(|&(i, &v)| i != v).count();
        assert_eq!(moved, 2);
    }

    #[test]
    fn test_select_parents() {
        let mut rng = ChaCha8Rng::seed_from_u64(11);

        for slot in 0..20 {
            let (p1, p2) = select_parents(slot, 4, &mut rng);
            assert!(p1 < 4 && p2 < 4);
            assert_ne!(p2, slot);
            if slot < 4 {
                assert_eq!(p1, slot);
            }
        }

        assert_eq!(select_parents(0, 1, &mut rng), (0, 0));
        assert_eq!(select_parents(3, 1, &mut rng), (0, 0));
    }

    #[test]
    fn test_generate_keeps_elites_and_permutations() {
        let n = 7;
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut population = Population::random(10, n, &mut rng);
        let elites: Vec<usize> = population.rows()[..3 * n].to_vec();

        let mut reproduction = ReproductionEngine::new(9, 3, n, 0.5);
        reproduction.generate(&mut population, 3, &pool(3));

        assert_eq!(&population.rows()[..3 * n], elites.as_slice());
        for tour in population.tours() {
            assert!(is_permutation(tour, n));
        }
    }

    #[test]
    fn test_generate_is_deterministic_per_seed() {
        let n = 8;
        let run = |threads: usize| {
            let mut rng = ChaCha8Rng::seed_from_u64(1);
            let mut population = Population::random(16, n, &mut rng);
            let mut reproduction = ReproductionEngine::new(21, 4, n, 0.3);
            reproduction.generate(&mut population, 4, &pool(threads));
            population.rows().to_vec()
        };

        assert_eq!(run(1), run(4));
    }
}
