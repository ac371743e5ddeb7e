//! Property-based tests for ga-tsp
//!
//! Uses proptest to check permutation validity, cost correctness and ranking
//! order on random instances.

use ga_tsp::genetic::{order_crossover, swap_mutation, GAConfig, GeneticAlgorithm, Population, RankingEngine};
use ga_tsp::instance::CostMatrix;
use ga_tsp::solution::is_permutation;
use ga_tsp::timing::NullSink;
use proptest::prelude::*;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Random symmetric matrix with integer costs in [1, 100)
fn symmetric_matrix(n: usize, seed: u64) -> CostMatrix {
    use rand::Rng;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut costs = vec![0.0; n * n];
    for i in 0..n {
        for j in i + 1..n {
            let c = rng.gen_range(1..100) as f64;
            costs[i * n + j] = c;
            costs[j * n + i] = c;
        }
    }
    CostMatrix::from_flat(n, costs).unwrap()
}

fn permutation(n: usize, seed: u64) -> Vec<usize> {
    use rand::seq::SliceRandom;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut tour: Vec<usize> = (0..n).collect();
    tour.shuffle(&mut rng);
    tour
}

proptest! {
    #[test]
    fn crossover_yields_permutation(n in 2usize..40, s1 in any::<u64>(), s2 in any::<u64>()) {
        let p1 = permutation(n, s1);
        let p2 = permutation(n, s2);
        let mut child = vec![0; n];
        let mut placed = vec![false; n];

        order_crossover(&p1, &p2, &mut child, &mut placed);

        prop_assert!(is_permutation(&child, n));
        prop_assert_eq!(&child[..n / 2], &p1[..n / 2]);
    }

    #[test]
    fn crossover_keeps_parent2_relative_order(n in 2usize..30, s1 in any::<u64>(), s2 in any::<u64>()) {
        let p1 = permutation(n, s1);
        let p2 = permutation(n, s2);
        let mut child = vec![0; n];
        let mut placed = vec![false; n];

        order_crossover(&p1, &p2, &mut child, &mut placed);

        let tail: Vec<usize> = p2.iter().copied().filter(|v| !p1[..n / 2].contains(v)).collect();
        prop_assert_eq!(&child[n / 2..], tail.as_slice());
    }

    #[test]
    fn mutation_yields_permutation(n in 2usize..40, s in any::<u64>(), prob in 0.0f64..=1.0) {
        let mut tour = permutation(n, s);
        let mut rng = ChaCha8Rng::seed_from_u64(s ^ 0x5eed);
        swap_mutation(&mut tour, prob, &mut rng);
        prop_assert!(is_permutation(&tour, n));
    }

    #[test]
    fn tour_cost_matches_edge_sum(n in 2usize..25, s in any::<u64>()) {
        let matrix = symmetric_matrix(n, s);
        let tour = permutation(n, s.wrapping_add(1));

        let mut expected = 0.0;
        for k in 0..n - 1 {
            expected += matrix.cost(tour[k], tour[k + 1]);
        }
        expected += matrix.cost(tour[n - 1], tour[0]);

        prop_assert_eq!(matrix.tour_cost(&tour), expected);
    }

    #[test]
    fn ranking_is_sorted_and_aligned(n in 2usize..15, size in 5usize..40, s in any::<u64>(), threads in 1usize..5) {
        let matrix = symmetric_matrix(n, s);
        let mut rng = ChaCha8Rng::seed_from_u64(s);
        let mut population = Population::random(size, n, &mut rng);
        let pool = rayon::ThreadPoolBuilder::new().num_threads(threads).build().unwrap();

        let mut ranking = RankingEngine::new(size);
        ranking.rank(&mut population, &matrix, &pool);

        let costs = population.costs();
        prop_assert!(costs.windows(2).all(|w| w[0] <= w[1]));
        for (k, tour) in population.tours().enumerate() {
            prop_assert!(is_permutation(tour, n));
            prop_assert_eq!(costs[k], matrix.tour_cost(tour));
        }
        let min = population.tours().map(|t| matrix.tour_cost(t)).fold(f64::INFINITY, f64::min);
        prop_assert_eq!(costs[0], min);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn every_generation_holds_permutations(
        n in 2usize..12,
        s in any::<u64>(),
        top in 0.2f64..0.9,
        threads in 1usize..4,
    ) {
        let matrix = symmetric_matrix(n, s);
        let config = GAConfig {
            num_threads: threads,
            population_size: 12,
            top,
            max_iterations: 15,
            mutation_prob: 0.4,
            early_stop_rounds: 15,
            early_stop_threshold: 0.0,
            seed: s,
            rank: 0,
        };

        let mut ga = GeneticAlgorithm::new(&matrix, config).unwrap();
        ga.initialize();
        let mut sink = NullSink;

        for _ in 0..15 {
            ga.step(&mut sink);
            for tour in ga.population().tours() {
                prop_assert!(is_permutation(tour, n));
            }
        }
    }

    #[test]
    fn solution_is_best_of_final_population(n in 3usize..10, s in any::<u64>()) {
        let matrix = symmetric_matrix(n, s);
        let config = GAConfig {
            num_threads: 2,
            population_size: 10,
            top: 0.3,
            max_iterations: 20,
            mutation_prob: 0.2,
            early_stop_rounds: 5,
            early_stop_threshold: 0.0,
            seed: s,
            rank: 0,
        };

        let mut ga = GeneticAlgorithm::new(&matrix, config).unwrap();
        let solution = ga.run();

        prop_assert!(solution.is_complete(n));
        prop_assert_eq!(solution.cost, matrix.tour_cost(&solution.tour));
        for tour in ga.population().tours() {
            prop_assert!(solution.cost <= matrix.tour_cost(tour));
        }
    }
}
