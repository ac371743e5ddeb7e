//! Flat, double-buffered population store.
//!
//! Tours live row-major in one `population_size * num_nodes` buffer. A second
//! buffer of the same shape receives the ranked rows; the two are swapped by
//! toggling an index, so no generation allocates.

use rand::seq::SliceRandom;
use rand::Rng;

/// Population of permutation tours plus the index-aligned cost vector
#[derive(Debug, Clone)]
pub struct Population {
    num_nodes: usize,
    size: usize,
    buffers: [Vec<usize>; 2],
    current: usize,
    costs: Vec<f64>,
}

impl Population {
    /// Allocate a population where every row is an independently shuffled permutation
    pub fn random<R: Rng + ?Sized>(size: usize, num_nodes: usize, rng: &mut R) -> Self {
        let mut rows = Vec::with_capacity(size * num_nodes);
        for _ in 0..size {
            let start = rows.len();
            rows.extend(0..num_nodes);
            rows[start..].shuffle(rng);
        }
        Self::from_rows(num_nodes, rows)
    }

    /// Wrap an existing row-major buffer of tours
    pub fn from_rows(num_nodes: usize, rows: Vec<usize>) -> Self {
        debug_assert!(num_nodes > 0 && rows.len() % num_nodes == 0);
        let size = rows.len() / num_nodes;
        let scratch = rows.clone();

        Population {
            num_nodes,
            size,
            buffers: [rows, scratch],
            current: 0,
            costs: vec![0.0; size],
        }
    }

    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Number of tours
    #[inline]
    pub fn len(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.size == 0
    }

    /// Tour stored at row `index` of the current buffer
    #[inline]
    pub fn tour(&self, index: usize) -> &[usize] {
        let start = index * self.num_nodes;
        &self.buffers[self.current][start..start + self.num_nodes]
    }

    /// Iterate over all tours in row order
    pub fn tours(&self) -> std::slice::ChunksExact<'_, usize> {
        self.buffers[self.current].chunks_exact(self.num_nodes)
    }

    /// Whole current buffer, row-major
    #[inline]
    pub fn rows(&self) -> &[usize] {
        &self.buffers[self.current]
    }

    #[inline]
    pub fn rows_mut(&mut self) -> &mut [usize] {
        &mut self.buffers[self.current]
    }

    /// Cost vector, index-aligned with the rows after ranking
    #[inline]
    pub fn costs(&self) -> &[f64] {
        &self.costs
    }

    /// Current rows together with the cost vector, for evaluation
    pub(crate) fn rows_and_costs_mut(&mut self) -> (&[usize], &mut [f64]) {
        (&self.buffers[self.current], &mut self.costs)
    }

    /// Copy the current rows into the scratch buffer in the given order, then
    /// make the scratch buffer current
    pub(crate) fn reorder(&mut self, order: &[usize]) {
        let n = self.num_nodes;
        let (current, scratch) = if self.current == 0 {
            let (a, b) = self.buffers.split_at_mut(1);
            (&a[0], &mut b[0])
        } else {
            let (a, b) = self.buffers.split_at_mut(1);
            (&b[0], &mut a[0])
        };

        for (dst, &src) in scratch.chunks_exact_mut(n).zip(order) {
            dst.copy_from_slice(&current[src * n..(src + 1) * n]);
        }

        self.current ^= 1;
    }

    /// Which of the two buffers is current
    #[inline]
    pub fn current_buffer(&self) -> usize {
        self.current
    }
}
