//! Module for loading and representing symmetric TSP cost matrices.
//!
//! The engine only ever reads a [`CostMatrix`]; this module also carries the
//! loader that builds one from a file. Two formats are understood: a dense
//! whitespace-separated `n x n` matrix, and TSP-LIB files with a
//! `NODE_COORD_SECTION`, for which Euclidean 2D distances are computed.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::InstanceError;

/// Relative tolerance used when checking `cost(i, j) == cost(j, i)`
const SYMMETRY_TOLERANCE: f64 = 1e-9;

/// Dense, immutable, symmetric travel-cost matrix
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostMatrix {
    /// Name of the instance (file stem or TSP-LIB `NAME:`)
    pub name: String,
    num_nodes: usize,
    /// Row-major `num_nodes * num_nodes` costs
    costs: Vec<f64>,
}

impl CostMatrix {
    /// Build a matrix from a row-major buffer of `num_nodes * num_nodes` costs
    pub fn from_flat(num_nodes: usize, costs: Vec<f64>) -> Result<Self, InstanceError> {
        if costs.len() != num_nodes * num_nodes {
            return Err(InstanceError::NotSquare(costs.len()));
        }
        let matrix = CostMatrix {
            name: String::new(),
            num_nodes,
            costs,
        };
        matrix.validate()?;
        Ok(matrix)
    }

    /// Build a matrix from nested rows
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self, InstanceError> {
        let n = rows.len();
        let mut costs = Vec::with_capacity(n * n);
        for (row, values) in rows.into_iter().enumerate() {
            if values.len() != n {
                return Err(InstanceError::RaggedRow {
                    row,
                    expected: n,
                    actual: values.len(),
                });
            }
            costs.extend(values);
        }
        Self::from_flat(n, costs)
    }

    /// Build the Euclidean distance matrix of a set of 2D points
    pub fn from_coordinates(points: &[(f64, f64)]) -> Result<Self, InstanceError> {
        let n = points.len();
        let mut costs = vec![0.0; n * n];

        for i in 0..n {
            for j in 0..n {
                if i != j {
                    let dx = points[i].0 - points[j].0;
                    let dy = points[i].1 - points[j].1;
                    costs[i * n + j] = (dx * dx + dy * dy).sqrt();
                }
            }
        }

        Self::from_flat(n, costs)
    }

    /// Load a cost matrix from a dense matrix file or a TSP-LIB coordinate file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, InstanceError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;

        let mut matrix = if content.contains("NODE_COORD_SECTION") {
            Self::parse_tsplib(&content)?
        } else {
            Self::parse_dense(&content)?
        };

        if matrix.name.is_empty() {
            matrix.name = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
        }

        log::info!(
            "Loaded cost matrix '{}' with {} nodes",
            matrix.name,
            matrix.num_nodes
        );
        Ok(matrix)
    }

    /// Parse whitespace-separated costs; the node count is the square root of the value count
    pub fn parse_dense(content: &str) -> Result<Self, InstanceError> {
        let mut costs = Vec::new();

        for (line_no, line) in content.lines().enumerate() {
            for token in line.split_whitespace() {
                let value: f64 = token.parse().map_err(|_| InstanceError::Parse {
                    line: line_no + 1,
                    token: token.to_string(),
                })?;
                costs.push(value);
            }
        }

        let n = (costs.len() as f64).sqrt().round() as usize;
        if n * n != costs.len() {
            return Err(InstanceError::NotSquare(costs.len()));
        }

        Self::from_flat(n, costs)
    }

    /// Parse a TSP-LIB file with a `NODE_COORD_SECTION`
    pub fn parse_tsplib(content: &str) -> Result<Self, InstanceError> {
        let mut name = String::new();
        let mut dimension: Option<usize> = None;
        let mut coords: Vec<(f64, f64)> = Vec::new();
        let mut in_coords = false;

        for (line_no, line) in content.lines().enumerate() {
            let line = line.trim();

            if line.is_empty() || line == "EOF" {
                continue;
            }

            let parse_err = |token: &str| InstanceError::Parse {
                line: line_no + 1,
                token: token.to_string(),
            };

            if let Some(rest) = line.strip_prefix("NAME") {
                name = rest.trim_start_matches([' ', ':']).trim().to_string();
                continue;
            }
            if let Some(rest) = line.strip_prefix("DIMENSION") {
                let value = rest.trim_start_matches([' ', ':']).trim();
                dimension = Some(value.parse().map_err(|_| parse_err(value))?);
                continue;
            }
            if line.starts_with("NODE_COORD_SECTION") {
                in_coords = true;
                continue;
            }
            if line.ends_with("_SECTION") {
                in_coords = false;
                continue;
            }

            if in_coords {
                let parts: Vec<&str> = line.split_whitespace().collect();
                if parts.len() >= 3 {
                    let x: f64 = parts[1].parse().map_err(|_| parse_err(parts[1]))?;
                    let y: f64 = parts[2].parse().map_err(|_| parse_err(parts[2]))?;
                    coords.push((x, y));
                }
            }
        }

        if let Some(declared) = dimension {
            if declared != coords.len() {
                return Err(InstanceError::DimensionMismatch {
                    declared,
                    actual: coords.len(),
                });
            }
        }

        let mut matrix = Self::from_coordinates(&coords)?;
        matrix.name = name;
        Ok(matrix)
    }

    fn validate(&self) -> Result<(), InstanceError> {
        let n = self.num_nodes;
        if n < 2 {
            return Err(InstanceError::TooFewNodes(n));
        }

        for i in 0..n {
            for j in 0..n {
                let value = self.cost(i, j);
                if !value.is_finite() || value < 0.0 {
                    return Err(InstanceError::InvalidCost { i, j, value });
                }
                if j > i {
                    let backward = self.cost(j, i);
                    if (value - backward).abs() > SYMMETRY_TOLERANCE * value.abs().max(1.0) {
                        return Err(InstanceError::Asymmetric {
                            i,
                            j,
                            forward: value,
                            backward,
                        });
                    }
                }
            }
        }

        Ok(())
    }

    /// Number of nodes
    #[inline]
    pub fn num_nodes(&self) -> usize {
        self.num_nodes
    }

    /// Travel cost between two nodes
    #[inline]
    pub fn cost(&self, i: usize, j: usize) -> f64 {
        self.costs[i * self.num_nodes + j]
    }

    /// Closed-tour cost: every consecutive edge plus the edge from the last node back to the first
    pub fn tour_cost(&self, tour: &[usize]) -> f64 {
        if tour.len() < 2 {
            return 0.0;
        }

        let mut cost = self.cost(tour[tour.len() - 1], tour[0]);
        for edge in tour.windows(2) {
            cost += self.cost(edge[0], edge[1]);
        }

        cost
    }

    /// Get statistics about the matrix
    pub fn statistics(&self) -> MatrixStatistics {
        let mut total = 0.0;
        let mut count = 0usize;
        let mut min_cost = f64::INFINITY;
        let mut max_cost = 0.0f64;

        for i in 0..self.num_nodes {
            for j in i + 1..self.num_nodes {
                let c = self.cost(i, j);
                total += c;
                count += 1;
                min_cost = min_cost.min(c);
                max_cost = max_cost.max(c);
            }
        }

        MatrixStatistics {
            name: self.name.clone(),
            num_nodes: self.num_nodes,
            num_edges: count,
            avg_cost: total / count as f64,
            min_cost,
            max_cost,
        }
    }
}

/// Statistics about a cost matrix
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatrixStatistics {
    pub name: String,
    pub num_nodes: usize,
    pub num_edges: usize,
    pub avg_cost: f64,
    pub min_cost: f64,
    pub max_cost: f64,
}

impl std::fmt::Display for MatrixStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Instance: {}", self.name)?;
        writeln!(f, "  Nodes: {}", self.num_nodes)?;
        writeln!(f, "  Edges: {}", self.num_edges)?;
        writeln!(f, "  Min cost: {:.2}", self.min_cost)?;
        writeln!(f, "  Avg cost: {:.2}", self.avg_cost)?;
        writeln!(f, "  Max cost: {:.2}", self.max_cost)
    }
}
