//! Aggregation of island results.
//!
//! Collects the outcome of every island run, computes summary statistics,
//! and exports them as CSV or as a text report.

use std::fs::File;
use std::path::Path;

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::island::IslandResult;

/// Aggregated statistics over a set of islands
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IslandStatistics {
    /// Instance name
    pub instance: String,
    pub num_nodes: usize,
    /// Number of islands
    pub num_islands: usize,
    /// Number of islands that stopped on the convergence criterion
    pub num_converged: usize,
    pub best_cost: f64,
    pub worst_cost: f64,
    pub avg_cost: f64,
    /// Population standard deviation of island costs
    pub std_cost: f64,
    pub avg_generations: f64,
    pub avg_time: f64,
    pub total_time: f64,
}

/// Collected island results of one instance
pub struct Benchmark {
    instance: String,
    num_nodes: usize,
    results: Vec<IslandResult>,
}

impl Benchmark {
    pub fn new(instance: &str, num_nodes: usize) -> Self {
        Benchmark {
            instance: instance.to_string(),
            num_nodes,
            results: Vec::new(),
        }
    }

    /// Record results
    pub fn extend<I: IntoIterator<Item = IslandResult>>(&mut self, results: I) {
        self.results.extend(results);
    }

    /// Compute statistics; `None` when nothing was recorded
    pub fn compute_statistics(&self) -> Option<IslandStatistics> {
        if self.results.is_empty() {
            return None;
        }

        let costs: Vec<f64> = self.results.iter().map(|r| r.cost).collect();
        let times: Vec<f64> = self.results.iter().map(|r| r.time).collect();

        Some(IslandStatistics {
            instance: self.instance.clone(),
            num_nodes: self.num_nodes,
            num_islands: self.results.len(),
            num_converged: self.results.iter().filter(|r| r.converged).count(),
            best_cost: Statistics::min(costs.iter()),
            worst_cost: Statistics::max(costs.iter()),
            avg_cost: costs.iter().mean(),
            std_cost: costs.iter().population_std_dev(),
            avg_generations: self.results.iter().map(|r| r.generations as f64).mean(),
            avg_time: times.iter().mean(),
            total_time: times.iter().sum(),
        })
    }

    /// Export one row per island to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> csv::Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for result in &self.results {
            writer.serialize(result)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Export the aggregated statistics to CSV
    pub fn export_statistics_csv<P: AsRef<Path>>(&self, path: P) -> csv::Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        if let Some(stats) = self.compute_statistics() {
            writer.serialize(stats)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("       GA-TSP Island Report\n");
        report.push_str("========================================\n\n");
        report.push_str(&format!(
            "Instance: {} ({} nodes)\n",
            self.instance, self.num_nodes
        ));
        report.push_str(&format!(
            "Generated: {}\n\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        ));

        report.push_str(&format!(
            "{:<8} {:>14} {:>12} {:>10} {:>12} {:>10}\n",
            "Island", "Seed", "Cost", "Converged", "Generations", "Time"
        ));
        report.push_str("-".repeat(72).as_str());
        report.push('\n');

        for result in &self.results {
            report.push_str(&format!(
                "{:<8} {:>14} {:>12.2} {:>10} {:>12} {:>10.4}\n",
                result.island,
                result.seed,
                result.cost,
                result.converged,
                result.generations,
                result.time
            ));
        }

        report.push_str("-".repeat(72).as_str());
        report.push('\n');

        if let Some(stats) = self.compute_statistics() {
            report.push_str(&format!(
                "Best {:.2}  Worst {:.2}  Avg {:.2}  Std {:.2}\n",
                stats.best_cost, stats.worst_cost, stats.avg_cost, stats.std_cost
            ));
            report.push_str(&format!(
                "Converged {}/{}  Avg generations {:.1}  Total time {:.4}s\n",
                stats.num_converged, stats.num_islands, stats.avg_generations, stats.total_time
            ));
        }

        report
    }

    /// Get all results
    pub fn results(&self) -> &[IslandResult] {
        &self.results
    }
}
