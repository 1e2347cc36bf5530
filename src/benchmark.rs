//! Benchmarking and experimentation module for SCP-CS.
//!
//! Provides tools for running repeated BRKGA experiments over instances,
//! collecting per-run results and per-instance statistics, and exporting
//! them for analysis.

use crate::heuristics::brkga::{Brkga, BrkgaConfig};
use crate::heuristics::local_search::{LocalSearch, RemovalSearch};
use crate::instance::ScpCsInstance;

use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// Result of a single BRKGA run on an instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    /// Instance name
    pub instance: String,
    /// Instance element count
    pub num_elements: usize,
    /// Instance subset count
    pub num_subsets: usize,
    /// Run index within the experiment
    pub run: usize,
    /// Seed used for this run
    pub seed: u64,
    /// Best cost before local search
    pub cost_before_refinement: f64,
    /// Final cost after local search
    pub cost: f64,
    /// Subsets removed by the refinement pass
    pub removed_subsets: usize,
    /// Whether the final solution covers every element
    pub feasible: bool,
    /// Computation time in seconds
    pub time: f64,
    /// Generations executed
    pub generations: usize,
}

/// Aggregated statistics for one instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceRunStatistics {
    /// Instance name
    pub instance: String,
    /// Number of runs recorded
    pub num_runs: usize,
    /// Number of runs ending with full coverage
    pub num_feasible: usize,
    /// Best final cost over feasible runs
    pub best_cost: f64,
    /// Worst final cost over feasible runs
    pub worst_cost: f64,
    /// Average final cost over feasible runs
    pub avg_cost: f64,
    /// Standard deviation of the final cost
    pub std_cost: f64,
    /// Average run time
    pub avg_time: f64,
    /// Total run time
    pub total_time: f64,
}

/// Benchmark configuration
#[derive(Debug, Clone)]
pub struct BenchmarkConfig {
    /// Number of runs per instance; run i uses seed `brkga.seed + i`
    pub num_runs: usize,
    /// Engine configuration shared by all runs
    pub brkga: BrkgaConfig,
    /// Apply removal refinement to each run's best solution
    pub apply_local_search: bool,
    /// Output directory
    pub output_dir: String,
}

impl Default for BenchmarkConfig {
    fn default() -> Self {
        BenchmarkConfig {
            num_runs: 5,
            brkga: BrkgaConfig::default(),
            apply_local_search: true,
            output_dir: "results".to_string(),
        }
    }
}

/// Benchmarking engine
pub struct Benchmark {
    config: BenchmarkConfig,
    results: Vec<RunResult>,
}

impl Benchmark {
    pub fn new(config: BenchmarkConfig) -> Self {
        Benchmark {
            config,
            results: Vec::new(),
        }
    }

    /// Run the configured number of repetitions on one instance.
    pub fn run_instance(&mut self, instance: &ScpCsInstance) {
        log::info!(
            "Running benchmark on instance: {} (m={}, n={})",
            instance.name,
            instance.num_elements,
            instance.num_subsets
        );

        for run in 0..self.config.num_runs {
            let mut brkga_config = self.config.brkga.clone();
            brkga_config.seed = self.config.brkga.seed + run as u64;
            let seed = brkga_config.seed;

            let mut brkga = match Brkga::new(instance.clone(), brkga_config) {
                Ok(engine) => engine,
                Err(e) => {
                    log::error!("Invalid configuration for {}: {}", instance.name, e);
                    return;
                }
            };

            let mut solution = brkga.run();
            let cost_before_refinement = solution.cost;
            let subsets_before = solution.len();

            if self.config.apply_local_search {
                let search = RemovalSearch::new();
                search.improve(instance, &mut solution);
            }

            log::info!(
                "  run {}: cost {:.2} -> {:.2} ({} subsets, feasible: {})",
                run,
                cost_before_refinement,
                solution.cost,
                solution.len(),
                solution.feasible
            );

            self.results.push(RunResult {
                instance: instance.name.clone(),
                num_elements: instance.num_elements,
                num_subsets: instance.num_subsets,
                run,
                seed,
                cost_before_refinement,
                cost: solution.cost,
                removed_subsets: subsets_before - solution.len(),
                feasible: solution.feasible,
                time: solution.computation_time,
                generations: solution.generations.unwrap_or(0),
            });
        }
    }

    /// Run the benchmark on multiple instances.
    pub fn run_on_instances(&mut self, instances: &[ScpCsInstance]) {
        for instance in instances {
            self.run_instance(instance);
        }
    }

    /// Compute per-instance statistics over feasible runs.
    pub fn compute_statistics(&self) -> Vec<InstanceRunStatistics> {
        let mut by_instance: HashMap<String, Vec<&RunResult>> = HashMap::new();
        for result in &self.results {
            by_instance
                .entry(result.instance.clone())
                .or_default()
                .push(result);
        }

        let mut statistics = Vec::new();

        for (name, results) in by_instance {
            let feasible: Vec<&&RunResult> = results.iter().filter(|r| r.feasible).collect();
            if feasible.is_empty() {
                continue;
            }

            let costs: Vec<f64> = feasible.iter().map(|r| r.cost).collect();
            let times: Vec<f64> = feasible.iter().map(|r| r.time).collect();

            let best_cost = costs.iter().cloned().fold(f64::INFINITY, f64::min);
            let worst_cost = costs.iter().cloned().fold(0.0, f64::max);
            let avg_cost = (&costs).mean();
            let std_cost = if costs.len() > 1 { (&costs).std_dev() } else { 0.0 };

            statistics.push(InstanceRunStatistics {
                instance: name,
                num_runs: results.len(),
                num_feasible: feasible.len(),
                best_cost,
                worst_cost,
                avg_cost,
                std_cost,
                avg_time: (&times).mean(),
                total_time: times.iter().sum(),
            });
        }

        statistics.sort_by(|a, b| a.instance.cmp(&b.instance));

        statistics
    }

    /// Export results to CSV
    pub fn export_to_csv<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for result in &self.results {
            writer.serialize(result)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Export statistics to CSV
    pub fn export_statistics_csv<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let file = File::create(path)?;
        let mut writer = csv::Writer::from_writer(file);

        for stat in self.compute_statistics() {
            writer.serialize(stat)?;
        }

        writer.flush()?;
        Ok(())
    }

    /// Generate summary report
    pub fn generate_report(&self) -> String {
        let mut report = String::new();

        report.push_str("========================================\n");
        report.push_str("       SCP-CS Benchmark Report\n");
        report.push_str("========================================\n");
        report.push_str(&format!(
            "Generated: {}\n\n",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        ));

        let stats = self.compute_statistics();

        report.push_str("Per-Instance Summary:\n");
        report.push_str("-".repeat(86).as_str());
        report.push('\n');
        report.push_str(&format!(
            "{:<25} {:>10} {:>12} {:>12} {:>12} {:>10}\n",
            "Instance", "Feasible", "Best Cost", "Avg Cost", "Std Cost", "Avg Time"
        ));
        report.push_str("-".repeat(86).as_str());
        report.push('\n');

        for stat in &stats {
            report.push_str(&format!(
                "{:<25} {:>10} {:>12.2} {:>12.2} {:>12.2} {:>10.4}\n",
                stat.instance,
                format!("{}/{}", stat.num_feasible, stat.num_runs),
                stat.best_cost,
                stat.avg_cost,
                stat.std_cost,
                stat.avg_time
            ));
        }

        report.push_str("-".repeat(86).as_str());
        report.push('\n');

        report
    }

    /// Get all results
    pub fn results(&self) -> &[RunResult] {
        &self.results
    }
}

/// Helper function to load instances from a directory
pub fn load_instances_from_dir<P: AsRef<Path>>(
    dir: P,
    conflict_threshold: usize,
) -> Vec<ScpCsInstance> {
    let mut instances = Vec::new();

    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().map(|e| e == "txt").unwrap_or(false) {
                match ScpCsInstance::from_file(&path, conflict_threshold) {
                    Ok(instance) => instances.push(instance),
                    Err(e) => log::warn!("Skipping {:?}: {}", path, e),
                }
            }
        }
    }

    // Sort by subset count
    instances.sort_by_key(|i| i.num_subsets);

    instances
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_instance() -> ScpCsInstance {
        ScpCsInstance::new(
            "test",
            3,
            vec![4.0, 4.0, 7.0],
            vec![vec![0, 1], vec![1, 2], vec![0, 1, 2]],
            3,
        )
        .unwrap()
    }

    #[test]
    fn test_benchmark_config() {
        let config = BenchmarkConfig::default();
        assert_eq!(config.num_runs, 5);
        assert!(config.apply_local_search);
    }

    #[test]
    fn test_run_instance_records_results() {
        let config = BenchmarkConfig {
            num_runs: 2,
            brkga: BrkgaConfig {
                population_size: 12,
                elite_count: 3,
                mutant_fraction: 0.25,
                generations: 10,
                ..Default::default()
            },
            ..Default::default()
        };
        let mut benchmark = Benchmark::new(config);

        benchmark.run_instance(&create_test_instance());

        let results = benchmark.results();
        assert_eq!(results.len(), 2);
        assert!(results.iter().all(|r| r.feasible));
        assert!(results.iter().all(|r| r.cost <= r.cost_before_refinement));
        // Runs must use distinct seeds.
        assert_ne!(results[0].seed, results[1].seed);
    }

    #[test]
    fn test_compute_statistics() {
        let mut benchmark = Benchmark::new(BenchmarkConfig::default());
        for (run, cost) in [(0usize, 8.0), (1, 7.0), (2, 7.0)] {
            benchmark.results.push(RunResult {
                instance: "synthetic".to_string(),
                num_elements: 3,
                num_subsets: 3,
                run,
                seed: run as u64,
                cost_before_refinement: cost,
                cost,
                removed_subsets: 0,
                feasible: true,
                time: 0.5,
                generations: 10,
            });
        }

        let stats = benchmark.compute_statistics();

        assert_eq!(stats.len(), 1);
        let stat = &stats[0];
        assert_eq!(stat.num_runs, 3);
        assert_eq!(stat.num_feasible, 3);
        assert_eq!(stat.best_cost, 7.0);
        assert_eq!(stat.worst_cost, 8.0);
        assert!((stat.avg_cost - 22.0 / 3.0).abs() < 1e-9);
        assert!((stat.total_time - 1.5).abs() < 1e-9);
    }

    #[test]
    fn test_statistics_skip_infeasible_only_instances() {
        let mut benchmark = Benchmark::new(BenchmarkConfig::default());
        benchmark.results.push(RunResult {
            instance: "stalled".to_string(),
            num_elements: 3,
            num_subsets: 2,
            run: 0,
            seed: 0,
            cost_before_refinement: 2.0,
            cost: 2.0,
            removed_subsets: 0,
            feasible: false,
            time: 0.1,
            generations: 10,
        });

        assert!(benchmark.compute_statistics().is_empty());
    }
}
