//! SCP-CS Solver - Command Line Interface
//!
//! A BRKGA-based solver for the Set Covering Problem with Conflicts.

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use scp_cs_solver::benchmark::{load_instances_from_dir, Benchmark, BenchmarkConfig};
use scp_cs_solver::heuristics::brkga::{Brkga, BrkgaConfig};
use scp_cs_solver::heuristics::local_search::{LocalSearch, RemovalSearch};
use scp_cs_solver::instance::ScpCsInstance;

use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "scp-cs-solver")]
#[command(author = "M2 AI2D Student")]
#[command(version = "1.0")]
#[command(about = "A BRKGA solver for the Set Covering Problem with Conflicts")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Solve an instance with BRKGA and removal refinement
    Solve {
        /// Path to the instance file
        #[arg(short, long)]
        instance: PathBuf,

        /// Conflict threshold k (shared elements tolerated without penalty)
        #[arg(short = 'k', long, default_value = "1")]
        conflict_threshold: usize,

        /// Population size
        #[arg(short, long, default_value = "128")]
        population_size: usize,

        /// Number of elite chromosomes
        #[arg(short, long, default_value = "24")]
        elite_count: usize,

        /// Number of generations
        #[arg(short, long, default_value = "500")]
        generations: usize,

        /// Fraction of mutants injected per generation
        #[arg(short, long, default_value = "0.2")]
        mutant_fraction: f64,

        /// Random seed
        #[arg(short, long, default_value = "42")]
        seed: u64,

        /// Skip the removal refinement pass
        #[arg(long)]
        no_local_search: bool,

        /// Output solution to a JSON file
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Analyze an instance
    Analyze {
        /// Path to the instance file
        #[arg(short, long)]
        instance: PathBuf,

        /// Conflict threshold k
        #[arg(short = 'k', long, default_value = "1")]
        conflict_threshold: usize,
    },

    /// Run benchmarks on a directory of instances
    Benchmark {
        /// Directory containing instance files (.txt)
        #[arg(short, long)]
        dir: PathBuf,

        /// Conflict threshold k
        #[arg(short = 'k', long, default_value = "1")]
        conflict_threshold: usize,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Number of runs per instance
        #[arg(short, long, default_value = "5")]
        runs: usize,

        /// Population size
        #[arg(short, long, default_value = "128")]
        population_size: usize,

        /// Number of elite chromosomes
        #[arg(short, long, default_value = "24")]
        elite_count: usize,

        /// Number of generations
        #[arg(short, long, default_value = "500")]
        generations: usize,

        /// Fraction of mutants injected per generation
        #[arg(short, long, default_value = "0.2")]
        mutant_fraction: f64,

        /// Base random seed (run i uses seed + i)
        #[arg(short, long, default_value = "42")]
        seed: u64,
    },
}

fn main() {
    env_logger::init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Solve {
            instance,
            conflict_threshold,
            population_size,
            elite_count,
            generations,
            mutant_fraction,
            seed,
            no_local_search,
            output,
            verbose,
        } => {
            let config = BrkgaConfig {
                population_size,
                elite_count,
                generations,
                mutant_fraction,
                seed,
                ..Default::default()
            };
            solve_instance(&instance, conflict_threshold, config, no_local_search, output, verbose);
        }

        Commands::Analyze {
            instance,
            conflict_threshold,
        } => {
            analyze_instance(&instance, conflict_threshold);
        }

        Commands::Benchmark {
            dir,
            conflict_threshold,
            output,
            runs,
            population_size,
            elite_count,
            generations,
            mutant_fraction,
            seed,
        } => {
            let config = BrkgaConfig {
                population_size,
                elite_count,
                generations,
                mutant_fraction,
                seed,
                ..Default::default()
            };
            run_benchmark(&dir, conflict_threshold, &output, runs, config);
        }
    }
}

fn load_or_exit(path: &PathBuf, conflict_threshold: usize) -> ScpCsInstance {
    match ScpCsInstance::from_file(path, conflict_threshold) {
        Ok(instance) => instance,
        Err(e) => {
            eprintln!("Error loading instance: {}", e);
            std::process::exit(1);
        }
    }
}

fn solve_instance(
    path: &PathBuf,
    conflict_threshold: usize,
    config: BrkgaConfig,
    no_local_search: bool,
    output: Option<PathBuf>,
    verbose: bool,
) {
    println!("Loading instance from {:?}...", path);
    let instance = load_or_exit(path, conflict_threshold);

    if verbose {
        println!("{}", instance.statistics());
    }

    let generations = config.generations;
    let mut brkga = match Brkga::new(instance.clone(), config) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };

    println!("Running BRKGA for {} generations...", generations);
    let start = Instant::now();
    brkga.initialize();

    let bar = ProgressBar::new(generations as u64);
    bar.set_style(
        ProgressStyle::with_template("[{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .unwrap()
            .progress_chars("#>-"),
    );
    for _ in 0..generations {
        brkga.step();
        bar.set_message(format!("best {:.2}", brkga.best_fitness()));
        bar.inc(1);
    }
    bar.finish_and_clear();

    let mut solution = brkga.best_solution();
    println!("Best solution (before local search): {:.2}", solution.cost);

    if !no_local_search {
        let search = RemovalSearch::new();
        search.improve(&instance, &mut solution);
        println!("Best solution (after local search): {:.2}", solution.cost);
    }

    let elapsed = start.elapsed();
    solution.computation_time = elapsed.as_secs_f64();

    println!("\n========== Results ==========");
    println!("Instance: {}", instance.name);
    println!("Cost: {:.2}", solution.cost);
    println!("Selected subsets: {}", solution.len());
    println!(
        "Coverage: {}/{} elements",
        solution.covered, instance.num_elements
    );
    println!("Feasible: {}", solution.feasible);
    println!("Time: {:.4}s", elapsed.as_secs_f64());

    if !solution.feasible {
        println!(
            "WARNING: decoding stalled before full coverage; {} element(s) remain uncovered",
            instance.num_elements - solution.covered
        );
    }

    // 1-based ids, matching the instance file format
    let one_based: Vec<usize> = solution.selected.iter().map(|j| j + 1).collect();
    println!("Selected subsets (1-based): {:?}", one_based);

    if verbose {
        for &j in &solution.selected {
            println!(
                "  subset {}: cost {:.2}, covers {} elements",
                j + 1,
                instance.costs[j],
                instance.incidence[j].len()
            );
        }
    }

    if let Some(out_path) = output {
        let json = serde_json::to_string_pretty(&solution).unwrap();
        std::fs::write(&out_path, json).expect("Failed to write output");
        println!("\nSolution saved to {:?}", out_path);
    }
}

fn analyze_instance(path: &PathBuf, conflict_threshold: usize) {
    let instance = load_or_exit(path, conflict_threshold);

    println!("========== Instance Analysis ==========\n");
    println!("{}", instance.statistics());

    // Quick estimate: one short BRKGA run with refinement
    let config = BrkgaConfig {
        population_size: 32,
        elite_count: 6,
        generations: 50,
        ..Default::default()
    };
    let mut brkga = match Brkga::new(instance.clone(), config) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Invalid configuration: {}", e);
            std::process::exit(1);
        }
    };
    let mut solution = brkga.run();
    let search = RemovalSearch::new();
    search.improve(&instance, &mut solution);

    println!("\nQuick Solution Estimate:");
    println!(
        "  BRKGA(32/6/50) + {}: {:.2} (feasible: {})",
        search.name(),
        solution.cost,
        solution.feasible
    );
}

fn run_benchmark(
    dir: &PathBuf,
    conflict_threshold: usize,
    output: &PathBuf,
    runs: usize,
    brkga_config: BrkgaConfig,
) {
    println!("Loading instances from {:?}...", dir);

    let instances = load_instances_from_dir(dir, conflict_threshold);
    println!("Found {} instances", instances.len());

    if instances.is_empty() {
        eprintln!("No instances found!");
        return;
    }

    std::fs::create_dir_all(output).expect("Failed to create output directory");

    let config = BenchmarkConfig {
        num_runs: runs,
        brkga: brkga_config,
        output_dir: output.to_string_lossy().to_string(),
        ..Default::default()
    };

    let mut benchmark = Benchmark::new(config);

    for (i, instance) in instances.iter().enumerate() {
        println!(
            "\n[{}/{}] Processing {} (m={}, n={})...",
            i + 1,
            instances.len(),
            instance.name,
            instance.num_elements,
            instance.num_subsets
        );

        benchmark.run_instance(instance);
    }

    let results_path = output.join("results.csv");
    benchmark
        .export_to_csv(&results_path)
        .expect("Failed to export results");
    println!("\nResults exported to {:?}", results_path);

    let stats_path = output.join("statistics.csv");
    benchmark
        .export_statistics_csv(&stats_path)
        .expect("Failed to export statistics");
    println!("Statistics exported to {:?}", stats_path);

    let report = benchmark.generate_report();
    println!("\n{}", report);

    let report_path = output.join("report.txt");
    std::fs::write(&report_path, &report).expect("Failed to save report");
    println!("Report saved to {:?}", report_path);
}
