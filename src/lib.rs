//! SCP-CS Solver Library
//!
//! A heuristic solver for the Set Covering Problem with Conflicts (SCP-CS):
//! cover every element of a ground set at minimum cost, where selected
//! subsets sharing more than a threshold number of elements incur a penalty.
//!
//! # Features
//!
//! - Instance parsing with conflict-matrix precomputation
//! - Randomized-key greedy decoder with a restricted candidate list
//! - Biased random-key genetic algorithm (BRKGA) with parallel evaluation
//! - Removal local search refining the best decoded solution
//! - Benchmarking tools with CSV export
//!
//! # Example
//!
//! ```no_run
//! use scp_cs_solver::instance::ScpCsInstance;
//! use scp_cs_solver::heuristics::brkga::{Brkga, BrkgaConfig};
//! use scp_cs_solver::heuristics::local_search::{LocalSearch, RemovalSearch};
//!
//! // Load instance with conflict threshold k = 1
//! let instance = ScpCsInstance::from_file("instance.txt", 1).unwrap();
//!
//! // Run the evolutionary search
//! let mut brkga = Brkga::new(instance.clone(), BrkgaConfig::default()).unwrap();
//! let mut solution = brkga.run();
//!
//! // Remove redundant subsets from the best solution
//! let search = RemovalSearch::new();
//! search.improve(&instance, &mut solution);
//!
//! println!("Solution cost: {:.2}", solution.cost);
//! ```

pub mod instance;
pub mod solution;
pub mod heuristics;
pub mod benchmark;

pub use instance::ScpCsInstance;
pub use solution::Solution;
