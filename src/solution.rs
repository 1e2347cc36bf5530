//! Solution representation and manipulation for SCP-CS.
//!
//! This module provides the data structure for representing and evaluating
//! covering solutions: which subsets are selected, what they cost including
//! conflict penalties, and how many elements they cover.

use crate::instance::ScpCsInstance;
use serde::{Deserialize, Serialize};

/// Represents a solution to the SCP-CS
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Solution {
    /// Selected subset indices, sorted ascending, no duplicates
    pub selected: Vec<usize>,
    /// Total cost: base costs plus pairwise conflict penalties
    pub cost: f64,
    /// Number of distinct elements covered
    pub covered: usize,
    /// Whether every element of the instance is covered
    pub feasible: bool,
    /// Algorithm that generated this solution
    pub algorithm: String,
    /// Computation time in seconds
    pub computation_time: f64,
    /// Number of generations (if applicable)
    pub generations: Option<usize>,
}

impl Solution {
    /// Create a new empty solution
    pub fn new() -> Self {
        Solution {
            selected: Vec::new(),
            cost: f64::INFINITY,
            covered: 0,
            feasible: false,
            algorithm: String::new(),
            computation_time: 0.0,
            generations: None,
        }
    }

    /// Create a solution from a selection of subset indices.
    ///
    /// Duplicates are collapsed; cost and coverage are recomputed from the
    /// instance.
    pub fn from_selected(instance: &ScpCsInstance, selected: Vec<usize>, algorithm: &str) -> Self {
        let mut selected = selected;
        selected.sort_unstable();
        selected.dedup();

        let cost = instance.solution_cost(&selected);
        let covered = instance.coverage_count(&selected);

        Solution {
            selected,
            cost,
            covered,
            feasible: covered == instance.num_elements,
            algorithm: algorithm.to_string(),
            computation_time: 0.0,
            generations: None,
        }
    }

    /// Recompute cost, coverage and feasibility from the instance.
    pub fn validate(&mut self, instance: &ScpCsInstance) {
        self.selected.sort_unstable();
        self.selected.dedup();
        self.cost = instance.solution_cost(&self.selected);
        self.covered = instance.coverage_count(&self.selected);
        self.feasible = self.covered == instance.num_elements;
    }

    /// Check whether a subset is part of the solution.
    pub fn contains(&self, subset: usize) -> bool {
        self.selected.binary_search(&subset).is_ok()
    }

    /// Number of selected subsets.
    pub fn len(&self) -> usize {
        self.selected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.selected.is_empty()
    }
}

impl Default for Solution {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for Solution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Solution ({})", self.algorithm)?;
        writeln!(f, "  Cost: {:.2}", self.cost)?;
        writeln!(f, "  Subsets: {}", self.selected.len())?;
        writeln!(f, "  Covered elements: {}", self.covered)?;
        writeln!(f, "  Feasible: {}", self.feasible)?;
        writeln!(f, "  Time: {:.4}s", self.computation_time)?;
        if let Some(gens) = self.generations {
            writeln!(f, "  Generations: {}", gens)?;
        }
        writeln!(f, "  Selected: {:?}", self.selected)
    }
}
