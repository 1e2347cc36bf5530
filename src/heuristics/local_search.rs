//! Local search improvement for SCP-CS solutions.
//!
//! The post-optimization pass removes redundant subsets from a decoded
//! solution: a subset can be dropped when every element it covers is also
//! covered by another selected subset. Dropping a subset recovers its base
//! cost and every conflict penalty it generated, so the pass never makes a
//! solution worse.

use crate::instance::ScpCsInstance;
use crate::solution::Solution;
use ordered_float::OrderedFloat;
use std::cmp::Reverse;
use std::collections::HashSet;

/// Trait for local search improvement methods
pub trait LocalSearch {
    fn improve(&self, instance: &ScpCsInstance, solution: &mut Solution) -> bool;
    fn name(&self) -> &str;
}

/// Removal refinement with first-improvement restarts.
///
/// Candidates are tried from the most expensive subset down. Each removal
/// restarts the scan, since dropping one subset can make another essential.
/// Terminates at a fixed point where no selected subset is removable.
pub struct RemovalSearch;

impl RemovalSearch {
    pub fn new() -> Self {
        RemovalSearch
    }
}

impl Default for RemovalSearch {
    fn default() -> Self {
        Self::new()
    }
}

impl LocalSearch for RemovalSearch {
    fn improve(&self, instance: &ScpCsInstance, solution: &mut Solution) -> bool {
        let mut current: HashSet<usize> = solution.selected.iter().copied().collect();
        let mut cost = solution.cost;

        // Try to remove the most expensive subsets first.
        let mut candidates = solution.selected.clone();
        candidates.sort_by_key(|&j| Reverse(OrderedFloat(instance.costs[j])));

        let mut removed_any = false;
        let mut changed = true;

        while changed {
            changed = false;

            for &j in &candidates {
                if !current.contains(&j) {
                    continue;
                }

                // j is removable only if every element it covers has a backup
                // among the other selected subsets.
                let removable = instance.incidence[j].iter().all(|&e| {
                    instance.reverse_incidence[e]
                        .iter()
                        .any(|&k| k != j && current.contains(&k))
                });
                if !removable {
                    continue;
                }

                let mut delta = instance.costs[j];
                for &k in &current {
                    if k != j {
                        delta += instance.conflict_matrix[j][k];
                    }
                }

                current.remove(&j);
                cost -= delta;
                removed_any = true;
                changed = true;
                break; // restart the scan over the remaining candidates
            }
        }

        if removed_any {
            let mut selected: Vec<usize> = current.into_iter().collect();
            selected.sort_unstable();
            solution.selected = selected;
            solution.cost = cost;
        }

        removed_any
    }

    fn name(&self) -> &str {
        "RemovalSearch"
    }
}
