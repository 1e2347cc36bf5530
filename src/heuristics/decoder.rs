//! Randomized-key greedy decoder for SCP-CS.
//!
//! Maps a chromosome's gene vector to a covering solution: subsets are
//! visited in descending gene order through a restricted candidate list and
//! picked by the cost-per-new-element greedy ratio, where cost includes the
//! conflict penalties against everything already selected. The decoder is a
//! pure function of the genes and the instance and may run concurrently
//! against the same instance.

use crate::instance::ScpCsInstance;
use ordered_float::OrderedFloat;
use std::cmp::Reverse;

/// Fraction of the subsets forming the restricted candidate list.
const RCL_FRACTION: f64 = 0.20;

/// Outcome of decoding one gene vector.
///
/// `covered < num_elements` means the greedy construction stalled before
/// reaching full coverage (every remaining subset adds nothing); callers must
/// check coverage rather than assume completeness.
#[derive(Debug, Clone)]
pub struct DecodedSolution {
    /// Selected subset indices, in selection order
    pub selected: Vec<usize>,
    /// Accumulated cost: base costs plus conflict penalties
    pub cost: f64,
    /// Number of distinct elements covered
    pub covered: usize,
}

impl DecodedSolution {
    /// Whether the decode covered every element of the instance.
    pub fn is_complete(&self, instance: &ScpCsInstance) -> bool {
        self.covered == instance.num_elements
    }
}

/// Greedy-randomized decoder driven by gene priorities.
#[derive(Debug, Clone)]
pub struct RandomKeyDecoder {
    rcl_fraction: f64,
}

impl RandomKeyDecoder {
    pub fn new() -> Self {
        RandomKeyDecoder {
            rcl_fraction: RCL_FRACTION,
        }
    }

    /// Decode a gene vector into a solution and its cost.
    ///
    /// There is a single construction routine: the fitness-only path
    /// (`decode_cost`) discards the subset list, so both always make
    /// identical selections for identical genes.
    pub fn decode(&self, instance: &ScpCsInstance, genes: &[f64]) -> DecodedSolution {
        let m = instance.num_elements;
        let n = instance.num_subsets;
        debug_assert_eq!(genes.len(), n, "gene vector length must equal subset count");

        // Higher gene = higher priority; ties keep index order.
        let mut priorities: Vec<(f64, usize)> = genes.iter().copied().zip(0..n).collect();
        priorities.sort_by_key(|&(gene, _)| Reverse(OrderedFloat(gene)));

        let rcl_size = ((n as f64 * self.rcl_fraction) as usize).max(1).min(n);

        let mut covered_mask = vec![false; m];
        let mut covered = 0usize;
        let mut processed = vec![false; n];
        let mut selected: Vec<usize> = Vec::new();
        let mut total_cost = 0.0;

        while covered < m {
            let mut best = best_candidate(
                instance,
                &priorities[..rcl_size],
                &processed,
                &covered_mask,
                &selected,
            );

            // The restricted window yielded nothing usable: widen to the rest.
            if best.is_none() {
                best = best_candidate(
                    instance,
                    &priorities[rcl_size..],
                    &processed,
                    &covered_mask,
                    &selected,
                );
            }

            let (winner, effective_cost) = match best {
                Some(found) => found,
                // No subset adds new coverage: stop with a partial result.
                None => break,
            };

            total_cost += effective_cost;
            for &e in &instance.incidence[winner] {
                if !covered_mask[e] {
                    covered_mask[e] = true;
                    covered += 1;
                }
            }
            selected.push(winner);
            processed[winner] = true;
        }

        DecodedSolution {
            selected,
            cost: total_cost,
            covered,
        }
    }

    /// Decode a gene vector and return only its cost (BRKGA fitness).
    pub fn decode_cost(&self, instance: &ScpCsInstance, genes: &[f64]) -> f64 {
        self.decode(instance, genes).cost
    }
}

impl Default for RandomKeyDecoder {
    fn default() -> Self {
        Self::new()
    }
}

/// Scan a priority window for the unprocessed subset with the smallest
/// effective-cost-per-new-element ratio. A strictly smaller ratio replaces
/// the incumbent. Returns the winner and its effective cost.
fn best_candidate(
    instance: &ScpCsInstance,
    window: &[(f64, usize)],
    processed: &[bool],
    covered_mask: &[bool],
    selected: &[usize],
) -> Option<(usize, f64)> {
    let mut best_ratio = f64::INFINITY;
    let mut best: Option<(usize, f64)> = None;

    for &(_, j) in window {
        if processed[j] {
            continue;
        }

        let new_elements = instance.incidence[j]
            .iter()
            .filter(|&&e| !covered_mask[e])
            .count();
        if new_elements == 0 {
            continue;
        }

        let mut effective_cost = instance.costs[j];
        for &l in selected {
            effective_cost += instance.conflict_matrix[j][l];
        }

        let ratio = effective_cost / new_elements as f64;
        if ratio < best_ratio {
            best_ratio = ratio;
            best = Some((j, effective_cost));
        }
    }

    best
}
