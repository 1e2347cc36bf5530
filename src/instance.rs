//! Module for parsing and representing SCP-CS instances.
//!
//! This module handles the text format used for Set Covering Problem with
//! Conflicts instances: a first line with `m n` (element and subset counts),
//! followed by `n` subset costs, followed by one block per element giving the
//! number of subsets covering it and their 1-based ids. Tokens may be split
//! across lines arbitrarily.

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use serde::{Deserialize, Serialize};

/// Represents a complete SCP-CS instance.
///
/// All fields are immutable after construction; the conflict matrix and the
/// reverse incidence lists are derived during construction and are guaranteed
/// to be consistent with `incidence`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScpCsInstance {
    /// Name of the instance
    pub name: String,
    /// Number of elements to cover (m)
    pub num_elements: usize,
    /// Number of available subsets (n)
    pub num_subsets: usize,
    /// Base cost of each subset
    pub costs: Vec<f64>,
    /// For each subset, the sorted element ids it covers
    pub incidence: Vec<Vec<usize>>,
    /// For each element, the sorted subset ids covering it
    pub reverse_incidence: Vec<Vec<usize>>,
    /// Precomputed n-by-n conflict penalty matrix (symmetric, zero diagonal)
    #[serde(skip)]
    pub conflict_matrix: Vec<Vec<f64>>,
    /// Overlap tolerance used when the conflict matrix was computed
    pub conflict_threshold: usize,
}

impl ScpCsInstance {
    /// Build a validated instance from raw data.
    ///
    /// `incidence[j]` lists the elements covered by subset `j` (duplicates are
    /// collapsed). Fails if dimensions are zero, costs are negative or an
    /// element id is out of range. An element covered by no subset is allowed;
    /// such instances simply cannot be fully covered.
    pub fn new(
        name: &str,
        num_elements: usize,
        costs: Vec<f64>,
        incidence: Vec<Vec<usize>>,
        conflict_threshold: usize,
    ) -> Result<Self, String> {
        if num_elements == 0 {
            return Err("Instance must have at least one element".to_string());
        }
        if costs.is_empty() {
            return Err("Instance must have at least one subset".to_string());
        }
        if costs.len() != incidence.len() {
            return Err(format!(
                "Cost vector has {} entries but incidence has {} subsets",
                costs.len(),
                incidence.len()
            ));
        }
        if let Some(c) = costs.iter().find(|c| **c < 0.0 || !c.is_finite()) {
            return Err(format!("Subset costs must be non-negative, got {}", c));
        }

        let num_subsets = costs.len();
        let mut incidence = incidence;
        for covered in incidence.iter_mut() {
            if let Some(&e) = covered.iter().find(|&&e| e >= num_elements) {
                return Err(format!(
                    "Element id {} out of range (instance has {} elements)",
                    e, num_elements
                ));
            }
            covered.sort_unstable();
            covered.dedup();
        }

        let mut reverse_incidence = vec![Vec::new(); num_elements];
        for (j, covered) in incidence.iter().enumerate() {
            for &e in covered {
                reverse_incidence[e].push(j);
            }
        }

        let conflict_matrix = Self::compute_conflict_matrix(&costs, &incidence, conflict_threshold);

        Ok(ScpCsInstance {
            name: name.to_string(),
            num_elements,
            num_subsets,
            costs,
            incidence,
            reverse_incidence,
            conflict_matrix,
            conflict_threshold,
        })
    }

    /// Parse an SCP-CS instance from a text file.
    ///
    /// `conflict_threshold` (k) is the number of shared elements two subsets
    /// may have before a conflict penalty applies.
    pub fn from_file<P: AsRef<Path>>(path: P, conflict_threshold: usize) -> Result<Self, String> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| format!("Cannot open file: {}", e))?;
        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().to_string())
            .unwrap_or_else(|| "unnamed".to_string());
        Self::parse(BufReader::new(file), &name, conflict_threshold)
    }

    /// Parse an instance from any reader. Subset ids in the file are 1-based.
    pub fn parse<R: Read>(
        mut reader: R,
        name: &str,
        conflict_threshold: usize,
    ) -> Result<Self, String> {
        let mut content = String::new();
        reader
            .read_to_string(&mut content)
            .map_err(|e| format!("Read error: {}", e))?;

        let mut tokens = content.split_whitespace();

        let num_elements = next_value::<usize>(&mut tokens, "element count")?;
        let num_subsets = next_value::<usize>(&mut tokens, "subset count")?;
        if num_elements == 0 || num_subsets == 0 {
            return Err(format!(
                "Instance dimensions must be positive (got m={}, n={})",
                num_elements, num_subsets
            ));
        }

        let mut costs = Vec::with_capacity(num_subsets);
        for j in 0..num_subsets {
            costs.push(next_value::<f64>(&mut tokens, &format!("cost of subset {}", j + 1))?);
        }

        let mut incidence = vec![Vec::new(); num_subsets];
        for i in 0..num_elements {
            let num_covers =
                next_value::<usize>(&mut tokens, &format!("cover count of element {}", i + 1))?;
            for _ in 0..num_covers {
                let id = next_value::<usize>(
                    &mut tokens,
                    &format!("subset id covering element {}", i + 1),
                )?;
                if id == 0 || id > num_subsets {
                    return Err(format!(
                        "Subset id {} out of range (1 to {}) for element {}",
                        id,
                        num_subsets,
                        i + 1
                    ));
                }
                incidence[id - 1].push(i);
            }
        }

        Self::new(name, num_elements, costs, incidence, conflict_threshold)
    }

    /// Compute the conflict penalty matrix.
    ///
    /// The unit penalty is the largest cost/cardinality ratio over all subsets
    /// (rounded, at least 1); the penalty between two subsets is that unit
    /// times the number of shared elements exceeding the threshold.
    fn compute_conflict_matrix(
        costs: &[f64],
        incidence: &[Vec<usize>],
        threshold: usize,
    ) -> Vec<Vec<f64>> {
        let n = costs.len();
        let mut matrix = vec![vec![0.0; n]; n];

        let mut max_ratio = 0.0f64;
        for (j, covered) in incidence.iter().enumerate() {
            if !covered.is_empty() {
                max_ratio = max_ratio.max(costs[j] / covered.len() as f64);
            }
        }
        let coeff = max_ratio.round().max(1.0);

        for i in 0..n {
            for j in i + 1..n {
                let shared = intersection_size(&incidence[i], &incidence[j]);
                let excess = shared.saturating_sub(threshold);
                if excess > 0 {
                    let penalty = coeff * excess as f64;
                    matrix[i][j] = penalty;
                    matrix[j][i] = penalty;
                }
            }
        }

        matrix
    }

    /// Total cost of a selection: base costs plus pairwise conflict penalties.
    ///
    /// The matrix is symmetric, so only pairs with i < j are visited.
    pub fn solution_cost(&self, selected: &[usize]) -> f64 {
        let mut cost = 0.0;

        for &j in selected {
            cost += self.costs[j];
        }

        for (i, &sub_i) in selected.iter().enumerate() {
            let row = &self.conflict_matrix[sub_i];
            for &sub_j in &selected[i + 1..] {
                cost += row[sub_j];
            }
        }

        cost
    }

    /// Number of distinct elements covered by a selection.
    pub fn coverage_count(&self, selected: &[usize]) -> usize {
        let mut covered = vec![false; self.num_elements];
        let mut count = 0;

        for &j in selected {
            for &e in &self.incidence[j] {
                if !covered[e] {
                    covered[e] = true;
                    count += 1;
                }
            }
        }

        count
    }

    /// Check whether a selection covers every element.
    pub fn covers_all(&self, selected: &[usize]) -> bool {
        self.coverage_count(selected) == self.num_elements
    }

    /// Get statistics about the instance
    pub fn statistics(&self) -> InstanceStatistics {
        let subset_sizes: Vec<usize> = self.incidence.iter().map(|s| s.len()).collect();
        let avg_subset_size =
            subset_sizes.iter().sum::<usize>() as f64 / self.num_subsets as f64;
        let max_subset_size = subset_sizes.iter().copied().max().unwrap_or(0);

        let avg_cost = self.costs.iter().sum::<f64>() / self.num_subsets as f64;
        let min_cost = self.costs.iter().cloned().fold(f64::INFINITY, f64::min);
        let max_cost = self.costs.iter().cloned().fold(0.0, f64::max);

        let mut conflict_pairs = 0usize;
        for i in 0..self.num_subsets {
            for j in i + 1..self.num_subsets {
                if self.conflict_matrix[i][j] > 0.0 {
                    conflict_pairs += 1;
                }
            }
        }

        let uncoverable = self
            .reverse_incidence
            .iter()
            .filter(|covers| covers.is_empty())
            .count();

        InstanceStatistics {
            name: self.name.clone(),
            num_elements: self.num_elements,
            num_subsets: self.num_subsets,
            conflict_threshold: self.conflict_threshold,
            avg_cost,
            min_cost,
            max_cost,
            avg_subset_size,
            max_subset_size,
            conflict_pairs,
            uncoverable_elements: uncoverable,
        }
    }
}

/// Size of the intersection of two sorted id lists.
fn intersection_size(a: &[usize], b: &[usize]) -> usize {
    let mut count = 0;
    let (mut i, mut j) = (0, 0);

    while i < a.len() && j < b.len() {
        match a[i].cmp(&b[j]) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                count += 1;
                i += 1;
                j += 1;
            }
        }
    }

    count
}

fn next_value<T: std::str::FromStr>(
    tokens: &mut std::str::SplitWhitespace<'_>,
    what: &str,
) -> Result<T, String> {
    let token = tokens
        .next()
        .ok_or_else(|| format!("Unexpected end of data while reading {}", what))?;
    token
        .parse::<T>()
        .map_err(|_| format!("Invalid value '{}' while reading {}", token, what))
}

/// Statistics about an SCP-CS instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InstanceStatistics {
    pub name: String,
    pub num_elements: usize,
    pub num_subsets: usize,
    pub conflict_threshold: usize,
    pub avg_cost: f64,
    pub min_cost: f64,
    pub max_cost: f64,
    pub avg_subset_size: f64,
    pub max_subset_size: usize,
    pub conflict_pairs: usize,
    pub uncoverable_elements: usize,
}

impl std::fmt::Display for InstanceStatistics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Instance: {}", self.name)?;
        writeln!(f, "  Elements (m): {}", self.num_elements)?;
        writeln!(f, "  Subsets (n): {}", self.num_subsets)?;
        writeln!(f, "  Conflict threshold (k): {}", self.conflict_threshold)?;
        writeln!(
            f,
            "  Subset cost: avg {:.2}, min {:.2}, max {:.2}",
            self.avg_cost, self.min_cost, self.max_cost
        )?;
        writeln!(
            f,
            "  Subset size: avg {:.2}, max {}",
            self.avg_subset_size, self.max_subset_size
        )?;
        writeln!(f, "  Conflicting pairs: {}", self.conflict_pairs)?;
        writeln!(f, "  Uncoverable elements: {}", self.uncoverable_elements)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn sample_text() -> &'static str {
        // 3 elements, 3 subsets: S1={1,2} cost 4, S2={2,3} cost 4, S3={1,2,3} cost 7
        "3 3\n\
         4 4 7\n\
         2 1 3\n\
         3 1 2 3\n\
         2 2 3\n"
    }

    #[test]
    fn test_parse_sample() {
        let instance = ScpCsInstance::parse(Cursor::new(sample_text()), "sample", 3).unwrap();

        assert_eq!(instance.num_elements, 3);
        assert_eq!(instance.num_subsets, 3);
        assert_eq!(instance.costs, vec![4.0, 4.0, 7.0]);
        assert_eq!(instance.incidence[0], vec![0, 1]);
        assert_eq!(instance.incidence[1], vec![1, 2]);
        assert_eq!(instance.incidence[2], vec![0, 1, 2]);
    }

    #[test]
    fn test_reverse_incidence_consistency() {
        let instance = ScpCsInstance::parse(Cursor::new(sample_text()), "sample", 3).unwrap();

        for (j, covered) in instance.incidence.iter().enumerate() {
            for &e in covered {
                assert!(
                    instance.reverse_incidence[e].contains(&j),
                    "subset {} covers element {} but is missing from its cover list",
                    j,
                    e
                );
            }
        }
        for (e, covers) in instance.reverse_incidence.iter().enumerate() {
            for &j in covers {
                assert!(instance.incidence[j].contains(&e));
            }
        }
    }

    #[test]
    fn test_parse_truncated_fails() {
        let result = ScpCsInstance::parse(Cursor::new("3 3\n4 4\n"), "bad", 1);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_bad_subset_id_fails() {
        let text = "2 2\n1 1\n1 5\n1 1\n";
        let result = ScpCsInstance::parse(Cursor::new(text), "bad", 1);
        assert!(result.is_err());
    }

    #[test]
    fn test_new_rejects_negative_cost() {
        let result = ScpCsInstance::new("bad", 2, vec![1.0, -2.0], vec![vec![0], vec![1]], 1);
        assert!(result.is_err());
    }

    #[test]
    fn test_new_rejects_element_out_of_range() {
        let result = ScpCsInstance::new("bad", 2, vec![1.0], vec![vec![0, 2]], 1);
        assert!(result.is_err());
    }

    #[test]
    fn test_conflict_matrix_symmetry_and_diagonal() {
        let instance = ScpCsInstance::parse(Cursor::new(sample_text()), "sample", 1).unwrap();

        for i in 0..instance.num_subsets {
            assert_eq!(instance.conflict_matrix[i][i], 0.0);
            for j in 0..instance.num_subsets {
                assert_eq!(
                    instance.conflict_matrix[i][j],
                    instance.conflict_matrix[j][i]
                );
            }
        }
    }

    #[test]
    fn test_conflict_matrix_values() {
        // Cost/size ratios: 4/2, 4/2, 7/3 -> unit penalty round(2.333) = 2.
        // With k=1: |S0 ∩ S1| = 1 (no conflict), |S0 ∩ S2| = 2 and
        // |S1 ∩ S2| = 2 (one shared element over the threshold each).
        let instance = ScpCsInstance::parse(Cursor::new(sample_text()), "sample", 1).unwrap();

        assert_eq!(instance.conflict_matrix[0][1], 0.0);
        assert_eq!(instance.conflict_matrix[0][2], 2.0);
        assert_eq!(instance.conflict_matrix[1][2], 2.0);
    }

    #[test]
    fn test_conflicts_vanish_with_large_threshold() {
        let instance = ScpCsInstance::parse(Cursor::new(sample_text()), "sample", 3).unwrap();

        for i in 0..instance.num_subsets {
            for j in 0..instance.num_subsets {
                assert_eq!(instance.conflict_matrix[i][j], 0.0);
            }
        }
    }

    #[test]
    fn test_solution_cost() {
        let instance = ScpCsInstance::parse(Cursor::new(sample_text()), "sample", 1).unwrap();

        assert_eq!(instance.solution_cost(&[0, 1]), 8.0);
        assert_eq!(instance.solution_cost(&[0, 1, 2]), 19.0);
        assert_eq!(instance.solution_cost(&[]), 0.0);
    }

    #[test]
    fn test_coverage_count() {
        let instance = ScpCsInstance::parse(Cursor::new(sample_text()), "sample", 1).unwrap();

        assert_eq!(instance.coverage_count(&[0]), 2);
        assert_eq!(instance.coverage_count(&[0, 1]), 3);
        assert!(instance.covers_all(&[2]));
        assert!(!instance.covers_all(&[1]));
    }

    #[test]
    fn test_uncoverable_element_is_constructible() {
        // Element 2 has no covering subset; construction must still succeed.
        let instance =
            ScpCsInstance::new("gap", 3, vec![1.0, 1.0], vec![vec![0], vec![1]], 1).unwrap();

        assert_eq!(instance.reverse_incidence[2].len(), 0);
        assert_eq!(instance.statistics().uncoverable_elements, 1);
        assert!(!instance.covers_all(&[0, 1]));
    }

    #[test]
    fn test_intersection_size() {
        assert_eq!(intersection_size(&[0, 1, 4], &[1, 2, 4]), 2);
        assert_eq!(intersection_size(&[], &[1, 2]), 0);
        assert_eq!(intersection_size(&[3], &[3]), 1);
    }
}
