//! Biased random-key genetic algorithm for SCP-CS.
//!
//! The engine owns the population lifecycle: random initialization, elite
//! retention, mutant injection and biased crossover, with decoder fitness
//! evaluated in parallel. Only chromosomes created in the current generation
//! are decoded; elites carry their fitness forward since the decoder is a
//! pure function of the genes. All randomness stays on the sequential path,
//! so a fixed seed reproduces the same run at any parallelism degree.

use crate::heuristics::decoder::RandomKeyDecoder;
use crate::instance::ScpCsInstance;
use crate::solution::Solution;
use ordered_float::OrderedFloat;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;

/// Smallest value a gene can take
pub const MIN_GENE: f64 = 0.01;
/// Largest value a gene can take
pub const MAX_GENE: f64 = 0.99;

/// A chromosome: one priority key per subset plus its decoded cost.
///
/// Genes never change after creation; fitness is written once, when the
/// chromosome is first evaluated.
#[derive(Debug, Clone)]
pub struct Chromosome {
    pub genes: Vec<f64>,
    pub fitness: f64,
}

/// BRKGA configuration
#[derive(Debug, Clone)]
pub struct BrkgaConfig {
    /// Population size
    pub population_size: usize,
    /// Number of elite chromosomes copied unchanged each generation
    pub elite_count: usize,
    /// Fraction of the population replaced by fresh random chromosomes
    pub mutant_fraction: f64,
    /// Number of generations
    pub generations: usize,
    /// Probability that an offspring gene comes from the elite parent
    pub elite_bias: f64,
    /// Random seed
    pub seed: u64,
}

impl Default for BrkgaConfig {
    fn default() -> Self {
        BrkgaConfig {
            population_size: 128,
            elite_count: 24,
            mutant_fraction: 0.2,
            generations: 500,
            elite_bias: 0.7,
            seed: 42,
        }
    }
}

impl BrkgaConfig {
    /// Number of mutants injected per generation (truncated toward zero).
    pub fn mutant_count(&self) -> usize {
        (self.population_size as f64 * self.mutant_fraction) as usize
    }

    /// Reject configurations that would malform the population.
    pub fn validate(&self) -> Result<(), String> {
        if self.population_size == 0 {
            return Err("population_size must be positive".to_string());
        }
        if self.elite_count == 0 {
            return Err("elite_count must be positive".to_string());
        }
        if self.elite_count >= self.population_size {
            return Err(format!(
                "elite_count ({}) must be smaller than population_size ({})",
                self.elite_count, self.population_size
            ));
        }
        if !(0.0..1.0).contains(&self.mutant_fraction) {
            return Err(format!(
                "mutant_fraction must be in [0, 1), got {}",
                self.mutant_fraction
            ));
        }
        if !(0.0..=1.0).contains(&self.elite_bias) || self.elite_bias == 0.0 {
            return Err(format!(
                "elite_bias must be in (0, 1], got {}",
                self.elite_bias
            ));
        }
        if self.elite_count + self.mutant_count() > self.population_size {
            return Err(format!(
                "elite_count ({}) plus mutants ({}) exceed population_size ({})",
                self.elite_count,
                self.mutant_count(),
                self.population_size
            ));
        }
        Ok(())
    }
}

/// BRKGA engine, one per run.
pub struct Brkga {
    config: BrkgaConfig,
    instance: ScpCsInstance,
    decoder: RandomKeyDecoder,
    population: Vec<Chromosome>,
    rng: ChaCha8Rng,
    generation: usize,
    best_history: Vec<f64>,
}

impl Brkga {
    /// Create an engine for one instance. Fails on a malformed configuration,
    /// before any search happens.
    pub fn new(instance: ScpCsInstance, config: BrkgaConfig) -> Result<Self, String> {
        config.validate()?;
        let rng = ChaCha8Rng::seed_from_u64(config.seed);

        Ok(Brkga {
            config,
            instance,
            decoder: RandomKeyDecoder::new(),
            population: Vec::new(),
            rng,
            generation: 0,
            best_history: Vec::new(),
        })
    }

    /// Generate the initial population and evaluate it.
    pub fn initialize(&mut self) {
        let mut population = Vec::with_capacity(self.config.population_size);
        for _ in 0..self.config.population_size {
            population.push(Chromosome {
                genes: self.random_genes(),
                fitness: f64::INFINITY,
            });
        }

        self.population = population;
        self.generation = 0;
        self.best_history.clear();

        self.evaluate_from(0);
        self.sort_population();
        self.best_history.push(self.population[0].fitness);
    }

    /// Advance one generation: elite copy, mutant injection, crossover fill,
    /// evaluation of the new chromosomes, sort. `initialize` must have run.
    pub fn step(&mut self) {
        let pop_size = self.config.population_size;
        let elite_count = self.config.elite_count;
        let n = self.instance.num_subsets;

        // Elites keep genes and fitness; they are never re-decoded.
        let mut next: Vec<Chromosome> = self.population[..elite_count].to_vec();
        let new_start = next.len();

        for _ in 0..self.config.mutant_count() {
            next.push(Chromosome {
                genes: self.random_genes(),
                fitness: f64::INFINITY,
            });
        }

        // Crossover fills the exact remainder. Parent 1 comes from the elite,
        // parent 2 from the non-elite part of the previous sorted population.
        while next.len() < pop_size {
            let parent1 = self.rng.gen_range(0..elite_count);
            let parent2 = self.rng.gen_range(elite_count..pop_size);

            let mut genes = Vec::with_capacity(n);
            for gene_idx in 0..n {
                let source = if self.rng.gen::<f64>() < self.config.elite_bias {
                    parent1
                } else {
                    parent2
                };
                genes.push(self.population[source].genes[gene_idx]);
            }
            next.push(Chromosome {
                genes,
                fitness: f64::INFINITY,
            });
        }

        self.population = next;
        self.evaluate_from(new_start);
        self.sort_population();

        self.generation += 1;
        self.best_history.push(self.population[0].fitness);
    }

    /// Run the configured number of generations and return the decoded best
    /// solution.
    pub fn run(&mut self) -> Solution {
        let start = std::time::Instant::now();

        self.initialize();
        for _ in 0..self.config.generations {
            self.step();
            log::debug!(
                "[BRKGA] generation {}  best fitness {:.3}",
                self.generation,
                self.best_fitness()
            );
        }

        let mut solution = self.best_solution();
        solution.computation_time = start.elapsed().as_secs_f64();
        solution
    }

    /// Decode the current best chromosome into a solution.
    pub fn best_solution(&self) -> Solution {
        match self.population.first() {
            Some(best) => {
                let decoded = self.decoder.decode(&self.instance, &best.genes);
                let mut solution =
                    Solution::from_selected(&self.instance, decoded.selected, "BRKGA");
                solution.generations = Some(self.generation);
                solution
            }
            None => Solution::new(),
        }
    }

    /// Fitness of the current best chromosome.
    pub fn best_fitness(&self) -> f64 {
        self.population
            .first()
            .map(|c| c.fitness)
            .unwrap_or(f64::INFINITY)
    }

    /// The current best chromosome, if the population is initialized.
    pub fn best_chromosome(&self) -> Option<&Chromosome> {
        self.population.first()
    }

    /// Best fitness at initialization and after every generation.
    pub fn best_history(&self) -> &[f64] {
        &self.best_history
    }

    /// Get current generation
    pub fn current_generation(&self) -> usize {
        self.generation
    }

    fn random_genes(&mut self) -> Vec<f64> {
        (0..self.instance.num_subsets)
            .map(|_| self.rng.gen_range(MIN_GENE..=MAX_GENE))
            .collect()
    }

    /// Decode every chromosome from `start` on. Decoding reads only the
    /// immutable instance and each chromosome's own genes; the parallel
    /// iterator joins before returning, so all fitness values are in place
    /// when sorting starts.
    fn evaluate_from(&mut self, start: usize) {
        let instance = &self.instance;
        let decoder = &self.decoder;

        self.population[start..]
            .par_iter_mut()
            .for_each(|chromosome| {
                chromosome.fitness = decoder.decode_cost(instance, &chromosome.genes);
            });
    }

    fn sort_population(&mut self) {
        self.population
            .sort_by_key(|chromosome| OrderedFloat(chromosome.fitness));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_instance() -> ScpCsInstance {
        // S0 = {0, 1} cost 4, S1 = {1, 2} cost 4, S2 = {0, 1, 2} cost 7
        ScpCsInstance::new(
            "test",
            3,
            vec![4.0, 4.0, 7.0],
            vec![vec![0, 1], vec![1, 2], vec![0, 1, 2]],
            3,
        )
        .unwrap()
    }

    fn small_config() -> BrkgaConfig {
        BrkgaConfig {
            population_size: 16,
            elite_count: 4,
            mutant_fraction: 0.25,
            generations: 25,
            ..Default::default()
        }
    }

    #[test]
    fn test_default_config_is_valid() {
        assert!(BrkgaConfig::default().validate().is_ok());
    }

    #[test]
    fn test_mutant_count_truncates() {
        let config = BrkgaConfig {
            population_size: 128,
            mutant_fraction: 0.2,
            ..Default::default()
        };
        assert_eq!(config.mutant_count(), 25);
    }

    #[test]
    fn test_config_rejects_zero_elite() {
        let config = BrkgaConfig {
            elite_count: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_rejects_elite_not_below_population() {
        let config = BrkgaConfig {
            population_size: 10,
            elite_count: 10,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_rejects_mutant_fraction_of_one() {
        let config = BrkgaConfig {
            mutant_fraction: 1.0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_rejects_elite_plus_mutant_overflow() {
        let config = BrkgaConfig {
            population_size: 10,
            elite_count: 5,
            mutant_fraction: 0.6,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_new_rejects_bad_config() {
        let config = BrkgaConfig {
            elite_count: 0,
            ..Default::default()
        };
        assert!(Brkga::new(create_test_instance(), config).is_err());
    }

    #[test]
    fn test_run_finds_feasible_solution() {
        let mut brkga = Brkga::new(create_test_instance(), small_config()).unwrap();

        let solution = brkga.run();

        assert!(solution.feasible);
        // The only irreducible covers of this instance cost 7 or 8.
        assert!(solution.cost <= 8.0);
        assert_eq!(solution.generations, Some(25));
    }

    #[test]
    fn test_population_size_invariant() {
        let config = small_config();
        let expected = config.population_size;
        let mut brkga = Brkga::new(create_test_instance(), config).unwrap();

        brkga.initialize();
        assert_eq!(brkga.population.len(), expected);

        for _ in 0..5 {
            brkga.step();
            assert_eq!(brkga.population.len(), expected);
        }
    }

    #[test]
    fn test_best_fitness_is_monotonic() {
        let mut brkga = Brkga::new(create_test_instance(), small_config()).unwrap();
        brkga.run();

        let history = brkga.best_history();
        assert_eq!(history.len(), 26);
        for window in history.windows(2) {
            assert!(
                window[1] <= window[0],
                "best fitness must be non-increasing: {} > {}",
                window[1],
                window[0]
            );
        }
    }

    #[test]
    fn test_best_fitness_matches_decoded_cost() {
        let instance = create_test_instance();
        let mut brkga = Brkga::new(instance.clone(), small_config()).unwrap();
        brkga.run();

        let decoder = RandomKeyDecoder::new();
        let best = brkga.best_chromosome().unwrap();
        let recomputed = decoder.decode_cost(&instance, &best.genes);

        assert!((best.fitness - recomputed).abs() < 1e-9);
    }

    #[test]
    fn test_same_seed_reproduces_run() {
        let mut first = Brkga::new(create_test_instance(), small_config()).unwrap();
        let mut second = Brkga::new(create_test_instance(), small_config()).unwrap();

        let sol_first = first.run();
        let sol_second = second.run();

        assert_eq!(first.best_history(), second.best_history());
        assert_eq!(sol_first.selected, sol_second.selected);
        assert_eq!(sol_first.cost, sol_second.cost);
    }
}
