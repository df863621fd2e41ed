//! The active generation.

use crate::config::Configuration;
use crate::error::Result;
use crate::individual::Individual;
use crate::pareto;
use crate::problem::{Evaluator, evaluate_into};
use crate::reproduction::VariationReproducer;

/// Owns every individual of the current generation.
///
/// A population is never edited in place between generations: the driver
/// takes its individuals out, and installs the next generation with
/// [`replace`](Self::replace).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Population {
    individuals: Vec<Individual>,
    generation: usize,
}

impl Population {
    /// Builds and evaluates generation 0.
    ///
    /// The first individuals copy `config.initial()` (repaired into bounds);
    /// the rest are sampled uniformly by `reproducer`. Extra seed vectors
    /// beyond the population size are ignored.
    ///
    /// # Errors
    ///
    /// Propagates evaluation errors.
    pub fn initialize<E: Evaluator + ?Sized>(
        config: &Configuration,
        reproducer: &mut VariationReproducer,
        evaluator: &mut E,
    ) -> Result<Self> {
        let size = config.population();
        let mut individuals = Vec::with_capacity(size);
        let mut seeds = config.initial().iter();

        for index in 0..size {
            let mut individual = match seeds.next() {
                Some(decisions) => reproducer.seeded(decisions),
                None => reproducer.sample(),
            };
            evaluate_into(evaluator, &mut individual, index)?;
            individuals.push(individual);
        }

        trace_debug!(
            size,
            seeded = config.initial().len().min(size),
            "generation 0 initialised"
        );
        Ok(Self {
            individuals,
            generation: 0,
        })
    }

    /// Wraps already evaluated individuals as generation 0.
    #[must_use]
    pub fn from_individuals(individuals: Vec<Individual>) -> Self {
        Self {
            individuals,
            generation: 0,
        }
    }

    /// Index of the current generation.
    #[must_use]
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Individuals of the current generation.
    #[must_use]
    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    /// Number of individuals.
    #[must_use]
    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    /// Returns `true` if the generation is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    /// Moves the individuals out, leaving the generation empty.
    pub(crate) fn take(&mut self) -> Vec<Individual> {
        core::mem::take(&mut self.individuals)
    }

    /// Installs the next generation.
    pub(crate) fn replace(&mut self, next: Vec<Individual>) {
        self.individuals = next;
        self.generation += 1;
    }

    /// Non-dominated members of the current generation, in population order.
    #[must_use]
    pub fn first_front(&self) -> Vec<&Individual> {
        pareto::rank_sort(&self.individuals)
            .into_iter()
            .next()
            .unwrap_or_default()
            .into_iter()
            .map(|i| &self.individuals[i])
            .collect()
    }

    /// Consumes the population.
    #[must_use]
    pub fn into_individuals(self) -> Vec<Individual> {
        self.individuals
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(initial: Vec<Vec<f64>>) -> Configuration {
        Configuration::builder()
            .bounds(vec![0.0, 0.0], vec![1.0, 1.0])
            .population(6)
            .division(4)
            .initial(initial)
            .seed(17)
            .build()
            .unwrap()
    }

    #[test]
    fn initial_vectors_come_first_and_are_repaired() {
        let config = config(vec![vec![0.25, 0.75], vec![2.0, -1.0]]);
        let mut reproducer = VariationReproducer::new(&config);
        let mut calls = 0;
        let mut evaluator = |x: &[f64], f: &mut [f64], _: &mut [f64]| {
            calls += 1;
            f[0] = x[0];
            f[1] = x[1];
        };
        let population = Population::initialize(&config, &mut reproducer, &mut evaluator).unwrap();

        assert_eq!(calls, 6);
        assert_eq!(population.len(), 6);
        assert_eq!(population.generation(), 0);
        assert_eq!(population.individuals()[0].decisions(), &[0.25, 0.75]);
        assert_eq!(population.individuals()[1].decisions(), &[1.0, 0.0]);
        assert_eq!(population.individuals()[1].objectives(), &[1.0, 0.0]);
    }

    #[test]
    fn first_front_filters_dominated() {
        let config = config(vec![
            vec![0.0, 1.0],
            vec![1.0, 0.0],
            vec![0.5, 0.5],
            vec![0.9, 0.9],
            vec![1.0, 1.0],
            vec![0.6, 0.6],
        ]);
        let mut reproducer = VariationReproducer::new(&config);
        let mut evaluator = |x: &[f64], f: &mut [f64], _: &mut [f64]| f.copy_from_slice(x);
        let population = Population::initialize(&config, &mut reproducer, &mut evaluator).unwrap();

        let front: Vec<&[f64]> = population
            .first_front()
            .into_iter()
            .map(Individual::objectives)
            .collect();
        assert_eq!(front, vec![&[0.0, 1.0][..], &[1.0, 0.0][..], &[0.5, 0.5][..]]);
    }

    #[test]
    fn replace_advances_generation() {
        let mut population = Population::from_individuals(Vec::new());
        let taken = population.take();
        population.replace(taken);
        assert_eq!(population.generation(), 1);
        assert!(population.is_empty());
    }
}
