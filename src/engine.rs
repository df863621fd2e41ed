//! The generation driver.
//!
//! [`Unsga`] owns the configuration, the selector, the reproducer, and the
//! evaluator. A run proceeds as:
//!
//! 1. build and evaluate generation 0;
//! 2. select the current generation into elite and ordinary parts, and
//!    report the elite to the observer;
//! 3. stop after `maximum` generations, or when the observer breaks;
//! 4. reproduce the split into the next generation and go back to 2.
//!
//! ```
//! use unsga::prelude::*;
//!
//! let config = Configuration::builder()
//!     .bounds(vec![-1.0, -1.0], vec![1.0, 1.0])
//!     .population(20)
//!     .division(10)
//!     .maximum(5)
//!     .seed(7)
//!     .build()
//!     .unwrap();
//!
//! let evaluator = |x: &[f64], f: &mut [f64], _: &mut [f64]| {
//!     f[0] = (x[0] - 1.0).powi(2) + x[1].powi(2);
//!     f[1] = (x[0] + 1.0).powi(2) + x[1].powi(2);
//! };
//!
//! let report = Unsga::new(config, evaluator).unwrap().run().unwrap();
//! assert_eq!(report.generations(), 5);
//! assert_eq!(report.elite().len(), 10);
//! ```

use core::ops::ControlFlow;

use crate::config::Configuration;
use crate::error::Result;
use crate::individual::Individual;
use crate::linalg::{LinearAlgebra, Portable};
use crate::pareto;
use crate::population::Population;
use crate::problem::Evaluator;
use crate::reproduction::{Reproducer, VariationReproducer};
use crate::selection::{ReferenceSelector, Selection, Selector};

/// Snapshot handed to the observer after each selection.
#[derive(Clone, Copy, Debug)]
pub struct GenerationReport<'a> {
    generation: usize,
    elite: &'a [Individual],
    ordinary: usize,
}

impl<'a> GenerationReport<'a> {
    /// Index of the generation that was selected.
    #[must_use]
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// The elite set.
    #[must_use]
    pub fn elite(&self) -> &'a [Individual] {
        self.elite
    }

    /// Size of the ordinary pool.
    #[must_use]
    pub fn ordinary(&self) -> usize {
        self.ordinary
    }

    /// Coordinatewise minimum of the elite objectives.
    #[must_use]
    pub fn ideal(&self) -> Vec<f64> {
        let Some(first) = self.elite.first() else {
            return Vec::new();
        };
        let mut ideal = first.objectives().to_vec();
        for individual in &self.elite[1..] {
            for (z, &f) in ideal.iter_mut().zip(individual.objectives()) {
                *z = z.min(f);
            }
        }
        ideal
    }

    /// Mean elite objective vector.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn mean_objectives(&self) -> Vec<f64> {
        let Some(first) = self.elite.first() else {
            return Vec::new();
        };
        let mut mean = vec![0.0; first.objectives().len()];
        for individual in self.elite {
            for (m, &f) in mean.iter_mut().zip(individual.objectives()) {
                *m += f;
            }
        }
        let n = self.elite.len() as f64;
        mean.iter_mut().for_each(|m| *m /= n);
        mean
    }
}

/// Outcome of a run.
#[derive(Clone, Debug, PartialEq)]
pub struct RunReport {
    generations: usize,
    cancelled: bool,
    elite: usize,
    population: Vec<Individual>,
}

impl RunReport {
    /// Number of reproduction steps performed.
    #[must_use]
    pub fn generations(&self) -> usize {
        self.generations
    }

    /// Returns `true` if the observer stopped the run early.
    #[must_use]
    pub fn cancelled(&self) -> bool {
        self.cancelled
    }

    /// Elite set of the last generation.
    #[must_use]
    pub fn elite(&self) -> &[Individual] {
        &self.population[..self.elite]
    }

    /// Whole last generation, elite first.
    #[must_use]
    pub fn population(&self) -> &[Individual] {
        &self.population
    }

    /// Non-dominated members of the last generation.
    #[must_use]
    pub fn first_front(&self) -> Vec<&Individual> {
        pareto::rank_sort(&self.population)
            .into_iter()
            .next()
            .unwrap_or_default()
            .into_iter()
            .map(|i| &self.population[i])
            .collect()
    }

    /// Consumes the report, returning the last generation, elite first.
    #[must_use]
    pub fn into_population(self) -> Vec<Individual> {
        self.population
    }
}

/// Reference-point guided multi-objective optimizer.
pub struct Unsga<E, L = Portable> {
    config: Configuration,
    selector: ReferenceSelector<L>,
    reproducer: VariationReproducer,
    evaluator: E,
}

impl<E: Evaluator> Unsga<E, Portable> {
    /// Creates an optimizer using the portable arithmetic backend.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `config` is inconsistent.
    pub fn new(config: Configuration, evaluator: E) -> Result<Self> {
        Self::with_linalg(config, evaluator, Portable)
    }
}

impl<E: Evaluator, L: LinearAlgebra> Unsga<E, L> {
    /// Creates an optimizer with an explicit arithmetic backend.
    ///
    /// # Errors
    ///
    /// Returns a validation error if `config` is inconsistent.
    pub fn with_linalg(config: Configuration, evaluator: E, linalg: L) -> Result<Self> {
        let config = config.validated()?;
        let selector = ReferenceSelector::with_linalg(
            config.target(),
            config.dimension(),
            config.division(),
            linalg,
        );
        let reproducer = VariationReproducer::new(&config);
        Ok(Self {
            config,
            selector,
            reproducer,
            evaluator,
        })
    }

    /// The validated configuration.
    #[must_use]
    pub fn config(&self) -> &Configuration {
        &self.config
    }

    /// The selector, including its reference lattice.
    #[must_use]
    pub fn selector(&self) -> &ReferenceSelector<L> {
        &self.selector
    }

    /// Consumes the optimizer, returning the evaluator.
    pub fn into_evaluator(self) -> E {
        self.evaluator
    }

    /// Runs `maximum` generations.
    ///
    /// Calling `run` again starts a fresh generation 0 but continues the
    /// random stream, so only the first run of a seeded optimizer matches
    /// another optimizer built from the same configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NonFiniteEvaluation`](crate::Error::NonFiniteEvaluation)
    /// if the evaluator produces NaN or infinite values, and
    /// [`Error::SortInvariant`](crate::Error::SortInvariant) if sorting
    /// breaks the front invariant.
    pub fn run(&mut self) -> Result<RunReport> {
        self.run_with(|_| ControlFlow::Continue(()))
    }

    /// Like [`run`](Self::run), calling `observer` after every selection.
    ///
    /// Returning [`ControlFlow::Break`] ends the run before the next
    /// reproduction step; the report then holds the generation just selected.
    ///
    /// # Errors
    ///
    /// Same as [`run`](Self::run).
    pub fn run_with<F>(&mut self, mut observer: F) -> Result<RunReport>
    where
        F: FnMut(&GenerationReport<'_>) -> ControlFlow<()>,
    {
        let mut population =
            Population::initialize(&self.config, &mut self.reproducer, &mut self.evaluator)?;

        loop {
            let generation = population.generation();
            let Selection { elite, ordinary } = self.selector.select(population.take())?;

            let report = GenerationReport {
                generation,
                elite: &elite,
                ordinary: ordinary.len(),
            };
            trace_info!(
                generation,
                elite = elite.len(),
                ordinary = ordinary.len(),
                ideal = ?report.ideal(),
                "generation selected"
            );

            let flow = observer(&report);
            let cancelled = flow.is_break();
            if cancelled || generation >= self.config.maximum() {
                if cancelled {
                    trace_info!(generation, "run cancelled by observer");
                }
                let elite_len = elite.len();
                let mut last = elite;
                last.extend(ordinary);
                return Ok(RunReport {
                    generations: generation,
                    cancelled,
                    elite: elite_len,
                    population: last,
                });
            }

            let next = self
                .reproducer
                .reproduce(elite, ordinary, &mut self.evaluator)?;
            population.replace(next);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(maximum: usize) -> Configuration {
        Configuration::builder()
            .bounds(vec![0.0, 0.0], vec![1.0, 1.0])
            .population(8)
            .division(4)
            .maximum(maximum)
            .seed(5)
            .build()
            .unwrap()
    }

    fn schaffer(x: &[f64], f: &mut [f64], _: &mut [f64]) {
        f[0] = x[0];
        f[1] = (1.0 - x[0]) + x[1];
    }

    #[test]
    fn zero_generations_selects_initial_population() {
        let report = Unsga::new(config(0), schaffer).unwrap().run().unwrap();
        assert_eq!(report.generations(), 0);
        assert_eq!(report.elite().len(), 4);
        assert_eq!(report.population().len(), 8);
        assert!(!report.cancelled());
    }

    #[test]
    fn observer_sees_every_generation() {
        let mut seen = Vec::new();
        let mut optimizer = Unsga::new(config(3), schaffer).unwrap();
        optimizer
            .run_with(|report| {
                seen.push((report.generation(), report.elite().len(), report.ordinary()));
                ControlFlow::Continue(())
            })
            .unwrap();
        assert_eq!(seen, vec![(0, 4, 4), (1, 4, 4), (2, 4, 4), (3, 4, 4)]);
    }

    #[test]
    fn observer_can_cancel() {
        let mut optimizer = Unsga::new(config(50), schaffer).unwrap();
        let report = optimizer
            .run_with(|report| {
                if report.generation() == 2 {
                    ControlFlow::Break(())
                } else {
                    ControlFlow::Continue(())
                }
            })
            .unwrap();
        assert!(report.cancelled());
        assert_eq!(report.generations(), 2);
        assert_eq!(report.population().len(), 8);
    }

    #[test]
    fn first_front_is_non_dominated() {
        let report = Unsga::new(config(4), schaffer).unwrap().run().unwrap();
        let front = report.first_front();
        assert!(!front.is_empty());
        for a in &front {
            for b in &front {
                assert_eq!(
                    crate::dominance::dominate(*a, *b),
                    crate::dominance::Dominance::NonDominated
                );
            }
        }
    }

    #[test]
    fn report_ideal_and_mean() {
        let layout = crate::individual::Layout::new(1, 2, 0);
        let mut a = Individual::new(layout);
        a.objectives_mut().copy_from_slice(&[1.0, 4.0]);
        let mut b = Individual::new(layout);
        b.objectives_mut().copy_from_slice(&[3.0, 2.0]);
        let elite = [a, b];
        let report = GenerationReport {
            generation: 0,
            elite: &elite,
            ordinary: 0,
        };
        assert_eq!(report.ideal(), vec![1.0, 2.0]);
        assert_eq!(report.mean_objectives(), vec![2.0, 3.0]);
    }
}
