//! Variation: crossover, mutation, repair, and re-evaluation.
//!
//! [`VariationReproducer`] turns an elite/ordinary split into the next
//! generation. The elite set is carried over unchanged and the rest of the
//! generation is filled with offspring:
//!
//! - the father is drawn uniformly from the elite set, the mother from elite
//!   and ordinary together;
//! - with probability `cross` the pair is recombined gene by gene with
//!   simulated binary crossover (SBX);
//! - every gene of each child is then mutated with probability `mutation`
//!   by polynomial mutation;
//! - [`repair`] clips decisions to their bounds and rounds integer genes;
//! - the child is evaluated.
//!
//! One [`fastrand::Rng`] drives every stochastic choice, including the
//! generation-0 sampling in [`VariationReproducer::sample`]. A fixed seed
//! makes a whole run reproducible.

use crate::config::Configuration;
use crate::error::Result;
use crate::individual::{Individual, Layout};
use crate::problem::{Evaluator, evaluate_into};

/// Parents closer than this on a gene are not recombined on it.
const SBX_MIN_GAP: f64 = 1e-14;

/// Produces the next generation from a selected split.
pub trait Reproducer<S> {
    /// Number of individuals every generation holds.
    fn population(&self) -> usize;

    /// Builds and evaluates the next generation.
    ///
    /// The result holds exactly [`population`](Self::population)
    /// individuals.
    ///
    /// # Errors
    ///
    /// Propagates evaluation errors.
    fn reproduce<E: Evaluator + ?Sized>(
        &mut self,
        elite: Vec<S>,
        ordinary: Vec<S>,
        evaluator: &mut E,
    ) -> Result<Vec<S>>;
}

/// SBX crossover plus polynomial mutation over bounded real decisions.
#[derive(Clone, Debug)]
pub struct VariationReproducer {
    rng: fastrand::Rng,
    layout: Layout,
    population: usize,
    cross: f64,
    mutation: f64,
    crossover_eta: f64,
    mutation_eta: f64,
    lower: Vec<f64>,
    upper: Vec<f64>,
    integer: Vec<bool>,
}

impl VariationReproducer {
    /// Creates a reproducer for `config`, seeded from `config.seed()` or
    /// from entropy.
    #[must_use]
    pub fn new(config: &Configuration) -> Self {
        let rng = config
            .seed()
            .map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed);
        Self {
            rng,
            layout: config.layout(),
            population: config.population(),
            cross: config.cross(),
            mutation: config.mutation(),
            crossover_eta: config.crossover_eta(),
            mutation_eta: config.mutation_eta(),
            lower: config.lower().to_vec(),
            upper: config.upper().to_vec(),
            integer: config.integer().to_vec(),
        }
    }

    /// Layout of the individuals this reproducer creates.
    #[must_use]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Draws an unevaluated individual uniformly within the bounds.
    pub fn sample(&mut self) -> Individual {
        let mut individual = Individual::new(self.layout);
        for ((x, &low), &high) in individual
            .decisions_mut()
            .iter_mut()
            .zip(&self.lower)
            .zip(&self.upper)
        {
            *x = uniform(&mut self.rng, low, high);
        }
        self.repair(&mut individual);
        individual
    }

    /// Creates an unevaluated individual from supplied decisions, repaired.
    #[must_use]
    pub fn seeded(&self, decisions: &[f64]) -> Individual {
        let mut individual = Individual::with_decisions(self.layout, decisions);
        self.repair(&mut individual);
        individual
    }

    /// Clips and rounds the decisions of `individual` in place.
    pub fn repair(&self, individual: &mut Individual) {
        repair(
            individual.decisions_mut(),
            &self.lower,
            &self.upper,
            &self.integer,
        );
    }

    /// Recombines two decision vectors in place with probability `cross`.
    fn crossover(&mut self, son: &mut [f64], daughter: &mut [f64]) {
        if self.rng.f64() >= self.cross {
            return;
        }
        for (i, (a, b)) in son.iter_mut().zip(daughter.iter_mut()).enumerate() {
            if (*a - *b).abs() < SBX_MIN_GAP {
                continue;
            }
            let (c1, c2) = sbx(
                &mut self.rng,
                *a,
                *b,
                self.lower[i],
                self.upper[i],
                self.crossover_eta,
            );
            *a = c1;
            *b = c2;
        }
    }

    /// Mutates each gene of `decisions` with probability `mutation`.
    fn mutate(&mut self, decisions: &mut [f64]) {
        for (i, x) in decisions.iter_mut().enumerate() {
            if self.rng.f64() >= self.mutation {
                continue;
            }
            *x = polynomial_mutation(
                &mut self.rng,
                *x,
                self.lower[i],
                self.upper[i],
                self.mutation_eta,
            );
        }
    }

    /// Picks a father from `elite` and a mother from `elite` then `ordinary`.
    fn parents<'a>(
        &mut self,
        elite: &'a [Individual],
        ordinary: &'a [Individual],
    ) -> Option<(&'a Individual, &'a Individual)> {
        let fathers = if elite.is_empty() { ordinary } else { elite };
        if fathers.is_empty() {
            return None;
        }
        let father = &fathers[self.rng.usize(..fathers.len())];
        let pick = self.rng.usize(..elite.len() + ordinary.len());
        let mother = if pick < elite.len() {
            &elite[pick]
        } else {
            &ordinary[pick - elite.len()]
        };
        Some((father, mother))
    }
}

impl Reproducer<Individual> for VariationReproducer {
    fn population(&self) -> usize {
        self.population
    }

    /// Keeps the elite and fills the rest with offspring.
    ///
    /// Each pair takes its father from the elite and its mother from the
    /// elite and ordinary individuals together, so every child has at least
    /// one elite parent. With an empty elite the father comes from the
    /// ordinary individuals; with both empty the offspring are sampled.
    fn reproduce<E: Evaluator + ?Sized>(
        &mut self,
        elite: Vec<Individual>,
        ordinary: Vec<Individual>,
        evaluator: &mut E,
    ) -> Result<Vec<Individual>> {
        let carried = elite.len().min(self.population);
        let needed = self.population - carried;
        let mut offspring = Vec::with_capacity(needed);

        while offspring.len() < needed {
            let Some((father, mother)) = self.parents(&elite, &ordinary) else {
                offspring.push(self.sample());
                continue;
            };
            let mut son = father.clone();
            let mut daughter = mother.clone();

            self.crossover(son.decisions_mut(), daughter.decisions_mut());
            self.mutate(son.decisions_mut());
            self.mutate(daughter.decisions_mut());
            self.repair(&mut son);
            self.repair(&mut daughter);

            offspring.push(son);
            if offspring.len() < needed {
                offspring.push(daughter);
            }
        }

        for (position, child) in offspring.iter_mut().enumerate() {
            evaluate_into(evaluator, child, carried + position)?;
        }

        let mut next = elite;
        next.truncate(carried);
        next.extend(offspring);
        Ok(next)
    }
}

/// Clips every decision into `[lower, upper]` and rounds integer genes.
///
/// Rounded values are clipped again, so when the bounds enclose no whole
/// number the nearer bound wins. Applying `repair` twice gives the same
/// result as applying it once.
pub fn repair(decisions: &mut [f64], lower: &[f64], upper: &[f64], integer: &[bool]) {
    for (i, x) in decisions.iter_mut().enumerate() {
        let (low, high) = (lower[i], upper[i]);
        *x = x.max(low).min(high);
        if integer.get(i).copied().unwrap_or(false) {
            *x = x.round().max(low).min(high);
        }
    }
}

#[inline]
fn uniform(rng: &mut fastrand::Rng, low: f64, high: f64) -> f64 {
    low + rng.f64() * (high - low)
}

/// Spread factor of simulated binary crossover for a uniform draw `u`.
fn spread(u: f64, eta: f64) -> f64 {
    let base = if u <= 0.5 { 2.0 * u } else { 1.0 / (2.0 * (1.0 - u)) };
    base.powf((eta + 1.0).recip())
}

/// SBX on one gene: both children sit symmetrically around the parents'
/// midpoint, `spread` times as far apart as the parents.
fn sbx(rng: &mut fastrand::Rng, p1: f64, p2: f64, low: f64, high: f64, eta: f64) -> (f64, f64) {
    let beta = spread(rng.f64(), eta);
    let mid = 0.5 * (p1 + p2);
    let half = 0.5 * beta * (p1 - p2);
    ((mid + half).max(low).min(high), (mid - half).max(low).min(high))
}

/// Polynomial mutation of one gene (Deb and Goyal, 1996).
///
/// The perturbation is drawn towards the lower bound for `u < 0.5` and
/// towards the upper bound otherwise, damped by the gene's distance to
/// that bound.
fn polynomial_mutation(rng: &mut fastrand::Rng, x: f64, low: f64, high: f64, eta: f64) -> f64 {
    let range = high - low;
    if range <= 0.0 {
        return x;
    }
    let u = rng.f64();
    let power = eta + 1.0;

    let delta = if u < 0.5 {
        let slack = (high - x) / range;
        (2.0 * u + (1.0 - 2.0 * u) * slack.powf(power)).powf(power.recip()) - 1.0
    } else {
        let slack = (x - low) / range;
        1.0 - (2.0 * (1.0 - u) + 2.0 * (u - 0.5) * slack.powf(power)).powf(power.recip())
    };

    (x + delta * range).max(low).min(high)
}
