//! Environmental selection guided by reference directions.
//!
//! [`ReferenceSelector::select`] splits a population into an **elite** set of
//! exactly [`target`](Selector::target) individuals and an **ordinary** pool
//! holding everyone else:
//!
//! 1. **Non-dominated sorting**: stratify the population into fronts.
//! 2. **Whole fronts**: accept fronts while they fit entirely.
//! 3. **Niching**: fill the remaining slots from the first front that does
//!    not fit (the *critical* front) with [`ReferenceSelector::dispense`]:
//!    - ideal point: coordinatewise minimum of the reference objectives;
//!    - intercepts: extreme point per axis by achievement scalarizing,
//!      hyperplane through them solved by Doolittle LU, nadir fallback per
//!      axis when the solve is degenerate;
//!    - normalize, associate each point with its nearest reference line by
//!      perpendicular distance;
//!    - repeatedly promote the earliest queued critical of the least crowded
//!      direction.
//!
//! Rejected criticals come first in the ordinary pool, followed by the
//! fronts past the critical one.

use crate::error::{Error, Result};
use crate::individual::Solution;
use crate::linalg::{LinearAlgebra, Portable};
use crate::pareto;
use crate::reference::ReferenceSet;

/// Weight given to the off-axis objectives when searching extreme points.
const ASF_OFF_AXIS_WEIGHT: f64 = 1e-6;

/// Smallest intercept accepted before falling back.
const MIN_INTERCEPT: f64 = 1e-10;

/// Output of one selection step.
#[derive(Clone, Debug, PartialEq)]
pub struct Selection<S> {
    /// Parents carried into reproduction.
    pub elite: Vec<S>,
    /// Everyone else.
    pub ordinary: Vec<S>,
}

/// Environmental selection over candidates of type `S`.
pub trait Selector<S> {
    /// Number of elites each call returns.
    fn target(&self) -> usize;

    /// Splits `population` into elite and ordinary parts.
    ///
    /// `elite.len() == min(target, population.len())` and
    /// `elite.len() + ordinary.len() == population.len()`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::SortInvariant`] if non-dominated sorting produced an
    /// inconsistent stratification.
    fn select(&mut self, population: Vec<S>) -> Result<Selection<S>>;
}

/// NSGA-III style selector with a fixed simplex lattice.
#[derive(Clone, Debug)]
pub struct ReferenceSelector<L = Portable> {
    target: usize,
    references: ReferenceSet,
    ideal: Vec<f64>,
    intercepts: Vec<f64>,
    verify: bool,
    linalg: L,
}

impl ReferenceSelector<Portable> {
    /// Creates a selector returning `target` elites, with a lattice of
    /// resolution `division` over `dimension` objectives.
    #[must_use]
    pub fn new(target: usize, dimension: usize, division: usize) -> Self {
        Self::with_linalg(target, dimension, division, Portable)
    }
}

impl<L: LinearAlgebra> ReferenceSelector<L> {
    /// Like [`ReferenceSelector::new`] with an explicit arithmetic backend.
    #[must_use]
    pub fn with_linalg(target: usize, dimension: usize, division: usize, linalg: L) -> Self {
        Self {
            target,
            references: ReferenceSet::new(dimension, division),
            ideal: vec![f64::INFINITY; dimension],
            intercepts: vec![1.0; dimension],
            verify: true,
            linalg,
        }
    }

    /// Enables or disables the front invariant check after sorting.
    /// Enabled by default.
    #[must_use]
    pub fn verify_fronts(mut self, verify: bool) -> Self {
        self.verify = verify;
        self
    }

    /// The reference lattice.
    #[must_use]
    pub fn references(&self) -> &ReferenceSet {
        &self.references
    }

    /// Ideal point computed by the last niching pass.
    #[must_use]
    pub fn ideal(&self) -> &[f64] {
        &self.ideal
    }

    /// Intercepts computed by the last niching pass.
    #[must_use]
    pub fn intercepts(&self) -> &[f64] {
        &self.intercepts
    }

    /// Fills up to `needed` more elite slots from `criticals` by niching.
    ///
    /// `elites` and `criticals` are indices into `population`. Promoted
    /// criticals are appended to `elites`; the rest are returned in
    /// reference-direction order. Fewer than `needed` are promoted only if
    /// the criticals run out.
    ///
    /// The ideal point and intercepts are computed over the elites, or over
    /// the criticals when there are no elites yet.
    pub fn dispense<S: Solution>(
        &mut self,
        needed: usize,
        population: &[S],
        elites: &mut Vec<usize>,
        criticals: Vec<usize>,
    ) -> Vec<usize> {
        let dimension = self.references.dimension();
        let basis: &[usize] = if elites.is_empty() {
            &criticals
        } else {
            elites.as_slice()
        };

        self.update_ideal(population, basis);
        self.update_intercepts(population, basis);

        let mut normalized = self.linalg.allocate(dimension);
        let mut scratch = self.linalg.allocate(dimension);

        for &elite in elites.iter() {
            self.normalize(population[elite].objectives(), &mut scratch, &mut normalized);
            let nearest = self.nearest(&normalized, &mut scratch);
            self.references.directions_mut()[nearest].attach();
        }
        for &critical in &criticals {
            self.normalize(population[critical].objectives(), &mut scratch, &mut normalized);
            let nearest = self.nearest(&normalized, &mut scratch);
            self.references.directions_mut()[nearest].enqueue(critical);
        }

        let mut remaining = needed;
        while remaining > 0 {
            let Some(chosen) = self.least_crowded() else {
                trace_warn!(remaining, "niching ran out of critical candidates");
                break;
            };
            if let Some(critical) = self.references.directions_mut()[chosen].promote() {
                elites.push(critical);
                remaining -= 1;
            }
        }

        let rejected: Vec<usize> = self
            .references
            .directions_mut()
            .iter_mut()
            .flat_map(|direction| direction.drain_queue().collect::<Vec<_>>())
            .collect();
        self.references.reset();
        rejected
    }

    /// First direction with a non-empty queue and the smallest niche count.
    fn least_crowded(&self) -> Option<usize> {
        let mut best: Option<(usize, usize)> = None;
        for (index, direction) in self.references.directions().iter().enumerate() {
            if direction.queue().is_empty() {
                continue;
            }
            match best {
                Some((_, niche)) if direction.niche() >= niche => {}
                _ => best = Some((index, direction.niche())),
            }
        }
        best.map(|(index, _)| index)
    }

    fn update_ideal<S: Solution>(&mut self, population: &[S], basis: &[usize]) {
        self.ideal.fill(f64::INFINITY);
        for &index in basis {
            for (z, &f) in self.ideal.iter_mut().zip(population[index].objectives()) {
                *z = z.min(f);
            }
        }
    }

    fn update_intercepts<S: Solution>(&mut self, population: &[S], basis: &[usize]) {
        let dimension = self.ideal.len();
        if basis.is_empty() || dimension == 0 {
            self.intercepts.fill(1.0);
            return;
        }

        let mut translated = self.linalg.allocate(dimension);
        let mut extremes = vec![(f64::INFINITY, basis[0]); dimension];
        let mut nadir = vec![f64::NEG_INFINITY; dimension];

        for &index in basis {
            self.linalg
                .sub(population[index].objectives(), &self.ideal, &mut translated);
            for (axis, extreme) in extremes.iter_mut().enumerate() {
                let value = asf(&translated, axis);
                if value < extreme.0 {
                    *extreme = (value, index);
                }
            }
            for (worst, &t) in nadir.iter_mut().zip(&translated) {
                *worst = worst.max(t);
            }
        }

        let mut matrix = self.linalg.allocate(dimension * dimension);
        for (row, &(_, index)) in extremes.iter().enumerate() {
            self.linalg.sub(
                population[index].objectives(),
                &self.ideal,
                &mut matrix[row * dimension..(row + 1) * dimension],
            );
        }
        let mut solution = vec![1.0; dimension];
        doolittle(dimension, &mut matrix, &mut solution);

        for (axis, (intercept, &x)) in self.intercepts.iter_mut().zip(&solution).enumerate() {
            let from_plane = 1.0 / x;
            *intercept = if from_plane.is_finite() && from_plane > MIN_INTERCEPT {
                from_plane
            } else if nadir[axis] > MIN_INTERCEPT {
                trace_debug!(axis, "degenerate hyperplane, using nadir intercept");
                nadir[axis]
            } else {
                1.0
            };
        }
    }

    /// `normalized = (objectives - ideal) / intercepts`.
    fn normalize(&self, objectives: &[f64], translated: &mut [f64], normalized: &mut [f64]) {
        self.linalg.sub(objectives, &self.ideal, translated);
        self.linalg.div(translated, &self.intercepts, normalized);
    }

    /// Index of the direction whose line passes closest to `point`.
    fn nearest(&self, point: &[f64], scratch: &mut [f64]) -> usize {
        let mut best = 0;
        let mut best_distance = f64::INFINITY;
        for (index, direction) in self.references.directions().iter().enumerate() {
            let distance = perpendicular_distance(&self.linalg, direction.point(), point, scratch);
            if distance < best_distance {
                best_distance = distance;
                best = index;
            }
        }
        best
    }
}

impl<S: Solution, L: LinearAlgebra> Selector<S> for ReferenceSelector<L> {
    fn target(&self) -> usize {
        self.target
    }

    fn select(&mut self, population: Vec<S>) -> Result<Selection<S>> {
        let fronts = pareto::sort(&population).map_err(sort_failure)?;
        if self.verify {
            pareto::check_fronts(&population, &fronts).map_err(sort_failure)?;
        }

        let mut fronts = fronts.into_iter();
        let mut elite: Vec<usize> = Vec::with_capacity(self.target);
        let mut ordinary: Vec<usize> = Vec::new();
        let mut critical = None;

        for front in fronts.by_ref() {
            if elite.len() + front.len() <= self.target {
                elite.extend(front);
            } else {
                critical = Some(front);
                break;
            }
        }

        if elite.len() > self.target {
            ordinary.extend(elite.drain(self.target..));
        }

        if let Some(criticals) = critical {
            let needed = self.target - elite.len();
            let mut rejected = if needed > 0 {
                self.dispense(needed, &population, &mut elite, criticals)
            } else {
                criticals
            };
            // Promote leftovers in order if niching could not fill the set.
            let short = self.target.saturating_sub(elite.len()).min(rejected.len());
            elite.extend(rejected.drain(..short));
            ordinary.extend(rejected);
        }
        ordinary.extend(fronts.flatten());

        Ok(partition(population, &elite, &ordinary))
    }
}

fn sort_failure(anomaly: pareto::SortAnomaly) -> Error {
    trace_warn!(%anomaly, "non-dominated sort anomaly");
    Error::SortInvariant(anomaly)
}

/// Moves the individuals at `elite` and `ordinary` positions out of `population`.
fn partition<S>(population: Vec<S>, elite: &[usize], ordinary: &[usize]) -> Selection<S> {
    let mut slots: Vec<Option<S>> = population.into_iter().map(Some).collect();
    let elite = elite.iter().filter_map(|&i| slots[i].take()).collect();
    let ordinary = ordinary.iter().filter_map(|&i| slots[i].take()).collect();
    Selection { elite, ordinary }
}

/// Achievement scalarizing value of a translated point for one axis.
fn asf(translated: &[f64], axis: usize) -> f64 {
    translated
        .iter()
        .enumerate()
        .map(|(j, &t)| {
            let weight = if j == axis { 1.0 } else { ASF_OFF_AXIS_WEIGHT };
            t / weight
        })
        .fold(f64::NEG_INFINITY, f64::max)
}

/// Perpendicular distance from `point` to the line through the origin along
/// `direction`: `|p - (p.d / d.d) d|`.
fn perpendicular_distance<L: LinearAlgebra>(
    linalg: &L,
    direction: &[f64],
    point: &[f64],
    scratch: &mut [f64],
) -> f64 {
    let n = point.len();
    let norm = linalg.dot(n, direction, 1, direction, 1);
    if norm < 1e-30 {
        return f64::INFINITY;
    }
    linalg.copy(n, direction, 1, scratch, 1);
    let fraction = -linalg.dot(n, direction, 1, point, 1) / norm;
    linalg.xpby(n, point, 1, fraction, scratch, 1);
    linalg.dot(n, scratch, 1, scratch, 1).sqrt()
}

/// Solves `A x = b` in place by Doolittle LU factorisation without pivoting.
///
/// `matrix` is row-major `n x n` and is overwritten by the packed factors
/// (unit lower triangle below the diagonal, upper triangle on and above).
/// `rhs` is overwritten by `x`. A zero pivot leaves non-finite entries in
/// `rhs`; callers check for them.
pub(crate) fn doolittle(n: usize, matrix: &mut [f64], rhs: &mut [f64]) {
    for k in 0..n {
        for c in k..n {
            let sum: f64 = (0..k).map(|t| matrix[k * n + t] * matrix[t * n + c]).sum();
            matrix[k * n + c] -= sum;
        }
        for r in (k + 1)..n {
            let sum: f64 = (0..k).map(|t| matrix[r * n + t] * matrix[t * n + k]).sum();
            matrix[r * n + k] = (matrix[r * n + k] - sum) / matrix[k * n + k];
        }
    }

    for i in 1..n {
        let sum: f64 = (0..i).map(|k| matrix[i * n + k] * rhs[k]).sum();
        rhs[i] -= sum;
    }

    for r in (0..n).rev() {
        let sum: f64 = ((r + 1)..n).map(|k| matrix[r * n + k] * rhs[k]).sum();
        rhs[r] = (rhs[r] - sum) / matrix[r * n + r];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::individual::{Individual, Layout};

    #[allow(clippy::cast_precision_loss)]
    fn population(points: &[[f64; 2]]) -> Vec<Individual> {
        let layout = Layout::new(1, 2, 0);
        points
            .iter()
            .enumerate()
            .map(|(i, p)| {
                let mut ind = Individual::with_decisions(layout, &[i as f64]);
                ind.objectives_mut().copy_from_slice(p);
                ind
            })
            .collect()
    }

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    fn tags(individuals: &[Individual]) -> Vec<usize> {
        individuals.iter().map(|i| i.decisions()[0] as usize).collect()
    }

    #[test]
    fn doolittle_solves_small_system() {
        // [2 1; 1 3] x = [1; 1] -> x = [0.4, 0.2]
        let mut matrix = vec![2.0, 1.0, 1.0, 3.0];
        let mut rhs = vec![1.0, 1.0];
        doolittle(2, &mut matrix, &mut rhs);
        assert!((rhs[0] - 0.4).abs() < 1e-12);
        assert!((rhs[1] - 0.2).abs() < 1e-12);
    }

    #[test]
    fn doolittle_three_by_three() {
        let a = [4.0, 3.0, 2.0, 2.0, 5.0, 1.0, 1.0, 2.0, 6.0];
        let x = [1.0, -2.0, 0.5];
        let mut rhs: Vec<f64> = (0..3)
            .map(|r| (0..3).map(|c| a[r * 3 + c] * x[c]).sum())
            .collect();
        let mut matrix = a.to_vec();
        doolittle(3, &mut matrix, &mut rhs);
        for (got, want) in rhs.iter().zip(&x) {
            assert!((got - want).abs() < 1e-10);
        }
    }

    #[test]
    fn doolittle_singular_matrix_is_non_finite() {
        let mut matrix = vec![1.0, 1.0, 1.0, 1.0];
        let mut rhs = vec![1.0, 1.0];
        doolittle(2, &mut matrix, &mut rhs);
        assert!(rhs.iter().any(|x| !x.is_finite()));
    }

    #[test]
    fn perpendicular_distance_to_diagonal() {
        let mut scratch = [0.0; 2];
        let d = perpendicular_distance(&Portable, &[1.0, 1.0], &[1.0, 0.0], &mut scratch);
        assert!((d - 0.5_f64.sqrt()).abs() < 1e-12);
        let on_line = perpendicular_distance(&Portable, &[1.0, 1.0], &[2.0, 2.0], &mut scratch);
        assert!(on_line < 1e-12);
    }

    #[test]
    fn asf_prefers_points_near_the_axis() {
        assert!(asf(&[1.0, 0.0], 0) < asf(&[1.0, 0.1], 0));
        assert!(asf(&[0.0, 5.0], 1) < asf(&[0.01, 0.5], 1));
    }

    #[test]
    fn intercepts_of_linear_front() {
        // Extremes (0, 2) and (4, 0) -> hyperplane x/4 + y/2 = 1.
        let pop = population(&[[0.0, 2.0], [4.0, 0.0], [2.0, 1.0]]);
        let mut selector = ReferenceSelector::new(3, 2, 4);
        selector.update_ideal(&pop, &[0, 1, 2]);
        selector.update_intercepts(&pop, &[0, 1, 2]);
        assert_eq!(selector.ideal(), &[0.0, 0.0]);
        assert!((selector.intercepts()[0] - 4.0).abs() < 1e-9);
        assert!((selector.intercepts()[1] - 2.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_extremes_fall_back_to_nadir() {
        // A single point is the extreme for both axes: singular matrix.
        let pop = population(&[[1.0, 3.0], [2.0, 5.0]]);
        let mut selector = ReferenceSelector::new(1, 2, 4);
        selector.update_ideal(&pop, &[0]);
        selector.update_intercepts(&pop, &[0]);
        // Translated point is (0, 0): nadir is zero too, so unit intercepts.
        assert_eq!(selector.intercepts(), &[1.0, 1.0]);

        selector.update_ideal(&pop, &[0, 1]);
        selector.update_intercepts(&pop, &[0, 1]);
        // Points translate to (0, 0) and (1, 2); (0, 0) is extreme for both
        // axes, so the plane is singular and the nadir (1, 2) is used.
        assert!((selector.intercepts()[0] - 1.0).abs() < 1e-12);
        assert!((selector.intercepts()[1] - 2.0).abs() < 1e-12);
    }

    #[test]
    fn select_accepts_whole_fronts_when_they_fit() {
        let pop = population(&[[3.0, 3.0], [1.0, 2.0], [2.0, 1.0], [4.0, 4.0]]);
        let mut selector = ReferenceSelector::new(3, 2, 4);
        let Selection { elite, ordinary } = selector.select(pop).unwrap();
        assert_eq!(tags(&elite), vec![1, 2, 0]);
        assert_eq!(tags(&ordinary), vec![3]);
    }

    #[test]
    fn select_niches_the_critical_front() {
        // One front of five points spread along x + y = 4; pick two.
        let pop = population(&[[0.0, 4.0], [1.0, 3.0], [2.0, 2.0], [3.0, 1.0], [4.0, 0.0]]);
        let mut selector = ReferenceSelector::new(2, 2, 4);
        let Selection { elite, ordinary } = selector.select(pop).unwrap();
        // Every point sits exactly on its own direction; the first two
        // directions in lattice order win the empty-niche ties.
        assert_eq!(tags(&elite), vec![0, 1]);
        assert_eq!(tags(&ordinary), vec![2, 3, 4]);
        assert!(selector.references().directions().iter().all(|d| d.niche() == 0));
    }

    #[test]
    fn select_prefers_uncrowded_directions() {
        // Front 0 = {0, 1} at the two axis ends, front 1 = {2, 3, 4}.
        let pop = population(&[
            [0.0, 4.0],
            [0.2, 3.9],
            [0.3, 5.0],
            [5.0, 4.1],
            [2.0, 4.5],
        ]);
        let mut selector = ReferenceSelector::new(3, 2, 2);
        let Selection { elite, ordinary } = selector.select(pop).unwrap();
        // 2 and 3 share crowded axis directions with the elites; 4 has the
        // middle direction to itself.
        assert_eq!(tags(&elite), vec![0, 1, 4]);
        assert_eq!(tags(&ordinary), vec![2, 3]);
        assert!((selector.ideal()[1] - 3.9).abs() < 1e-12);
    }

    #[test]
    fn dispense_never_over_promotes() {
        let pop = population(&[[0.0, 4.0], [1.0, 3.0], [2.0, 2.0], [3.0, 1.0], [4.0, 0.0]]);
        let mut selector = ReferenceSelector::new(5, 2, 4);
        for needed in 0..=5 {
            let mut elites = Vec::new();
            let rejected = selector.dispense(needed, &pop, &mut elites, vec![0, 1, 2, 3, 4]);
            assert_eq!(elites.len(), needed);
            assert_eq!(elites.len() + rejected.len(), 5);
            let mut all: Vec<usize> = elites.iter().chain(&rejected).copied().collect();
            all.sort_unstable();
            assert_eq!(all, vec![0, 1, 2, 3, 4]);
        }
    }

    #[test]
    fn dispense_tolerates_too_few_criticals() {
        let pop = population(&[[0.0, 4.0], [4.0, 0.0]]);
        let mut selector = ReferenceSelector::new(5, 2, 4);
        let mut elites = Vec::new();
        let rejected = selector.dispense(5, &pop, &mut elites, vec![0, 1]);
        assert_eq!(elites.len(), 2);
        assert!(rejected.is_empty());
    }

    #[test]
    fn select_smaller_population_than_target() {
        let pop = population(&[[1.0, 1.0], [2.0, 2.0]]);
        let mut selector = ReferenceSelector::new(4, 2, 4);
        let Selection { elite, ordinary } = selector.select(pop).unwrap();
        assert_eq!(elite.len(), 2);
        assert!(ordinary.is_empty());
    }
}
