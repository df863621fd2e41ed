//! Simplex-lattice reference directions.
//!
//! The lattice holds every point with non-negative coordinates summing to
//! one whose coordinates are multiples of `1 / division` (Das and Dennis,
//! 1998). There are `C(division + dimension - 1, dimension - 1)` of them,
//! generated in lexicographic order of their coordinates.
//!
//! Each direction carries a niche count and a queue of candidates waiting
//! to be assigned. Both are scratch state for a single selection call; the
//! coordinates never change after construction.
//!
//! ```
//! use unsga::reference::{ReferenceSet, n_combinations};
//!
//! let set = ReferenceSet::new(3, 4);
//! assert_eq!(set.len(), n_combinations(4 + 3 - 1, 3 - 1));
//! assert_eq!(set.len(), 15);
//! assert_eq!(set.directions()[0].point(), &[0.0, 0.0, 1.0]);
//! ```

use std::collections::VecDeque;

/// One reference direction and its per-selection bookkeeping.
#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceDirection {
    point: Box<[f64]>,
    niche: usize,
    queue: VecDeque<usize>,
}

impl ReferenceDirection {
    fn new(point: Vec<f64>) -> Self {
        Self {
            point: point.into_boxed_slice(),
            niche: 0,
            queue: VecDeque::new(),
        }
    }

    /// Coordinates on the unit simplex.
    #[must_use]
    pub fn point(&self) -> &[f64] {
        &self.point
    }

    /// Number of selected individuals associated with this direction.
    #[must_use]
    pub fn niche(&self) -> usize {
        self.niche
    }

    /// Candidates waiting on this direction, earliest first.
    #[must_use]
    pub fn queue(&self) -> &VecDeque<usize> {
        &self.queue
    }

    pub(crate) fn attach(&mut self) {
        self.niche += 1;
    }

    pub(crate) fn enqueue(&mut self, candidate: usize) {
        self.queue.push_back(candidate);
    }

    /// Pops the earliest queued candidate and counts it into the niche.
    pub(crate) fn promote(&mut self) -> Option<usize> {
        let candidate = self.queue.pop_front()?;
        self.niche += 1;
        Some(candidate)
    }

    pub(crate) fn drain_queue(&mut self) -> impl Iterator<Item = usize> + '_ {
        self.queue.drain(..)
    }

    pub(crate) fn reset(&mut self) {
        self.niche = 0;
        self.queue.clear();
    }
}

/// The full lattice for one optimizer run.
#[derive(Clone, Debug, PartialEq)]
pub struct ReferenceSet {
    dimension: usize,
    division: usize,
    directions: Vec<ReferenceDirection>,
}

impl ReferenceSet {
    /// Builds the lattice for `dimension` objectives at resolution `division`.
    ///
    /// A zero `dimension` yields an empty set. A zero `division` yields the
    /// single all-zero point; configuration validation rejects it.
    #[must_use]
    pub fn new(dimension: usize, division: usize) -> Self {
        let mut points = Vec::with_capacity(n_combinations(
            (division + dimension).saturating_sub(1),
            dimension.saturating_sub(1),
        ));
        if dimension > 0 {
            lattice(dimension, division, &mut points);
        }

        Self {
            dimension,
            division,
            directions: points.into_iter().map(ReferenceDirection::new).collect(),
        }
    }

    /// Number of objectives.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Lattice resolution.
    #[must_use]
    pub fn division(&self) -> usize {
        self.division
    }

    /// Number of directions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.directions.len()
    }

    /// Returns `true` if the set holds no directions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.directions.is_empty()
    }

    /// All directions in lattice order.
    #[must_use]
    pub fn directions(&self) -> &[ReferenceDirection] {
        &self.directions
    }

    pub(crate) fn directions_mut(&mut self) -> &mut [ReferenceDirection] {
        &mut self.directions
    }

    /// Clears every niche count and queue.
    pub(crate) fn reset(&mut self) {
        self.directions.iter_mut().for_each(ReferenceDirection::reset);
    }
}

/// Walks the integer compositions of `division` into `dimension` parts in
/// lexicographic order and scales each onto the simplex.
#[allow(clippy::cast_precision_loss)]
fn lattice(dimension: usize, division: usize, points: &mut Vec<Vec<f64>>) {
    let scale = division.max(1) as f64;
    let mut counts = vec![0usize; dimension];
    counts[dimension - 1] = division;

    loop {
        points.push(counts.iter().map(|&c| c as f64 / scale).collect());

        // the rightmost part that can still grow borrows from its tail
        let mut tail = 0;
        let Some(pivot) = (0..dimension - 1).rev().find(|&i| {
            tail += counts[i + 1];
            tail > 0
        }) else {
            break;
        };
        counts[pivot] += 1;
        counts[pivot + 1..].fill(0);
        counts[dimension - 1] = tail - 1;
    }
}

/// Computes `C(n, k)`, saturating on overflow.
#[must_use]
pub fn n_combinations(n: usize, k: usize) -> usize {
    if k > n {
        return 0;
    }
    (0..k.min(n - k)).fold(1usize, |acc, i| acc.saturating_mul(n - i) / (i + 1))
}
