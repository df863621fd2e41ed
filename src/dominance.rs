//! Constrained Pareto dominance under minimisation.
//!
//! Two individuals are compared on their constraint-violation vectors
//! first. Only when neither violation vector dominates the other (which
//! includes the all-equal case and the case of no constraints at all) are
//! the objective vectors compared.
//!
//! Coordinates closer than [`EPSILON`] count as tied.
//!
//! ```
//! use unsga::dominance::{Dominance, compare};
//!
//! assert_eq!(compare(&[1.0, 2.0], &[1.0, 3.0]), Dominance::ADominates);
//! assert_eq!(compare(&[1.0, 3.0], &[2.0, 2.0]), Dominance::NonDominated);
//! assert_eq!(compare(&[1.0, 1.0], &[1.0 + 1e-9, 1.0]), Dominance::NonDominated);
//! ```

use crate::individual::Solution;

/// Absolute tolerance under which two coordinates are considered equal.
pub const EPSILON: f64 = 1e-6;

/// Outcome of a dominance test between `a` and `b`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dominance {
    /// `a` dominates `b`.
    ADominates,
    /// `b` dominates `a`.
    BDominates,
    /// Neither dominates the other.
    NonDominated,
}

impl Dominance {
    /// The same relation seen from the other side.
    #[must_use]
    pub const fn reversed(self) -> Self {
        match self {
            Self::ADominates => Self::BDominates,
            Self::BDominates => Self::ADominates,
            Self::NonDominated => Self::NonDominated,
        }
    }
}

/// Compares two equally long vectors coordinate by coordinate.
///
/// `a` dominates when it is nowhere worse and strictly better somewhere;
/// vectors that tie everywhere are non-dominated.
#[must_use]
pub fn compare(a: &[f64], b: &[f64]) -> Dominance {
    debug_assert_eq!(a.len(), b.len());

    let mut a_better = false;
    let mut b_better = false;
    for (&x, &y) in a.iter().zip(b) {
        if (x - y).abs() < EPSILON {
            continue;
        }
        if x < y {
            a_better = true;
        } else {
            b_better = true;
        }
        if a_better && b_better {
            return Dominance::NonDominated;
        }
    }

    match (a_better, b_better) {
        (true, false) => Dominance::ADominates,
        (false, true) => Dominance::BDominates,
        _ => Dominance::NonDominated,
    }
}

/// Constrained dominance test between two candidates.
#[must_use]
pub fn dominate<S: Solution + ?Sized>(a: &S, b: &S) -> Dominance {
    match compare(a.violations(), b.violations()) {
        Dominance::NonDominated => compare(a.objectives(), b.objectives()),
        decided => decided,
    }
}
