//! The evaluator boundary.
//!
//! An [`Evaluator`] turns a decision vector into objective and
//! constraint-violation values by writing into caller-provided slices.
//! Closures with the matching signature implement the trait directly:
//!
//! ```
//! use unsga::problem::Evaluator;
//!
//! let mut sphere = |x: &[f64], f: &mut [f64], _g: &mut [f64]| {
//!     f[0] = x.iter().map(|v| v * v).sum();
//! };
//!
//! let mut objectives = [0.0];
//! sphere.evaluate(&[3.0, 4.0], &mut objectives, &mut []);
//! assert_eq!(objectives[0], 25.0);
//! ```
//!
//! Violation values are minimised like objectives; zero (or any value tied
//! across candidates) means the constraint does not discriminate.

use crate::error::{Error, OutputKind, Result};
use crate::individual::Individual;

/// Computes objective and violation values for a decision vector.
///
/// Implementations must write every entry of both output slices. They must
/// not depend on state the optimizer mutates; an evaluator may keep its own
/// counters or caches.
pub trait Evaluator {
    /// Fills `objectives` and `violations` for `decisions`.
    fn evaluate(&mut self, decisions: &[f64], objectives: &mut [f64], violations: &mut [f64]);
}

impl<F> Evaluator for F
where
    F: FnMut(&[f64], &mut [f64], &mut [f64]),
{
    fn evaluate(&mut self, decisions: &[f64], objectives: &mut [f64], violations: &mut [f64]) {
        self(decisions, objectives, violations);
    }
}

/// Evaluates `individual` in place and rejects non-finite output.
///
/// `index` is the individual's position in its generation and is only used
/// for error reporting.
///
/// # Errors
///
/// Returns [`Error::NonFiniteEvaluation`] if any objective or violation
/// value is NaN or infinite.
pub fn evaluate_into<E: Evaluator + ?Sized>(
    evaluator: &mut E,
    individual: &mut Individual,
    index: usize,
) -> Result<()> {
    let (decisions, objectives, violations) = individual.split_for_evaluation();
    evaluator.evaluate(decisions, objectives, violations);

    if !objectives.iter().all(|v| v.is_finite()) {
        trace_warn!(index, "non-finite objective value");
        return Err(Error::NonFiniteEvaluation {
            index,
            kind: OutputKind::Objective,
        });
    }
    if !violations.iter().all(|v| v.is_finite()) {
        trace_warn!(index, "non-finite violation value");
        return Err(Error::NonFiniteEvaluation {
            index,
            kind: OutputKind::Violation,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::individual::Layout;

    #[test]
    fn closure_writes_both_outputs() {
        let mut evaluator = |x: &[f64], f: &mut [f64], g: &mut [f64]| {
            f[0] = x[0] + x[1];
            f[1] = x[0] - x[1];
            g[0] = (x[0] - 1.0).max(0.0);
        };
        let mut ind = Individual::with_decisions(Layout::new(2, 2, 1), &[3.0, 1.0]);
        evaluate_into(&mut evaluator, &mut ind, 0).unwrap();
        assert_eq!(ind.objectives(), &[4.0, 2.0]);
        assert_eq!(ind.violations(), &[2.0]);
    }

    #[test]
    fn nan_objective_is_rejected() {
        let mut evaluator = |_: &[f64], f: &mut [f64], _: &mut [f64]| f[0] = f64::NAN;
        let mut ind = Individual::new(Layout::new(1, 1, 0));
        let err = evaluate_into(&mut evaluator, &mut ind, 7).unwrap_err();
        assert!(matches!(
            err,
            Error::NonFiniteEvaluation {
                index: 7,
                kind: OutputKind::Objective
            }
        ));
    }

    #[test]
    fn infinite_violation_is_rejected() {
        let mut evaluator = |_: &[f64], f: &mut [f64], g: &mut [f64]| {
            f[0] = 0.0;
            g[0] = f64::INFINITY;
        };
        let mut ind = Individual::new(Layout::new(1, 1, 1));
        let err = evaluate_into(&mut evaluator, &mut ind, 2).unwrap_err();
        assert!(matches!(
            err,
            Error::NonFiniteEvaluation {
                index: 2,
                kind: OutputKind::Violation
            }
        ));
    }

    #[test]
    fn stateful_evaluator_struct() {
        struct Counting(usize);
        impl Evaluator for Counting {
            fn evaluate(&mut self, x: &[f64], f: &mut [f64], _: &mut [f64]) {
                self.0 += 1;
                f[0] = x[0].abs();
            }
        }

        let mut counter = Counting(0);
        let mut ind = Individual::with_decisions(Layout::new(1, 1, 0), &[-2.0]);
        evaluate_into(&mut counter, &mut ind, 0).unwrap();
        evaluate_into(&mut counter, &mut ind, 0).unwrap();
        assert_eq!(counter.0, 2);
        assert_eq!(ind.objectives(), &[2.0]);
    }
}
