//! Candidate solutions and their memory layout.
//!
//! An [`Individual`] keeps its decision, objective, and constraint-violation
//! vectors in **one** contiguous allocation. The three logical vectors are
//! exposed as slices into that buffer; their lengths come from the
//! [`Layout`] shared by every individual of a run.
//!
//! ```
//! use unsga::{Individual, Layout};
//!
//! let layout = Layout::new(2, 3, 1);
//! let mut individual = Individual::with_decisions(layout, &[0.5, -0.5]);
//!
//! assert_eq!(individual.decisions(), &[0.5, -0.5]);
//! assert_eq!(individual.objectives().len(), 3);
//! assert_eq!(individual.violations().len(), 1);
//!
//! individual.objectives_mut()[0] = 1.0;
//! assert_eq!(individual.objectives()[0], 1.0);
//! ```

/// Read access to the three vectors every candidate carries.
///
/// Dominance, sorting, and selection are written against this trait so
/// representations with extra per-candidate state (a sparsity mask, say)
/// reuse them unchanged.
pub trait Solution {
    /// Decision variables.
    fn decisions(&self) -> &[f64];
    /// Objective values (minimised).
    fn objectives(&self) -> &[f64];
    /// Constraint-violation values (minimised).
    fn violations(&self) -> &[f64];
}

/// Lengths of the three vectors carried by every individual of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Layout {
    /// Number of decision variables.
    pub scale: usize,
    /// Number of objectives.
    pub dimension: usize,
    /// Number of constraint-violation values.
    pub constraint: usize,
}

impl Layout {
    /// Creates a layout from the decision, objective, and constraint counts.
    #[must_use]
    pub const fn new(scale: usize, dimension: usize, constraint: usize) -> Self {
        Self {
            scale,
            dimension,
            constraint,
        }
    }

    /// Total number of `f64` slots an individual occupies.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.scale + self.dimension + self.constraint
    }

    /// Returns `true` if the layout holds no values at all.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    const fn objective_offset(&self) -> usize {
        self.scale
    }

    const fn violation_offset(&self) -> usize {
        self.scale + self.dimension
    }
}

/// A candidate solution.
///
/// Individuals are owned by exactly one generation. Cloning one copies its
/// buffer; the reproducer uses this to turn parents into offspring.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "RawIndividual"))]
pub struct Individual {
    layout: Layout,
    data: Box<[f64]>,
}

/// Unchecked wire form of an [`Individual`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct RawIndividual {
    layout: Layout,
    data: Vec<f64>,
}

#[cfg(feature = "serde")]
impl TryFrom<RawIndividual> for Individual {
    type Error = crate::Error;

    fn try_from(raw: RawIndividual) -> crate::Result<Self> {
        if raw.data.len() != raw.layout.len() {
            return Err(crate::Error::LayoutMismatch {
                expected: raw.layout.len(),
                got: raw.data.len(),
            });
        }
        Ok(Self {
            layout: raw.layout,
            data: raw.data.into_boxed_slice(),
        })
    }
}

impl Individual {
    /// Creates a zero-filled individual.
    #[must_use]
    pub fn new(layout: Layout) -> Self {
        Self {
            layout,
            data: vec![0.0; layout.len()].into_boxed_slice(),
        }
    }

    /// Creates an individual whose decision vector is copied from `decisions`.
    ///
    /// Objectives and violations start at zero.
    ///
    /// # Panics
    ///
    /// Panics if `decisions.len() != layout.scale`.
    #[must_use]
    pub fn with_decisions(layout: Layout, decisions: &[f64]) -> Self {
        let mut individual = Self::new(layout);
        individual.decisions_mut().copy_from_slice(decisions);
        individual
    }

    /// The layout shared with the rest of the run.
    #[must_use]
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Decision variables.
    #[must_use]
    pub fn decisions(&self) -> &[f64] {
        &self.data[..self.layout.objective_offset()]
    }

    /// Mutable decision variables.
    pub fn decisions_mut(&mut self) -> &mut [f64] {
        let end = self.layout.objective_offset();
        &mut self.data[..end]
    }

    /// Objective values (minimised).
    #[must_use]
    pub fn objectives(&self) -> &[f64] {
        &self.data[self.layout.objective_offset()..self.layout.violation_offset()]
    }

    /// Mutable objective values.
    pub fn objectives_mut(&mut self) -> &mut [f64] {
        let (start, end) = (
            self.layout.objective_offset(),
            self.layout.violation_offset(),
        );
        &mut self.data[start..end]
    }

    /// Constraint-violation values (minimised).
    #[must_use]
    pub fn violations(&self) -> &[f64] {
        &self.data[self.layout.violation_offset()..]
    }

    /// Mutable constraint-violation values.
    pub fn violations_mut(&mut self) -> &mut [f64] {
        let start = self.layout.violation_offset();
        &mut self.data[start..]
    }

    /// Splits the buffer into the decision slice and the two evaluator outputs.
    ///
    /// Used to hand an evaluator read access to the decisions while it
    /// writes objectives and violations, without copying.
    pub fn split_for_evaluation(&mut self) -> (&[f64], &mut [f64], &mut [f64]) {
        let (decisions, rest) = self.data.split_at_mut(self.layout.scale);
        let (objectives, violations) = rest.split_at_mut(self.layout.dimension);
        (decisions, objectives, violations)
    }

    /// Whole backing buffer: decisions, objectives, then violations.
    #[must_use]
    pub fn as_slice(&self) -> &[f64] {
        &self.data
    }
}

impl Solution for Individual {
    fn decisions(&self) -> &[f64] {
        Individual::decisions(self)
    }

    fn objectives(&self) -> &[f64] {
        Individual::objectives(self)
    }

    fn violations(&self) -> &[f64] {
        Individual::violations(self)
    }
}
