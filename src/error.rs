use crate::pareto::SortAnomaly;

/// Errors produced while configuring or running the optimizer.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Returned when an option holds a value outside its accepted range.
    #[error("invalid configuration for '{option}': {reason}")]
    InvalidConfiguration {
        /// The name of the offending option.
        option: &'static str,
        /// Why the value was rejected.
        reason: String,
    },

    /// Returned when a required option is absent from an option map.
    #[error("missing required option '{0}'")]
    MissingOption(&'static str),

    /// Returned when an option map entry holds the wrong kind of value.
    #[error("option '{option}' must be {expected}")]
    OptionType {
        /// The name of the offending option.
        option: &'static str,
        /// Human-readable description of the expected kind.
        expected: &'static str,
    },

    /// Returned when a per-decision vector does not have `scale` entries.
    #[error("option '{option}' has {got} entries, expected {expected}")]
    BoundsLength {
        /// The name of the offending option.
        option: &'static str,
        /// The expected length (the decision count).
        expected: usize,
        /// The actual length.
        got: usize,
    },

    /// Returned when a lower bound exceeds its upper bound.
    #[error("invalid bounds for decision {index}: expected finite lower ({lower}) <= upper ({upper})")]
    InvalidBounds {
        /// The decision index.
        index: usize,
        /// The lower bound.
        lower: f64,
        /// The upper bound.
        upper: f64,
    },

    /// Returned when a probability is not within `[0, 1]`.
    #[error("invalid probability for '{option}': {value} must be in [0.0, 1.0]")]
    InvalidProbability {
        /// The name of the offending option.
        option: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// Returned when the population size is too small or odd.
    #[error("population must be an even number >= 2, got {0}")]
    InvalidPopulation(usize),

    /// Returned when the reference lattice resolution is zero.
    #[error("division must be >= 1")]
    InvalidDivision,

    /// Returned when an initial decision vector has the wrong length.
    #[error("initial vector {index} has {got} decisions, expected {expected}")]
    InitialLength {
        /// Position of the vector in the `initial` list.
        index: usize,
        /// The expected length.
        expected: usize,
        /// The actual length.
        got: usize,
    },

    /// Returned when a stored individual's buffer disagrees with its layout.
    #[error("individual buffer holds {got} values, layout expects {expected}")]
    LayoutMismatch {
        /// Slots required by the layout.
        expected: usize,
        /// Values actually present.
        got: usize,
    },

    /// Returned when the evaluator writes a NaN or infinite value.
    #[error("evaluator produced a non-finite {kind} value for individual {index}")]
    NonFiniteEvaluation {
        /// Position of the individual in the generation being evaluated.
        index: usize,
        /// Which output vector held the value.
        kind: OutputKind,
    },

    /// Returned when non-dominated sorting breaks its own invariant.
    #[error("non-dominated sort invariant violated: {0}")]
    SortInvariant(SortAnomaly),

    /// Returned when the result sink fails.
    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// Returned when JSON serialisation of results fails.
    #[cfg(feature = "serde")]
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The evaluator output vector an [`Error::NonFiniteEvaluation`] refers to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputKind {
    /// The objective vector.
    Objective,
    /// The constraint-violation vector.
    Violation,
}

impl core::fmt::Display for OutputKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Objective => write!(f, "objective"),
            Self::Violation => write!(f, "violation"),
        }
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = core::result::Result<T, Error>;
