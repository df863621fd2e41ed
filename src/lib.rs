#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(unreachable_pub)]
#![deny(clippy::correctness)]
#![deny(clippy::suspicious)]
#![deny(clippy::style)]
#![deny(clippy::complexity)]
#![deny(clippy::perf)]
#![deny(clippy::pedantic)]
#![deny(clippy::std_instead_of_core)]

//! Reference-point guided multi-objective evolutionary optimization in the
//! NSGA-III family, with constraint handling and mixed integer/continuous
//! decisions.
//!
//! Every generation is sorted into Pareto fronts under constrained
//! dominance, cut down to an elite set by niching around a simplex lattice
//! of reference directions, and refilled by SBX crossover and polynomial
//! mutation.
//!
//! # Getting Started
//!
//! ```
//! use unsga::prelude::*;
//!
//! let config = Configuration::builder()
//!     .bounds(vec![0.0; 3], vec![1.0; 3])
//!     .dimension(2)
//!     .population(40)
//!     .division(12)
//!     .maximum(20)
//!     .seed(1)
//!     .build()
//!     .unwrap();
//!
//! // ZDT1
//! let zdt1 = |x: &[f64], f: &mut [f64], _: &mut [f64]| {
//!     let g = 1.0 + 9.0 * x[1..].iter().sum::<f64>() / (x.len() - 1) as f64;
//!     f[0] = x[0];
//!     f[1] = g * (1.0 - (x[0] / g).sqrt());
//! };
//!
//! let mut optimizer = Unsga::new(config, zdt1).unwrap();
//! let report = optimizer.run().unwrap();
//!
//! assert_eq!(report.elite().len(), 20);
//! for individual in report.first_front() {
//!     println!("{:?} -> {:?}", individual.decisions(), individual.objectives());
//! }
//! ```
//!
//! # Core Concepts
//!
//! | Type | Role |
//! |------|------|
//! | [`Configuration`](config::Configuration) | Validated run settings, from a builder or a named option map. |
//! | [`Evaluator`](problem::Evaluator) | Fills objectives and constraint violations for a decision vector. |
//! | [`Individual`] | One candidate: decisions, objectives, violations in one buffer. |
//! | [`ReferenceSelector`](selection::ReferenceSelector) | Sorting plus reference-direction niching down to the elite set. |
//! | [`VariationReproducer`](reproduction::VariationReproducer) | Crossover, mutation, repair, evaluation. |
//! | [`Unsga`] | Drives the generations and reports the result. |
//!
//! Constraint violations are minimised ahead of objectives: an individual
//! whose violation vector dominates another's wins regardless of objectives.
//!
//! # Feature Flags
//!
//! | Flag | What it enables | Default |
//! |------|----------------|---------|
//! | `nalgebra` | [`Dense`](linalg::Dense) arithmetic backend on `nalgebra` vector views | off |
//! | `serde` | `Serialize`/`Deserialize` on configuration and individuals, [`export::write_json`] | off |
//! | `tracing` | Structured log events via [`tracing`](https://docs.rs/tracing) at each generation | off |

/// Emit a `tracing::info!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_info {
    ($($arg:tt)*) => { tracing::info!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_info {
    ($($arg:tt)*) => {};
}

/// Emit a `tracing::debug!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_debug {
    ($($arg:tt)*) => { tracing::debug!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_debug {
    ($($arg:tt)*) => {};
}

/// Emit a `tracing::warn!` event when the `tracing` feature is enabled.
/// No-op otherwise.
#[cfg(feature = "tracing")]
macro_rules! trace_warn {
    ($($arg:tt)*) => { tracing::warn!($($arg)*) };
}

#[cfg(not(feature = "tracing"))]
macro_rules! trace_warn {
    ($($arg:tt)*) => {};
}

pub mod config;
pub mod dominance;
mod engine;
mod error;
pub mod export;
mod individual;
pub mod linalg;
pub mod pareto;
pub mod population;
pub mod problem;
pub mod reference;
pub mod reproduction;
pub mod selection;

pub use engine::{GenerationReport, RunReport, Unsga};
pub use error::{Error, OutputKind, Result};
pub use individual::{Individual, Layout, Solution};

/// Convenient wildcard import for the most common types.
///
/// ```
/// use unsga::prelude::*;
/// ```
pub mod prelude {
    pub use core::ops::ControlFlow;

    pub use crate::config::{Configuration, ConfigurationBuilder, OptionValue, Options};
    pub use crate::dominance::{Dominance, dominate};
    pub use crate::engine::{GenerationReport, RunReport, Unsga};
    pub use crate::error::{Error, Result};
    pub use crate::individual::{Individual, Layout, Solution};
    #[cfg(feature = "nalgebra")]
    pub use crate::linalg::Dense;
    pub use crate::linalg::{LinearAlgebra, Portable};
    pub use crate::problem::Evaluator;
    pub use crate::reproduction::{Reproducer, VariationReproducer};
    pub use crate::selection::{ReferenceSelector, Selection, Selector};
}
