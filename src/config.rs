//! Optimizer configuration.
//!
//! A [`Configuration`] can be assembled with the fluent
//! [`ConfigurationBuilder`] or read from a named option map
//! ([`Options`]). Both paths end in the same validation.
//!
//! # Option map keys
//!
//! | Key | Kind | Required | Default |
//! |---|---|---|---|
//! | `scale` | unsigned | yes | |
//! | `dimension` | unsigned | yes | |
//! | `constraint` | unsigned | no | 0 |
//! | `population` | unsigned, even, ≥ 2 | yes | |
//! | `division` | unsigned, ≥ 1 | yes | |
//! | `cross` | real in [0, 1] | yes | |
//! | `mutation` | real in [0, 1] | yes | |
//! | `maximum` | unsigned | yes | |
//! | `upper`, `lower` | reals, length `scale` | yes | |
//! | `integer` | flags, length `scale` | no | all continuous |
//! | `initial` | list of decision vectors | no | none |
//! | `seed` | unsigned | no | entropy |
//! | `crossover_eta` | real | no | 30 |
//! | `mutation_eta` | real | no | 20 |
//!
//! ```
//! use unsga::config::{Configuration, OptionValue, Options};
//!
//! let mut options = Options::new();
//! options.insert("scale".into(), OptionValue::Unsigned(2));
//! options.insert("dimension".into(), OptionValue::Unsigned(2));
//! options.insert("population".into(), OptionValue::Unsigned(20));
//! options.insert("division".into(), OptionValue::Unsigned(10));
//! options.insert("cross".into(), OptionValue::Real(0.8));
//! options.insert("mutation".into(), OptionValue::Real(0.8));
//! options.insert("maximum".into(), OptionValue::Unsigned(5));
//! options.insert("upper".into(), OptionValue::Reals(vec![1.0, 1.0]));
//! options.insert("lower".into(), OptionValue::Reals(vec![-1.0, -1.0]));
//!
//! let config = Configuration::from_options(&options).unwrap();
//! assert_eq!(config.target(), 10);
//! assert_eq!(config.integer(), &[false, false]);
//! ```

use std::collections::BTreeMap;

use crate::error::{Error, Result};
use crate::individual::Layout;

/// Default SBX distribution index.
pub const DEFAULT_CROSSOVER_ETA: f64 = 30.0;

/// Default polynomial-mutation distribution index.
pub const DEFAULT_MUTATION_ETA: f64 = 20.0;

/// Named option map accepted by [`Configuration::from_options`].
pub type Options = BTreeMap<String, OptionValue>;

/// One value of an [`Options`] map.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
pub enum OptionValue {
    /// A count or seed.
    Unsigned(u64),
    /// A real number. Unsigned values are accepted where a real is expected.
    Real(f64),
    /// Per-decision real values.
    Reals(Vec<f64>),
    /// Per-decision flags.
    Flags(Vec<bool>),
    /// A list of decision vectors.
    Vectors(Vec<Vec<f64>>),
}

impl From<u64> for OptionValue {
    fn from(value: u64) -> Self {
        Self::Unsigned(value)
    }
}

impl From<f64> for OptionValue {
    fn from(value: f64) -> Self {
        Self::Real(value)
    }
}

impl From<Vec<f64>> for OptionValue {
    fn from(value: Vec<f64>) -> Self {
        Self::Reals(value)
    }
}

impl From<Vec<bool>> for OptionValue {
    fn from(value: Vec<bool>) -> Self {
        Self::Flags(value)
    }
}

impl From<Vec<Vec<f64>>> for OptionValue {
    fn from(value: Vec<Vec<f64>>) -> Self {
        Self::Vectors(value)
    }
}

/// Validated optimizer settings.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Configuration {
    scale: usize,
    dimension: usize,
    #[cfg_attr(feature = "serde", serde(default))]
    constraint: usize,
    population: usize,
    division: usize,
    cross: f64,
    mutation: f64,
    maximum: usize,
    upper: Vec<f64>,
    lower: Vec<f64>,
    #[cfg_attr(feature = "serde", serde(default))]
    integer: Vec<bool>,
    #[cfg_attr(feature = "serde", serde(default))]
    initial: Vec<Vec<f64>>,
    #[cfg_attr(feature = "serde", serde(default))]
    seed: Option<u64>,
    #[cfg_attr(feature = "serde", serde(default = "default_crossover_eta"))]
    crossover_eta: f64,
    #[cfg_attr(feature = "serde", serde(default = "default_mutation_eta"))]
    mutation_eta: f64,
}

#[cfg(feature = "serde")]
fn default_crossover_eta() -> f64 {
    DEFAULT_CROSSOVER_ETA
}

#[cfg(feature = "serde")]
fn default_mutation_eta() -> f64 {
    DEFAULT_MUTATION_ETA
}

impl Configuration {
    /// Starts a fluent builder.
    #[must_use]
    pub fn builder() -> ConfigurationBuilder {
        ConfigurationBuilder::new()
    }

    /// Reads and validates a configuration from a named option map.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingOption`] or [`Error::OptionType`] for absent or
    /// mistyped entries, and any validation error listed on
    /// [`Configuration::validated`].
    pub fn from_options(options: &Options) -> Result<Self> {
        let scale = unsigned(options, "scale")?;
        let config = Self {
            scale,
            dimension: unsigned(options, "dimension")?,
            constraint: optional(options, "constraint", unsigned)?.unwrap_or(0),
            population: unsigned(options, "population")?,
            division: unsigned(options, "division")?,
            cross: real(options, "cross")?,
            mutation: real(options, "mutation")?,
            maximum: unsigned(options, "maximum")?,
            upper: reals(options, "upper")?,
            lower: reals(options, "lower")?,
            integer: optional(options, "integer", flags)?.unwrap_or_default(),
            initial: optional(options, "initial", vectors)?.unwrap_or_default(),
            seed: optional(options, "seed", unsigned_u64)?,
            crossover_eta: optional(options, "crossover_eta", real)?
                .unwrap_or(DEFAULT_CROSSOVER_ETA),
            mutation_eta: optional(options, "mutation_eta", real)?
                .unwrap_or(DEFAULT_MUTATION_ETA),
        };
        config.validated()
    }

    fn fill_defaults(&mut self) {
        if self.integer.is_empty() {
            self.integer = vec![false; self.scale];
        }
    }

    /// Fills omitted optional vectors and checks every cross-field
    /// constraint.
    ///
    /// Configurations produced by the builder or by
    /// [`from_options`](Self::from_options) have already been through this;
    /// call it on values obtained another way (deserialisation, say).
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidConfiguration`] for zero `scale` or `dimension`, or a
    ///   non-positive distribution index.
    /// - [`Error::InvalidPopulation`] unless `population` is even and ≥ 2.
    /// - [`Error::InvalidDivision`] for a zero `division`.
    /// - [`Error::InvalidProbability`] for `cross` or `mutation` outside [0, 1].
    /// - [`Error::BoundsLength`] when `upper`, `lower`, or `integer` do not
    ///   have `scale` entries.
    /// - [`Error::InvalidBounds`] when a bound is not finite or a lower bound
    ///   exceeds its upper bound.
    /// - [`Error::InitialLength`] for a seed vector of the wrong length.
    pub fn validated(mut self) -> Result<Self> {
        self.fill_defaults();
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<()> {
        if self.scale == 0 {
            return Err(invalid("scale", "must be at least 1"));
        }
        if self.dimension == 0 {
            return Err(invalid("dimension", "must be at least 1"));
        }
        if self.population < 2 || !self.population.is_multiple_of(2) {
            return Err(Error::InvalidPopulation(self.population));
        }
        if self.division == 0 {
            return Err(Error::InvalidDivision);
        }
        for (option, value) in [("cross", self.cross), ("mutation", self.mutation)] {
            if !(0.0..=1.0).contains(&value) {
                return Err(Error::InvalidProbability { option, value });
            }
        }
        for (option, value) in [
            ("crossover_eta", self.crossover_eta),
            ("mutation_eta", self.mutation_eta),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(invalid(option, "must be a finite non-negative number"));
            }
        }
        for (option, got) in [
            ("upper", self.upper.len()),
            ("lower", self.lower.len()),
            ("integer", self.integer.len()),
        ] {
            if got != self.scale {
                return Err(Error::BoundsLength {
                    option,
                    expected: self.scale,
                    got,
                });
            }
        }
        for (index, (&lower, &upper)) in self.lower.iter().zip(&self.upper).enumerate() {
            if !lower.is_finite() || !upper.is_finite() || lower > upper {
                return Err(Error::InvalidBounds {
                    index,
                    lower,
                    upper,
                });
            }
        }
        for (index, initial) in self.initial.iter().enumerate() {
            if initial.len() != self.scale {
                return Err(Error::InitialLength {
                    index,
                    expected: self.scale,
                    got: initial.len(),
                });
            }
        }
        Ok(())
    }

    /// Number of decision variables.
    #[must_use]
    pub fn scale(&self) -> usize {
        self.scale
    }

    /// Number of objectives.
    #[must_use]
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Number of constraint-violation values.
    #[must_use]
    pub fn constraint(&self) -> usize {
        self.constraint
    }

    /// Individuals per generation.
    #[must_use]
    pub fn population(&self) -> usize {
        self.population
    }

    /// Elite set size, half the population.
    #[must_use]
    pub fn target(&self) -> usize {
        self.population / 2
    }

    /// Simplex lattice resolution.
    #[must_use]
    pub fn division(&self) -> usize {
        self.division
    }

    /// Probability that a parent pair is recombined.
    #[must_use]
    pub fn cross(&self) -> f64 {
        self.cross
    }

    /// Per-gene mutation probability.
    #[must_use]
    pub fn mutation(&self) -> f64 {
        self.mutation
    }

    /// Number of generations to run.
    #[must_use]
    pub fn maximum(&self) -> usize {
        self.maximum
    }

    /// Per-decision upper bounds.
    #[must_use]
    pub fn upper(&self) -> &[f64] {
        &self.upper
    }

    /// Per-decision lower bounds.
    #[must_use]
    pub fn lower(&self) -> &[f64] {
        &self.lower
    }

    /// Per-decision integer flags.
    #[must_use]
    pub fn integer(&self) -> &[bool] {
        &self.integer
    }

    /// Seed decision vectors for generation 0.
    #[must_use]
    pub fn initial(&self) -> &[Vec<f64>] {
        &self.initial
    }

    /// RNG seed, if fixed.
    #[must_use]
    pub fn seed(&self) -> Option<u64> {
        self.seed
    }

    /// SBX distribution index.
    #[must_use]
    pub fn crossover_eta(&self) -> f64 {
        self.crossover_eta
    }

    /// Polynomial-mutation distribution index.
    #[must_use]
    pub fn mutation_eta(&self) -> f64 {
        self.mutation_eta
    }

    /// Vector lengths every individual of this run uses.
    #[must_use]
    pub fn layout(&self) -> Layout {
        Layout::new(self.scale, self.dimension, self.constraint)
    }
}

/// Fluent builder for [`Configuration`].
///
/// # Defaults
///
/// - `dimension`: 2
/// - `constraint`: 0
/// - `population`: 100
/// - `division`: 12
/// - `cross`: 0.9
/// - `mutation`: `1 / scale`
/// - `maximum`: 100
/// - `integer`: all continuous
/// - `crossover_eta` / `mutation_eta`: 30 / 20
///
/// Bounds have no default and must be set with [`bounds`](Self::bounds).
///
/// ```
/// use unsga::config::Configuration;
///
/// let config = Configuration::builder()
///     .bounds(vec![-1.0, -1.0], vec![1.0, 1.0])
///     .dimension(2)
///     .population(20)
///     .division(10)
///     .maximum(5)
///     .seed(42)
///     .build()
///     .unwrap();
///
/// assert_eq!(config.scale(), 2);
/// assert_eq!(config.mutation(), 0.5);
/// ```
#[derive(Clone, Debug)]
#[must_use]
pub struct ConfigurationBuilder {
    dimension: usize,
    constraint: usize,
    population: usize,
    division: usize,
    cross: f64,
    mutation: Option<f64>,
    maximum: usize,
    bounds: Option<(Vec<f64>, Vec<f64>)>,
    integer: Option<Vec<bool>>,
    initial: Vec<Vec<f64>>,
    seed: Option<u64>,
    crossover_eta: f64,
    mutation_eta: f64,
}

impl Default for ConfigurationBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigurationBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self {
            dimension: 2,
            constraint: 0,
            population: 100,
            division: 12,
            cross: 0.9,
            mutation: None,
            maximum: 100,
            bounds: None,
            integer: None,
            initial: Vec::new(),
            seed: None,
            crossover_eta: DEFAULT_CROSSOVER_ETA,
            mutation_eta: DEFAULT_MUTATION_ETA,
        }
    }

    /// Sets the lower and upper decision bounds. Their length fixes `scale`.
    pub fn bounds(mut self, lower: Vec<f64>, upper: Vec<f64>) -> Self {
        self.bounds = Some((lower, upper));
        self
    }

    /// Sets the number of objectives.
    pub fn dimension(mut self, dimension: usize) -> Self {
        self.dimension = dimension;
        self
    }

    /// Sets the number of constraint-violation values.
    pub fn constraint(mut self, constraint: usize) -> Self {
        self.constraint = constraint;
        self
    }

    /// Sets the generation size.
    pub fn population(mut self, population: usize) -> Self {
        self.population = population;
        self
    }

    /// Sets the simplex lattice resolution.
    pub fn division(mut self, division: usize) -> Self {
        self.division = division;
        self
    }

    /// Sets the crossover probability.
    pub fn cross(mut self, cross: f64) -> Self {
        self.cross = cross;
        self
    }

    /// Sets the per-gene mutation probability.
    pub fn mutation(mut self, mutation: f64) -> Self {
        self.mutation = Some(mutation);
        self
    }

    /// Sets the number of generations.
    pub fn maximum(mut self, maximum: usize) -> Self {
        self.maximum = maximum;
        self
    }

    /// Flags decisions that take whole-number values.
    pub fn integer(mut self, integer: Vec<bool>) -> Self {
        self.integer = Some(integer);
        self
    }

    /// Adds seed decision vectors for generation 0.
    pub fn initial(mut self, initial: Vec<Vec<f64>>) -> Self {
        self.initial = initial;
        self
    }

    /// Fixes the RNG seed for reproducible runs.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Sets the SBX distribution index.
    pub fn crossover_eta(mut self, eta: f64) -> Self {
        self.crossover_eta = eta;
        self
    }

    /// Sets the polynomial-mutation distribution index.
    pub fn mutation_eta(mut self, eta: f64) -> Self {
        self.mutation_eta = eta;
        self
    }

    /// Validates and builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingOption`] if no bounds were set, and any error
    /// listed on [`Configuration::validated`].
    #[allow(clippy::cast_precision_loss)]
    pub fn build(self) -> Result<Configuration> {
        let (lower, upper) = self.bounds.ok_or(Error::MissingOption("upper"))?;
        let scale = upper.len();
        let mutation = self
            .mutation
            .unwrap_or_else(|| if scale == 0 { 1.0 } else { 1.0 / scale as f64 });

        let config = Configuration {
            scale,
            dimension: self.dimension,
            constraint: self.constraint,
            population: self.population,
            division: self.division,
            cross: self.cross,
            mutation,
            maximum: self.maximum,
            upper,
            lower,
            integer: self.integer.unwrap_or_default(),
            initial: self.initial,
            seed: self.seed,
            crossover_eta: self.crossover_eta,
            mutation_eta: self.mutation_eta,
        };
        config.validated()
    }
}

fn invalid(option: &'static str, reason: &str) -> Error {
    Error::InvalidConfiguration {
        option,
        reason: reason.to_owned(),
    }
}

fn get<'a>(options: &'a Options, key: &'static str) -> Result<&'a OptionValue> {
    options.get(key).ok_or(Error::MissingOption(key))
}

fn optional<T>(
    options: &Options,
    key: &'static str,
    read: fn(&Options, &'static str) -> Result<T>,
) -> Result<Option<T>> {
    if options.contains_key(key) {
        read(options, key).map(Some)
    } else {
        Ok(None)
    }
}

fn unsigned_u64(options: &Options, key: &'static str) -> Result<u64> {
    match get(options, key)? {
        OptionValue::Unsigned(v) => Ok(*v),
        _ => Err(Error::OptionType {
            option: key,
            expected: "an unsigned integer",
        }),
    }
}

fn unsigned(options: &Options, key: &'static str) -> Result<usize> {
    let value = unsigned_u64(options, key)?;
    usize::try_from(value).map_err(|_| invalid(key, "does not fit in usize"))
}

#[allow(clippy::cast_precision_loss)]
fn real(options: &Options, key: &'static str) -> Result<f64> {
    match get(options, key)? {
        OptionValue::Real(v) => Ok(*v),
        OptionValue::Unsigned(v) => Ok(*v as f64),
        _ => Err(Error::OptionType {
            option: key,
            expected: "a real number",
        }),
    }
}

fn reals(options: &Options, key: &'static str) -> Result<Vec<f64>> {
    match get(options, key)? {
        OptionValue::Reals(v) => Ok(v.clone()),
        _ => Err(Error::OptionType {
            option: key,
            expected: "a list of real numbers",
        }),
    }
}

fn flags(options: &Options, key: &'static str) -> Result<Vec<bool>> {
    match get(options, key)? {
        OptionValue::Flags(v) => Ok(v.clone()),
        // Numeric 0/1 flags are accepted as well.
        OptionValue::Reals(v) => Ok(v.iter().map(|&x| x != 0.0).collect()),
        _ => Err(Error::OptionType {
            option: key,
            expected: "a list of flags",
        }),
    }
}

fn vectors(options: &Options, key: &'static str) -> Result<Vec<Vec<f64>>> {
    match get(options, key)? {
        OptionValue::Vectors(v) => Ok(v.clone()),
        _ => Err(Error::OptionType {
            option: key,
            expected: "a list of decision vectors",
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_options() -> Options {
        let mut options = Options::new();
        options.insert("scale".into(), 3_u64.into());
        options.insert("dimension".into(), 2_u64.into());
        options.insert("population".into(), 10_u64.into());
        options.insert("division".into(), 4_u64.into());
        options.insert("cross".into(), 0.9.into());
        options.insert("mutation".into(), 0.1.into());
        options.insert("maximum".into(), 3_u64.into());
        options.insert("upper".into(), vec![1.0, 2.0, 3.0].into());
        options.insert("lower".into(), vec![0.0, 0.0, 0.0].into());
        options
    }

    #[test]
    fn reads_required_and_defaults() {
        let config = Configuration::from_options(&base_options()).unwrap();
        assert_eq!(config.scale(), 3);
        assert_eq!(config.constraint(), 0);
        assert_eq!(config.target(), 5);
        assert_eq!(config.integer(), &[false, false, false]);
        assert!(config.initial().is_empty());
        assert_eq!(config.seed(), None);
        assert!((config.crossover_eta() - DEFAULT_CROSSOVER_ETA).abs() < f64::EPSILON);
        assert_eq!(config.layout(), Layout::new(3, 2, 0));
    }

    #[test]
    fn missing_required_option() {
        let mut options = base_options();
        options.remove("division");
        assert!(matches!(
            Configuration::from_options(&options),
            Err(Error::MissingOption("division"))
        ));
    }

    #[test]
    fn wrong_option_kind() {
        let mut options = base_options();
        options.insert("upper".into(), 1.0.into());
        assert!(matches!(
            Configuration::from_options(&options),
            Err(Error::OptionType { option: "upper", .. })
        ));
    }

    #[test]
    fn unsigned_probability_is_accepted() {
        let mut options = base_options();
        options.insert("cross".into(), 1_u64.into());
        let config = Configuration::from_options(&options).unwrap();
        assert!((config.cross() - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn numeric_integer_flags() {
        let mut options = base_options();
        options.insert("integer".into(), vec![0.0, 1.0, 0.0].into());
        let config = Configuration::from_options(&options).unwrap();
        assert_eq!(config.integer(), &[false, true, false]);
    }

    #[test]
    fn odd_population_is_rejected() {
        let mut options = base_options();
        options.insert("population".into(), 7_u64.into());
        assert!(matches!(
            Configuration::from_options(&options),
            Err(Error::InvalidPopulation(7))
        ));
    }

    #[test]
    fn zero_division_is_rejected() {
        let mut options = base_options();
        options.insert("division".into(), 0_u64.into());
        assert!(matches!(
            Configuration::from_options(&options),
            Err(Error::InvalidDivision)
        ));
    }

    #[test]
    fn probability_out_of_range() {
        let mut options = base_options();
        options.insert("mutation".into(), 1.5.into());
        assert!(matches!(
            Configuration::from_options(&options),
            Err(Error::InvalidProbability {
                option: "mutation",
                ..
            })
        ));
    }

    #[test]
    fn bounds_length_mismatch() {
        let mut options = base_options();
        options.insert("lower".into(), vec![0.0, 0.0].into());
        assert!(matches!(
            Configuration::from_options(&options),
            Err(Error::BoundsLength {
                option: "lower",
                expected: 3,
                got: 2
            })
        ));
    }

    #[test]
    fn inverted_bounds() {
        let result = Configuration::builder()
            .bounds(vec![0.0, 5.0], vec![1.0, 4.0])
            .build();
        assert!(matches!(result, Err(Error::InvalidBounds { index: 1, .. })));
    }

    #[test]
    fn infinite_bounds_rejected() {
        let result = Configuration::builder()
            .bounds(vec![f64::NEG_INFINITY], vec![f64::INFINITY])
            .build();
        assert!(matches!(result, Err(Error::InvalidBounds { index: 0, .. })));

        let result = Configuration::builder()
            .bounds(vec![0.0, 0.0], vec![1.0, f64::INFINITY])
            .build();
        assert!(matches!(result, Err(Error::InvalidBounds { index: 1, .. })));
    }

    #[test]
    fn initial_vector_length() {
        let result = Configuration::builder()
            .bounds(vec![0.0, 0.0], vec![1.0, 1.0])
            .initial(vec![vec![0.5, 0.5], vec![0.5]])
            .build();
        assert!(matches!(
            result,
            Err(Error::InitialLength {
                index: 1,
                expected: 2,
                got: 1
            })
        ));
    }

    #[test]
    fn builder_requires_bounds() {
        assert!(matches!(
            Configuration::builder().build(),
            Err(Error::MissingOption("upper"))
        ));
    }

    #[test]
    fn builder_defaults() {
        let config = Configuration::builder()
            .bounds(vec![0.0; 4], vec![1.0; 4])
            .build()
            .unwrap();
        assert_eq!(config.population(), 100);
        assert_eq!(config.division(), 12);
        assert!((config.mutation() - 0.25).abs() < f64::EPSILON);
        assert_eq!(config.integer().len(), 4);
    }
}
