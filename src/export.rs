//! Result sinks.
//!
//! One record per individual: decision values, then objective values, then
//! constraint-violation values.

use std::io::Write;
use std::path::Path;

use crate::error::Result;
use crate::individual::Solution;

/// Writes `individuals` as CSV.
///
/// Columns: `x0..`, `f0..`, `g0..` for decisions, objectives, and
/// violations. The column counts come from the first individual; an empty
/// slice writes nothing.
///
/// # Errors
///
/// Returns [`Error::Io`](crate::Error::Io) if writing fails.
///
/// # Examples
///
/// ```
/// use unsga::export::write_csv;
/// use unsga::{Individual, Layout};
///
/// let mut ind = Individual::with_decisions(Layout::new(2, 1, 0), &[0.5, 1.0]);
/// ind.objectives_mut()[0] = 1.25;
///
/// let mut buf = Vec::new();
/// write_csv(&mut buf, &[ind]).unwrap();
/// assert_eq!(String::from_utf8(buf).unwrap(), "x0,x1,f0\n0.5,1,1.25\n");
/// ```
pub fn write_csv<S: Solution>(mut writer: impl Write, individuals: &[S]) -> Result<()> {
    let Some(first) = individuals.first() else {
        return Ok(());
    };

    let columns = [
        ("x", first.decisions().len()),
        ("f", first.objectives().len()),
        ("g", first.violations().len()),
    ];
    let header: Vec<String> = columns
        .iter()
        .flat_map(|&(prefix, count)| (0..count).map(move |i| format!("{prefix}{i}")))
        .collect();
    writeln!(writer, "{}", header.join(","))?;

    for individual in individuals {
        let mut values = individual
            .decisions()
            .iter()
            .chain(individual.objectives())
            .chain(individual.violations());
        if let Some(value) = values.next() {
            write!(writer, "{value}")?;
        }
        for value in values {
            write!(writer, ",{value}")?;
        }
        writeln!(writer)?;
    }
    writer.flush()?;
    Ok(())
}

/// Convenience wrapper around [`write_csv`] that creates a buffered file.
///
/// # Errors
///
/// Returns [`Error::Io`](crate::Error::Io) if the file cannot be created or
/// written.
pub fn export_csv<S: Solution>(path: impl AsRef<Path>, individuals: &[S]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_csv(std::io::BufWriter::new(file), individuals)
}

#[cfg(feature = "serde")]
#[derive(serde::Serialize)]
struct Record<'a> {
    decisions: &'a [f64],
    objectives: &'a [f64],
    violations: &'a [f64],
}

/// Writes `individuals` as a pretty-printed JSON array of records with
/// `decisions`, `objectives`, and `violations` fields.
///
/// # Errors
///
/// Returns [`Error::Serialization`](crate::Error::Serialization) if encoding
/// or writing fails.
#[cfg(feature = "serde")]
pub fn write_json<S: Solution>(writer: impl Write, individuals: &[S]) -> Result<()> {
    let records: Vec<Record<'_>> = individuals
        .iter()
        .map(|individual| Record {
            decisions: individual.decisions(),
            objectives: individual.objectives(),
            violations: individual.violations(),
        })
        .collect();
    serde_json::to_writer_pretty(writer, &records)?;
    Ok(())
}

/// Convenience wrapper around [`write_json`] that creates a buffered file.
///
/// # Errors
///
/// Same as [`write_json`], plus [`Error::Io`](crate::Error::Io) if the file
/// cannot be created.
#[cfg(feature = "serde")]
pub fn export_json<S: Solution>(path: impl AsRef<Path>, individuals: &[S]) -> Result<()> {
    let file = std::fs::File::create(path)?;
    write_json(std::io::BufWriter::new(file), individuals)
}
