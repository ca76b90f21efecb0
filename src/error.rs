// src/error.rs

//! Error types for transaction planning
//!
//! Precondition violations (universe mismatch, classifying an id that is
//! not a step) are programming errors and panic instead of returning a
//! variant here; see the crate-level documentation.

use crate::universe::PackageId;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// A step id does not resolve to any record in the universe.
    #[error("package id {0} is not present in the universe")]
    UnknownPackage(PackageId),

    /// Cooperative cancellation was requested while the named pass ran.
    #[error("operation cancelled during {0}")]
    Cancelled(String),

    /// Several independent problems collected from a batch operation.
    #[error("{} planning errors:\n{}", .0.len(), render_aggregate(.0))]
    Aggregate(Vec<Error>),
}

impl Error {
    /// Collapse a batch of independently gathered errors into one value.
    ///
    /// Returns `Ok(())` for an empty batch and the sole error unwrapped
    /// when only one problem was found.
    pub fn aggregate(mut errors: Vec<Error>) -> Result<()> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(Error::Aggregate(errors)),
        }
    }
}

fn render_aggregate(errors: &[Error]) -> String {
    errors
        .iter()
        .map(|e| format!("  - {e}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aggregate_empty_is_ok() {
        assert!(Error::aggregate(Vec::new()).is_ok());
    }

    #[test]
    fn test_aggregate_single_unwraps() {
        let err = Error::aggregate(vec![Error::UnknownPackage(PackageId(7))]).unwrap_err();
        assert!(matches!(err, Error::UnknownPackage(PackageId(7))));
    }

    #[test]
    fn test_aggregate_renders_one_line_per_error() {
        let err = Error::aggregate(vec![
            Error::UnknownPackage(PackageId(1)),
            Error::UnknownPackage(PackageId(2)),
        ])
        .unwrap_err();

        let rendered = err.to_string();
        assert!(rendered.starts_with("2 planning errors:"));
        assert!(rendered.contains("package id 1 is not present"));
        assert!(rendered.contains("package id 2 is not present"));
        assert_eq!(rendered.lines().count(), 3);
    }
}
