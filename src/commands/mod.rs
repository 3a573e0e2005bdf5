use std::io;

use crate::error::QueryError;
use crate::report::Reporter;

pub mod buckets;
pub mod credits;
pub mod files;
pub mod s3;
pub mod storage;

/// What a single query section ended up printing.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// A listing with this many entries.
    Listed(usize),
    /// A single value (storage total, credit balance).
    Reported,
    /// Nothing found; a warning, not a failure.
    Empty,
    Failed(QueryError),
}

impl Outcome {
    pub const fn count(&self) -> usize {
        match self {
            Self::Listed(count) => *count,
            _ => 0,
        }
    }

    pub const fn is_failure(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Backend failure: report it and skip the rest of the section.
pub(crate) fn failed(
    reporter: &mut Reporter,
    err: QueryError,
    what: &str,
) -> io::Result<Outcome> {
    reporter.error(&err)?;
    reporter.error(format_args!("Failed to retrieve {what}"))?;

    Ok(Outcome::Failed(err))
}

pub(crate) fn empty(
    reporter: &mut Reporter,
    message: &str,
) -> io::Result<Outcome> {
    reporter.warning(message)?;

    Ok(Outcome::Empty)
}
