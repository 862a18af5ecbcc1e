use serde::Serialize;
use std::fmt;

/// A non-fatal condition met during a conversion. Warnings never abort the
/// request; they are logged and handed back to the caller with the output.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Warning {
    /// A route references a stop that is not in the registry
    UnmatchedStop { route: String, stop: String },
    /// A registry row has a blank or non-numeric coordinate
    MissingCoordinates {
        table: String,
        stop: String,
        row: usize,
    },
    /// The registry lists the same stop more than once; the first row wins
    DuplicateStop { stop: String, row: usize },
    /// One end of a stop pair has no coordinates, so no directions were requested
    UnresolvedPair {
        route: String,
        from: String,
        to: String,
    },
    /// The directions request for a stop pair failed
    SegmentFailed {
        route: String,
        from: String,
        to: String,
        reason: String,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::UnmatchedStop { route, stop } => {
                write!(f, "{}: stop '{}' not found in the stop registry", route, stop)
            }
            Warning::MissingCoordinates { table, stop, row } => write!(
                f,
                "{}: stop '{}' on row {} has no usable coordinates",
                table, stop, row
            ),
            Warning::DuplicateStop { stop, row } => write!(
                f,
                "stop '{}' on row {} duplicates an earlier row and was ignored",
                stop, row
            ),
            Warning::UnresolvedPair { route, from, to } => write!(
                f,
                "{}: skipped {} -> {}, missing coordinates",
                route, from, to
            ),
            Warning::SegmentFailed {
                route,
                from,
                to,
                reason,
            } => write!(f, "{}: request failed for {} -> {}: {}", route, from, to, reason),
        }
    }
}
