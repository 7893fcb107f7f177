use chrono::NaiveDate;

use crate::model::Span;

#[derive(Debug)]
pub enum EngineError {
    /// A required text field was empty after trimming.
    EmptyField(&'static str),
    /// `start >= end`.
    InvalidSpan(Span),
    InvalidCapacity,
    UnknownVenue(String),
    VenueExists(String),
    /// The candidate overlaps an accepted booking in the same venue and date.
    Conflict {
        venue: String,
        date: NaiveDate,
        existing: Span,
    },
    LimitExceeded(&'static str),
    /// The store was closed; no further writes are accepted.
    Closed,
    WalError(String),
}

impl EngineError {
    /// Rejections caused by the request itself, as opposed to storage faults.
    pub fn is_client_error(&self) -> bool {
        !matches!(self, EngineError::Closed | EngineError::WalError(_))
    }
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::EmptyField(field) => write!(f, "{field} is required"),
            EngineError::InvalidSpan(span) => {
                write!(f, "start {} must be before end {}", span.start, span.end)
            }
            EngineError::InvalidCapacity => write!(f, "capacity must be a positive integer"),
            EngineError::UnknownVenue(name) => write!(f, "unknown venue: {name}"),
            EngineError::VenueExists(name) => write!(f, "venue already exists: {name}"),
            EngineError::Conflict {
                venue,
                date,
                existing,
            } => write!(
                f,
                "venue {venue} already booked on {date} from {} to {}",
                existing.start, existing.end
            ),
            EngineError::LimitExceeded(msg) => write!(f, "limit exceeded: {msg}"),
            EngineError::Closed => write!(f, "store is closed"),
            EngineError::WalError(e) => write!(f, "WAL error: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}
