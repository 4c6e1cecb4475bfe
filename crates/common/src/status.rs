//! Processing status shared by orders and order items.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The processing status of an order or an order item.
///
/// ```text
/// New ──► Processing ──┬──► Processed
///                      └──► Error
/// ```
///
/// Persisted as a small integer (see [`Status::code`]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Status {
    /// Received, not yet picked up.
    #[default]
    New,

    /// A worker is processing the record.
    Processing,

    /// Processing finished (terminal).
    Processed,

    /// Processing failed (terminal).
    Error,
}

/// Returned when a persisted status code has no matching [`Status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("unknown status code: {0}")]
pub struct UnknownStatus(pub i16);

impl Status {
    /// All statuses, in lifecycle order.
    pub const ALL: [Status; 4] = [
        Status::New,
        Status::Processing,
        Status::Processed,
        Status::Error,
    ];

    /// Returns true if no transition leaves this status.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Status::Processed | Status::Error)
    }

    /// Returns the integer code used in storage.
    pub fn code(&self) -> i16 {
        match self {
            Status::New => 0,
            Status::Processing => 1,
            Status::Processed => 2,
            Status::Error => 3,
        }
    }

    /// Parses a storage code.
    pub fn from_code(code: i16) -> Result<Self, UnknownStatus> {
        match code {
            0 => Ok(Status::New),
            1 => Ok(Status::Processing),
            2 => Ok(Status::Processed),
            3 => Ok(Status::Error),
            other => Err(UnknownStatus(other)),
        }
    }

    /// Returns the status name as a string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Status::New => "NEW",
            Status::Processing => "PROCESSING",
            Status::Processed => "PROCESSED",
            Status::Error => "ERROR",
        }
    }
}

impl std::fmt::Display for Status {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<i16> for Status {
    type Error = UnknownStatus;

    fn try_from(code: i16) -> Result<Self, UnknownStatus> {
        Status::from_code(code)
    }
}
