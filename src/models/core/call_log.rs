//! # Call Log Model
//!
//! Immutable record of a contact attempt against an order. Append-only; call
//! logs are never updated or deleted after creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome lookup for a contact attempt.
///
/// `creates_schedule` flags outcomes that should fold straight into
/// appointment creation (the client agreed to a schedule on the call).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallStatus {
    pub code: String,
    pub description: String,
    pub creates_schedule: bool,
}

impl CallStatus {
    pub fn new(code: impl Into<String>, description: impl Into<String>, creates_schedule: bool) -> Self {
        Self {
            code: code.into(),
            description: description.into(),
            creates_schedule,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CallLog {
    pub id: i64,
    pub order_id: i64,
    pub agent_id: i64,
    pub status_code: String,
    pub creates_schedule: bool,
    pub comments: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// New call log for creation (without generated fields)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCallLog {
    pub order_id: i64,
    pub agent_id: i64,
    pub status: CallStatus,
    pub comments: Option<String>,
}
