//! # Intermediary Account Model
//!
//! Minimal lookup record for orders sourced through an intermediary. Account
//! CRUD lives outside this core; only the active-by-key lookup is consumed
//! here, by recipient resolution.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntermediaryAccount {
    pub id: i64,
    pub key: String,
    pub contact_email: String,
    pub contact_phone: Option<String>,
    pub active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
