//! Append-only record sinks
//!
//! Every monitor cycle appends one interaction record. Cycles with an elevated
//! risk also append an alert record.

mod memory;
mod sqlite;

pub use memory::MemorySink;
pub use sqlite::SqliteSink;

use crate::error::ComputeError;
use crate::types::RiskLevel;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Channel used for monitor cycle interactions
pub const MONITOR_CHANNEL: &str = "monitor";

/// Destination for interaction and alert records.
///
/// Implementations must tolerate concurrent appends.
pub trait WellnessSink: Send + Sync {
    fn append_interaction(&self, channel: &str, payload: &Value) -> Result<(), ComputeError>;

    fn append_alert(
        &self,
        level: RiskLevel,
        reason: &str,
        metadata: &Value,
    ) -> Result<(), ComputeError>;
}

/// One logged interaction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionRecord {
    pub id: Uuid,
    pub channel: String,
    pub payload: Value,
    pub created_at: DateTime<Utc>,
}

impl InteractionRecord {
    pub fn new(channel: &str, payload: &Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            channel: channel.to_string(),
            payload: payload.clone(),
            created_at: Utc::now(),
        }
    }
}

/// One logged alert
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlertRecord {
    pub id: Uuid,
    pub level: RiskLevel,
    pub reason: String,
    pub metadata: Value,
    pub created_at: DateTime<Utc>,
}

impl AlertRecord {
    pub fn new(level: RiskLevel, reason: &str, metadata: &Value) -> Self {
        Self {
            id: Uuid::new_v4(),
            level,
            reason: reason.to_string(),
            metadata: metadata.clone(),
            created_at: Utc::now(),
        }
    }
}
