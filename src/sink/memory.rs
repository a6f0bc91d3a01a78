//! In-process sink

use super::{AlertRecord, InteractionRecord, WellnessSink};
use crate::error::ComputeError;
use crate::types::RiskLevel;
use serde_json::Value;
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Default)]
struct Records {
    interactions: Vec<InteractionRecord>,
    alerts: Vec<AlertRecord>,
}

/// Keeps records in memory, in append order
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Records>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interactions(&self) -> Vec<InteractionRecord> {
        self.lock().interactions.clone()
    }

    pub fn alerts(&self) -> Vec<AlertRecord> {
        self.lock().alerts.clone()
    }

    fn lock(&self) -> MutexGuard<'_, Records> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl WellnessSink for MemorySink {
    fn append_interaction(&self, channel: &str, payload: &Value) -> Result<(), ComputeError> {
        self.lock()
            .interactions
            .push(InteractionRecord::new(channel, payload));
        Ok(())
    }

    fn append_alert(
        &self,
        level: RiskLevel,
        reason: &str,
        metadata: &Value,
    ) -> Result<(), ComputeError> {
        self.lock()
            .alerts
            .push(AlertRecord::new(level, reason, metadata));
        Ok(())
    }
}
