//! SQLite-backed sink
//!
//! Payloads and metadata are stored as JSON text, timestamps as RFC 3339 UTC.

use super::{AlertRecord, InteractionRecord, WellnessSink};
use crate::error::ComputeError;
use crate::types::RiskLevel;
use chrono::{DateTime, Utc};
use log::{debug, warn};
use rusqlite::{params, Connection};
use serde_json::Value;
use std::fs;
use std::path::Path;
use std::sync::{Mutex, MutexGuard, PoisonError};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS interactions (
        id TEXT PRIMARY KEY,
        channel TEXT NOT NULL,
        payload TEXT NOT NULL,
        created_at TEXT NOT NULL
    );
    CREATE TABLE IF NOT EXISTS alerts (
        id TEXT PRIMARY KEY,
        level TEXT NOT NULL,
        reason TEXT NOT NULL,
        metadata TEXT NOT NULL,
        created_at TEXT NOT NULL
    );
";

/// Durable append-only log in a single SQLite database
pub struct SqliteSink {
    conn: Mutex<Connection>,
}

impl SqliteSink {
    /// Open (or create) the database at `path`, creating parent directories
    pub fn open(path: &Path) -> Result<Self, ComputeError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let conn = Connection::open(path)?;
        if let Err(err) = conn.pragma_update(None, "journal_mode", "WAL") {
            warn!("Failed to enable WAL mode: {err}");
        }
        debug!("Opened sink database at {}", path.display());
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, ComputeError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, ComputeError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn interaction_count(&self) -> Result<u64, ComputeError> {
        self.count("interactions")
    }

    pub fn alert_count(&self) -> Result<u64, ComputeError> {
        self.count("alerts")
    }

    /// Most recent alerts first
    pub fn recent_alerts(&self, limit: usize) -> Result<Vec<AlertRecord>, ComputeError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(
            "SELECT id, level, reason, metadata, created_at
             FROM alerts
             ORDER BY created_at DESC
             LIMIT ?1",
        )?;

        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let rows = stmt.query_map(params![limit], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut alerts = Vec::new();
        for row in rows {
            let (id, level, reason, metadata, created_at) = row?;
            alerts.push(AlertRecord {
                id: id
                    .parse()
                    .map_err(|e| ComputeError::Sink(format!("invalid alert id '{id}': {e}")))?,
                level: RiskLevel::from_label(&level)
                    .ok_or_else(|| ComputeError::Sink(format!("unknown risk level '{level}'")))?,
                reason,
                metadata: serde_json::from_str(&metadata)?,
                created_at: parse_datetime(&created_at)?,
            });
        }
        Ok(alerts)
    }

    fn count(&self, table: &str) -> Result<u64, ComputeError> {
        let conn = self.lock();
        let count: i64 =
            conn.query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| row.get(0))?;
        u64::try_from(count).map_err(|_| ComputeError::Sink(format!("negative count {count}")))
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl WellnessSink for SqliteSink {
    fn append_interaction(&self, channel: &str, payload: &Value) -> Result<(), ComputeError> {
        let record = InteractionRecord::new(channel, payload);
        self.lock().execute(
            "INSERT INTO interactions (id, channel, payload, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                record.id.to_string(),
                record.channel,
                serde_json::to_string(&record.payload)?,
                record.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }

    fn append_alert(
        &self,
        level: RiskLevel,
        reason: &str,
        metadata: &Value,
    ) -> Result<(), ComputeError> {
        let record = AlertRecord::new(level, reason, metadata);
        self.lock().execute(
            "INSERT INTO alerts (id, level, reason, metadata, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                record.id.to_string(),
                record.level.as_str(),
                record.reason,
                serde_json::to_string(&record.metadata)?,
                record.created_at.to_rfc3339(),
            ],
        )?;
        Ok(())
    }
}

fn parse_datetime(value: &str) -> Result<DateTime<Utc>, ComputeError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| ComputeError::Sink(format!("invalid datetime '{value}': {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_counts_start_at_zero() {
        let sink = SqliteSink::open_in_memory().unwrap();
        assert_eq!(sink.interaction_count().unwrap(), 0);
        assert_eq!(sink.alert_count().unwrap(), 0);
    }

    #[test]
    fn test_append_and_read_back_alert() {
        let sink = SqliteSink::open_in_memory().unwrap();
        let metadata = json!({"score": 18.0, "risk_level": "critical"});

        sink.append_interaction("monitor", &json!({"modules": {}}))
            .unwrap();
        sink.append_alert(RiskLevel::Critical, "elevated", &metadata)
            .unwrap();

        assert_eq!(sink.interaction_count().unwrap(), 1);
        assert_eq!(sink.alert_count().unwrap(), 1);

        let alerts = sink.recent_alerts(10).unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].level, RiskLevel::Critical);
        assert_eq!(alerts[0].reason, "elevated");
        assert_eq!(alerts[0].metadata, metadata);
    }

    #[test]
    fn test_open_creates_parent_directories() {
        let dir = std::env::temp_dir().join(format!("wellness-sink-{}", uuid::Uuid::new_v4()));
        let path = dir.join("nested").join("wellness.db");

        let sink = SqliteSink::open(&path).unwrap();
        sink.append_interaction("monitor", &json!({})).unwrap();
        drop(sink);

        let reopened = SqliteSink::open(&path).unwrap();
        assert_eq!(reopened.interaction_count().unwrap(), 1);

        let _ = fs::remove_dir_all(&dir);
    }
}
