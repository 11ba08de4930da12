//! Reading history store (SQLite)
//!
//! Append-only log of sensor readings plus the three queries the API needs:
//! most recent, recent batch, and highest/lowest distances within a time
//! window. Every operation opens its own connection (WAL journal, busy
//! timeout), executes and releases it; the collector is the only writer,
//! HTTP handlers are readers.

use crate::common::{unix_epoch_now, Result};
use crate::sensor::SensorSample;
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS readings (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    distance_cm INTEGER NOT NULL,
    sensor_timestamp TEXT NOT NULL,
    sensor_ip TEXT NOT NULL,
    fetched_at_epoch REAL NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_readings_fetched_at ON readings(fetched_at_epoch);
CREATE INDEX IF NOT EXISTS idx_readings_distance ON readings(distance_cm);
";

/// One stored sensor reading
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    /// Store-assigned, strictly increasing
    pub id: i64,
    pub distance_cm: i64,
    /// Device-reported label, compared for equality only
    pub sensor_timestamp: String,
    pub sensor_ip: String,
    /// Collector clock at retrieval; the authoritative ordering key
    pub fetched_at_epoch: f64,
}

/// Time window for extremes queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Period {
    Day,
    Week,
    Month,
    Year,
    All,
}

impl Period {
    pub const ALL: [Period; 5] = [
        Period::Day,
        Period::Week,
        Period::Month,
        Period::Year,
        Period::All,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Period::Day => "day",
            Period::Week => "week",
            Period::Month => "month",
            Period::Year => "year",
            Period::All => "all",
        }
    }

    /// Lower bound on `fetched_at_epoch`, if the window is bounded.
    /// Windows are fixed durations (30-day month, 365-day year), not
    /// calendar periods.
    pub fn since(&self, now: f64) -> Option<f64> {
        match self {
            Period::Day => Some(now - 86_400.0),
            Period::Week => Some(now - 604_800.0),
            Period::Month => Some(now - 2_592_000.0),
            Period::Year => Some(now - 31_536_000.0),
            Period::All => None,
        }
    }
}

/// Ranking direction for extremes queries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Order {
    Max,
    Min,
}

impl Order {
    fn direction(&self) -> &'static str {
        match self {
            Order::Max => "DESC",
            Order::Min => "ASC",
        }
    }
}

/// Reading history store
#[derive(Clone)]
pub struct ReadingStore {
    path: PathBuf,
}

impl ReadingStore {
    /// Open or create the store at `path`
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let store = Self { path };
        store.connect()?.execute_batch(SCHEMA)?;
        Ok(store)
    }

    fn connect(&self) -> Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(Duration::from_secs(5))?;
        Ok(conn)
    }

    /// Append a sample; returns `false` when skipped as a duplicate.
    ///
    /// Duplicate filtering compares the new sample's device timestamp against
    /// the single most-recent stored row only; older rows are never
    /// consulted. Callers are expected to drop invalid samples (negative
    /// distance, empty timestamp) before storing.
    pub fn insert(&self, sample: &SensorSample, dedupe: bool) -> Result<bool> {
        let mut conn = self.connect()?;
        let tx = conn.transaction()?;

        if dedupe && !sample.timestamp.is_empty() {
            let last_ts: Option<String> = tx
                .query_row(
                    "SELECT sensor_timestamp FROM readings
                     ORDER BY fetched_at_epoch DESC, id DESC LIMIT 1",
                    [],
                    |row| row.get(0),
                )
                .optional()?;
            if last_ts.as_deref() == Some(sample.timestamp.as_str()) {
                return Ok(false);
            }
        }

        tx.execute(
            "INSERT INTO readings (distance_cm, sensor_timestamp, sensor_ip, fetched_at_epoch)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                sample.distance_cm,
                sample.timestamp,
                sample.ip,
                sample.fetched_at_epoch
            ],
        )?;
        tx.commit()?;
        Ok(true)
    }

    /// Most recent reading, if any
    pub fn last(&self) -> Result<Option<Reading>> {
        let conn = self.connect()?;
        let reading = conn
            .query_row(
                "SELECT id, distance_cm, sensor_timestamp, sensor_ip, fetched_at_epoch
                 FROM readings ORDER BY fetched_at_epoch DESC, id DESC LIMIT 1",
                [],
                row_to_reading,
            )
            .optional()?;
        Ok(reading)
    }

    /// Up to `n` most recent readings, newest first
    pub fn last_n(&self, n: u32) -> Result<Vec<Reading>> {
        let conn = self.connect()?;
        let mut stmt = conn.prepare(
            "SELECT id, distance_cm, sensor_timestamp, sensor_ip, fetched_at_epoch
             FROM readings ORDER BY fetched_at_epoch DESC, id DESC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![n], row_to_reading)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    /// Highest (`Order::Max`) or lowest (`Order::Min`) distances within the
    /// period, ties broken by recency then id
    pub fn extremes(&self, period: Period, n: u32, order: Order) -> Result<Vec<Reading>> {
        let conn = self.connect()?;
        let direction = order.direction();

        let readings = match period.since(unix_epoch_now()) {
            Some(since) => {
                let sql = format!(
                    "SELECT id, distance_cm, sensor_timestamp, sensor_ip, fetched_at_epoch
                     FROM readings WHERE fetched_at_epoch >= ?1
                     ORDER BY distance_cm {direction}, fetched_at_epoch DESC, id DESC LIMIT ?2"
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params![since, n], row_to_reading)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
            None => {
                let sql = format!(
                    "SELECT id, distance_cm, sensor_timestamp, sensor_ip, fetched_at_epoch
                     FROM readings
                     ORDER BY distance_cm {direction}, fetched_at_epoch DESC, id DESC LIMIT ?1"
                );
                let mut stmt = conn.prepare(&sql)?;
                let rows = stmt.query_map(params![n], row_to_reading)?;
                rows.collect::<rusqlite::Result<Vec<_>>>()?
            }
        };

        Ok(readings)
    }
}

fn row_to_reading(row: &Row<'_>) -> rusqlite::Result<Reading> {
    Ok(Reading {
        id: row.get(0)?,
        distance_cm: row.get(1)?,
        sensor_timestamp: row.get(2)?,
        sensor_ip: row.get(3)?,
        fetched_at_epoch: row.get(4)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn sample(distance_cm: i64, timestamp: &str, epoch: f64) -> SensorSample {
        SensorSample {
            distance_cm,
            timestamp: timestamp.to_string(),
            ip: "10.0.0.7".to_string(),
            fetched_at_epoch: epoch,
        }
    }

    #[test]
    fn test_insert_and_last() {
        let dir = tempdir().unwrap();
        let store = ReadingStore::open(dir.path().join("test.sqlite3")).unwrap();

        assert!(store.last().unwrap().is_none());

        assert!(store.insert(&sample(42, "t1", 100.0), true).unwrap());
        let last = store.last().unwrap().unwrap();
        assert_eq!(last.distance_cm, 42);
        assert_eq!(last.sensor_timestamp, "t1");
        assert_eq!(last.id, 1);
    }

    #[test]
    fn test_dedupe_skips_repeated_timestamp() {
        let dir = tempdir().unwrap();
        let store = ReadingStore::open(dir.path().join("test.sqlite3")).unwrap();

        assert!(store.insert(&sample(42, "t1", 100.0), true).unwrap());
        assert!(!store.insert(&sample(43, "t1", 101.0), true).unwrap());
        assert_eq!(store.last_n(10).unwrap().len(), 1);

        // Without dedup the same timestamp appends
        assert!(store.insert(&sample(43, "t1", 102.0), false).unwrap());
        assert_eq!(store.last_n(10).unwrap().len(), 2);
    }
}
