//! SQLite-backed feedback storage.

use super::storage::{DailyCount, FeedbackStorage};
use super::{FeedbackError, FeedbackRecord, PerformanceAggregate};
use crate::style::ConversationStyle;
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS feedback (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    message_id       TEXT NOT NULL,
    conversation_id  TEXT NOT NULL,
    kind             TEXT NOT NULL,
    rating           INTEGER,
    comment          TEXT,
    backend          TEXT NOT NULL,
    style            TEXT NOT NULL,
    latency_seconds  REAL,
    response_error   INTEGER NOT NULL DEFAULT 0,
    session_id       TEXT,
    timestamp        TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_feedback_timestamp ON feedback(timestamp);
CREATE INDEX IF NOT EXISTS idx_feedback_pair ON feedback(backend, style);

CREATE TABLE IF NOT EXISTS performance (
    backend              TEXT NOT NULL,
    style                TEXT NOT NULL,
    avg_rating           REAL NOT NULL,
    rated_count          INTEGER NOT NULL,
    avg_latency_seconds  REAL NOT NULL,
    latency_count        INTEGER NOT NULL,
    total_count          INTEGER NOT NULL,
    success_count        INTEGER NOT NULL,
    positive_count       INTEGER NOT NULL,
    negative_count       INTEGER NOT NULL,
    success_rate         REAL NOT NULL,
    score                REAL NOT NULL,
    last_updated         TEXT NOT NULL,
    PRIMARY KEY (backend, style)
);
"#;

/// Feedback storage in a single SQLite file.
///
/// The connection is guarded by a mutex. A feedback write is one short
/// transaction, so contention stays low at chat-turn rates.
pub struct SqliteStorage {
    conn: Mutex<Connection>,
}

impl SqliteStorage {
    /// Open or create a database at the given path.
    pub fn open(path: &Path) -> Result<Self, FeedbackError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        Self::initialize(conn)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> Result<Self, FeedbackError> {
        Self::initialize(Connection::open_in_memory()?)
    }

    fn initialize(conn: Connection) -> Result<Self, FeedbackError> {
        conn.execute_batch(SCHEMA)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, FeedbackError> {
        self.conn
            .lock()
            .map_err(|_| FeedbackError::Storage("sqlite connection lock poisoned".to_string()))
    }
}

fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_ts(raw: &str) -> Result<DateTime<Utc>, FeedbackError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| FeedbackError::Storage(format!("bad timestamp '{}': {}", raw, e)))
}

fn parse_style(raw: &str) -> Result<ConversationStyle, FeedbackError> {
    raw.parse().map_err(FeedbackError::Storage)
}

fn insert_record(conn: &Connection, record: &FeedbackRecord) -> rusqlite::Result<usize> {
    conn.execute(
        r#"
        INSERT INTO feedback (message_id, conversation_id, kind, rating, comment, backend,
                              style, latency_seconds, response_error, session_id, timestamp)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
        "#,
        params![
            record.message_id,
            record.conversation_id,
            record.kind.as_str(),
            record.kind.rating().map(i64::from),
            record.kind.comment(),
            record.backend,
            record.style.as_str(),
            record.latency_seconds,
            record.response_error,
            record.session_id,
            format_ts(&record.timestamp),
        ],
    )
}

fn upsert_aggregate(conn: &Connection, agg: &PerformanceAggregate) -> rusqlite::Result<usize> {
    conn.execute(
        r#"
        INSERT INTO performance (backend, style, avg_rating, rated_count, avg_latency_seconds,
                                 latency_count, total_count, success_count, positive_count,
                                 negative_count, success_rate, score, last_updated)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)
        ON CONFLICT(backend, style) DO UPDATE SET
            avg_rating = excluded.avg_rating,
            rated_count = excluded.rated_count,
            avg_latency_seconds = excluded.avg_latency_seconds,
            latency_count = excluded.latency_count,
            total_count = excluded.total_count,
            success_count = excluded.success_count,
            positive_count = excluded.positive_count,
            negative_count = excluded.negative_count,
            success_rate = excluded.success_rate,
            score = excluded.score,
            last_updated = excluded.last_updated
        "#,
        params![
            agg.backend,
            agg.style.as_str(),
            agg.avg_rating,
            agg.rated_count as i64,
            agg.avg_latency_seconds,
            agg.latency_count as i64,
            agg.total_count as i64,
            agg.success_count as i64,
            agg.positive_count as i64,
            agg.negative_count as i64,
            agg.success_rate,
            agg.score,
            format_ts(&agg.last_updated),
        ],
    )
}

impl FeedbackStorage for SqliteStorage {
    fn record(
        &self,
        record: &FeedbackRecord,
        aggregate: &PerformanceAggregate,
    ) -> Result<(), FeedbackError> {
        let mut conn = self.conn()?;
        // Dropping an uncommitted transaction rolls it back.
        let tx = conn.transaction()?;
        insert_record(&tx, record)?;
        upsert_aggregate(&tx, aggregate)?;
        tx.commit()?;
        Ok(())
    }

    fn load_aggregates(&self) -> Result<Vec<PerformanceAggregate>, FeedbackError> {
        type Row = (String, String, f64, i64, f64, i64, i64, i64, i64, i64, f64, f64, String);

        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT backend, style, avg_rating, rated_count, avg_latency_seconds, latency_count,
                    total_count, success_count, positive_count, negative_count, success_rate,
                    score, last_updated
             FROM performance ORDER BY score DESC",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                    row.get(7)?,
                    row.get(8)?,
                    row.get(9)?,
                    row.get(10)?,
                    row.get(11)?,
                    row.get(12)?,
                ))
            })?
            .collect::<Result<Vec<Row>, _>>()?;

        rows.into_iter()
            .map(|r| {
                Ok(PerformanceAggregate {
                    backend: r.0,
                    style: parse_style(&r.1)?,
                    avg_rating: r.2,
                    rated_count: r.3 as u64,
                    avg_latency_seconds: r.4,
                    latency_count: r.5 as u64,
                    total_count: r.6 as u64,
                    success_count: r.7 as u64,
                    positive_count: r.8 as u64,
                    negative_count: r.9 as u64,
                    success_rate: r.10,
                    score: r.11,
                    last_updated: parse_ts(&r.12)?,
                })
            })
            .collect()
    }

    fn daily_counts(&self, since: DateTime<Utc>) -> Result<Vec<DailyCount>, FeedbackError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT substr(timestamp, 1, 10) AS day, COUNT(*)
             FROM feedback
             WHERE timestamp >= ?1
             GROUP BY day
             ORDER BY day",
        )?;

        let rows = stmt
            .query_map([format_ts(&since)], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        rows.into_iter()
            .map(|(day, count)| {
                let date = NaiveDate::parse_from_str(&day, "%Y-%m-%d")
                    .map_err(|e| FeedbackError::Storage(format!("bad date '{}': {}", day, e)))?;
                Ok(DailyCount {
                    date,
                    feedback_count: count as u64,
                })
            })
            .collect()
    }

    fn record_count(&self) -> Result<u64, FeedbackError> {
        let count: i64 = self
            .conn()?
            .query_row("SELECT COUNT(*) FROM feedback", [], |row| row.get(0))?;
        Ok(count as u64)
    }
}

#[cfg(test)]
impl SqliteStorage {
    /// Read back stored records for one message, oldest first.
    fn records_for_message(&self, message_id: &str) -> Result<Vec<FeedbackRecord>, FeedbackError> {
        type Row = (
            String,
            String,
            String,
            Option<i64>,
            Option<String>,
            String,
            String,
            Option<f64>,
            bool,
            Option<String>,
            String,
        );

        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT message_id, conversation_id, kind, rating, comment, backend, style,
                    latency_seconds, response_error, session_id, timestamp
             FROM feedback WHERE message_id = ?1 ORDER BY id",
        )?;
        let rows = stmt
            .query_map([message_id], |row| {
                Ok((
                    row.get(0)?,
                    row.get(1)?,
                    row.get(2)?,
                    row.get(3)?,
                    row.get(4)?,
                    row.get(5)?,
                    row.get(6)?,
                    row.get(7)?,
                    row.get(8)?,
                    row.get(9)?,
                    row.get(10)?,
                ))
            })?
            .collect::<Result<Vec<Row>, _>>()?;

        rows.into_iter()
            .map(|r| {
                let rating = r.3.map(|v| v.clamp(0, u8::MAX as i64) as u8);
                Ok(FeedbackRecord {
                    message_id: r.0,
                    conversation_id: r.1,
                    kind: super::FeedbackKind::from_parts(&r.2, rating, r.4)?,
                    backend: r.5,
                    style: parse_style(&r.6)?,
                    latency_seconds: r.7,
                    response_error: r.8,
                    session_id: r.9,
                    timestamp: parse_ts(&r.10)?,
                })
            })
            .collect()
    }
}
