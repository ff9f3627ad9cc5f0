//! SQLite-based persistent store for rounds, observations, and verdicts.
//!
//! The database lives at `~/.vigil/history.db`. Each stored round writes one
//! `executions` row plus its `observations`, `verdicts`, and `battery_metals`
//! children in a single transaction; re-storing the same round replaces the
//! same rows instead of duplicating them. A retention pass runs after every
//! store in its own transaction, so history stays bounded without a separate
//! maintenance job.

use std::path::{Path, PathBuf};

use chrono::{Duration, Utc};
use rusqlite::{params, Connection, OpenFlags};

use crate::execution::RoundOutcome;
use crate::threshold::ThresholdVerdict;
use crate::trends::{analyze, TrendAnalysis};

pub mod types;
pub use types::*;

pub struct HistoryDb {
    conn: Connection,
}

impl HistoryDb {
    /// Borrow the underlying connection for ad-hoc queries.
    pub fn conn_ref(&self) -> &Connection {
        &self.conn
    }

    /// Execute a closure within a SQLite transaction.
    /// Commits on Ok, rolls back on Err.
    pub fn with_transaction<F, T>(&self, f: F) -> Result<T, DbError>
    where
        F: FnOnce(&Self) -> Result<T, DbError>,
    {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        match f(self) {
            Ok(val) => {
                self.conn.execute_batch("COMMIT")?;
                Ok(val)
            }
            Err(e) => {
                let _ = self.conn.execute_batch("ROLLBACK");
                Err(e)
            }
        }
    }

    /// Open (or create) the database at `~/.vigil/history.db` and apply
    /// pending migrations.
    pub fn open() -> Result<Self, DbError> {
        let path = Self::db_path()?;
        Self::open_at(path)
    }

    /// Open a database at an explicit path. Useful for testing.
    pub fn open_at(path: PathBuf) -> Result<Self, DbError> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            if !parent.exists() {
                std::fs::create_dir_all(parent).map_err(DbError::CreateDir)?;
            }
        }

        let conn = Connection::open(&path)?;

        // WAL for concurrent reads while a store is in flight
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;

        crate::migrations::run_migrations(&conn).map_err(DbError::Migration)?;

        conn.execute_batch("PRAGMA foreign_keys = ON;")?;

        Ok(Self { conn })
    }

    /// Open a database at an explicit path in read-only mode. Used by report
    /// tooling for safe concurrent reads while the pipeline owns writes.
    pub fn open_readonly_at(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        Ok(Self { conn })
    }

    /// Resolve the default database path: `~/.vigil/history.db`.
    fn db_path() -> Result<PathBuf, DbError> {
        let home = dirs::home_dir().ok_or(DbError::HomeDirNotFound)?;
        Ok(home.join(".vigil").join("history.db"))
    }

    // =========================================================================
    // Writes
    // =========================================================================

    /// Store one round — execution header, observations, verdicts, and the
    /// battery matrix — then prune history past the retention window.
    ///
    /// Storing the same round again replaces its rows; the uniqueness
    /// constraints on `(signal_id, execution_id)` and
    /// `(execution_id, hypothesis_id)` make the write idempotent.
    pub fn store_round(
        &self,
        outcome: &RoundOutcome,
        retention_days: u32,
    ) -> Result<String, DbError> {
        let timestamp = outcome.started_at.to_rfc3339();
        let end_time = outcome.finished_at.to_rfc3339();
        let duration_seconds =
            (outcome.finished_at - outcome.started_at).num_milliseconds() as f64 / 1000.0;
        let extracted = outcome.records.iter().filter(|r| r.value.is_some()).count();
        let alerts = outcome
            .records
            .iter()
            .filter(|r| r.alert == ThresholdVerdict::Alert)
            .count();

        self.with_transaction(|db| {
            db.conn.execute(
                "INSERT OR REPLACE INTO executions (
                    execution_id, signal_count, extracted_count, alert_count,
                    index_score, index_tier, start_time, end_time,
                    duration_seconds, status)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
                params![
                    outcome.execution_id,
                    outcome.records.len() as i64,
                    extracted as i64,
                    alerts as i64,
                    outcome.index.score,
                    outcome.index.tier.label(),
                    timestamp,
                    end_time,
                    duration_seconds,
                    outcome.status.as_str(),
                ],
            )?;

            for record in &outcome.records {
                db.conn.execute(
                    "INSERT OR REPLACE INTO observations (
                        signal_id, label, domain, priority, unit, threshold,
                        raw_output, value, extraction_method, context_status,
                        alert, hypothesis, fetch_status, timestamp, execution_id)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)",
                    params![
                        record.signal_id,
                        record.label,
                        record.domain,
                        record.priority.as_str(),
                        record.unit,
                        record.threshold,
                        record.raw_output,
                        record.value,
                        record.extraction_method.map(|m| m.as_str()),
                        record.context_status,
                        record.alert.as_str(),
                        record.hypothesis,
                        record.fetch_status,
                        timestamp,
                        outcome.execution_id,
                    ],
                )?;
            }

            for hyp in &outcome.hypotheses {
                db.conn.execute(
                    "INSERT OR REPLACE INTO verdicts (
                        execution_id, hypothesis_id, verdict, explanation, condition_text)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        outcome.execution_id,
                        hyp.id,
                        hyp.verdict.as_str(),
                        hyp.explanation,
                        hyp.condition,
                    ],
                )?;
            }

            for metal in &outcome.battery.metals {
                db.conn.execute(
                    "INSERT OR REPLACE INTO battery_metals (
                        execution_id, signal_id, metal, value, cutoff, unit, bullish)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                    params![
                        outcome.execution_id,
                        metal.signal_id,
                        metal.metal,
                        metal.value,
                        metal.cutoff,
                        metal.unit,
                        metal.bullish,
                    ],
                )?;
            }

            Ok(())
        })?;

        self.prune_history(retention_days, &outcome.execution_id)?;

        log::info!(
            "Stored round {} — {} observations, {} verdicts",
            outcome.execution_id,
            outcome.records.len(),
            outcome.hypotheses.len()
        );
        Ok(outcome.execution_id.clone())
    }

    /// Delete observations older than the retention window, then any
    /// executions (and their verdicts and metals) left without observations.
    ///
    /// The round just written is exempt even if its timestamp is old, so a
    /// backfilled store never deletes itself.
    pub fn prune_history(&self, retention_days: u32, keep_execution_id: &str) -> Result<(), DbError> {
        let cutoff = (Utc::now() - Duration::days(retention_days as i64)).to_rfc3339();

        self.with_transaction(|db| {
            let observations = db.conn.execute(
                "DELETE FROM observations WHERE timestamp < ?1 AND execution_id != ?2",
                params![cutoff, keep_execution_id],
            )?;

            // Children first: verdicts and battery_metals reference executions,
            // and foreign keys are enforced on this connection.
            db.conn.execute(
                "DELETE FROM verdicts WHERE execution_id != ?1 AND execution_id NOT IN
                 (SELECT DISTINCT execution_id FROM observations)",
                params![keep_execution_id],
            )?;
            db.conn.execute(
                "DELETE FROM battery_metals WHERE execution_id != ?1 AND execution_id NOT IN
                 (SELECT DISTINCT execution_id FROM observations)",
                params![keep_execution_id],
            )?;
            let executions = db.conn.execute(
                "DELETE FROM executions WHERE execution_id != ?1 AND execution_id NOT IN
                 (SELECT DISTINCT execution_id FROM observations)",
                params![keep_execution_id],
            )?;

            if observations > 0 {
                log::info!(
                    "Pruned {} observations and {} executions past {} days",
                    observations,
                    executions,
                    retention_days
                );
            }
            Ok(())
        })
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// One signal's history over the last `days`, oldest first, each point
    /// joined to the decision context of the round that recorded it.
    pub fn signal_history(
        &self,
        signal_id: &str,
        days: u32,
    ) -> Result<Vec<SignalHistoryRow>, DbError> {
        let cutoff = (Utc::now() - Duration::days(days as i64)).to_rfc3339();
        let mut stmt = self.conn.prepare(
            "SELECT o.timestamp, o.value, o.raw_output, o.context_status,
                    o.alert, e.index_score, e.index_tier, o.execution_id
             FROM observations o
             JOIN executions e ON o.execution_id = e.execution_id
             WHERE o.signal_id = ?1 AND o.timestamp >= ?2
             ORDER BY o.timestamp ASC",
        )?;

        let rows = stmt.query_map(params![signal_id, cutoff], |row| {
            Ok(SignalHistoryRow {
                timestamp: row.get(0)?,
                value: row.get(1)?,
                raw_output: row.get(2)?,
                context_status: row.get(3)?,
                alert: row.get(4)?,
                index_score: row.get(5)?,
                index_tier: row.get(6)?,
                execution_id: row.get(7)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// All observation rows stored for one execution.
    pub fn observations_for(&self, execution_id: &str) -> Result<Vec<ObservationRow>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT signal_id, label, domain, priority, unit, threshold,
                    raw_output, value, extraction_method, context_status,
                    alert, hypothesis, fetch_status, timestamp, execution_id
             FROM observations
             WHERE execution_id = ?1
             ORDER BY signal_id ASC",
        )?;

        let rows = stmt.query_map(params![execution_id], |row| {
            Ok(ObservationRow {
                signal_id: row.get(0)?,
                label: row.get(1)?,
                domain: row.get(2)?,
                priority: row.get(3)?,
                unit: row.get(4)?,
                threshold: row.get(5)?,
                raw_output: row.get(6)?,
                value: row.get(7)?,
                extraction_method: row.get(8)?,
                context_status: row.get(9)?,
                alert: row.get(10)?,
                hypothesis: row.get(11)?,
                fetch_status: row.get(12)?,
                timestamp: row.get(13)?,
                execution_id: row.get(14)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// Just the numeric points for one signal, oldest first. Rounds where
    /// extraction failed are skipped.
    pub fn numeric_series(&self, signal_id: &str, days: u32) -> Result<Vec<SignalPoint>, DbError> {
        let cutoff = (Utc::now() - Duration::days(days as i64)).to_rfc3339();
        let mut stmt = self.conn.prepare(
            "SELECT timestamp, value FROM observations
             WHERE signal_id = ?1 AND timestamp >= ?2 AND value IS NOT NULL
             ORDER BY timestamp ASC",
        )?;

        let rows = stmt.query_map(params![signal_id, cutoff], |row| {
            Ok(SignalPoint {
                timestamp: row.get(0)?,
                value: row.get(1)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// Trend and anomaly statistics over a signal's stored numeric history.
    pub fn signal_trend(&self, signal_id: &str, days: u32) -> Result<TrendAnalysis, DbError> {
        let series: Vec<f64> = self
            .numeric_series(signal_id, days)?
            .iter()
            .map(|p| p.value)
            .collect();
        Ok(analyze(&series))
    }

    /// The most recent executions, newest first.
    pub fn last_executions(&self, limit: u32) -> Result<Vec<ExecutionRow>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT execution_id, signal_count, extracted_count, alert_count,
                    index_score, index_tier, start_time, end_time,
                    duration_seconds, status
             FROM executions
             ORDER BY start_time DESC
             LIMIT ?1",
        )?;

        let rows = stmt.query_map(params![limit], Self::execution_from_row)?;
        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// Threshold breaches over the last `days`, newest first, each joined
    /// to the decision context of its owning execution.
    pub fn alert_history(&self, days: u32) -> Result<Vec<AlertRow>, DbError> {
        let cutoff = (Utc::now() - Duration::days(days as i64)).to_rfc3339();
        let mut stmt = self.conn.prepare(
            "SELECT o.signal_id, o.label, o.value, o.threshold, o.timestamp,
                    o.execution_id, e.index_score, e.index_tier
             FROM observations o
             JOIN executions e ON o.execution_id = e.execution_id
             WHERE o.alert = 'alert' AND o.timestamp >= ?1
             ORDER BY o.timestamp DESC",
        )?;

        let rows = stmt.query_map(params![cutoff], |row| {
            Ok(AlertRow {
                signal_id: row.get(0)?,
                label: row.get(1)?,
                value: row.get(2)?,
                threshold: row.get(3)?,
                timestamp: row.get(4)?,
                execution_id: row.get(5)?,
                index_score: row.get(6)?,
                index_tier: row.get(7)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// One hypothesis's verdicts over the last `days`, oldest first.
    pub fn hypothesis_history(
        &self,
        hypothesis_id: &str,
        days: u32,
    ) -> Result<Vec<VerdictRow>, DbError> {
        let cutoff = (Utc::now() - Duration::days(days as i64)).to_rfc3339();
        let mut stmt = self.conn.prepare(
            "SELECT v.execution_id, v.hypothesis_id, v.verdict, v.explanation, v.condition_text
             FROM verdicts v
             JOIN executions e ON v.execution_id = e.execution_id
             WHERE v.hypothesis_id = ?1 AND e.start_time >= ?2
             ORDER BY e.start_time ASC",
        )?;

        let rows = stmt.query_map(params![hypothesis_id, cutoff], |row| {
            Ok(VerdictRow {
                execution_id: row.get(0)?,
                hypothesis_id: row.get(1)?,
                verdict: row.get(2)?,
                explanation: row.get(3)?,
                condition: row.get(4)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// The battery matrix stored for one execution.
    pub fn battery_matrix_for(&self, execution_id: &str) -> Result<Vec<MetalRow>, DbError> {
        let mut stmt = self.conn.prepare(
            "SELECT execution_id, signal_id, metal, value, cutoff, unit, bullish
             FROM battery_metals
             WHERE execution_id = ?1
             ORDER BY signal_id ASC",
        )?;

        let rows = stmt.query_map(params![execution_id], |row| {
            Ok(MetalRow {
                execution_id: row.get(0)?,
                signal_id: row.get(1)?,
                metal: row.get(2)?,
                value: row.get(3)?,
                cutoff: row.get(4)?,
                unit: row.get(5)?,
                bullish: row.get(6)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// Battery-metals rows across every round in the last `days`, oldest
    /// round first, stamped with each round's start time.
    pub fn battery_metals_history(&self, days: u32) -> Result<Vec<MetalHistoryRow>, DbError> {
        let cutoff = (Utc::now() - Duration::days(days as i64)).to_rfc3339();
        let mut stmt = self.conn.prepare(
            "SELECT b.execution_id, b.signal_id, b.metal, b.value, b.cutoff,
                    b.unit, b.bullish, e.start_time
             FROM battery_metals b
             JOIN executions e ON b.execution_id = e.execution_id
             WHERE e.start_time >= ?1
             ORDER BY e.start_time ASC, b.signal_id ASC",
        )?;

        let rows = stmt.query_map(params![cutoff], |row| {
            Ok(MetalHistoryRow {
                execution_id: row.get(0)?,
                signal_id: row.get(1)?,
                metal: row.get(2)?,
                value: row.get(3)?,
                cutoff: row.get(4)?,
                unit: row.get(5)?,
                bullish: row.get(6)?,
                start_time: row.get(7)?,
            })
        })?;

        rows.collect::<Result<Vec<_>, _>>().map_err(DbError::from)
    }

    /// Export the last `days` of history as a pretty-printed JSON file.
    /// Returns the assembled snapshot.
    pub fn export_json(&self, path: &Path, days: u32) -> Result<HistoryExport, DbError> {
        let export = HistoryExport {
            generated_at: Utc::now().to_rfc3339(),
            window_days: days,
            summary: self.dashboard_summary()?,
            executions: self.last_executions(1000)?,
            alerts: self.alert_history(days)?,
            battery_metals: self.battery_metals_history(days)?,
        };

        let json = serde_json::to_string_pretty(&export)?;
        std::fs::write(path, json).map_err(DbError::Export)?;
        log::info!("Exported {} days of history to {}", days, path.display());
        Ok(export)
    }

    /// Store-wide counters plus the latest execution, for the dashboard view.
    pub fn dashboard_summary(&self) -> Result<DashboardSummary, DbError> {
        let execution_count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM executions", [], |row| row.get(0))?;
        let observation_count: i64 =
            self.conn
                .query_row("SELECT COUNT(*) FROM observations", [], |row| row.get(0))?;

        let day_ago = (Utc::now() - Duration::days(1)).to_rfc3339();
        let alerts_last_24h: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM observations WHERE alert = 'alert' AND timestamp >= ?1",
            params![day_ago],
            |row| row.get(0),
        )?;

        let latest = self.last_executions(1)?.into_iter().next();

        Ok(DashboardSummary {
            execution_count,
            observation_count,
            alerts_last_24h,
            latest,
        })
    }

    fn execution_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<ExecutionRow> {
        Ok(ExecutionRow {
            execution_id: row.get(0)?,
            signal_count: row.get(1)?,
            extracted_count: row.get(2)?,
            alert_count: row.get(3)?,
            index_score: row.get(4)?,
            index_tier: row.get(5)?,
            start_time: row.get(6)?,
            end_time: row.get(7)?,
            duration_seconds: row.get(8)?,
            status: row.get(9)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SignalRegistry;
    use crate::execution::{generate_execution_id, run_round, FetchStatus, SourceReading};
    use crate::trends::TrendDirection;

    /// Create a temporary database for testing.
    ///
    /// We leak the `TempDir` so the directory persists for the duration of the test.
    /// Test temp dirs are cleaned up by the OS.
    fn test_db() -> HistoryDb {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let path = dir.path().join("test_history.db");
        // Leak the TempDir so it is not deleted while the DB connection is open.
        std::mem::forget(dir);
        HistoryDb::open_at(path).expect("Failed to open test database")
    }

    fn reading(id: &str, output: &str) -> SourceReading {
        SourceReading {
            signal_id: id.to_string(),
            status: FetchStatus::Ok,
            raw_output: output.to_string(),
        }
    }

    fn sample_round() -> crate::execution::RoundOutcome {
        let registry = SignalRegistry::builtin();
        run_round(
            &registry,
            &[
                reading("R11", "R11=45.2%"),
                reading("R24", "TTF=€30.5"),
                reading("R00", "R00=22"),
            ],
        )
    }

    #[test]
    fn test_store_and_read_round() {
        let db = test_db();
        let outcome = sample_round();
        let id = db.store_round(&outcome, 90).expect("store");
        assert_eq!(id, outcome.execution_id);

        let history = db.signal_history("R11", 7).expect("history");
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].value, Some(45.2));
        assert_eq!(history[0].context_status.as_deref(), Some("stable"));
        assert_eq!(history[0].index_score, outcome.index.score);
        assert_eq!(history[0].index_tier, outcome.index.tier.label());

        let observations = db.observations_for(&id).expect("observations");
        assert_eq!(observations.len(), 3);
        let r11 = observations.iter().find(|o| o.signal_id == "R11").unwrap();
        assert_eq!(r11.hypothesis.as_deref(), Some("H1_P4"));
        assert_eq!(r11.extraction_method.as_deref(), Some("source_pattern"));

        let executions = db.last_executions(5).expect("executions");
        assert_eq!(executions.len(), 1);
        assert_eq!(executions[0].signal_count, 3);
        assert_eq!(executions[0].extracted_count, 3);
        assert_eq!(executions[0].index_score, outcome.index.score);

        let verdicts = db.hypothesis_history("H1_P4", 7).expect("verdicts");
        assert_eq!(verdicts.len(), 1);
        assert_eq!(verdicts[0].verdict, "full-pass");

        let metals = db.battery_matrix_for(&id).expect("metals");
        assert_eq!(metals.len(), 6);
        assert!(metals.iter().all(|m| !m.bullish));
    }

    #[test]
    fn test_storing_same_round_twice_is_idempotent() {
        let db = test_db();
        let outcome = sample_round();

        db.store_round(&outcome, 90).expect("first store");
        db.store_round(&outcome, 90).expect("second store");

        let history = db.signal_history("R11", 7).expect("history");
        assert_eq!(history.len(), 1, "re-store must not duplicate observations");

        let executions = db.last_executions(10).expect("executions");
        assert_eq!(executions.len(), 1);

        let verdicts = db.hypothesis_history("H1_P4", 7).expect("verdicts");
        assert_eq!(verdicts.len(), 1);
    }

    #[test]
    fn test_retention_prunes_old_rounds() {
        let db = test_db();

        // A round backdated past the retention window.
        let mut old = sample_round();
        old.started_at = Utc::now() - Duration::days(100);
        old.finished_at = old.started_at;
        old.execution_id = generate_execution_id(old.started_at);
        let old_id = old.execution_id.clone();

        db.store_round(&old, 90).expect("store old");
        // The just-written round survives its own prune even when backdated.
        assert_eq!(db.last_executions(10).unwrap().len(), 1);

        let fresh = sample_round();
        db.store_round(&fresh, 90).expect("store fresh");

        let executions = db.last_executions(10).expect("executions");
        assert_eq!(executions.len(), 1);
        assert_eq!(executions[0].execution_id, fresh.execution_id);

        // Children of the pruned execution are gone too.
        assert!(db.battery_matrix_for(&old_id).unwrap().is_empty());
        let verdicts = db.hypothesis_history("H1_P4", 365).expect("verdicts");
        assert_eq!(verdicts.len(), 1);
        assert_eq!(verdicts[0].execution_id, fresh.execution_id);
    }

    #[test]
    fn test_round_without_observations_survives_its_own_store() {
        let db = test_db();
        let registry = SignalRegistry::builtin();

        // No readings at all: the execution row has no observation children,
        // so the orphan pass must still exempt the round just written.
        let outcome = run_round(&registry, &[]);
        let id = db.store_round(&outcome, 90).expect("store");

        let executions = db.last_executions(10).expect("executions");
        assert_eq!(executions.len(), 1);
        assert_eq!(executions[0].execution_id, id);
        assert_eq!(executions[0].status.as_deref(), Some("failed"));

        assert_eq!(db.battery_matrix_for(&id).unwrap().len(), 6);
        let verdicts = db.hypothesis_history("H1_P4", 7).expect("verdicts");
        assert_eq!(verdicts.len(), 1);
    }

    #[test]
    fn test_battery_metals_history_windows_by_round() {
        let db = test_db();

        let mut old = sample_round();
        old.started_at = Utc::now() - Duration::days(20);
        old.finished_at = old.started_at;
        old.execution_id = generate_execution_id(old.started_at);
        db.store_round(&old, 90).expect("store old");

        let fresh = sample_round();
        db.store_round(&fresh, 90).expect("store fresh");

        // Both rounds inside the window: 6 metals each, oldest round first.
        let history = db.battery_metals_history(30).expect("history");
        assert_eq!(history.len(), 12);
        assert_eq!(history[0].execution_id, old.execution_id);
        assert_eq!(history[11].execution_id, fresh.execution_id);
        assert!(history.iter().all(|m| !m.start_time.is_empty()));

        // A tighter window drops the old round.
        let recent = db.battery_metals_history(7).expect("recent");
        assert_eq!(recent.len(), 6);
        assert!(recent.iter().all(|m| m.execution_id == fresh.execution_id));
    }

    #[test]
    fn test_export_json_writes_snapshot() {
        let db = test_db();
        let outcome = sample_round();
        db.store_round(&outcome, 90).expect("store");

        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("export.json");
        let export = db.export_json(&path, 30).expect("export");

        assert_eq!(export.window_days, 30);
        assert_eq!(export.summary.execution_count, 1);
        assert_eq!(export.executions.len(), 1);
        assert_eq!(export.alerts.len(), 1);
        assert_eq!(export.battery_metals.len(), 6);

        let written = std::fs::read_to_string(&path).expect("read back");
        let parsed: HistoryExport = serde_json::from_str(&written).expect("parse");
        assert_eq!(parsed.executions[0].execution_id, outcome.execution_id);
    }

    #[test]
    fn test_alert_history_and_counts() {
        let db = test_db();
        // R00=22 breaches its >15 threshold.
        let outcome = sample_round();
        db.store_round(&outcome, 90).expect("store");

        let alerts = db.alert_history(7).expect("alerts");
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].signal_id, "R00");
        assert_eq!(alerts[0].value, Some(22.0));
        assert_eq!(alerts[0].threshold.as_deref(), Some(">15"));
        assert_eq!(alerts[0].index_score, outcome.index.score);
        assert_eq!(alerts[0].index_tier, outcome.index.tier.label());

        let executions = db.last_executions(1).expect("executions");
        assert_eq!(executions[0].alert_count, 1);
    }

    #[test]
    fn test_numeric_series_skips_failed_extractions() {
        let db = test_db();
        let registry = SignalRegistry::builtin();

        let outcome = run_round(&registry, &[reading("R00", "no numbers here")]);
        db.store_round(&outcome, 90).expect("store");

        assert_eq!(db.signal_history("R00", 7).unwrap().len(), 1);
        assert!(db.numeric_series("R00", 7).unwrap().is_empty());
    }

    #[test]
    fn test_signal_trend_over_stored_history() {
        let db = test_db();
        let registry = SignalRegistry::builtin();

        // Three rounds with distinct ids and ascending timestamps.
        for (i, output) in ["R00=10", "R00=20", "R00=30"].into_iter().enumerate() {
            let mut outcome = run_round(&registry, &[reading("R00", output)]);
            outcome.started_at = Utc::now() - Duration::days(3 - i as i64);
            outcome.execution_id = generate_execution_id(outcome.started_at);
            db.store_round(&outcome, 90).expect("store");
        }

        match db.signal_trend("R00", 30).expect("trend") {
            TrendAnalysis::Stats(report) => {
                assert_eq!(report.data_points, 3);
                assert_eq!(report.direction, TrendDirection::Rising);
                assert_eq!(report.current, 30.0);
            }
            other => panic!("expected stats, got {other:?}"),
        }
    }

    #[test]
    fn test_empty_store_reads() {
        let db = test_db();

        assert!(db.signal_history("R11", 30).unwrap().is_empty());
        assert!(db.numeric_series("R11", 30).unwrap().is_empty());
        assert!(db.last_executions(10).unwrap().is_empty());
        assert!(db.alert_history(30).unwrap().is_empty());
        assert!(db.hypothesis_history("H1_P4", 30).unwrap().is_empty());

        let summary = db.dashboard_summary().expect("summary");
        assert_eq!(summary.execution_count, 0);
        assert_eq!(summary.observation_count, 0);
        assert_eq!(summary.alerts_last_24h, 0);
        assert!(summary.latest.is_none());
    }

    #[test]
    fn test_dashboard_summary() {
        let db = test_db();
        let outcome = sample_round();
        db.store_round(&outcome, 90).expect("store");

        let summary = db.dashboard_summary().expect("summary");
        assert_eq!(summary.execution_count, 1);
        assert_eq!(summary.observation_count, 3);
        assert_eq!(summary.alerts_last_24h, 1);
        let latest = summary.latest.expect("latest execution");
        assert_eq!(latest.execution_id, outcome.execution_id);
    }
}
