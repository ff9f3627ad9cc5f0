//! Vigil — signal ingestion and epistemic validation pipeline.
//!
//! Ingests the textual output of ~100 independent monitoring sources,
//! normalizes each reading into a numeric signal (or a typed extraction
//! failure), evaluates a fixed battery of composite hypotheses over the
//! signal map, folds the verdicts into a single 0–100 decision index, and
//! persists the full round to a local SQLite history for trend and anomaly
//! analysis.
//!
//! The per-source fetchers, the scheduler that invokes them, and any report
//! rendering live outside this crate. A caller hands [`execution::run_round`]
//! the raw readings the fetchers produced and receives a finalized
//! [`execution::RoundOutcome`]; [`db::HistoryDb::store_round`] is the sole
//! write path into the history store. [`ingest_round`] chains the two for
//! callers that want one call per round.

pub mod config;
pub mod context;
pub mod db;
mod error;
pub mod execution;
pub mod extract;
pub mod hypotheses;
pub mod index;
mod migrations;
pub mod threshold;
pub mod trends;

pub use error::VigilError;

use config::SignalRegistry;
use db::HistoryDb;
use execution::{run_round, RoundOutcome, SourceReading};

/// Evaluate one batch of readings and persist the round, pruning history
/// to the registry's retention window.
pub fn ingest_round(
    registry: &SignalRegistry,
    readings: &[SourceReading],
    db: &HistoryDb,
) -> Result<RoundOutcome, VigilError> {
    let outcome = run_round(registry, readings);
    db.store_round(&outcome, registry.retention_days)?;
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use execution::FetchStatus;

    #[test]
    fn ingest_round_evaluates_and_persists() {
        let dir = tempfile::tempdir().expect("temp dir");
        let db = HistoryDb::open_at(dir.path().join("history.db")).expect("open");
        std::mem::forget(dir);

        let registry = SignalRegistry::builtin();
        let readings = [SourceReading {
            signal_id: "R11".to_string(),
            status: FetchStatus::Ok,
            raw_output: "R11=45.2%".to_string(),
        }];

        let outcome: Result<RoundOutcome, VigilError> = ingest_round(&registry, &readings, &db);
        let outcome = outcome.expect("ingest");

        let stored = db.observations_for(&outcome.execution_id).expect("read back");
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].signal_id, "R11");
    }
}
