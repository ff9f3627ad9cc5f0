//! Shared type definitions for the database layer.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors specific to database operations.
#[derive(Debug, Error)]
pub enum DbError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Home directory not found")]
    HomeDirNotFound,

    #[error("Failed to create database directory: {0}")]
    CreateDir(std::io::Error),

    #[error("Schema migration failed: {0}")]
    Migration(String),

    #[error("Failed to write export file: {0}")]
    Export(std::io::Error),

    #[error("Failed to serialize export: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// A row from the `observations` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationRow {
    pub signal_id: String,
    pub label: String,
    pub domain: Option<String>,
    pub priority: Option<String>,
    pub unit: Option<String>,
    pub threshold: Option<String>,
    pub raw_output: Option<String>,
    pub value: Option<f64>,
    pub extraction_method: Option<String>,
    pub context_status: Option<String>,
    pub alert: Option<String>,
    pub hypothesis: Option<String>,
    pub fetch_status: Option<String>,
    pub timestamp: String,
    pub execution_id: String,
}

/// A row from the `executions` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionRow {
    pub execution_id: String,
    pub signal_count: i64,
    pub extracted_count: i64,
    pub alert_count: i64,
    pub index_score: f64,
    pub index_tier: String,
    pub start_time: String,
    pub end_time: Option<String>,
    pub duration_seconds: Option<f64>,
    pub status: Option<String>,
}

/// A row from the `verdicts` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerdictRow {
    pub execution_id: String,
    pub hypothesis_id: String,
    pub verdict: String,
    pub explanation: Option<String>,
    pub condition: Option<String>,
}

/// A row from the `battery_metals` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetalRow {
    pub execution_id: String,
    pub signal_id: String,
    pub metal: String,
    pub value: Option<f64>,
    pub cutoff: Option<f64>,
    pub unit: Option<String>,
    pub bullish: bool,
}

/// A battery-metals row over a history window, stamped with the start time
/// of the round that recorded it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetalHistoryRow {
    pub execution_id: String,
    pub signal_id: String,
    pub metal: String,
    pub value: Option<f64>,
    pub cutoff: Option<f64>,
    pub unit: Option<String>,
    pub bullish: bool,
    pub start_time: String,
}

/// One point of a signal's stored history, joined to the decision context
/// of the round that recorded it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalHistoryRow {
    pub timestamp: String,
    pub value: Option<f64>,
    pub raw_output: Option<String>,
    pub context_status: Option<String>,
    pub alert: Option<String>,
    pub index_score: f64,
    pub index_tier: String,
    pub execution_id: String,
}

/// One (timestamp, value) point of a signal's numeric history, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignalPoint {
    pub timestamp: String,
    pub value: f64,
}

/// A threshold breach pulled from stored history, joined to the decision
/// context of the round that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlertRow {
    pub signal_id: String,
    pub label: String,
    pub value: Option<f64>,
    pub threshold: Option<String>,
    pub timestamp: String,
    pub execution_id: String,
    pub index_score: f64,
    pub index_tier: String,
}

/// Aggregate store counters for the dashboard view.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub execution_count: i64,
    pub observation_count: i64,
    pub alerts_last_24h: i64,
    pub latest: Option<ExecutionRow>,
}

/// A portable JSON snapshot of recent history.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryExport {
    pub generated_at: String,
    pub window_days: u32,
    pub summary: DashboardSummary,
    pub executions: Vec<ExecutionRow>,
    pub alerts: Vec<AlertRow>,
    pub battery_metals: Vec<MetalHistoryRow>,
}
