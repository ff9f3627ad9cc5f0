//! Round orchestration: turns one batch of source readings into normalized
//! signal records, hypothesis verdicts, and the composite index, stamped
//! with a unique execution id.
//!
//! Fetching itself happens outside this crate; a round starts from the raw
//! outputs the fetch layer collected. Extraction always runs on whatever
//! output is present, even for failed fetches, since a source that timed
//! out mid-write may still have printed a usable value.

use chrono::{DateTime, Utc};
use log::{info, warn};
use sha2::{Digest, Sha256};

use crate::config::{Priority, SignalRegistry};
use crate::context::evaluate_status;
use crate::extract::{extract_value, ExtractionMethod};
use crate::hypotheses::{evaluate_all, BatteryMatrix, HypothesisOutcome, SignalValues};
use crate::index::{aggregate, CompositeIndex};
use crate::threshold::{compare, ThresholdVerdict};

/// How the fetch layer fared for one source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    Ok,
    /// Non-success HTTP response from the source.
    HttpError(u16),
    Timeout,
    /// The fetcher itself raised.
    Exception,
    /// No fetcher ran for this signal this round.
    Missing,
}

impl FetchStatus {
    pub fn label(self) -> String {
        match self {
            Self::Ok => "ok".to_string(),
            Self::HttpError(code) => format!("http-{code}"),
            Self::Timeout => "timeout".to_string(),
            Self::Exception => "exception".to_string(),
            Self::Missing => "missing".to_string(),
        }
    }
}

/// Raw output of one fetch, as handed to the pipeline.
#[derive(Debug, Clone)]
pub struct SourceReading {
    pub signal_id: String,
    pub status: FetchStatus,
    pub raw_output: String,
}

/// One signal's fully evaluated state for a round. Registry metadata is
/// copied in at evaluation time so stored rows stay interpretable even
/// after the registry changes.
#[derive(Debug, Clone)]
pub struct SignalRecord {
    pub signal_id: String,
    pub label: String,
    pub domain: String,
    pub priority: Priority,
    pub unit: Option<String>,
    pub threshold: Option<String>,
    pub raw_output: String,
    pub value: Option<f64>,
    pub extraction_method: Option<ExtractionMethod>,
    pub context_status: String,
    pub alert: ThresholdVerdict,
    pub hypothesis: Option<String>,
    pub fetch_status: String,
}

/// Overall health of a round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionStatus {
    /// Every reading yielded a value.
    Completed,
    /// Some readings yielded values.
    Partial,
    /// No reading yielded a value.
    Failed,
}

impl ExecutionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Partial => "partial",
            Self::Failed => "failed",
        }
    }
}

/// Everything one round produced, ready for storage and reporting.
#[derive(Debug, Clone)]
pub struct RoundOutcome {
    pub execution_id: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub status: ExecutionStatus,
    pub records: Vec<SignalRecord>,
    pub hypotheses: Vec<HypothesisOutcome>,
    pub battery: BatteryMatrix,
    pub index: CompositeIndex,
}

/// Execution id: UTC second stamp plus an 8-char digest suffix so two
/// rounds in the same second stay distinct.
pub fn generate_execution_id(at: DateTime<Utc>) -> String {
    let stamp = at.format("%Y%m%d_%H%M%S");
    let digest = Sha256::digest(at.timestamp_micros().to_string().as_bytes());
    format!("{stamp}_{}", &hex::encode(digest)[..8])
}

/// Run the full pipeline over one batch of readings: extract, evaluate
/// context and thresholds, test hypotheses, aggregate the index.
///
/// Readings for signals the registry does not know are logged and dropped;
/// the pipeline cannot interpret a value it has no metadata for.
pub fn run_round(registry: &SignalRegistry, readings: &[SourceReading]) -> RoundOutcome {
    let started_at = Utc::now();
    let execution_id = generate_execution_id(started_at);

    let mut records = Vec::with_capacity(readings.len());
    let mut values = SignalValues::new();

    for reading in readings {
        let Some(spec) = registry.get(&reading.signal_id) else {
            warn!("dropping reading for unknown signal {}", reading.signal_id);
            continue;
        };

        let extraction = extract_value(&reading.raw_output, spec.pattern.as_ref());
        let value = match extraction.value {
            Ok(v) => {
                values.insert(spec.id.clone(), v);
                Some(v)
            }
            Err(err) => {
                warn!("no value for {}: {err}", spec.id);
                None
            }
        };

        let context_status = evaluate_status(spec.context_rule.as_ref(), value).to_string();
        let alert = match spec.threshold.as_deref() {
            Some(expr) => compare(value, expr),
            None => ThresholdVerdict::Indeterminate,
        };

        records.push(SignalRecord {
            signal_id: spec.id.clone(),
            label: spec.label.clone(),
            domain: spec.domain.clone(),
            priority: spec.priority,
            unit: spec.unit.clone(),
            threshold: spec.threshold.clone(),
            raw_output: reading.raw_output.clone(),
            value,
            extraction_method: extraction.method,
            context_status,
            alert,
            hypothesis: spec.hypothesis.clone(),
            fetch_status: reading.status.label(),
        });
    }

    let (hypotheses, battery) = evaluate_all(&values);
    let index = aggregate(&hypotheses);

    let extracted = records.iter().filter(|r| r.value.is_some()).count();
    let status = if records.is_empty() || extracted == 0 {
        ExecutionStatus::Failed
    } else if extracted == records.len() {
        ExecutionStatus::Completed
    } else {
        ExecutionStatus::Partial
    };

    let finished_at = Utc::now();
    info!(
        "round {execution_id}: {extracted}/{} values, index {:.1} ({})",
        records.len(),
        index.score,
        index.tier.label()
    );

    RoundOutcome {
        execution_id,
        started_at,
        finished_at,
        status,
        records,
        hypotheses,
        battery,
        index,
    }
}
