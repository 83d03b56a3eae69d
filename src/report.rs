//! Reporting sink
//!
//! Every engine iteration produces exactly one [`IterationRecord`], failure
//! or not, so the operator can tell continuous progress from a stall. At the
//! end of a run a [`SessionSummary`] closes the stream. Two sinks ship:
//! a tracing log sink (always on) and an append-only JSONL file sink
//! (one JSON object per line).
//!
//! Author: AI-Generated
//! Created: 2026-08-11

use crate::bandit::ArmSnapshot;
use crate::stats::VenueTally;
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// How an iteration ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum IterationOutcome {
    /// The scan surfaced nothing profitable
    NoOpportunity,
    /// The best find did not clear the execution threshold
    BelowThreshold,
    /// An execution attempt ran to completion or aborted
    Executed { succeeded: bool },
}

/// One structured record per engine iteration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IterationRecord {
    pub iteration: u64,
    pub venue: String,
    pub opportunity_count: usize,
    /// Route of the best opportunity, when one existed
    pub best_route: Option<String>,
    /// Best net profit estimate in native smallest units, decimal string
    pub net_profit_estimate: Option<String>,
    /// USD rendering of the estimate, display only
    pub net_profit_usd: Option<String>,
    pub executed: bool,
    pub outcome: IterationOutcome,
    pub timestamp: DateTime<Utc>,
}

/// End-of-run summary record
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub iterations: u64,
    pub scans: u64,
    pub trades: u64,
    pub successful_trades: u64,
    /// Cumulative realized profit in native smallest units, decimal string
    pub cumulative_profit_wei: String,
    pub cumulative_profit_usd: String,
    pub win_rate: f64,
    pub venues: BTreeMap<String, VenueTally>,
    /// Per-venue bandit posterior at the end of the run
    pub arms: Vec<ArmSnapshot>,
}

/// Destination for iteration records and the session summary
pub trait ReportSink: Send {
    fn record(&mut self, record: &IterationRecord) -> Result<()>;
    fn summary(&mut self, summary: &SessionSummary) -> Result<()>;
}

/// Sink that writes records through `tracing`
pub struct LogSink;

impl ReportSink for LogSink {
    fn record(&mut self, record: &IterationRecord) -> Result<()> {
        info!(
            iteration = record.iteration,
            venue = %record.venue,
            opportunities = record.opportunity_count,
            best_route = record.best_route.as_deref().unwrap_or("-"),
            net_estimate = record.net_profit_estimate.as_deref().unwrap_or("-"),
            usd = record.net_profit_usd.as_deref().unwrap_or("-"),
            outcome = ?record.outcome,
            "iteration"
        );
        Ok(())
    }

    fn summary(&mut self, summary: &SessionSummary) -> Result<()> {
        info!(
            iterations = summary.iterations,
            trades = summary.trades,
            successful = summary.successful_trades,
            profit_wei = %summary.cumulative_profit_wei,
            profit_usd = %summary.cumulative_profit_usd,
            win_rate = format!("{:.1}%", summary.win_rate * 100.0).as_str(),
            "session complete"
        );
        for arm in &summary.arms {
            info!(
                venue = %arm.venue_id,
                alpha = arm.alpha,
                beta = arm.beta,
                expected_value = format!("{:.3}", arm.expected_value).as_str(),
                win_rate = format!("{:.1}%", arm.win_rate * 100.0).as_str(),
                selections = arm.selections,
                "venue posterior"
            );
        }
        Ok(())
    }
}

/// Append-only JSONL sink: one line per record, summary last
pub struct JsonlSink {
    path: PathBuf,
}

impl JsonlSink {
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("failed to create report dir: {}", parent.display()))?;
            }
        }
        Ok(Self { path })
    }

    fn append<T: Serialize>(&self, value: &T) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open report file: {}", self.path.display()))?;
        let json = serde_json::to_string(value).context("failed to serialize report record")?;
        writeln!(file, "{}", json)?;
        Ok(())
    }

    /// Lines currently in the report file
    pub fn record_count(&self) -> Result<usize> {
        if !self.path.exists() {
            return Ok(0);
        }
        let content = std::fs::read_to_string(&self.path)?;
        Ok(content.lines().filter(|l| !l.trim().is_empty()).count())
    }
}

impl ReportSink for JsonlSink {
    fn record(&mut self, record: &IterationRecord) -> Result<()> {
        self.append(record)
    }

    fn summary(&mut self, summary: &SessionSummary) -> Result<()> {
        self.append(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::fs;

    fn sample_record(iteration: u64) -> IterationRecord {
        IterationRecord {
            iteration,
            venue: "base".to_string(),
            opportunity_count: 1,
            best_route: Some("native->0.05%->stable->0.3%->native".to_string()),
            net_profit_estimate: Some("1000".to_string()),
            net_profit_usd: Some("0.0035".to_string()),
            executed: false,
            outcome: IterationOutcome::BelowThreshold,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn jsonl_sink_appends_one_line_per_record() {
        let path = env::temp_dir().join("multiarb_report_test.jsonl");
        let _ = fs::remove_file(&path);

        let mut sink = JsonlSink::new(&path).unwrap();
        sink.record(&sample_record(1)).unwrap();
        sink.record(&sample_record(2)).unwrap();
        assert_eq!(sink.record_count().unwrap(), 2);

        // Records round-trip through serde_json
        let content = fs::read_to_string(&path).unwrap();
        let first: IterationRecord = serde_json::from_str(content.lines().next().unwrap()).unwrap();
        assert_eq!(first.iteration, 1);
        assert_eq!(first.outcome, IterationOutcome::BelowThreshold);

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn outcome_serializes_with_a_tag() {
        let json = serde_json::to_string(&IterationOutcome::Executed { succeeded: true }).unwrap();
        assert_eq!(json, r#"{"kind":"executed","succeeded":true}"#);
        assert_eq!(
            serde_json::to_string(&IterationOutcome::NoOpportunity).unwrap(),
            r#"{"kind":"no_opportunity"}"#
        );
    }

    #[test]
    fn log_sink_accepts_records_and_summary() {
        let mut sink = LogSink;
        sink.record(&sample_record(1)).unwrap();
        sink.summary(&SessionSummary {
            started_at: Utc::now(),
            finished_at: Utc::now(),
            iterations: 1,
            scans: 1,
            trades: 0,
            successful_trades: 0,
            cumulative_profit_wei: "0".to_string(),
            cumulative_profit_usd: "0".to_string(),
            win_rate: 0.0,
            venues: BTreeMap::new(),
            arms: Vec::new(),
        })
        .unwrap();
    }
}
