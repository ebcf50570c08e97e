use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Local};
use quill_domain::{AgentTrace, PipelineState, Recommendation, VerificationResult};
use serde::{Deserialize, Serialize};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

const FILE_PREFIX: &str = "workflow_";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Error,
}

/// One persisted record per finished task.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunLogEntry {
    pub timestamp: DateTime<Local>,
    /// Wall-clock duration in seconds.
    pub duration: f64,
    pub status: RunStatus,
    pub task: String,
    pub agent_trace: AgentTrace,
    pub citations_count: usize,
    /// Length of the approved output in characters; zero when unapproved.
    pub output_length: usize,
    pub verification: Option<VerificationResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RunLogEntry {
    pub fn from_state(state: &PipelineState, duration: Duration) -> Self {
        Self {
            timestamp: Local::now(),
            duration: duration.as_secs_f64(),
            status: RunStatus::Success,
            task: state.task.clone(),
            agent_trace: state.agent_trace.clone(),
            citations_count: state.citations.len(),
            output_length: state.final_output.chars().count(),
            verification: state.verification_result.clone(),
            error: None,
        }
    }

    /// Entry for a run that aborted before reaching a terminal state.
    pub fn failed(task: impl Into<String>, duration: Duration, error: &anyhow::Error) -> Self {
        Self {
            timestamp: Local::now(),
            duration: duration.as_secs_f64(),
            status: RunStatus::Error,
            task: task.into(),
            agent_trace: AgentTrace::default(),
            citations_count: 0,
            output_length: 0,
            verification: None,
            error: Some(format!("{error:#}")),
        }
    }

    fn is_approved(&self) -> bool {
        self.verification
            .as_ref()
            .is_some_and(|result| result.recommendation == Recommendation::Approve)
    }
}

/// Aggregates over every run log in a directory. Rates are fractions in
/// `0.0..=1.0` and are `None` when there are no runs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    pub total_runs: usize,
    pub successful_runs: usize,
    pub average_duration: Option<f64>,
    pub success_rate: Option<f64>,
    pub citation_rate: Option<f64>,
    pub approval_rate: Option<f64>,
    /// Trace events per agent across all runs.
    pub agent_calls: BTreeMap<String, usize>,
}

impl RunSummary {
    fn from_entries(entries: &[RunLogEntry]) -> Self {
        let total_runs = entries.len();
        let rate = |count: usize| (total_runs > 0).then(|| count as f64 / total_runs as f64);

        let successful_runs = entries.iter().filter(|e| e.status == RunStatus::Success).count();
        let with_citations = entries.iter().filter(|e| e.citations_count > 0).count();
        let approved = entries.iter().filter(|e| e.is_approved()).count();
        let total_duration: f64 = entries.iter().map(|e| e.duration).sum();

        let mut agent_calls = BTreeMap::new();
        for event in entries.iter().flat_map(|e| e.agent_trace.iter()) {
            *agent_calls.entry(event.agent.to_string()).or_insert(0) += 1;
        }

        Self {
            total_runs,
            successful_runs,
            average_duration: (total_runs > 0).then(|| total_duration / total_runs as f64),
            success_rate: rate(successful_runs),
            citation_rate: rate(with_citations),
            approval_rate: rate(approved),
            agent_calls,
        }
    }
}

/// Writes and reads per-task JSON run logs under a single directory.
#[derive(Debug, Clone)]
pub struct RunLogger {
    dir: PathBuf,
}

impl RunLogger {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Persists `entry` as `workflow_<timestamp>.json` and returns its path.
    /// Entries written within the same millisecond get a numeric suffix.
    pub async fn write(&self, entry: &RunLogEntry) -> anyhow::Result<PathBuf> {
        tokio::fs::create_dir_all(&self.dir)
            .await
            .with_context(|| format!("Failed to create run log directory {}", self.dir.display()))?;

        let stem = format!("{FILE_PREFIX}{}", entry.timestamp.format("%Y%m%d_%H%M%S_%3f"));
        let content = serde_json::to_string_pretty(entry)?;
        let mut attempt = 0;
        loop {
            let name = match attempt {
                0 => format!("{stem}.json"),
                n => format!("{stem}_{n}.json"),
            };
            let path = self.dir.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path).await {
                Ok(mut file) => {
                    file.write_all(content.as_bytes())
                        .await
                        .with_context(|| format!("Failed to write run log {}", path.display()))?;
                    debug!(path = %path.display(), "Run log written");
                    return Ok(path);
                }
                Err(error) if error.kind() == ErrorKind::AlreadyExists => attempt += 1,
                Err(error) => {
                    return Err(error)
                        .with_context(|| format!("Failed to create run log {}", path.display()));
                }
            }
        }
    }

    /// Reads every run log in timestamp order. Unreadable files are skipped.
    pub async fn entries(&self) -> anyhow::Result<Vec<RunLogEntry>> {
        if !tokio::fs::try_exists(&self.dir).await? {
            return Ok(Vec::new());
        }

        let mut paths = Vec::new();
        let mut dir = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            let is_log = path
                .file_name()
                .and_then(|name| name.to_str())
                .is_some_and(|name| name.starts_with(FILE_PREFIX) && name.ends_with(".json"));
            if is_log {
                paths.push(path);
            }
        }
        paths.sort();

        let mut entries = Vec::with_capacity(paths.len());
        for path in paths {
            let parsed = tokio::fs::read_to_string(&path)
                .await
                .map_err(anyhow::Error::from)
                .and_then(|content| Ok(serde_json::from_str::<RunLogEntry>(&content)?));
            match parsed {
                Ok(entry) => entries.push(entry),
                Err(error) => warn!(path = %path.display(), %error, "Skipping unreadable run log"),
            }
        }
        Ok(entries)
    }

    pub async fn summarize(&self) -> anyhow::Result<RunSummary> {
        Ok(RunSummary::from_entries(&self.entries().await?))
    }
}
