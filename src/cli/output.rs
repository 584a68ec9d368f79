//! Output formatting utilities
//!
//! Provides table and JSON output formatting for CLI commands.

use crate::cli::args::OutputFormat;
use crate::domain::{JobIdentity, JobStatus};
use crate::notify::DeliveryReport;
use crate::services::MonitorOutcome;
use serde::Serialize;
use std::io::{self, Write};

/// Format and print output based on the selected format
pub fn print_output<T: Serialize + TableDisplay>(data: &T, format: OutputFormat) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();

    match format {
        OutputFormat::Table => {
            writeln!(handle, "{}", data.to_table())?;
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(data).unwrap_or_else(|_| "{}".to_string());
            writeln!(handle, "{}", json)?;
        }
        OutputFormat::Compact => {
            writeln!(handle, "{}", data.to_compact())?;
        }
    }

    Ok(())
}

/// Trait for types that can be displayed as a table
pub trait TableDisplay {
    /// Format as a table string
    fn to_table(&self) -> String;

    /// Format as a compact single line
    fn to_compact(&self) -> String {
        self.to_table().replace('\n', " | ")
    }
}

/// One-shot view of a job
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    pub job: JobIdentity,
    pub status: Option<JobStatus>,
    pub status_code: Option<i64>,
    pub gpu_memory_mb: Option<f64>,
    pub idle_threshold_mb: f64,
    pub idle: Option<bool>,
}

impl ProbeReport {
    pub fn new(
        job: JobIdentity,
        status: Option<JobStatus>,
        gpu_memory_mb: Option<f64>,
        idle_threshold_mb: f64,
    ) -> Self {
        Self {
            status_code: status.map(|s| s.code()),
            idle: gpu_memory_mb.map(|usage| usage < idle_threshold_mb),
            job,
            status,
            gpu_memory_mb,
            idle_threshold_mb,
        }
    }
}

impl TableDisplay for ProbeReport {
    fn to_table(&self) -> String {
        let status = self
            .status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "unavailable".to_string());
        let memory = match (self.gpu_memory_mb, self.idle) {
            (Some(mb), Some(true)) => format!("{} MB (idle, < {} MB)", mb, self.idle_threshold_mb),
            (Some(mb), _) => format!("{} MB", mb),
            (None, _) => "unavailable".to_string(),
        };

        format!(
            "Job: {}\n  Cluster: {}\n  Node: {}\n  Pod: {}\n  Status: {}\n  GPU Memory: {}",
            self.job.job_id, self.job.cluster, self.job.node, self.job.pod, status, memory
        )
    }

    fn to_compact(&self) -> String {
        let status = self
            .status
            .map(|s| s.to_string())
            .unwrap_or_else(|| "-".to_string());
        let memory = self
            .gpu_memory_mb
            .map(|mb| format!("{}MB", mb))
            .unwrap_or_else(|| "-".to_string());
        format!("{}: {} {}", self.job.job_id, status, memory)
    }
}

/// Per-channel test results
#[derive(Debug, Clone, Serialize)]
pub struct DeliverySummary {
    pub channels: Vec<ChannelResult>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChannelResult {
    pub channel: String,
    pub delivered: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl From<&DeliveryReport> for ChannelResult {
    fn from(report: &DeliveryReport) -> Self {
        Self {
            channel: report.channel.clone(),
            delivered: report.result.is_ok(),
            error: report.result.as_ref().err().map(|e| e.to_string()),
        }
    }
}

impl DeliverySummary {
    pub fn from_reports(reports: &[DeliveryReport]) -> Self {
        Self {
            channels: reports.iter().map(ChannelResult::from).collect(),
        }
    }

    /// Number of channels that delivered
    pub fn delivered(&self) -> usize {
        self.channels.iter().filter(|c| c.delivered).count()
    }
}

impl TableDisplay for DeliverySummary {
    fn to_table(&self) -> String {
        if self.channels.is_empty() {
            return "No notification channels enabled".to_string();
        }

        let mut output = String::new();
        for channel in &self.channels {
            match &channel.error {
                None => output.push_str(&format!("✓ {}\n", channel.channel)),
                Some(e) => output.push_str(&format!("✗ {}: {}\n", channel.channel, e)),
            }
        }
        output.push_str(&format!(
            "\n{}/{} channels delivered",
            self.delivered(),
            self.channels.len()
        ));
        output
    }

    fn to_compact(&self) -> String {
        format!("{}/{} delivered", self.delivered(), self.channels.len())
    }
}

/// How a watch run ended
#[derive(Debug, Clone, Serialize)]
pub struct WatchSummary {
    pub job_id: String,
    pub outcome: MonitorOutcome,
}

impl TableDisplay for WatchSummary {
    fn to_table(&self) -> String {
        match self.outcome {
            MonitorOutcome::QueueFinished => {
                format!("✓ Job {} left the queue and is running", self.job_id)
            }
            MonitorOutcome::Terminated => format!("✓ Idle job {} was stopped", self.job_id),
            MonitorOutcome::Failed => {
                format!("✗ Lost contact with the platform while watching {}", self.job_id)
            }
        }
    }
}

/// Freshly issued API token
#[derive(Debug, Clone, Serialize)]
pub struct TokenOutput {
    pub token: String,
}

impl TableDisplay for TokenOutput {
    fn to_table(&self) -> String {
        self.token.clone()
    }
}
