//! Notification messages
//!
//! One constructor per monitor event. Titles are fixed per kind so channels
//! and tests can recognise them; bodies carry the job identity and a local
//! timestamp.

use crate::config::MonitorSettings;
use crate::domain::JobIdentity;
use chrono::Local;
use std::fmt;

/// Kind of event a notice reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeKind {
    Queued,
    QueueFinished,
    MonitoringStarted,
    ShutdownImminent,
    Terminated,
    TerminationFailed,
    TokenRefreshFailed,
    MonitorExiting,
    StartupFailed,
    Test,
}

impl NoticeKind {
    /// Title used for this kind
    pub fn title(&self) -> &'static str {
        match self {
            NoticeKind::Queued => "✅ Job is queued",
            NoticeKind::QueueFinished => "✅ Job left the queue and is running",
            NoticeKind::MonitoringStarted => "🚀 GPU idle monitor started",
            NoticeKind::ShutdownImminent => "⚠️ GPU job will be stopped soon",
            NoticeKind::Terminated => "✅ GPU job stopped",
            NoticeKind::TerminationFailed => "❌ Failed to stop GPU job",
            NoticeKind::TokenRefreshFailed => "❌ Token refresh failed",
            NoticeKind::MonitorExiting => "❌ GPU monitor exited",
            NoticeKind::StartupFailed => "❌ GPU monitor failed to start",
            NoticeKind::Test => "🧪 Notification test",
        }
    }
}

/// A title/body pair ready for delivery
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub title: String,
    pub body: String,
}

impl Notice {
    fn new(kind: NoticeKind, lines: Vec<String>) -> Self {
        Self {
            kind,
            title: kind.title().to_string(),
            body: lines.join("\n"),
        }
    }

    /// Job entered the queue
    pub fn queued(job: &JobIdentity) -> Self {
        Self::new(
            NoticeKind::Queued,
            vec![
                format!("Job: {}", job.job_id),
                format!("Node: {}", job.node),
                format!("Pod: {}", job.pod),
                format!("Time: {}", now()),
            ],
        )
    }

    /// Job moved from queued to running
    pub fn queue_finished(job: &JobIdentity) -> Self {
        Self::new(
            NoticeKind::QueueFinished,
            vec![
                format!("Job: {}", job.job_id),
                format!("Node: {}", job.node),
                format!("Pod: {}", job.pod),
                format!("Time: {}", now()),
            ],
        )
    }

    /// Idle watch began
    pub fn monitoring_started(job: &JobIdentity, settings: &MonitorSettings) -> Self {
        let window_minutes =
            u64::from(settings.max_idle_count).saturating_mul(settings.check_interval_secs) / 60;
        Self::new(
            NoticeKind::MonitoringStarted,
            vec![
                format!("Job: {}", job.job_id),
                format!("Node: {}", job.node),
                format!("Pod: {}", job.pod),
                format!("Idle threshold: GPU memory < {} MB", settings.idle_threshold_mb),
                format!(
                    "Trigger: {} consecutive idle checks (about {} min)",
                    settings.max_idle_count, window_minutes
                ),
                format!("Check interval: {} s", settings.check_interval_secs),
                format!("Started: {}", now()),
            ],
        )
    }

    /// Idle run reached the limit; the job stops after one more interval
    pub fn shutdown_imminent(job: &JobIdentity, usage_mb: f64, settings: &MonitorSettings) -> Self {
        Self::new(
            NoticeKind::ShutdownImminent,
            vec![
                format!("Job: {}", job.job_id),
                format!("Node: {}", job.node),
                format!(
                    "Reason: GPU idle for {} consecutive checks",
                    settings.max_idle_count
                ),
                format!("Current GPU memory: {} MB", usage_mb),
                format!("Triggered: {}", now()),
                format!(
                    "The job will be stopped in about {} s unless GPU usage resumes",
                    settings.check_interval_secs
                ),
            ],
        )
    }

    /// Platform confirmed the stop
    pub fn terminated(job: &JobIdentity) -> Self {
        Self::new(
            NoticeKind::Terminated,
            vec![
                format!("Job: {}", job.job_id),
                format!("Node: {}", job.node),
                format!("Pod: {}", job.pod),
                format!("Stopped: {}", now()),
                "Billing has stopped".to_string(),
            ],
        )
    }

    /// Stop call failed
    pub fn termination_failed(job: &JobIdentity) -> Self {
        Self::new(
            NoticeKind::TerminationFailed,
            vec![
                format!("Job: {}", job.job_id),
                format!("Failed: {}", now()),
                "Please check and stop the job manually".to_string(),
            ],
        )
    }

    /// Credential refresh failed but the monitor keeps going
    pub fn token_refresh_failed(job: &JobIdentity, error: &dyn fmt::Display) -> Self {
        Self::new(
            NoticeKind::TokenRefreshFailed,
            vec![
                format!("Job: {}", job.job_id),
                format!("Error: {}", error),
                "The monitor is still running and will retry".to_string(),
            ],
        )
    }

    /// Retry budget exhausted; the monitor stops
    pub fn monitor_exiting(job: &JobIdentity, max_fail_count: u32) -> Self {
        Self::new(
            NoticeKind::MonitorExiting,
            vec![
                format!("Job: {}", job.job_id),
                format!(
                    "Reason: data could not be fetched after {} credential refreshes",
                    max_fail_count
                ),
                format!("Stopped: {}", now()),
                "Please check the network or the account credentials".to_string(),
            ],
        )
    }

    /// Initial login failed; nothing is being watched
    pub fn startup_failed(job: &JobIdentity, error: &dyn fmt::Display) -> Self {
        Self::new(
            NoticeKind::StartupFailed,
            vec![
                format!("Job: {}", job.job_id),
                format!("Error: {}", error),
                format!("Time: {}", now()),
                "Please check the account credentials".to_string(),
            ],
        )
    }

    /// Channel self-test
    pub fn test() -> Self {
        Self::new(
            NoticeKind::Test,
            vec![
                "This is a test message from idleguard.".to_string(),
                format!("Sent: {}", now()),
                "If you can read this, the channel is configured correctly.".to_string(),
            ],
        )
    }
}

fn now() -> String {
    Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn job() -> JobIdentity {
        JobIdentity::new("k8s", "train-1-abc", "an35", "train-1")
    }

    #[test]
    fn test_title_matches_kind() {
        let notice = Notice::queued(&job());
        assert_eq!(notice.kind, NoticeKind::Queued);
        assert_eq!(notice.title, NoticeKind::Queued.title());
    }

    #[test]
    fn test_bodies_name_the_job() {
        let settings = MonitorSettings::default();
        let notices = [
            Notice::queued(&job()),
            Notice::queue_finished(&job()),
            Notice::monitoring_started(&job(), &settings),
            Notice::shutdown_imminent(&job(), 1.5, &settings),
            Notice::terminated(&job()),
            Notice::termination_failed(&job()),
            Notice::token_refresh_failed(&job(), &"HTTP 500"),
            Notice::monitor_exiting(&job(), 2),
            Notice::startup_failed(&job(), &"HTTP 401"),
        ];
        for notice in &notices {
            assert!(notice.body.contains("train-1"), "{:?}", notice.kind);
        }
    }

    #[test]
    fn test_monitoring_started_window() {
        let settings = MonitorSettings {
            max_idle_count: 3,
            check_interval_secs: 120,
            ..MonitorSettings::default()
        };
        let notice = Notice::monitoring_started(&job(), &settings);
        assert!(notice.body.contains("3 consecutive idle checks (about 6 min)"));
        assert!(notice.body.contains("< 3 MB"));
    }

    #[test]
    fn test_monitoring_started_window_saturates() {
        let settings = MonitorSettings {
            max_idle_count: u32::MAX,
            check_interval_secs: u64::MAX,
            ..MonitorSettings::default()
        };
        let notice = Notice::monitoring_started(&job(), &settings);
        assert!(notice.body.contains(&format!("about {} min", u64::MAX / 60)));
    }

    #[test]
    fn test_shutdown_imminent_reports_usage() {
        let notice = Notice::shutdown_imminent(&job(), 1.25, &MonitorSettings::default());
        assert!(notice.body.contains("1.25 MB"));
        assert!(notice.body.contains("120 s"));
    }

    #[test]
    fn test_token_refresh_failed_includes_error() {
        let notice = Notice::token_refresh_failed(&job(), &"connection reset");
        assert!(notice.body.contains("connection reset"));
    }
}
