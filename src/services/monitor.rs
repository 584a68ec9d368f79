//! Job monitor
//!
//! Drives one job through queue wait and idle watch, stopping it once the
//! GPU has been idle for too long.

use super::retry::{ConnectivityRetry, RetryOutcome};
use super::{Sleeper, ThreadSleeper};
use crate::api::{CredentialSession, MonitorApi};
use crate::config::MonitorSettings;
use crate::domain::{Escalation, IdleObservation, IdleTracker, JobIdentity, JobStatus};
use crate::notify::{NotificationManager, Notice};

use serde::Serialize;
use std::fmt;
use std::ops::ControlFlow;

/// Monitor state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Phase {
    /// Polling status until the job runs
    QueueWait,
    /// Polling memory usage
    IdleWatch,
    /// Warned about an idle run; still polling
    ShutdownPending,
    /// The job was stopped
    Terminated,
    /// Connectivity retries were exhausted
    Failed,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Phase::QueueWait => "queue-wait",
            Phase::IdleWatch => "idle-watch",
            Phase::ShutdownPending => "shutdown-pending",
            Phase::Terminated => "terminated",
            Phase::Failed => "failed",
        };
        write!(f, "{}", name)
    }
}

/// What a status poll means during queue wait
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueTransition {
    /// Running on the first observation; go straight to idle watch
    AlreadyRunning,
    /// Queued on the first observation
    Queued,
    /// Queued before, running now
    QueueFinished,
    /// Nothing to act on
    Waiting,
}

/// Transition for `current` given the previous non-null status
///
/// # Examples
///
/// ```
/// use idleguard::domain::JobStatus;
/// use idleguard::services::{queue_transition, QueueTransition};
///
/// assert_eq!(queue_transition(None, JobStatus::Running), QueueTransition::AlreadyRunning);
/// assert_eq!(
///     queue_transition(Some(JobStatus::Queued), JobStatus::Running),
///     QueueTransition::QueueFinished
/// );
/// ```
pub fn queue_transition(last: Option<JobStatus>, current: JobStatus) -> QueueTransition {
    match (last, current) {
        (None, JobStatus::Running) => QueueTransition::AlreadyRunning,
        (None, JobStatus::Queued) => QueueTransition::Queued,
        (Some(JobStatus::Queued), JobStatus::Running) => QueueTransition::QueueFinished,
        _ => QueueTransition::Waiting,
    }
}

/// How a monitor run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MonitorOutcome {
    /// The job left the queue; idle watch is left to a later run
    QueueFinished,
    /// The idle job was stopped
    Terminated,
    /// The platform stayed unreachable
    Failed,
}

/// Job monitor
pub struct Monitor<A: MonitorApi> {
    api: A,
    session: CredentialSession,
    notifier: NotificationManager,
    sleeper: Box<dyn Sleeper>,
    job: JobIdentity,
    settings: MonitorSettings,
    retry: ConnectivityRetry,
    tracker: IdleTracker,
    phase: Phase,
}

impl<A: MonitorApi> Monitor<A> {
    /// Create a monitor for `job`
    pub fn new(
        api: A,
        session: CredentialSession,
        notifier: NotificationManager,
        job: JobIdentity,
        settings: MonitorSettings,
    ) -> Self {
        Self {
            api,
            session,
            notifier,
            sleeper: Box::new(ThreadSleeper),
            retry: ConnectivityRetry::from_settings(&settings),
            tracker: IdleTracker::new(settings.idle_threshold_mb),
            job,
            settings,
            phase: Phase::QueueWait,
        }
    }

    /// Replace the sleeper used between polls
    pub fn with_sleeper(mut self, sleeper: Box<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    /// Current phase
    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Length of the current idle run
    pub fn idle_count(&self) -> u32 {
        self.tracker.count()
    }

    /// Run until the job leaves the queue, is stopped, or the platform is lost
    pub fn run(&mut self) -> MonitorOutcome {
        log::info!("Starting monitoring job {}", self.job);
        log::info!(
            "Criteria: GPU memory < {} MB for {} consecutive checks",
            self.settings.idle_threshold_mb,
            self.settings.max_idle_count
        );

        self.phase = Phase::QueueWait;
        if let ControlFlow::Break(outcome) = self.queue_wait() {
            return outcome;
        }
        self.idle_watch()
    }

    fn queue_wait(&mut self) -> ControlFlow<MonitorOutcome> {
        let mut last: Option<JobStatus> = None;

        loop {
            let Some(status) = self.api.job_status(&self.job, self.session.credential()) else {
                match self.recover() {
                    RetryOutcome::Resume => continue,
                    RetryOutcome::GiveUp => return ControlFlow::Break(MonitorOutcome::Failed),
                }
            };
            log::info!("Job status: {}", status);

            match queue_transition(last, status) {
                QueueTransition::AlreadyRunning => {
                    log::info!("Job is already running");
                    return ControlFlow::Continue(());
                }
                QueueTransition::Queued => {
                    log::info!("Job is queued");
                    self.notifier.send_all(&Notice::queued(&self.job));
                }
                QueueTransition::QueueFinished => {
                    log::info!("Job left the queue");
                    self.notifier.send_all(&Notice::queue_finished(&self.job));
                    if self.settings.continue_after_queue {
                        return ControlFlow::Continue(());
                    }
                    return ControlFlow::Break(MonitorOutcome::QueueFinished);
                }
                QueueTransition::Waiting => {}
            }

            last = Some(status);
            self.sleeper.sleep(self.settings.check_interval());
        }
    }

    fn idle_watch(&mut self) -> MonitorOutcome {
        self.phase = Phase::IdleWatch;
        self.notifier
            .send_all(&Notice::monitoring_started(&self.job, &self.settings));

        let max_idle = self.settings.max_idle_count;

        loop {
            let Some(usage) = self
                .api
                .latest_memory_mb(&self.job, self.session.credential())
            else {
                match self.recover() {
                    RetryOutcome::Resume => continue,
                    RetryOutcome::GiveUp => return MonitorOutcome::Failed,
                }
            };

            match self.tracker.observe(usage) {
                IdleObservation::Idle { count } => {
                    log::info!("Status: Idle ({} MB) | Counter: {}/{}", usage, count, max_idle)
                }
                IdleObservation::Recovered { previous } => log::info!(
                    "Status: Active ({} MB) | Counter reset to 0 after {} idle checks",
                    usage,
                    previous
                ),
                IdleObservation::Active => log::debug!("Status: Active ({} MB)", usage),
            }

            match self.tracker.escalation(max_idle) {
                Escalation::Warn => {
                    self.phase = Phase::ShutdownPending;
                    log::warn!("GPU idle for {} checks; job will be stopped", max_idle);
                    self.notifier.send_all(&Notice::shutdown_imminent(
                        &self.job,
                        usage,
                        &self.settings,
                    ));
                    self.sleeper.sleep(self.settings.check_interval());
                }
                Escalation::Terminate => {
                    if self.api.terminate_job(&self.job, self.session.credential()) {
                        self.phase = Phase::Terminated;
                        log::info!("Job {} stopped", self.job.job_id);
                        self.notifier.send_all(&Notice::terminated(&self.job));
                        return MonitorOutcome::Terminated;
                    }
                    log::error!("Failed to stop job {}", self.job.job_id);
                    self.notifier
                        .send_all(&Notice::termination_failed(&self.job));
                }
                Escalation::None => self.phase = Phase::IdleWatch,
            }

            self.sleeper.sleep(self.settings.check_interval());
        }
    }

    fn recover(&mut self) -> RetryOutcome {
        let outcome = self.retry.recover(
            &mut self.session,
            &self.notifier,
            self.sleeper.as_ref(),
            &self.job,
        );
        if outcome == RetryOutcome::GiveUp {
            self.phase = Phase::Failed;
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AuthError;
    use crate::mock::{RecordingNotifier, RecordingSleeper, ScriptedMonitorApi, ScriptedTokenProvider};
    use crate::notify::NoticeKind;
    use std::time::Duration;

    struct Harness {
        api: ScriptedMonitorApi,
        provider: ScriptedTokenProvider,
        recorder: RecordingNotifier,
        sleeper: RecordingSleeper,
    }

    fn settings() -> MonitorSettings {
        MonitorSettings {
            idle_threshold_mb: 3.0,
            max_idle_count: 1,
            check_interval_secs: 60,
            max_fail_count: 2,
            retry_backoff_secs: 30,
            continue_after_queue: false,
        }
    }

    fn monitor(
        api: ScriptedMonitorApi,
        tokens: Vec<Result<&str, AuthError>>,
        settings: MonitorSettings,
    ) -> (Monitor<ScriptedMonitorApi>, Harness) {
        let provider = ScriptedTokenProvider::new(tokens);
        let session = CredentialSession::establish(Box::new(provider.clone())).unwrap();
        let recorder = RecordingNotifier::new("recorder");
        let sleeper = RecordingSleeper::new();
        let manager = NotificationManager::new().with_notifier(Box::new(recorder.clone()));
        let job = JobIdentity::new("k8s", "train-1-abc", "an35", "train-1");

        let monitor = Monitor::new(api.clone(), session, manager, job, settings)
            .with_sleeper(Box::new(sleeper.clone()));
        (
            monitor,
            Harness {
                api,
                provider,
                recorder,
                sleeper,
            },
        )
    }

    fn secs(values: &[u64]) -> Vec<Duration> {
        values.iter().map(|s| Duration::from_secs(*s)).collect()
    }

    #[test]
    fn test_queue_transition_table() {
        use JobStatus::*;
        assert_eq!(queue_transition(None, Running), QueueTransition::AlreadyRunning);
        assert_eq!(queue_transition(None, Queued), QueueTransition::Queued);
        assert_eq!(queue_transition(Some(Queued), Running), QueueTransition::QueueFinished);
        assert_eq!(queue_transition(Some(Queued), Queued), QueueTransition::Waiting);
        assert_eq!(queue_transition(Some(Running), Running), QueueTransition::Waiting);
        assert_eq!(queue_transition(None, Other(1)), QueueTransition::Waiting);
        assert_eq!(queue_transition(Some(Other(1)), Running), QueueTransition::Waiting);
    }

    #[test]
    fn test_queue_then_running_ends_run() {
        let api = ScriptedMonitorApi::new().with_statuses(vec![
            Some(JobStatus::Queued),
            Some(JobStatus::Queued),
            Some(JobStatus::Running),
        ]);
        let (mut monitor, h) = monitor(api, vec![Ok("t0")], settings());

        assert_eq!(monitor.run(), MonitorOutcome::QueueFinished);
        assert_eq!(
            h.recorder.titles(),
            vec![NoticeKind::Queued.title(), NoticeKind::QueueFinished.title()]
        );
        assert_eq!(h.api.usage_calls(), 0);
        assert_eq!(h.api.terminate_calls(), 0);
        assert_eq!(h.sleeper.sleeps(), secs(&[60, 60]));
    }

    #[test]
    fn test_idle_run_warns_then_terminates() {
        let api = ScriptedMonitorApi::new()
            .with_statuses(vec![Some(JobStatus::Running)])
            .with_usage(vec![Some(5.0), Some(2.0), Some(1.0)])
            .with_terminations(vec![true]);
        let (mut monitor, h) = monitor(api, vec![Ok("t0")], settings());

        assert_eq!(monitor.run(), MonitorOutcome::Terminated);
        assert_eq!(monitor.phase(), Phase::Terminated);
        assert_eq!(monitor.idle_count(), 2);
        assert_eq!(
            h.recorder.titles(),
            vec![
                NoticeKind::MonitoringStarted.title(),
                NoticeKind::ShutdownImminent.title(),
                NoticeKind::Terminated.title(),
            ]
        );
        assert_eq!(h.api.terminate_calls(), 1);
        // tick after 5.0, extra pause plus tick after the warning
        assert_eq!(h.sleeper.sleeps(), secs(&[60, 60, 60]));
    }

    #[test]
    fn test_busy_device_is_not_idle() {
        let api = ScriptedMonitorApi::new()
            .with_statuses(vec![Some(JobStatus::Running)])
            .with_usage(vec![Some(4.5), Some(1.0), Some(4.5), Some(1.0), Some(1.0)])
            .with_terminations(vec![true]);
        let (mut monitor, h) = monitor(api, vec![Ok("t0")], settings());

        assert_eq!(monitor.run(), MonitorOutcome::Terminated);
        assert_eq!(
            h.recorder.titles(),
            vec![
                NoticeKind::MonitoringStarted.title(),
                NoticeKind::ShutdownImminent.title(),
                NoticeKind::ShutdownImminent.title(),
                NoticeKind::Terminated.title(),
            ]
        );
        assert_eq!(h.api.usage_calls(), 5);
    }

    #[test]
    fn test_failed_termination_keeps_polling() {
        let api = ScriptedMonitorApi::new()
            .with_statuses(vec![Some(JobStatus::Running)])
            .with_usage(vec![Some(1.0), Some(1.0), Some(1.0)])
            .with_terminations(vec![false, true]);
        let (mut monitor, h) = monitor(api, vec![Ok("t0")], settings());

        assert_eq!(monitor.run(), MonitorOutcome::Terminated);
        assert_eq!(
            h.recorder.titles(),
            vec![
                NoticeKind::MonitoringStarted.title(),
                NoticeKind::ShutdownImminent.title(),
                NoticeKind::TerminationFailed.title(),
                NoticeKind::Terminated.title(),
            ]
        );
        assert_eq!(h.api.terminate_calls(), 2);
    }

    #[test]
    fn test_refresh_resumes_without_sleeping() {
        let api = ScriptedMonitorApi::new()
            .with_statuses(vec![None, Some(JobStatus::Running)])
            .with_usage(vec![None, Some(1.0), Some(1.0)])
            .with_terminations(vec![true]);
        let (mut monitor, h) = monitor(api, vec![Ok("t0"), Ok("t1"), Ok("t2")], settings());

        assert_eq!(monitor.run(), MonitorOutcome::Terminated);
        assert_eq!(h.provider.attempts(), 3);
        assert_eq!(h.api.credentials(), vec!["t0", "t1", "t1", "t2", "t2", "t2"]);
        // only the warning pause and its tick; refreshes add no delay
        assert_eq!(h.sleeper.sleeps(), secs(&[60, 60]));
    }

    #[test]
    fn test_lost_platform_fails_after_two_refreshes() {
        let api = ScriptedMonitorApi::new().with_statuses(vec![None]);
        let (mut monitor, h) = monitor(
            api,
            vec![
                Ok("t0"),
                Err(AuthError::MissingToken),
                Err(AuthError::MissingToken),
            ],
            settings(),
        );

        assert_eq!(monitor.run(), MonitorOutcome::Failed);
        assert_eq!(monitor.phase(), Phase::Failed);
        assert_eq!(h.provider.attempts(), 3);
        assert_eq!(h.api.status_calls(), 1);
        assert_eq!(h.sleeper.sleeps(), secs(&[30, 30]));
        assert_eq!(
            h.recorder.titles().last().copied(),
            Some(NoticeKind::MonitorExiting.title())
        );
    }

    #[test]
    fn test_lost_platform_during_idle_watch() {
        let api = ScriptedMonitorApi::new()
            .with_statuses(vec![Some(JobStatus::Running)])
            .with_usage(vec![Some(1.0), None]);
        let (mut monitor, h) = monitor(
            api,
            vec![
                Ok("t0"),
                Err(AuthError::MissingToken),
                Err(AuthError::MissingToken),
            ],
            settings(),
        );

        assert_eq!(monitor.run(), MonitorOutcome::Failed);
        assert_eq!(h.api.terminate_calls(), 0);
    }

    #[test]
    fn test_continue_after_queue() {
        let api = ScriptedMonitorApi::new()
            .with_statuses(vec![Some(JobStatus::Queued), Some(JobStatus::Running)])
            .with_usage(vec![Some(1.0), Some(1.0)])
            .with_terminations(vec![true]);
        let settings = MonitorSettings {
            continue_after_queue: true,
            ..settings()
        };
        let (mut monitor, h) = monitor(api, vec![Ok("t0")], settings);

        assert_eq!(monitor.run(), MonitorOutcome::Terminated);
        assert_eq!(
            h.recorder.titles(),
            vec![
                NoticeKind::Queued.title(),
                NoticeKind::QueueFinished.title(),
                NoticeKind::MonitoringStarted.title(),
                NoticeKind::ShutdownImminent.title(),
                NoticeKind::Terminated.title(),
            ]
        );
    }

    #[test]
    fn test_higher_idle_limit() {
        let api = ScriptedMonitorApi::new()
            .with_statuses(vec![Some(JobStatus::Running)])
            .with_usage(vec![Some(1.0), Some(1.0), Some(1.0), Some(1.0)])
            .with_terminations(vec![true]);
        let settings = MonitorSettings {
            max_idle_count: 3,
            ..settings()
        };
        let (mut monitor, h) = monitor(api, vec![Ok("t0")], settings);

        assert_eq!(monitor.run(), MonitorOutcome::Terminated);
        assert_eq!(h.api.usage_calls(), 4);
        assert_eq!(h.api.terminate_calls(), 1);
    }
}
