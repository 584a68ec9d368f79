//! Integration tests for idleguard with scripted platform fakes
//!
//! Drives the full monitor through the public API the way the watch
//! command wires it together.

use idleguard::api::CredentialSession;
use idleguard::config::{ConfigBuilder, MonitorSettings};
use idleguard::domain::{JobIdentity, JobStatus};
use idleguard::error::AuthError;
use idleguard::mock::{RecordingNotifier, RecordingSleeper, ScriptedMonitorApi, ScriptedTokenProvider};
use idleguard::notify::{NoticeKind, NotificationManager};
use idleguard::services::{Monitor, MonitorOutcome};
use std::time::Duration;

const SCHEDULE_LOG: &str =
    "Normal Scheduled 2m default-scheduler Successfully assigned 13957/deeplearni-2903845-r8lcz to an35";

fn job() -> JobIdentity {
    let config = ConfigBuilder::new()
        .with_schedule_log(Some(SCHEDULE_LOG.to_string()))
        .build()
        .unwrap();
    config.job.identity()
}

fn settings() -> MonitorSettings {
    MonitorSettings {
        check_interval_secs: 120,
        retry_backoff_secs: 120,
        ..MonitorSettings::default()
    }
}

#[test]
fn test_identity_from_schedule_log() {
    let job = job();
    assert_eq!(job.pod, "deeplearni-2903845-r8lcz");
    assert_eq!(job.node, "an35");
    assert_eq!(job.job_id, "deeplearni-2903845");
    assert!(job.is_complete());
}

#[test]
fn test_queued_job_hands_off_when_it_starts() {
    let api = ScriptedMonitorApi::new().with_statuses(vec![
        Some(JobStatus::Queued),
        Some(JobStatus::Queued),
        Some(JobStatus::Running),
    ]);
    let recorder = RecordingNotifier::new("email");
    let sleeper = RecordingSleeper::new();
    let session =
        CredentialSession::establish(Box::new(ScriptedTokenProvider::always("tok"))).unwrap();
    let notifier = NotificationManager::new().with_notifier(Box::new(recorder.clone()));

    let outcome = Monitor::new(api.clone(), session, notifier, job(), settings())
        .with_sleeper(Box::new(sleeper.clone()))
        .run();

    assert_eq!(outcome, MonitorOutcome::QueueFinished);
    assert_eq!(
        recorder.titles(),
        vec![NoticeKind::Queued.title(), NoticeKind::QueueFinished.title()]
    );
    assert_eq!(api.usage_calls(), 0);
    assert_eq!(sleeper.sleeps().len(), 2);
}

#[test]
fn test_failing_channel_does_not_silence_others() {
    let api = ScriptedMonitorApi::new()
        .with_statuses(vec![Some(JobStatus::Running)])
        .with_usage(vec![Some(5.0), Some(2.0), Some(1.0)])
        .with_terminations(vec![true]);
    let dingtalk = RecordingNotifier::failing("dingtalk");
    let email = RecordingNotifier::new("email");
    let session =
        CredentialSession::establish(Box::new(ScriptedTokenProvider::always("tok"))).unwrap();
    let notifier = NotificationManager::new()
        .with_notifier(Box::new(dingtalk.clone()))
        .with_notifier(Box::new(email.clone()));

    let outcome = Monitor::new(api.clone(), session, notifier, job(), settings())
        .with_sleeper(Box::new(RecordingSleeper::new()))
        .run();

    assert_eq!(outcome, MonitorOutcome::Terminated);
    assert_eq!(api.terminate_calls(), 1);
    assert_eq!(dingtalk.sent().len(), 3);
    assert_eq!(
        email.titles(),
        vec![
            NoticeKind::MonitoringStarted.title(),
            NoticeKind::ShutdownImminent.title(),
            NoticeKind::Terminated.title(),
        ]
    );
}

#[test]
fn test_unreachable_platform_gives_up_after_two_refreshes() {
    let api = ScriptedMonitorApi::new().with_statuses(vec![None]);
    let provider = ScriptedTokenProvider::new(vec![
        Ok("tok"),
        Err(AuthError::Request("connection refused".to_string())),
        Err(AuthError::Request("connection refused".to_string())),
    ]);
    let recorder = RecordingNotifier::new("serverchan");
    let sleeper = RecordingSleeper::new();
    let session = CredentialSession::establish(Box::new(provider.clone())).unwrap();
    let notifier = NotificationManager::new().with_notifier(Box::new(recorder.clone()));

    let outcome = Monitor::new(api, session, notifier, job(), settings())
        .with_sleeper(Box::new(sleeper.clone()))
        .run();

    assert_eq!(outcome, MonitorOutcome::Failed);
    assert_eq!(provider.attempts(), 3);
    assert_eq!(
        sleeper.sleeps(),
        vec![Duration::from_secs(120), Duration::from_secs(120)]
    );
    assert_eq!(
        recorder.titles(),
        vec![
            NoticeKind::TokenRefreshFailed.title(),
            NoticeKind::TokenRefreshFailed.title(),
            NoticeKind::MonitorExiting.title(),
        ]
    );
}
