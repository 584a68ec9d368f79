//! Mock implementations for testing
//!
//! Scripted platform API and token provider, plus recording notifier and
//! sleeper, for driving the monitor without a network. Every mock is a
//! cheap handle over shared state: keep a clone to inspect it after handing
//! the original to the code under test.

use crate::api::{MonitorApi, TokenProvider};
use crate::domain::{Credential, JobIdentity, JobStatus};
use crate::error::{AuthError, NotifyError};
use crate::notify::Notifier;
use crate::services::Sleeper;

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Default)]
struct ApiScript {
    statuses: VecDeque<Option<JobStatus>>,
    usage: VecDeque<Option<f64>>,
    terminations: VecDeque<bool>,
    status_calls: usize,
    usage_calls: usize,
    terminate_calls: usize,
    credentials: Vec<String>,
}

/// Platform API that replays scripted answers
///
/// Panics when a script runs dry so a runaway loop fails the test instead
/// of hanging it.
#[derive(Debug, Clone, Default)]
pub struct ScriptedMonitorApi {
    script: Arc<Mutex<ApiScript>>,
}

impl ScriptedMonitorApi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answers for successive status polls (`None` is "no data")
    pub fn with_statuses(self, statuses: Vec<Option<JobStatus>>) -> Self {
        self.script.lock().unwrap().statuses = statuses.into();
        self
    }

    /// Answers for successive usage polls (`None` is "no data")
    pub fn with_usage(self, usage: Vec<Option<f64>>) -> Self {
        self.script.lock().unwrap().usage = usage.into();
        self
    }

    /// Answers for successive stop calls
    pub fn with_terminations(self, results: Vec<bool>) -> Self {
        self.script.lock().unwrap().terminations = results.into();
        self
    }

    pub fn status_calls(&self) -> usize {
        self.script.lock().unwrap().status_calls
    }

    pub fn usage_calls(&self) -> usize {
        self.script.lock().unwrap().usage_calls
    }

    pub fn terminate_calls(&self) -> usize {
        self.script.lock().unwrap().terminate_calls
    }

    /// Credential presented on every call, in order
    pub fn credentials(&self) -> Vec<String> {
        self.script.lock().unwrap().credentials.clone()
    }
}

impl MonitorApi for ScriptedMonitorApi {
    fn latest_memory_mb(&self, _job: &JobIdentity, credential: &Credential) -> Option<f64> {
        let mut script = self.script.lock().unwrap();
        script.usage_calls += 1;
        script.credentials.push(credential.expose().to_string());
        script
            .usage
            .pop_front()
            .expect("usage script exhausted")
    }

    fn job_status(&self, _job: &JobIdentity, credential: &Credential) -> Option<JobStatus> {
        let mut script = self.script.lock().unwrap();
        script.status_calls += 1;
        script.credentials.push(credential.expose().to_string());
        script
            .statuses
            .pop_front()
            .expect("status script exhausted")
    }

    fn terminate_job(&self, _job: &JobIdentity, credential: &Credential) -> bool {
        let mut script = self.script.lock().unwrap();
        script.terminate_calls += 1;
        script.credentials.push(credential.expose().to_string());
        script
            .terminations
            .pop_front()
            .expect("termination script exhausted")
    }
}

#[derive(Debug, Default)]
struct TokenScript {
    results: VecDeque<Result<String, AuthError>>,
    fallback: Option<String>,
    attempts: u32,
}

/// Token provider that replays scripted results
///
/// Once the script is used up it returns the fallback token, if any, and
/// `MissingToken` otherwise.
#[derive(Debug, Clone, Default)]
pub struct ScriptedTokenProvider {
    script: Arc<Mutex<TokenScript>>,
}

impl ScriptedTokenProvider {
    pub fn new(results: Vec<Result<&str, AuthError>>) -> Self {
        let results = results
            .into_iter()
            .map(|r| r.map(str::to_string))
            .collect();
        Self {
            script: Arc::new(Mutex::new(TokenScript {
                results,
                fallback: None,
                attempts: 0,
            })),
        }
    }

    /// Provider that always succeeds with `token`
    pub fn always(token: &str) -> Self {
        let provider = Self::default();
        provider.script.lock().unwrap().fallback = Some(token.to_string());
        provider
    }

    /// Number of `acquire` calls so far
    pub fn attempts(&self) -> u32 {
        self.script.lock().unwrap().attempts
    }
}

impl TokenProvider for ScriptedTokenProvider {
    fn acquire(&self) -> Result<Credential, AuthError> {
        let mut script = self.script.lock().unwrap();
        script.attempts += 1;
        match script.results.pop_front() {
            Some(result) => result.map(Credential::new),
            None => script
                .fallback
                .clone()
                .map(Credential::new)
                .ok_or(AuthError::MissingToken),
        }
    }
}

/// Notifier that records every message it is given
#[derive(Debug, Clone)]
pub struct RecordingNotifier {
    name: String,
    fail: bool,
    sent: Arc<Mutex<Vec<(String, String)>>>,
}

impl RecordingNotifier {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            fail: false,
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Notifier that records the message and then reports a rejection
    pub fn failing(name: &str) -> Self {
        Self {
            fail: true,
            ..Self::new(name)
        }
    }

    /// `(title, body)` pairs in delivery order
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn titles(&self) -> Vec<&'static str> {
        use crate::notify::NoticeKind::*;
        let known = [
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
        ];
        self.sent()
            .iter()
            .map(|(title, _)| {
                known
                    .iter()
                    .map(|kind| kind.title())
                    .find(|t| *t == title.as_str())
                    .unwrap_or("<unknown>")
            })
            .collect()
    }
}

impl Notifier for RecordingNotifier {
    fn send(&self, title: &str, body: &str) -> Result<(), NotifyError> {
        self.sent
            .lock()
            .unwrap()
            .push((title.to_string(), body.to_string()));
        if self.fail {
            return Err(NotifyError::Rejected {
                channel: self.name.clone(),
                message: "errcode 1".to_string(),
            });
        }
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Sleeper that records requested pauses and returns immediately
#[derive(Debug, Clone, Default)]
pub struct RecordingSleeper {
    sleeps: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.lock().unwrap().clone()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.sleeps.lock().unwrap().push(duration);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_token_provider_fallback() {
        let provider = ScriptedTokenProvider::always("tok");
        assert_eq!(provider.acquire().unwrap().expose(), "tok");
        assert_eq!(provider.acquire().unwrap().expose(), "tok");
        assert_eq!(provider.attempts(), 2);

        let empty = ScriptedTokenProvider::new(vec![]);
        assert!(matches!(empty.acquire(), Err(AuthError::MissingToken)));
    }

    #[test]
    fn test_recording_notifier_shares_state() {
        let notifier = RecordingNotifier::failing("x");
        let handle = notifier.clone();
        assert!(notifier.send("a", "b").is_err());
        assert_eq!(handle.sent(), vec![("a".to_string(), "b".to_string())]);
        assert_eq!(handle.titles(), vec!["<unknown>"]);
    }
}
