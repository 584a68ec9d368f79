//! Job run-status codes reported by the platform

use serde::{Deserialize, Serialize};
use std::fmt;

/// Job status as reported by the status endpoint
///
/// Only `Queued` and `Running` drive transitions; every other code is kept
/// verbatim and otherwise ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    /// Waiting in the scheduler queue (code 0)
    Queued,
    /// Running on its node (code 2)
    Running,
    /// Any other code
    Other(i64),
}

impl JobStatus {
    /// Map a raw status code
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => JobStatus::Queued,
            2 => JobStatus::Running,
            other => JobStatus::Other(other),
        }
    }

    /// Raw status code
    pub fn code(&self) -> i64 {
        match self {
            JobStatus::Queued => 0,
            JobStatus::Running => 2,
            JobStatus::Other(code) => *code,
        }
    }

    /// Parse a status from a JSON value (integer or numeric string)
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => n.as_i64().map(Self::from_code),
            serde_json::Value::String(s) => s.trim().parse::<i64>().ok().map(Self::from_code),
            _ => None,
        }
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            JobStatus::Queued => write!(f, "Queued"),
            JobStatus::Running => write!(f, "Running"),
            JobStatus::Other(code) => write!(f, "Status {}", code),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_code() {
        assert_eq!(JobStatus::from_code(0), JobStatus::Queued);
        assert_eq!(JobStatus::from_code(2), JobStatus::Running);
        assert_eq!(JobStatus::from_code(5), JobStatus::Other(5));
        assert_eq!(JobStatus::Other(5).code(), 5);
    }

    #[test]
    fn test_from_json() {
        assert_eq!(JobStatus::from_json(&json!(2)), Some(JobStatus::Running));
        assert_eq!(JobStatus::from_json(&json!("0")), Some(JobStatus::Queued));
        assert_eq!(JobStatus::from_json(&json!("running")), None);
        assert_eq!(JobStatus::from_json(&json!(null)), None);
        assert_eq!(JobStatus::from_json(&json!(1.5)), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(JobStatus::Queued.to_string(), "Queued");
        assert_eq!(JobStatus::Other(7).to_string(), "Status 7");
    }
}
