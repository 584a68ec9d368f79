//! Job identity
//!
//! The four names that parameterize every API call for the watched job.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Identity of the single job this process watches
///
/// Derived once at startup and never changed afterwards. An incomplete
/// identity (any empty field) makes the API client skip its requests.
///
/// # Examples
///
/// ```
/// use idleguard::domain::JobIdentity;
///
/// let line = "Normal Scheduled Successfully assigned 13957/deeplearni-2903845-r8lcz to an35";
/// let job = JobIdentity::from_schedule_log("k8s_cluster", line).unwrap();
///
/// assert_eq!(job.pod, "deeplearni-2903845-r8lcz");
/// assert_eq!(job.node, "an35");
/// assert_eq!(job.job_id, "deeplearni-2903845");
/// assert!(job.is_complete());
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobIdentity {
    /// Cluster the job runs on
    pub cluster: String,
    /// Pod name assigned by the scheduler
    pub pod: String,
    /// Node the pod was placed on
    pub node: String,
    /// Job id (pod name without its replica suffix)
    pub job_id: String,
}

fn schedule_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"Successfully assigned .*/(\S+) to (\S+)").expect("valid schedule pattern")
    })
}

impl JobIdentity {
    /// Create an identity from explicit parts
    pub fn new(
        cluster: impl Into<String>,
        pod: impl Into<String>,
        node: impl Into<String>,
        job_id: impl Into<String>,
    ) -> Self {
        Self {
            cluster: cluster.into(),
            pod: pod.into(),
            node: node.into(),
            job_id: job_id.into(),
        }
    }

    /// Derive the identity from a scheduler "Successfully assigned" event line
    ///
    /// Returns `None` when the line does not contain a scheduling event.
    pub fn from_schedule_log(cluster: &str, line: &str) -> Option<Self> {
        let caps = schedule_pattern().captures(line)?;
        let pod = caps.get(1)?.as_str();
        let node = caps.get(2)?.as_str();

        Some(Self::new(cluster, pod, node, job_id_from_pod(pod)))
    }

    /// Check that every field is set
    pub fn is_complete(&self) -> bool {
        !self.cluster.is_empty()
            && !self.pod.is_empty()
            && !self.node.is_empty()
            && !self.job_id.is_empty()
    }

    /// Names of the fields that are still empty
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.cluster.is_empty() {
            missing.push("cluster");
        }
        if self.pod.is_empty() {
            missing.push("pod");
        }
        if self.node.is_empty() {
            missing.push("node");
        }
        if self.job_id.is_empty() {
            missing.push("job_id");
        }
        missing
    }

    /// Fill `{cluster}` and `{job_id}` placeholders in a URL template
    pub fn expand(&self, template: &str) -> String {
        template
            .replace("{cluster}", &self.cluster)
            .replace("{job_id}", &self.job_id)
    }
}

/// Strip the replica suffix (everything from the last `-`) from a pod name
///
/// A pod name without any dash yields an empty job id.
pub fn job_id_from_pod(pod: &str) -> String {
    pod.rsplit_once('-')
        .map(|(head, _)| head.to_string())
        .unwrap_or_default()
}

impl fmt::Display for JobIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (pod {} on {}, cluster {})",
            self.job_id, self.pod, self.node, self.cluster
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const LOG: &str = "0001-01-01 00:00:00 +0000 UTC\tNormal\tScheduled\tSuccessfully assigned 13957/deeplearni-2903845-r8lcz to an35";

    #[test]
    fn test_from_schedule_log() {
        let job = JobIdentity::from_schedule_log("k8s_xingyiAI", LOG).unwrap();
        assert_eq!(job.cluster, "k8s_xingyiAI");
        assert_eq!(job.pod, "deeplearni-2903845-r8lcz");
        assert_eq!(job.node, "an35");
        assert_eq!(job.job_id, "deeplearni-2903845");
        assert!(job.is_complete());
    }

    #[test]
    fn test_from_schedule_log_no_match() {
        assert!(JobIdentity::from_schedule_log("c", "Pulling image").is_none());
    }

    #[test]
    fn test_job_id_from_pod() {
        assert_eq!(job_id_from_pod("train-42-abcde"), "train-42");
        assert_eq!(job_id_from_pod("single"), "");
    }

    #[test]
    fn test_incomplete_identity() {
        let job = JobIdentity::new("c", "", "n", "");
        assert!(!job.is_complete());
        assert_eq!(job.missing_fields(), vec!["pod", "job_id"]);
        assert!(!JobIdentity::default().is_complete());
    }

    #[test]
    fn test_expand_template() {
        let job = JobIdentity::new("k8s", "p-1", "n", "p");
        assert_eq!(
            job.expand("https://host/api/job/running/{cluster}/{job_id}"),
            "https://host/api/job/running/k8s/p"
        );
    }
}
