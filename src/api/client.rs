//! HTTP implementation of the platform API
//!
//! Blocking reqwest client; every request carries the bearer token header
//! and a short timeout so one tick can never hang the monitor.

use super::types::{MetricResponse, StatusResponse};
use super::MonitorApi;
use crate::config::ApiConfig;
use crate::domain::{Credential, JobIdentity, JobStatus};
use crate::error::{ApiError, ConfigError};

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::StatusCode;

/// Metric name for GPU memory in MB
const GPU_MEMORY_METRIC: &str = "gpu_memory";

/// Number of trailing samples requested per device
const SAMPLE_LIMIT: &str = "10";

/// Length of the metric query window in minutes
const WINDOW_MINUTES: i64 = 60;

const ACCEPT_VALUE: &str = "application/json, text/plain, */*";

/// Monitoring API client backed by HTTP
pub struct HttpMonitorClient {
    http: Client,
    /// Used for stop requests; always verifies certificates
    stop_http: Client,
    token_header: HeaderName,
    metric_url: String,
    status_url: String,
    delete_url: String,
}

impl HttpMonitorClient {
    /// Build a client from API settings
    pub fn new(api: &ApiConfig) -> Result<Self, ConfigError> {
        let token_header = HeaderName::from_bytes(api.token_header.as_bytes()).map_err(|e| {
            ConfigError::InvalidValue {
                key: "api.token_header".to_string(),
                message: e.to_string(),
            }
        })?;

        let http = build_client(api, accepts_invalid_certs(api, Request::Query))?;
        let stop_http = build_client(api, accepts_invalid_certs(api, Request::Stop))?;

        Ok(Self {
            http,
            stop_http,
            token_header,
            metric_url: api.metric_url.clone(),
            status_url: api.status_url.clone(),
            delete_url: api.delete_url.clone(),
        })
    }

    fn auth_headers(&self, credential: &Credential) -> Result<HeaderMap, ApiError> {
        let token = HeaderValue::from_str(credential.expose())
            .map_err(|_| ApiError::Transport("credential is not a valid header value".into()))?;

        let mut headers = HeaderMap::new();
        headers.insert(self.token_header.clone(), token);
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));
        Ok(headers)
    }

    /// Query the latest GPU memory reading
    pub fn try_latest_memory_mb(
        &self,
        job: &JobIdentity,
        credential: &Credential,
    ) -> Result<f64, ApiError> {
        if !job.is_complete() {
            return Err(ApiError::IncompleteIdentity);
        }

        let (start, end) = metric_window(Utc::now());
        let params = [
            ("node_list", job.node.as_str()),
            ("pod_list", job.pod.as_str()),
            ("metric", GPU_MEMORY_METRIC),
            ("start", start.as_str()),
            ("end", end.as_str()),
            ("limit", SAMPLE_LIMIT),
            ("cluster_name", job.cluster.as_str()),
            ("job_name", job.job_id.as_str()),
            ("job_id", job.job_id.as_str()),
        ];

        let response = self
            .http
            .get(&self.metric_url)
            .query(&params)
            .headers(self.auth_headers(credential)?)
            .send()?;

        let body: MetricResponse = response
            .json()
            .map_err(|e| ApiError::Malformed(e.to_string()))?;

        body.latest_max_usage()
    }

    /// Query the job's run status
    pub fn try_job_status(
        &self,
        job: &JobIdentity,
        credential: &Credential,
    ) -> Result<JobStatus, ApiError> {
        if !job.is_complete() {
            return Err(ApiError::IncompleteIdentity);
        }

        let response = self
            .http
            .get(job.expand(&self.status_url))
            .headers(self.auth_headers(credential)?)
            .send()?;

        let body: StatusResponse = response
            .json()
            .map_err(|e| ApiError::Malformed(e.to_string()))?;

        body.job_status()
    }

    /// Issue the stop call for the job
    pub fn try_terminate_job(
        &self,
        job: &JobIdentity,
        credential: &Credential,
    ) -> Result<(), ApiError> {
        if !job.is_complete() {
            return Err(ApiError::IncompleteIdentity);
        }

        let response = self
            .stop_http
            .delete(job.expand(&self.delete_url))
            .headers(self.auth_headers(credential)?)
            .send()?;

        let status = response.status();
        if status == StatusCode::OK {
            return Ok(());
        }

        let text = response.text().unwrap_or_default();
        log::warn!("Stop request answered {}: {}", status, text.trim());
        Err(ApiError::Http(status.as_u16()))
    }
}

impl MonitorApi for HttpMonitorClient {
    fn latest_memory_mb(&self, job: &JobIdentity, credential: &Credential) -> Option<f64> {
        match self.try_latest_memory_mb(job, credential) {
            Ok(usage) => {
                log::debug!("GPU memory for {}: {} MB", job.job_id, usage);
                Some(usage)
            }
            Err(e) => {
                log::warn!("GPU memory query failed: {}", e);
                None
            }
        }
    }

    fn job_status(&self, job: &JobIdentity, credential: &Credential) -> Option<JobStatus> {
        match self.try_job_status(job, credential) {
            Ok(status) => {
                log::debug!("Job {} status: {}", job.job_id, status);
                Some(status)
            }
            Err(e) => {
                log::warn!("Job status query failed: {}", e);
                None
            }
        }
    }

    fn terminate_job(&self, job: &JobIdentity, credential: &Credential) -> bool {
        log::warn!("Sending stop request for job {}", job.job_id);
        match self.try_terminate_job(job, credential) {
            Ok(()) => {
                log::info!("Platform confirmed the job was stopped; billing has ended");
                true
            }
            Err(e) => {
                log::error!("Stop request failed: {}", e);
                false
            }
        }
    }
}

/// Start and end of the trailing query window, ISO-8601 UTC with a `Z` suffix
pub fn metric_window(now: DateTime<Utc>) -> (String, String) {
    let start = now - ChronoDuration::minutes(WINDOW_MINUTES);
    (format_timestamp(start), format_timestamp(now))
}

fn format_timestamp(t: DateTime<Utc>) -> String {
    t.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Request {
    Query,
    Stop,
}

/// `api.accept_invalid_certs` only relaxes metric and status queries
fn accepts_invalid_certs(api: &ApiConfig, request: Request) -> bool {
    match request {
        Request::Query => api.accept_invalid_certs,
        Request::Stop => false,
    }
}

fn build_client(api: &ApiConfig, accept_invalid_certs: bool) -> Result<Client, ConfigError> {
    Client::builder()
        .timeout(api.request_timeout())
        .user_agent(api.user_agent.clone())
        .danger_accept_invalid_certs(accept_invalid_certs)
        .build()
        .map_err(|e| ConfigError::InvalidValue {
            key: "api".to_string(),
            message: format!("failed to build HTTP client: {}", e),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_metric_window() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let (start, end) = metric_window(now);
        assert_eq!(start, "2024-05-01T11:30:00.000000Z");
        assert_eq!(end, "2024-05-01T12:30:00.000000Z");
    }

    #[test]
    fn test_stop_requests_always_verify_certs() {
        let api = ApiConfig {
            accept_invalid_certs: true,
            ..ApiConfig::default()
        };
        assert!(accepts_invalid_certs(&api, Request::Query));
        assert!(!accepts_invalid_certs(&api, Request::Stop));
        assert!(HttpMonitorClient::new(&api).is_ok());

        let strict = ApiConfig::default();
        assert!(!accepts_invalid_certs(&strict, Request::Query));
    }

    #[test]
    fn test_client_rejects_bad_header_name() {
        let api = ApiConfig {
            token_header: "bad header".to_string(),
            ..ApiConfig::default()
        };
        assert!(matches!(
            HttpMonitorClient::new(&api),
            Err(ConfigError::InvalidValue { .. })
        ));
    }

    #[test]
    fn test_incomplete_identity_skips_requests() {
        let client = HttpMonitorClient::new(&ApiConfig::default()).unwrap();
        let job = JobIdentity::new("k8s", "", "", "");
        let cred = Credential::new("token");

        assert!(matches!(
            client.try_latest_memory_mb(&job, &cred),
            Err(ApiError::IncompleteIdentity)
        ));
        assert!(client.job_status(&job, &cred).is_none());
        assert!(!client.terminate_job(&job, &cred));
    }

    #[test]
    fn test_auth_headers() {
        let client = HttpMonitorClient::new(&ApiConfig::default()).unwrap();
        let headers = client.auth_headers(&Credential::new("tok")).unwrap();
        assert_eq!(headers.get("bihu-token").unwrap(), "tok");
        assert_eq!(headers.get(ACCEPT).unwrap(), ACCEPT_VALUE);

        assert!(client.auth_headers(&Credential::new("bad\ntoken")).is_err());
    }
}
