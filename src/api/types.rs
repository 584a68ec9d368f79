//! Wire types for platform responses
//!
//! Every field is optional on the wire; the extraction helpers decide what
//! counts as usable data.

use crate::domain::JobStatus;
use crate::error::ApiError;
use serde::Deserialize;
use serde_json::Value;

/// Application code the platform uses for success
pub const API_OK: i64 = 200;

/// Metric query response
///
/// `{code, info, spec: {device: [{data: [[timestamp, value], ...]}, ...]}}`
#[derive(Debug, Clone, Deserialize)]
pub struct MetricResponse {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub info: Option<String>,
    #[serde(default)]
    pub spec: Option<MetricSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricSpec {
    #[serde(default)]
    pub device: Option<Vec<DeviceSeries>>,
}

/// Sample series for one GPU
#[derive(Debug, Clone, Deserialize)]
pub struct DeviceSeries {
    #[serde(default)]
    pub data: Option<Vec<Vec<Value>>>,
}

impl DeviceSeries {
    /// Value of the most recent sample, if it can be read as a number
    pub fn latest_value(&self) -> Option<f64> {
        let point = self.data.as_ref()?.last()?;
        point.get(1).and_then(number_like)
    }
}

impl MetricResponse {
    /// Maximum of the latest sample across devices
    ///
    /// A single busy device keeps the job alive, so this is a max rather than
    /// an average. Responses without any readable sample are errors, never 0.
    pub fn latest_max_usage(&self) -> Result<f64, ApiError> {
        check_code(self.code, self.info.as_deref(), true)?;

        let devices = self
            .spec
            .as_ref()
            .and_then(|s| s.device.as_ref())
            .filter(|d| !d.is_empty())
            .ok_or(ApiError::NoDevices)?;

        devices
            .iter()
            .filter_map(DeviceSeries::latest_value)
            .fold(None, |max: Option<f64>, v| {
                Some(max.map_or(v, |m| m.max(v)))
            })
            .ok_or(ApiError::NoSamples)
    }
}

/// Job status response: `{code?, info?, spec: {status}}`
#[derive(Debug, Clone, Deserialize)]
pub struct StatusResponse {
    #[serde(default)]
    pub code: Option<i64>,
    #[serde(default)]
    pub info: Option<String>,
    #[serde(default)]
    pub spec: Option<StatusSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusSpec {
    #[serde(default)]
    pub status: Option<Value>,
}

impl StatusResponse {
    /// Extract the job status; a missing `code` is accepted
    pub fn job_status(&self) -> Result<JobStatus, ApiError> {
        check_code(self.code, self.info.as_deref(), false)?;

        let raw = self
            .spec
            .as_ref()
            .and_then(|s| s.status.as_ref())
            .filter(|v| !v.is_null())
            .ok_or_else(|| ApiError::Malformed("missing spec.status".to_string()))?;

        JobStatus::from_json(raw)
            .ok_or_else(|| ApiError::Malformed(format!("invalid status value: {}", raw)))
    }
}

/// Extract the token from a login response body
///
/// The token is the `spec` string of a JSON object; a body that is a bare
/// JSON string or not JSON at all is taken verbatim (trimmed, unquoted).
pub fn token_from_body(body: &str) -> Option<String> {
    let token = match serde_json::from_str::<Value>(body) {
        Ok(Value::Object(map)) => map.get("spec").and_then(Value::as_str).map(str::to_string),
        Ok(Value::String(s)) => Some(s),
        Ok(_) => None,
        Err(_) => Some(body.trim().trim_matches('"').to_string()),
    };

    token.filter(|t| !t.trim().is_empty())
}

fn check_code(code: Option<i64>, info: Option<&str>, required: bool) -> Result<(), ApiError> {
    match code {
        Some(API_OK) => Ok(()),
        None if !required => Ok(()),
        other => Err(ApiError::Status {
            code: other.unwrap_or_default(),
            info: info.unwrap_or("no info").to_string(),
        }),
    }
}

fn number_like(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
