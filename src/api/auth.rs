//! Password login against the platform's token endpoint

use super::types::token_from_body;
use super::TokenProvider;
use crate::config::{ApiConfig, AuthConfig};
use crate::domain::Credential;
use crate::error::{AuthError, ConfigError};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use reqwest::blocking::Client;
use reqwest::header::{ORIGIN, REFERER};
use reqwest::StatusCode;
use serde::Serialize;

/// Login payload expected by the token endpoint
#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    cookie_exp: Option<u64>,
    /// Base64 of the plain password
    password: String,
    redirect_url: Option<&'a str>,
    token_type: Option<&'a str>,
    username: &'a str,
}

/// Token provider that logs in with a fixed username and password
pub struct PasswordTokenProvider {
    http: Client,
    auth_url: String,
    origin: String,
    username: String,
    password: String,
}

impl PasswordTokenProvider {
    /// Create a provider from API and account settings
    pub fn new(api: &ApiConfig, auth: &AuthConfig) -> Result<Self, ConfigError> {
        if auth.username.trim().is_empty() {
            return Err(ConfigError::MissingField("auth.username".to_string()));
        }

        let http = Client::builder()
            .timeout(api.request_timeout())
            .user_agent(api.user_agent.clone())
            .build()
            .map_err(|e| ConfigError::InvalidValue {
                key: "api".to_string(),
                message: format!("failed to build HTTP client: {}", e),
            })?;

        Ok(Self {
            http,
            auth_url: api.auth_url.clone(),
            origin: api.origin.clone(),
            username: auth.username.clone(),
            password: auth.password.clone(),
        })
    }

    fn login_request(&self) -> LoginRequest<'_> {
        LoginRequest {
            cookie_exp: None,
            password: encode_password(&self.password),
            redirect_url: None,
            token_type: None,
            username: &self.username,
        }
    }
}

impl TokenProvider for PasswordTokenProvider {
    fn acquire(&self) -> Result<Credential, AuthError> {
        log::debug!("Requesting token for {}", self.username);

        let response = self
            .http
            .post(&self.auth_url)
            .header(ORIGIN, &self.origin)
            .header(REFERER, format!("{}/", self.origin.trim_end_matches('/')))
            .json(&self.login_request())
            .send()?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(AuthError::Rejected {
                status: status.as_u16(),
            });
        }

        let body = response.text()?;
        token_from_body(&body)
            .map(Credential::new)
            .ok_or(AuthError::MissingToken)
    }
}

/// Encode the password the way the login form does
pub fn encode_password(password: &str) -> String {
    BASE64.encode(password.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_password() {
        assert_eq!(encode_password("inplusML123"), "aW5wbHVzTUwxMjM=");
        assert_eq!(encode_password(""), "");
    }

    #[test]
    fn test_login_request_shape() {
        let auth = AuthConfig {
            username: "user@example.com".to_string(),
            password: "pw".to_string(),
        };
        let provider = PasswordTokenProvider::new(&ApiConfig::default(), &auth).unwrap();
        let json = serde_json::to_value(provider.login_request()).unwrap();

        assert_eq!(json["username"], "user@example.com");
        assert_eq!(json["password"], "cHc=");
        assert!(json["cookie_exp"].is_null());
        assert!(json["redirect_url"].is_null());
        assert!(json["token_type"].is_null());
    }

    #[test]
    fn test_missing_username() {
        let result = PasswordTokenProvider::new(&ApiConfig::default(), &AuthConfig::default());
        assert!(matches!(result, Err(ConfigError::MissingField(_))));
    }
}
