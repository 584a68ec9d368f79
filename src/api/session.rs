//! Credential session
//!
//! Owns the active bearer credential and replaces it on demand.

use super::TokenProvider;
use crate::domain::Credential;
use crate::error::AuthError;

/// Holder of the active credential
///
/// The credential is replaced wholesale on refresh and never mutated.
/// Refresh has no retry of its own; callers pick the cadence.
pub struct CredentialSession {
    provider: Box<dyn TokenProvider>,
    credential: Credential,
    refreshes: u32,
}

impl CredentialSession {
    /// Acquire the initial credential
    pub fn establish(provider: Box<dyn TokenProvider>) -> Result<Self, AuthError> {
        let credential = provider.acquire()?;
        log::info!("Obtained initial credential");
        Ok(Self {
            provider,
            credential,
            refreshes: 0,
        })
    }

    /// Re-acquire the credential, replacing the current one on success
    pub fn refresh(&mut self) -> Result<(), AuthError> {
        let credential = self.provider.acquire()?;
        self.credential = credential;
        self.refreshes += 1;
        log::info!("Credential refreshed");
        Ok(())
    }

    /// Credential to attach to requests
    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Number of successful refreshes in this run
    pub fn refresh_count(&self) -> u32 {
        self.refreshes
    }
}
