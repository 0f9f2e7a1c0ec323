//! Identity provider client
//!
//! Exchanges a short-lived external assertion for the user's identity
//! profile. The exchange is the only blocking external call in the system;
//! it is time-bounded and fails closed (a timeout is an error, never a
//! success).

use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

/// Identity data returned by the provider on a successful exchange
#[derive(Debug, Clone, Deserialize)]
pub struct IdentityProfile {
    pub email: String,
    pub name: String,
    #[serde(default)]
    pub picture: String,
}

/// Error types for the identity exchange
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// The provider rejected the assertion
    #[error("Identity provider rejected the assertion")]
    Rejected,

    /// The provider could not be reached, errored, or timed out
    #[error("Identity provider unavailable: {0}")]
    Unavailable(String),
}

/// Identity provider abstraction
///
/// The production implementation talks HTTP; tests substitute in-process
/// doubles.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Exchange an external assertion for the user's identity profile
    async fn exchange(&self, assertion: &str) -> Result<IdentityProfile, IdentityError>;
}

/// HTTP identity provider
///
/// Sends the assertion in an `X-Session-ID` header to the configured
/// endpoint and expects a JSON identity profile back.
pub struct HttpIdentityProvider {
    client: reqwest::Client,
    url: String,
}

impl HttpIdentityProvider {
    /// Create a provider client with a bounded request timeout
    pub fn new(url: impl Into<String>, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| anyhow::anyhow!("Failed to build identity provider client: {}", e))?;

        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn exchange(&self, assertion: &str) -> Result<IdentityProfile, IdentityError> {
        let response = self
            .client
            .get(&self.url)
            .header("X-Session-ID", assertion)
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(IdentityError::Rejected);
        }

        response
            .json::<IdentityProfile>()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))
    }
}
