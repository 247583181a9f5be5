//! Access token validation for tokenized order links.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use domain::AccessGrant;
use tokio::sync::RwLock;

use crate::error::GatewayError;

/// Trait for validating and consuming single-use access tokens.
#[async_trait]
pub trait AccessTokenValidator: Send + Sync {
    /// Returns the grant for an unused, unexpired token, or `None`.
    async fn validate(&self, token: &str) -> Result<Option<AccessGrant>, GatewayError>;

    /// Atomically marks an unused, unexpired token as used and returns its
    /// grant. Returns `None` when the token cannot be claimed, so at most one
    /// caller ever wins a given token.
    async fn claim(&self, token: &str) -> Result<Option<AccessGrant>, GatewayError>;

    /// Makes a claimed token usable again after the order it was claimed
    /// for could not be written.
    async fn release(&self, token: &str) -> Result<(), GatewayError>;
}

#[async_trait]
impl<T: AccessTokenValidator + ?Sized> AccessTokenValidator for Arc<T> {
    async fn validate(&self, token: &str) -> Result<Option<AccessGrant>, GatewayError> {
        (**self).validate(token).await
    }

    async fn claim(&self, token: &str) -> Result<Option<AccessGrant>, GatewayError> {
        (**self).claim(token).await
    }

    async fn release(&self, token: &str) -> Result<(), GatewayError> {
        (**self).release(token).await
    }
}

#[derive(Debug, Clone)]
struct IssuedToken {
    grant: AccessGrant,
    expires_at: DateTime<Utc>,
    used: bool,
}

/// In-memory token validator for testing and demo mode.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAccessTokenValidator {
    tokens: Arc<RwLock<HashMap<String, IssuedToken>>>,
}

impl InMemoryAccessTokenValidator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a token.
    pub async fn issue(&self, token: impl Into<String>, grant: AccessGrant, expires_at: DateTime<Utc>) {
        self.tokens.write().await.insert(
            token.into(),
            IssuedToken {
                grant,
                expires_at,
                used: false,
            },
        );
    }

    /// Returns true if the token exists and was used.
    pub async fn is_used(&self, token: &str) -> bool {
        self.tokens
            .read()
            .await
            .get(token)
            .is_some_and(|issued| issued.used)
    }
}

#[async_trait]
impl AccessTokenValidator for InMemoryAccessTokenValidator {
    async fn validate(&self, token: &str) -> Result<Option<AccessGrant>, GatewayError> {
        let tokens = self.tokens.read().await;
        let now = Utc::now();
        Ok(tokens
            .get(token)
            .filter(|issued| !issued.used && issued.expires_at > now)
            .map(|issued| issued.grant.clone()))
    }

    async fn claim(&self, token: &str) -> Result<Option<AccessGrant>, GatewayError> {
        let mut tokens = self.tokens.write().await;
        let now = Utc::now();
        Ok(tokens
            .get_mut(token)
            .filter(|issued| !issued.used && issued.expires_at > now)
            .map(|issued| {
                issued.used = true;
                issued.grant.clone()
            }))
    }

    async fn release(&self, token: &str) -> Result<(), GatewayError> {
        let mut tokens = self.tokens.write().await;
        let issued = tokens
            .get_mut(token)
            .ok_or_else(|| GatewayError::MissingReference("access token".to_string()))?;
        issued.used = false;
        Ok(())
    }
}
