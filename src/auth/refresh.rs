use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;
use tracing::debug;

use super::claims::SessionClaims;
use super::token::{TokenCodec, VerifyError};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RefreshError {
    #[error("{0}")]
    Rejected(VerifyError),

    #[error("token expired too long ago")]
    GraceElapsed,

    #[error("session lifetime exceeded")]
    LifetimeExceeded,

    #[error("failed to sign refreshed token")]
    Signing,
}

#[derive(Debug, Clone, Copy)]
pub struct RefreshConfig {
    /// Lifetime of a re-issued token.
    pub ttl: Duration,
    /// How long after expiry a token may still be renewed.
    pub grace: Duration,
    /// Hard cap measured from the original `issued_at`.
    pub max_session: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::hours(1),
            grace: Duration::days(7),
            max_session: Duration::days(60),
        }
    }
}

/// Re-issues tokens whose signature still checks out, tolerating expiry
/// inside a bounded window.
pub struct RefreshPolicy {
    codec: Arc<TokenCodec>,
    config: RefreshConfig,
}

impl RefreshPolicy {
    pub fn new(codec: Arc<TokenCodec>, config: RefreshConfig) -> Self {
        Self { codec, config }
    }

    /// Returns the new token together with the claims it carries.
    pub fn refresh(&self, token: &str) -> Result<(String, SessionClaims), RefreshError> {
        self.refresh_at(token, Utc::now())
    }

    pub fn refresh_at(
        &self,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<(String, SessionClaims), RefreshError> {
        let claims = self.codec.decode_signed(token).map_err(RefreshError::Rejected)?;

        let t = now.timestamp();
        if t < claims.not_before {
            return Err(RefreshError::Rejected(VerifyError::NotYetValid));
        }
        if t - claims.expires_at > self.config.grace.num_seconds() {
            return Err(RefreshError::GraceElapsed);
        }
        if t - claims.issued_at > self.config.max_session.num_seconds() {
            return Err(RefreshError::LifetimeExceeded);
        }

        let renewed = SessionClaims {
            expires_at: (now + self.config.ttl).timestamp(),
            ..claims
        };
        let token = self.codec.create(&renewed).map_err(|_| RefreshError::Signing)?;
        debug!(subject_id = renewed.subject_id, expires_at = renewed.expires_at, "token refreshed");
        Ok((token, renewed))
    }
}
