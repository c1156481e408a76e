use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Issuer stamped into every session token minted by this gateway.
pub const ISSUER: &str = "aphasia";

/// Identity and validity window carried inside a session token.
///
/// The token is the only copy of a session; nothing is stored server-side.
/// Timestamps are unix seconds so they line up with the registered JWT
/// claims (`iat`, `nbf`, `exp`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    #[serde(rename = "id")]
    pub subject_id: u64,
    #[serde(rename = "nick_name")]
    pub display_name: String,
    #[serde(rename = "authority_id")]
    pub authority_level: u32,
    /// Start of the session. Carried unchanged through refreshes.
    #[serde(rename = "iat")]
    pub issued_at: i64,
    #[serde(rename = "nbf")]
    pub not_before: i64,
    #[serde(rename = "exp")]
    pub expires_at: i64,
    #[serde(rename = "iss")]
    pub issuer: String,
}

impl SessionClaims {
    /// Claims for a session starting at `now` and lasting `ttl`.
    pub fn issue(
        subject_id: u64,
        display_name: impl Into<String>,
        authority_level: u32,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        let start = now.timestamp();
        Self {
            subject_id,
            display_name: display_name.into(),
            authority_level,
            issued_at: start,
            not_before: start,
            expires_at: (now + ttl).timestamp(),
            issuer: ISSUER.to_string(),
        }
    }

    /// Expiry in milliseconds, the unit clients receive as `expired_at`.
    pub fn expires_at_millis(&self) -> i64 {
        self.expires_at.saturating_mul(1000)
    }

    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        let t = now.timestamp();
        self.not_before <= t && t < self.expires_at
    }
}

/// Bare principal id attached to a request next to the full claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubjectId(pub u64);
