//! User listing for signed-in callers
//!
//! Routes here run behind the [`AuthGate`](crate::auth::AuthGate) and
//! forward to the user service.

pub mod handlers;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::rpc::UserInfo;

/// A user as shown to clients. The encoded password never leaves the gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: u64,
    pub nick_name: String,
    /// `YYYY-MM-DD`, empty when the user service has no birthday on file.
    pub birthday: String,
    pub gender: String,
    pub mobile: String,
}

impl From<UserInfo> for UserResponse {
    fn from(user: UserInfo) -> Self {
        let birthday = match user.birthday {
            0 => String::new(),
            secs => DateTime::<Utc>::from_timestamp(secs, 0)
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
        };

        Self {
            id: user.id,
            nick_name: user.nick_name,
            birthday,
            gender: user.gender,
            mobile: user.mobile,
        }
    }
}
