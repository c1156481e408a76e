use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use url::Url;

use super::status::{RpcCode, RpcStatus};
use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: u64,
    pub mobile: String,
    pub nick_name: String,
    /// Encoded password as stored by the user service.
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub role: u32,
    #[serde(default)]
    pub gender: String,
    /// Unix seconds, zero when unknown.
    #[serde(default)]
    pub birthday: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserPage {
    pub total: u64,
    pub data: Vec<UserInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub nick_name: String,
    pub password: String,
    pub mobile: String,
}

#[derive(Debug, Serialize)]
struct PasswordCheck<'a> {
    password: &'a str,
    encrypted_password: &'a str,
}

#[derive(Debug, Deserialize)]
struct PasswordCheckResult {
    success: bool,
}

/// Calls the gateway makes against the user service.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait IdentityBackend: Send + Sync {
    async fn get_by_mobile(&self, mobile: &str) -> Result<UserInfo, RpcStatus>;

    async fn check_password(&self, password: &str, encrypted: &str) -> Result<bool, RpcStatus>;

    async fn create_user(&self, user: NewUser) -> Result<UserInfo, RpcStatus>;

    async fn list_users(&self, page: u32, page_size: u32) -> Result<UserPage, RpcStatus>;
}

/// JSON-over-HTTP client for the user service.
pub struct HttpIdentityClient {
    client: Client,
    base_url: Url,
}

impl HttpIdentityClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let mut base_url = Url::parse(base_url)
            .map_err(|e| AppError::ConfigError(format!("invalid identity.base_url: {}", e)))?;
        // Relative joins only append when the base path ends in a slash.
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::InternalError(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> Result<Url, RpcStatus> {
        self.base_url
            .join(path)
            .map_err(|e| RpcStatus::new(RpcCode::InvalidArgument, e.to_string()))
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, RpcStatus> {
        let status = response.status();
        if status.is_success() {
            return response
                .json::<T>()
                .await
                .map_err(|e| RpcStatus::new(RpcCode::Internal, format!("bad response body: {}", e)));
        }

        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<RpcStatus>(&body) {
            Ok(rpc) => Err(rpc),
            Err(_) => Err(RpcStatus::new(code_for_http(status), body)),
        }
    }
}

fn code_for_http(status: StatusCode) -> RpcCode {
    match status {
        StatusCode::NOT_FOUND => RpcCode::NotFound,
        StatusCode::BAD_REQUEST => RpcCode::InvalidArgument,
        StatusCode::SERVICE_UNAVAILABLE | StatusCode::BAD_GATEWAY | StatusCode::GATEWAY_TIMEOUT => {
            RpcCode::Unavailable
        }
        _ => RpcCode::Internal,
    }
}

// Connect failures and timeouts both mean the service could not be reached.
fn transport_error(err: reqwest::Error) -> RpcStatus {
    error!("user service request failed: {}", err);
    RpcStatus::new(RpcCode::Unavailable, err.to_string())
}

#[async_trait]
impl IdentityBackend for HttpIdentityClient {
    async fn get_by_mobile(&self, mobile: &str) -> Result<UserInfo, RpcStatus> {
        let mut url = self.endpoint("v1/users/mobile/")?;
        url.path_segments_mut()
            .map_err(|_| RpcStatus::new(RpcCode::InvalidArgument, "base url cannot hold a path"))?
            .pop_if_empty()
            .push(mobile);
        debug!(%url, "looking up user by mobile");

        let response = self.client.get(url).send().await.map_err(transport_error)?;
        Self::decode(response).await
    }

    async fn check_password(&self, password: &str, encrypted: &str) -> Result<bool, RpcStatus> {
        let url = self.endpoint("v1/users/password/check")?;
        let response = self
            .client
            .post(url)
            .json(&PasswordCheck {
                password,
                encrypted_password: encrypted,
            })
            .send()
            .await
            .map_err(transport_error)?;

        let result: PasswordCheckResult = Self::decode(response).await?;
        Ok(result.success)
    }

    async fn create_user(&self, user: NewUser) -> Result<UserInfo, RpcStatus> {
        let url = self.endpoint("v1/users")?;
        let response = self
            .client
            .post(url)
            .json(&user)
            .send()
            .await
            .map_err(transport_error)?;
        Self::decode(response).await
    }

    async fn list_users(&self, page: u32, page_size: u32) -> Result<UserPage, RpcStatus> {
        let url = self.endpoint("v1/users")?;
        let response = self
            .client
            .get(url)
            .query(&[("pn", page), ("psize", page_size)])
            .send()
            .await
            .map_err(transport_error)?;
        Self::decode(response).await
    }
}
