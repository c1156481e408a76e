use actix_web::{web, HttpRequest, HttpResponse};
use chrono::{Duration, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use super::middleware::extract_token;
use super::refresh::RefreshError;
use super::claims::SessionClaims;
use crate::error::{AppError, AuthError};
use crate::rpc::{translate, NewUser, RpcCode, UserInfo};
use crate::validation::is_valid_mobile;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct PasswordLoginRequest {
    pub mobile: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub mobile: String,
    pub password: String,
    pub code: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthResponse {
    pub id: u64,
    pub nick_name: String,
    pub token: String,
    /// Token expiry in milliseconds since the epoch.
    pub expired_at: i64,
    pub msg: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RefreshResponse {
    pub token: String,
    pub expired_at: i64,
}

fn validate_credentials(mobile: &str, password: &str) -> Result<(), AppError> {
    if !is_valid_mobile(mobile) {
        return Err(AppError::ValidationError("invalid mobile number".into()));
    }
    let length = password.chars().count();
    if !(3..=20).contains(&length) {
        return Err(AppError::ValidationError("password must be 3 to 20 characters".into()));
    }
    Ok(())
}

/// Mints a session token for `user` and builds the login/register body.
fn issue_session(state: &AppState, user: &UserInfo, msg: &str) -> Result<AuthResponse, AppError> {
    let claims = SessionClaims::issue(
        user.id,
        user.nick_name.clone(),
        user.role,
        Utc::now(),
        Duration::seconds(state.config.auth.token_ttl_secs),
    );
    let token = state.codec.create(&claims).map_err(|e| {
        error!("failed to sign session token for user {}: {}", user.id, e);
        e
    })?;

    Ok(AuthResponse {
        id: user.id,
        nick_name: user.nick_name.clone(),
        token,
        expired_at: claims.expires_at_millis(),
        msg: msg.to_string(),
    })
}

pub async fn password_login(
    req: web::Json<PasswordLoginRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    validate_credentials(&req.mobile, &req.password)?;
    info!("Received login request for mobile: {}", req.mobile);

    let user = match state.identity.get_by_mobile(&req.mobile).await {
        Ok(user) => user,
        Err(status) if status.code == RpcCode::NotFound => {
            warn!("Login failed, no user for mobile: {}", req.mobile);
            return Err(AppError::ValidationError("user does not exist".into()));
        }
        Err(status) => {
            error!("[password_login] user lookup failed: {}", status);
            return Err(translate(&status).into());
        }
    };

    let matched = state
        .identity
        .check_password(&req.password, &user.password)
        .await
        .map_err(|status| {
            error!("[password_login] password check failed: {}", status);
            AppError::from(translate(&status))
        })?;

    if !matched {
        warn!("Login failed for mobile: {}", req.mobile);
        return Err(AuthError::InvalidCredentials.into());
    }

    let body = issue_session(&state, &user, "login successful")?;
    info!("Login successful for user {}", user.id);
    Ok(HttpResponse::Ok().json(body))
}

pub async fn register(
    req: web::Json<RegisterRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    validate_credentials(&req.mobile, &req.password)?;
    info!("Received registration request for mobile: {}", req.mobile);

    match state.codes.get(&req.mobile).await {
        Some(code) if code == req.code => {}
        _ => {
            warn!("Registration rejected, bad verification code for mobile: {}", req.mobile);
            return Err(AuthError::InvalidCode.into());
        }
    }

    let user = state
        .identity
        .create_user(NewUser {
            nick_name: req.mobile.clone(),
            password: req.password.clone(),
            mobile: req.mobile.clone(),
        })
        .await
        .map_err(|status| {
            error!("[register] creating user failed: {}", status);
            AppError::from(translate(&status))
        })?;

    let body = issue_session(&state, &user, "registration successful")?;
    info!("Registration successful for user {}", user.id);
    Ok(HttpResponse::Ok().json(body))
}

/// Re-issues the token presented in the `x-token` header. Expired tokens
/// are accepted within the refresh grace window.
pub async fn refresh(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    let token = extract_token(req.headers()).ok_or(AuthError::Unauthenticated)?;

    let (token, claims) = state.refresh.refresh(token).map_err(|e| {
        match e {
            RefreshError::Signing => error!("Token refresh failed: {}", e),
            _ => warn!("Token refresh rejected: {}", e),
        }
        AppError::from(e)
    })?;

    info!("Token refreshed for user {}", claims.subject_id);
    Ok(HttpResponse::Ok().json(RefreshResponse {
        token,
        expired_at: claims.expires_at_millis(),
    }))
}
