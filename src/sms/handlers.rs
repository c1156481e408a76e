use actix_web::{web, HttpResponse};
use chrono::Duration;
use serde::Deserialize;
use tracing::{error, info};

use super::generate_code;
use crate::error::AppError;
use crate::validation::is_valid_mobile;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SendSmsRequest {
    pub mobile: String,
    /// 1 = registration, 2 = login.
    #[serde(rename = "type")]
    pub kind: u8,
}

pub async fn send_sms(
    req: web::Json<SendSmsRequest>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    if !is_valid_mobile(&req.mobile) {
        return Err(AppError::ValidationError("invalid mobile number".into()));
    }
    if !matches!(req.kind, 1 | 2) {
        return Err(AppError::ValidationError("type must be 1 or 2".into()));
    }

    let code = generate_code(state.config.sms.code_length);
    state.sms.send(&req.mobile, &code).await.map_err(|e| {
        error!("Sending verification code to {} failed: {}", req.mobile, e);
        e
    })?;

    state
        .codes
        .set(&req.mobile, &code, Duration::seconds(state.config.sms.code_ttl_secs))
        .await;

    info!("Verification code issued for mobile: {}", req.mobile);
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "msg": "sent successfully"
    })))
}
