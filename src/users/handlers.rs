use actix_web::{web, HttpResponse};
use serde::Deserialize;
use tracing::{error, info};

use super::UserResponse;
use crate::auth::SessionClaims;
use crate::error::AppError;
use crate::rpc::translate;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub pn: u32,
    #[serde(default = "default_page_size")]
    pub psize: u32,
}

fn default_page_size() -> u32 {
    10
}

pub async fn list_users(
    claims: SessionClaims,
    query: web::Query<ListQuery>,
    state: web::Data<AppState>,
) -> Result<HttpResponse, AppError> {
    info!("User {} listing users, page {} size {}", claims.subject_id, query.pn, query.psize);

    let page = state
        .identity
        .list_users(query.pn, query.psize)
        .await
        .map_err(|status| {
            error!("[list_users] querying user list failed: {}", status);
            AppError::from(translate(&status))
        })?;

    let users: Vec<UserResponse> = page.data.into_iter().map(UserResponse::from).collect();
    Ok(HttpResponse::Ok().json(users))
}
