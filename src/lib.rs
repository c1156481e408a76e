pub mod auth;
pub mod cache;
pub mod config;
pub mod error;
pub mod rpc;
pub mod sms;
pub mod users;
pub mod validation;

use std::sync::Arc;
use std::time::Duration as StdDuration;

use actix_web::{web, HttpResponse};
use chrono::Duration;

pub use error::AppError;
pub type Result<T> = std::result::Result<T, AppError>;
pub use config::Settings;
pub use auth::TOKEN_HEADER;

use auth::{AuthGate, RefreshConfig, RefreshPolicy, SessionVerifier, SigningKey, TokenCodec};
use cache::{CodeCache, InMemoryCodeCache};
use rpc::{HttpIdentityClient, IdentityBackend};
use sms::{LogSmsSender, SmsSender};

/// Health check endpoint handler
/// Returns a JSON response with server status and timestamp
pub async fn health_check() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

/// Application state shared across all workers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Settings>,
    pub codec: Arc<TokenCodec>,
    pub refresh: Arc<RefreshPolicy>,
    pub identity: Arc<dyn IdentityBackend>,
    pub codes: Arc<dyn CodeCache>,
    pub sms: Arc<dyn SmsSender>,
}

impl AppState {
    /// Wires the production collaborators from configuration. Fails when the
    /// signing key is missing or the user service address is unusable.
    pub fn new(config: Settings) -> Result<Self> {
        let identity = HttpIdentityClient::new(
            &config.identity.base_url,
            StdDuration::from_secs(config.identity.timeout_secs),
        )?;

        Self::with_collaborators(
            config,
            Arc::new(identity),
            Arc::new(InMemoryCodeCache::new()),
            Arc::new(LogSmsSender),
        )
    }

    pub fn with_collaborators(
        config: Settings,
        identity: Arc<dyn IdentityBackend>,
        codes: Arc<dyn CodeCache>,
        sms: Arc<dyn SmsSender>,
    ) -> Result<Self> {
        let key = SigningKey::new(config.auth.signing_key.as_bytes())?;
        let codec = Arc::new(TokenCodec::new(&key));
        let refresh = Arc::new(RefreshPolicy::new(
            codec.clone(),
            RefreshConfig {
                ttl: Duration::seconds(config.auth.refresh_ttl_secs),
                grace: Duration::seconds(config.auth.refresh_grace_secs),
                max_session: Duration::seconds(config.auth.max_session_secs),
            },
        ));

        Ok(Self {
            config: Arc::new(config),
            codec,
            refresh,
            identity,
            codes,
            sms,
        })
    }

    pub fn auth_gate(&self) -> AuthGate {
        let verifier: Arc<dyn SessionVerifier> = self.codec.clone();
        AuthGate::new(verifier)
    }
}

/// Registers every route. Everything under `/u/v1/user/list` sits behind
/// the [`AuthGate`].
pub fn configure_routes(cfg: &mut web::ServiceConfig, gate: AuthGate) {
    cfg.route("/health", web::get().to(health_check)).service(
        web::scope("/u/v1")
            .route("/base/send_sms", web::post().to(sms::handlers::send_sms))
            .route("/user/pwd_login", web::post().to(auth::handlers::password_login))
            .route("/user/register", web::post().to(auth::handlers::register))
            .route("/user/refresh", web::post().to(auth::handlers::refresh))
            .service(
                web::resource("/user/list")
                    .wrap(gate)
                    .route(web::get().to(users::handlers::list_users)),
            ),
    );
}
