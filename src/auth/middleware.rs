//! Authorization gate for protected routes.
//!
//! Wrap a scope with [`AuthGate`] and every request must carry a valid
//! session token in the `x-token` header. On success the verified
//! [`SessionClaims`] and its [`SubjectId`] are stored in the request
//! extensions and can be pulled into handlers as extractors.

use std::rc::Rc;
use std::sync::Arc;

use actix_web::body::EitherBody;
use actix_web::dev::{forward_ready, Payload, Service, ServiceRequest, ServiceResponse, Transform};
use actix_web::http::header::HeaderMap;
use actix_web::{FromRequest, HttpMessage, HttpRequest, ResponseError};
use futures::future::{ready, LocalBoxFuture, Ready};
use tracing::{debug, warn};

use super::claims::{SessionClaims, SubjectId};
use super::token::{SessionVerifier, VerifyError};
use crate::error::{AppError, AuthError};

pub const TOKEN_HEADER: &str = "x-token";

/// External revocation list consulted after a token verifies.
pub trait RevocationCheck: Send + Sync {
    fn is_revoked(&self, claims: &SessionClaims) -> bool;
}

/// Reads the session token from the request headers. Empty and non-UTF-8
/// values count as absent.
pub fn extract_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(TOKEN_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// The gate decision, independent of the actix plumbing.
pub fn authorize(
    token: Option<&str>,
    verifier: &dyn SessionVerifier,
    revocation: Option<&dyn RevocationCheck>,
) -> Result<SessionClaims, AuthError> {
    let token = token.ok_or(AuthError::Unauthenticated)?;

    let claims = verifier.verify(token).map_err(|e| {
        match e {
            VerifyError::Expired => debug!("rejected expired session token"),
            other => warn!(reason = %other, "rejected session token"),
        }
        AuthError::from(e)
    })?;

    if revocation.is_some_and(|check| check.is_revoked(&claims)) {
        warn!(subject_id = claims.subject_id, "rejected revoked session token");
        return Err(AuthError::NotLoggedIn);
    }

    Ok(claims)
}

#[derive(Clone)]
pub struct AuthGate {
    verifier: Arc<dyn SessionVerifier>,
    revocation: Option<Arc<dyn RevocationCheck>>,
}

impl AuthGate {
    pub fn new(verifier: Arc<dyn SessionVerifier>) -> Self {
        Self {
            verifier,
            revocation: None,
        }
    }

    pub fn with_revocation(mut self, check: Arc<dyn RevocationCheck>) -> Self {
        self.revocation = Some(check);
        self
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Transform = AuthGateMiddleware<S>;
    type InitError = ();
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AuthGateMiddleware {
            service: Rc::new(service),
            gate: self.clone(),
        }))
    }
}

pub struct AuthGateMiddleware<S> {
    service: Rc<S>,
    gate: AuthGate,
}

impl<S, B> Service<ServiceRequest> for AuthGateMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = actix_web::Error> + 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = actix_web::Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let decision = authorize(
            extract_token(req.headers()),
            self.gate.verifier.as_ref(),
            self.gate.revocation.as_deref(),
        );

        match decision {
            Ok(claims) => {
                {
                    let mut extensions = req.extensions_mut();
                    extensions.insert(SubjectId(claims.subject_id));
                    extensions.insert(claims);
                }
                let service = Rc::clone(&self.service);
                Box::pin(async move { service.call(req).await.map(ServiceResponse::map_into_left_body) })
            }
            Err(e) => {
                let response = AppError::from(e).error_response();
                Box::pin(ready(Ok(req.into_response(response).map_into_right_body())))
            }
        }
    }
}

impl FromRequest for SessionClaims {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<SessionClaims>()
                .cloned()
                .ok_or(AppError::AuthError(AuthError::Unauthenticated)),
        )
    }
}

impl FromRequest for SubjectId {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<SubjectId>()
                .copied()
                .ok_or(AppError::AuthError(AuthError::Unauthenticated)),
        )
    }
}
