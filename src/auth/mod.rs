//! Session tokens for the gateway
//!
//! This module handles token issuance and verification, the
//! authorization gate for protected routes, and token refresh.

mod claims;
mod refresh;
mod token;

pub mod handlers;
pub mod middleware;

pub use claims::{SessionClaims, SubjectId, ISSUER};
pub use middleware::{AuthGate, RevocationCheck, TOKEN_HEADER};
pub use refresh::{RefreshConfig, RefreshError, RefreshPolicy};
pub use token::{SessionVerifier, SigningKey, TokenCodec, VerifyError};
