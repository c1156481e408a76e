//! User service plumbing
//!
//! The client trait the gateway calls, its HTTP implementation, the status
//! model returned on failure, and the translation of those failures into
//! caller-facing responses.

mod client;
mod status;
mod translator;

pub use client::{HttpIdentityClient, IdentityBackend, NewUser, UserInfo, UserPage};
pub use status::{RpcCode, RpcStatus};
pub use translator::{translate, CallerFailure, FailureCategory};

#[cfg(test)]
pub use client::MockIdentityBackend;
