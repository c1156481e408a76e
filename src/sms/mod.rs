//! SMS verification codes
//!
//! Generates numeric one-time codes, hands them to an [`SmsSender`] and
//! stores them in the [`CodeCache`](crate::cache::CodeCache) so registration
//! can confirm them later.

pub mod handlers;

use async_trait::async_trait;
use rand::Rng;
use tracing::info;

use crate::error::AppError;

/// Generates a code of `width` decimal digits.
pub fn generate_code(width: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..width)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// Delivery channel for verification codes.
#[async_trait]
pub trait SmsSender: Send + Sync {
    async fn send(&self, mobile: &str, code: &str) -> Result<(), AppError>;
}

/// Sender that only records the dispatch in the log. Used when no SMS
/// vendor is configured.
pub struct LogSmsSender;

#[async_trait]
impl SmsSender for LogSmsSender {
    async fn send(&self, mobile: &str, _code: &str) -> Result<(), AppError> {
        info!(mobile, "verification code dispatched");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_code() {
        for width in [4, 6, 8] {
            let code = generate_code(width);
            assert_eq!(code.len(), width);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[tokio::test]
    async fn test_log_sender_succeeds() {
        assert!(LogSmsSender.send("13812345678", "123456").await.is_ok());
    }
}
