use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, decode_header, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use thiserror::Error;

use super::claims::{SessionClaims, ISSUER};
use crate::error::AppError;

/// Why a token was refused. Only `Expired` may be followed by a refresh.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyError {
    #[error("token is malformed")]
    Malformed,

    #[error("token is invalid")]
    Invalid,

    #[error("token has expired")]
    Expired,

    #[error("token is not active yet")]
    NotYetValid,
}

/// HMAC secret shared by token creation, verification and refresh.
///
/// Built once from configuration at startup and never mutated afterwards.
#[derive(Clone)]
pub struct SigningKey(Arc<[u8]>);

impl SigningKey {
    pub fn new(secret: impl AsRef<[u8]>) -> Result<Self, AppError> {
        let secret = secret.as_ref();
        if secret.is_empty() {
            return Err(AppError::ConfigError("auth.signing_key must not be empty".into()));
        }
        Ok(Self(Arc::from(secret)))
    }

    fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for SigningKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKey(<redacted>)")
    }
}

/// Anything able to turn a presented token into trusted claims.
#[cfg_attr(test, mockall::automock)]
pub trait SessionVerifier: Send + Sync {
    fn verify(&self, token: &str) -> Result<SessionClaims, VerifyError>;
}

pub struct TokenCodec {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenCodec {
    pub fn new(key: &SigningKey) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(key.as_bytes()),
            decoding_key: DecodingKey::from_secret(key.as_bytes()),
        }
    }

    /// Signs `claims` as an HS256 JWT.
    pub fn create(&self, claims: &SessionClaims) -> Result<String, AppError> {
        let token = encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)?;
        Ok(token)
    }

    pub fn verify_at(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, VerifyError> {
        let claims = self.decode_signed(token)?;

        if claims.is_active_at(now) {
            Ok(claims)
        } else if now.timestamp() < claims.not_before {
            Err(VerifyError::NotYetValid)
        } else {
            Err(VerifyError::Expired)
        }
    }

    /// Checks structure, signature, claim shape and issuer, but not the
    /// validity window. Callers apply their own time policy on top.
    pub(crate) fn decode_signed(&self, token: &str) -> Result<SessionClaims, VerifyError> {
        // An unreadable header or unknown `alg` never reaches signature checks.
        decode_header(token).map_err(|_| VerifyError::Malformed)?;
        decode::<SessionClaims>(token, &self.decoding_key, &Self::validation())
            .map(|data| data.claims)
            .map_err(|e| classify(e.kind()))
    }

    fn validation() -> Validation {
        let mut validation = Validation::new(Algorithm::HS256);
        // The window is checked against an explicit instant with no leeway.
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "nbf", "iss"]);
        validation.set_issuer(&[ISSUER]);
        validation
    }
}

impl SessionVerifier for TokenCodec {
    fn verify(&self, token: &str) -> Result<SessionClaims, VerifyError> {
        self.verify_at(token, Utc::now())
    }
}

fn classify(kind: &ErrorKind) -> VerifyError {
    match kind {
        ErrorKind::InvalidToken
        | ErrorKind::Base64(_)
        | ErrorKind::Utf8(_)
        | ErrorKind::InvalidAlgorithm
        | ErrorKind::InvalidAlgorithmName => VerifyError::Malformed,
        ErrorKind::ExpiredSignature => VerifyError::Expired,
        ErrorKind::ImmatureSignature => VerifyError::NotYetValid,
        _ => VerifyError::Invalid,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    const T: i64 = 1_700_000_000;

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn codec(secret: &str) -> TokenCodec {
        TokenCodec::new(&SigningKey::new(secret).unwrap())
    }

    fn thirty_day_claims() -> SessionClaims {
        SessionClaims::issue(42, "alice", 1, at(T), Duration::seconds(2_592_000))
    }

    // Swap one character for a different base64url character.
    fn tamper(token: &str, segment: usize) -> String {
        let mut parts: Vec<String> = token.split('.').map(str::to_string).collect();
        let mut chars: Vec<char> = parts[segment].chars().collect();
        let idx = chars.len() / 2;
        chars[idx] = if chars[idx] == 'A' { 'B' } else { 'A' };
        parts[segment] = chars.into_iter().collect();
        parts.join(".")
    }

    #[test]
    fn test_round_trip() {
        let codec = codec("test_secret");
        let claims = thirty_day_claims();
        let token = codec.create(&claims).unwrap();

        assert_eq!(token.split('.').count(), 3);
        assert_eq!(codec.verify_at(&token, at(T + 10)).unwrap(), claims);
    }

    #[test]
    fn test_expiry_scenario() {
        let codec = codec("test_secret");
        let token = codec.create(&thirty_day_claims()).unwrap();

        let claims = codec.verify_at(&token, at(T + 10)).unwrap();
        assert_eq!(claims.subject_id, 42);

        assert_eq!(codec.verify_at(&token, at(T + 2_592_001)), Err(VerifyError::Expired));
        // Expiry instant itself is already outside the window.
        assert_eq!(codec.verify_at(&token, at(T + 2_592_000)), Err(VerifyError::Expired));
    }

    #[test]
    fn test_not_yet_valid() {
        let codec = codec("test_secret");
        let token = codec.create(&thirty_day_claims()).unwrap();

        assert_eq!(codec.verify_at(&token, at(T - 1)), Err(VerifyError::NotYetValid));
    }

    #[test]
    fn test_tampered_payload_and_signature_are_invalid() {
        let codec = codec("test_secret");
        let token = codec.create(&thirty_day_claims()).unwrap();

        assert_eq!(codec.verify_at(&tamper(&token, 1), at(T + 10)), Err(VerifyError::Invalid));
        assert_eq!(codec.verify_at(&tamper(&token, 2), at(T + 10)), Err(VerifyError::Invalid));
    }

    #[test]
    fn test_forged_and_expired_reports_invalid() {
        let codec = codec("test_secret");
        let forged = tamper(&codec.create(&thirty_day_claims()).unwrap(), 2);

        assert_eq!(codec.verify_at(&forged, at(T + 3_000_000)), Err(VerifyError::Invalid));
    }

    #[test]
    fn test_other_key_is_invalid() {
        let token = codec("first_secret").create(&thirty_day_claims()).unwrap();

        assert_eq!(
            codec("second_secret").verify_at(&token, at(T + 10)),
            Err(VerifyError::Invalid)
        );
    }

    #[test]
    fn test_foreign_issuer_is_invalid() {
        let codec = codec("test_secret");
        let mut claims = thirty_day_claims();
        claims.issuer = "someone-else".to_string();
        let token = codec.create(&claims).unwrap();

        assert_eq!(codec.verify_at(&token, at(T + 10)), Err(VerifyError::Invalid));
    }

    #[test]
    fn test_malformed_inputs() {
        let codec = codec("test_secret");

        assert_eq!(codec.verify_at("not-a-token", at(T)), Err(VerifyError::Malformed));
        assert_eq!(codec.verify_at("", at(T)), Err(VerifyError::Malformed));
        assert_eq!(codec.verify_at("a.b.c", at(T)), Err(VerifyError::Malformed));
    }

    #[test]
    fn test_unsupported_algorithm_is_malformed() {
        let key = EncodingKey::from_secret(b"test_secret");
        let token = encode(&Header::new(Algorithm::HS512), &thirty_day_claims(), &key).unwrap();

        assert_eq!(codec("test_secret").verify_at(&token, at(T + 10)), Err(VerifyError::Malformed));
    }

    // Header segment swapped for `b64url(header)`, payload and signature kept.
    fn with_header(token: &str, header: &str) -> String {
        let rest = token.splitn(2, '.').nth(1).unwrap();
        format!("{}.{}", header, rest)
    }

    #[test]
    fn test_alg_none_is_malformed() {
        let codec = codec("test_secret");
        let token = codec.create(&thirty_day_claims()).unwrap();
        let payload = token.split('.').nth(1).unwrap();

        // {"alg":"none"} with an empty signature
        let unsigned = format!("eyJhbGciOiJub25lIn0.{}.", payload);
        assert_eq!(codec.verify_at(&unsigned, at(T + 10)), Err(VerifyError::Malformed));
    }

    #[test]
    fn test_unreadable_header_is_malformed() {
        let codec = codec("test_secret");
        let token = codec.create(&thirty_day_claims()).unwrap();

        // {"alg":"XX99","typ":"JWT"}
        let unknown_alg = with_header(&token, "eyJhbGciOiJYWDk5IiwidHlwIjoiSldUIn0");
        assert_eq!(codec.verify_at(&unknown_alg, at(T + 10)), Err(VerifyError::Malformed));

        // "hello" is not JSON
        let not_json = with_header(&token, "aGVsbG8");
        assert_eq!(codec.verify_at(&not_json, at(T + 10)), Err(VerifyError::Malformed));
    }

    #[test]
    fn test_wrong_claim_shape_is_invalid() {
        #[derive(serde::Serialize)]
        struct Other {
            sub: String,
            nbf: i64,
            exp: i64,
            iss: String,
        }
        let other = Other {
            sub: "42".into(),
            nbf: T,
            exp: T + 60,
            iss: ISSUER.into(),
        };
        let key = EncodingKey::from_secret(b"test_secret");
        let token = encode(&Header::new(Algorithm::HS256), &other, &key).unwrap();

        assert_eq!(codec("test_secret").verify_at(&token, at(T + 10)), Err(VerifyError::Invalid));
    }

    #[test]
    fn test_empty_key_is_rejected() {
        assert!(matches!(SigningKey::new(""), Err(AppError::ConfigError(_))));
    }

    #[test]
    fn test_key_is_not_printed() {
        let key = SigningKey::new("super_secret_value").unwrap();
        assert!(!format!("{:?}", key).contains("super_secret_value"));
    }
}
