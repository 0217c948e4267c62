//! Verification token issuance and validation.

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::warn;

use crate::claims::VerificationClaims;
use crate::error::{IssueError, VerifyError};

/// Environment variable holding the token signing secret.
pub const SECRET_ENV: &str = "SCHOOLDESK_TOKEN_SECRET";

/// Fallback secret for local development when no secret is configured.
const DEV_FALLBACK_SECRET: &str = "dev-secret-change-me";

/// Validity window for verification tokens (10 minutes).
pub const TOKEN_TTL_SECS: i64 = 600;

/// Contents recovered from a successfully verified token.
#[derive(Debug, Clone)]
pub struct Verified<P> {
    /// Email address as it was signed (lowercased).
    pub email: String,
    /// Application payload carried through the round trip.
    pub payload: P,
    /// Expiration (unix timestamp).
    pub expires_at: i64,
}

/// Issues and verifies signed email-verification tokens.
///
/// Stateless: nothing is recorded when a token is issued, so a token can be
/// verified any number of times until it expires. There is no revocation
/// list and no single-use enforcement.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl TokenService {
    /// Create a service signing with the given secret.
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
        }
    }

    /// Create a service keyed from the `SCHOOLDESK_TOKEN_SECRET`
    /// environment variable.
    ///
    /// Falls back to a fixed development secret when the variable is unset
    /// or empty. The fallback is insecure by construction; a warning is
    /// logged so it cannot engage silently in production.
    pub fn from_env() -> Self {
        match std::env::var(SECRET_ENV) {
            Ok(secret) if !secret.is_empty() => Self::new(secret.as_bytes()),
            _ => {
                warn!(
                    env = SECRET_ENV,
                    "token secret not configured; using insecure development fallback"
                );
                Self::new(DEV_FALLBACK_SECRET.as_bytes())
            }
        }
    }

    /// Issue a token binding `email` (lowercased) and `payload`, valid for
    /// ten minutes.
    ///
    /// The email is not validated beyond being non-empty; format checks are
    /// the caller's responsibility. The resulting string is opaque and safe
    /// to embed in a URL or hidden form field.
    pub fn issue<P: Serialize>(&self, email: &str, payload: P) -> Result<String, IssueError> {
        self.issue_at(email, payload, now_secs())
    }

    fn issue_at<P: Serialize>(
        &self,
        email: &str,
        payload: P,
        now: i64,
    ) -> Result<String, IssueError> {
        if email.is_empty() {
            return Err(IssueError::EmptyEmail);
        }
        let claims = VerificationClaims {
            sub: email.to_lowercase(),
            payload,
            iat: now,
            exp: now + TOKEN_TTL_SECS,
        };
        jsonwebtoken::encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| IssueError::Signing(e.to_string()))
    }

    /// Verify a token and recover its email and payload.
    ///
    /// Fails with [`VerifyError::Invalid`] on any signature or structure
    /// problem and with [`VerifyError::Expired`] for an authentic token past
    /// its window. Verification is a pure function of the token, the secret,
    /// and the clock; no state is consulted or mutated, so the outcome is
    /// stable across repeated calls until expiry.
    pub fn verify<P: DeserializeOwned>(&self, token: &str) -> Result<Verified<P>, VerifyError> {
        self.verify_at(token, now_secs())
    }

    fn verify_at<P: DeserializeOwned>(
        &self,
        token: &str,
        now: i64,
    ) -> Result<Verified<P>, VerifyError> {
        // Expiry is enforced against the supplied clock with zero leeway,
        // not by the JWT layer.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data =
            jsonwebtoken::decode::<VerificationClaims<P>>(token, &self.decoding_key, &validation)
                .map_err(|e| VerifyError::Invalid(e.to_string()))?;

        let claims = data.claims;
        if now > claims.exp {
            return Err(VerifyError::Expired {
                expired_at: claims.exp,
                checked_at: now,
            });
        }
        Ok(Verified {
            email: claims.sub,
            payload: claims.payload,
            expires_at: claims.exp,
        })
    }
}

fn now_secs() -> i64 {
    #[allow(clippy::cast_possible_wrap)]
    let secs = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64;
    secs
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use serde_json::{Value, json};

    use super::*;

    fn test_service() -> TokenService {
        TokenService::new(b"test-secret-key-for-testing")
    }

    #[test]
    fn issue_and_verify_roundtrip() {
        let svc = test_service();
        let payload = json!({"name": "Alice Prichard", "school_id": 42});
        let token = svc.issue("Alice@Example.COM", payload.clone()).unwrap();

        let verified = svc.verify::<Value>(&token).unwrap();
        assert_eq!(verified.email, "alice@example.com");
        assert_eq!(verified.payload, payload);
    }

    #[test]
    fn empty_payload_is_allowed() {
        let svc = test_service();
        let token = svc.issue("teacher@school.edu", json!({})).unwrap();

        let verified = svc.verify::<Value>(&token).unwrap();
        assert_eq!(verified.payload, json!({}));
    }

    #[test]
    fn empty_email_is_rejected() {
        let svc = test_service();
        let err = svc.issue("", json!({"x": 1})).unwrap_err();
        assert!(matches!(err, IssueError::EmptyEmail));
    }

    #[test]
    fn garbage_token_fails_as_invalid() {
        let svc = test_service();
        let result = svc.verify::<Value>("not-a-valid-token");
        assert!(matches!(result, Err(VerifyError::Invalid(_))));
    }

    #[test]
    fn wrong_secret_fails_as_invalid() {
        let svc1 = test_service();
        let svc2 = TokenService::new(b"different-secret");

        let token = svc1.issue("kid@example.com", json!({"grade": 5})).unwrap();
        let result = svc2.verify::<Value>(&token);
        assert!(matches!(result, Err(VerifyError::Invalid(_))));
    }

    #[test]
    fn any_single_byte_flip_fails_verification() {
        let svc = test_service();
        let token = svc.issue("kid@example.com", json!({"grade": 5})).unwrap();

        for i in 0..token.len() {
            let mut bytes = token.clone().into_bytes();
            bytes[i] = if bytes[i] == b'A' { b'B' } else { b'A' };
            let tampered = String::from_utf8(bytes).unwrap();

            let result = svc.verify::<Value>(&tampered);
            assert!(
                matches!(result, Err(VerifyError::Invalid(_))),
                "flip at byte {i} went undetected"
            );
        }
    }

    #[test]
    fn expiry_window_is_exactly_ten_minutes() {
        let svc = test_service();
        let issued_at = 1_700_000_000;
        let token = svc
            .issue_at("kid@example.com", json!({"grade": 5}), issued_at)
            .unwrap();

        // One second inside the window.
        let ok = svc.verify_at::<Value>(&token, issued_at + TOKEN_TTL_SECS - 1);
        assert!(ok.is_ok());

        // Exactly at expiry is still valid (now <= exp).
        let boundary = svc.verify_at::<Value>(&token, issued_at + TOKEN_TTL_SECS);
        assert!(boundary.is_ok());

        // One second past the window.
        let err = svc
            .verify_at::<Value>(&token, issued_at + TOKEN_TTL_SECS + 1)
            .unwrap_err();
        match err {
            VerifyError::Expired {
                expired_at,
                checked_at,
            } => {
                assert_eq!(expired_at, issued_at + TOKEN_TTL_SECS);
                assert_eq!(checked_at, issued_at + TOKEN_TTL_SECS + 1);
            }
            VerifyError::Invalid(e) => panic!("expected Expired, got Invalid: {e}"),
        }
    }

    #[test]
    fn expired_token_reports_expired_not_invalid() {
        let svc = test_service();
        let token = svc.issue_at("kid@example.com", json!({}), 1_000).unwrap();
        let result = svc.verify_at::<Value>(&token, 10_000);
        assert!(matches!(result, Err(VerifyError::Expired { .. })));
    }

    #[test]
    fn same_token_verifies_repeatedly_within_window() {
        // No server-side record is kept, so replay within the window is
        // accepted by design.
        let svc = test_service();
        let token = svc.issue("kid@example.com", json!({"grade": 5})).unwrap();

        let first = svc.verify::<Value>(&token).unwrap();
        let second = svc.verify::<Value>(&token).unwrap();
        assert_eq!(first.email, second.email);
        assert_eq!(first.payload, second.payload);
    }

    #[test]
    fn expiry_matches_ttl_from_issuance() {
        let svc = test_service();
        let token = svc.issue_at("kid@example.com", json!({}), 5_000).unwrap();
        let verified = svc.verify_at::<Value>(&token, 5_000).unwrap();
        assert_eq!(verified.expires_at, 5_000 + TOKEN_TTL_SECS);
    }
}
