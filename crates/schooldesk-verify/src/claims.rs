//! Claim set embedded in verification tokens.

use serde::{Deserialize, Serialize};

/// Claims carried by a verification token.
///
/// `P` is whatever profile data the application needs to survive the
/// confirmation round trip; the token mechanism never inspects it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationClaims<P> {
    /// Subject (email address, lowercased at issuance).
    pub sub: String,
    /// Opaque application payload, carried unmodified.
    pub payload: P,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Expiration (unix timestamp).
    pub exp: i64,
}
