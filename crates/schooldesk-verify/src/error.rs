//! Error types for verification tokens.

use thiserror::Error;

/// Errors from token issuance.
#[derive(Debug, Error)]
pub enum IssueError {
    #[error("email must not be empty")]
    EmptyEmail,

    #[error("failed to encode token payload: {0}")]
    Signing(String),
}

/// Errors from token verification.
///
/// Both variants are expected, recoverable outcomes. Callers show the user a
/// generic "verification failed" either way; the variant exists so logs can
/// tell a tampered or wrongly keyed token apart from one that merely aged out.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("token is malformed or its signature does not match: {0}")]
    Invalid(String),

    #[error("token expired at {expired_at} (checked at {checked_at})")]
    Expired { expired_at: i64, checked_at: i64 },
}
