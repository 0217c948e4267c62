//! Schooldesk identity verification library
//!
//! Carries an unconfirmed identity (email + profile payload) across an
//! out-of-band confirmation step:
//! - **Tokens**: HS256-signed, ten-minute artifacts binding an email and an
//!   opaque payload; tamper-evident, verified statelessly.
//! - **Codes**: independently generated 6-digit confirmation codes for
//!   human-readable checks; not bound to any token.

pub mod claims;
pub mod code;
pub mod error;
pub mod token;

pub use claims::VerificationClaims;
pub use code::generate_code;
pub use error::{IssueError, VerifyError};
pub use token::{SECRET_ENV, TOKEN_TTL_SECS, TokenService, Verified};
