//! One-time confirmation codes.

use rand::RngExt;

/// Generate a 6-digit confirmation code.
///
/// Codes are uniform over `100000..=999999`, so they always render as
/// exactly six digits with no leading zero. Generation uses the
/// general-purpose thread-local RNG rather than a CSPRNG: the code is a
/// short-lived, human-typed second signal that the caller associates with a
/// verification attempt out of band, not a secret with cryptographic weight.
/// It carries no relationship to any issued token.
pub fn generate_code() -> String {
    let mut rng = rand::rng();
    let code: u32 = rng.random_range(100_000..=999_999);
    code.to_string()
}
