//! Opaque bearer token generation.
//!
//! Tokens carry no claims; the database row they index holds the
//! expiry and scope snapshot.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;

/// Generate a cryptographically random opaque token
/// (32 bytes → base64url-encoded, no padding).
pub fn generate_token() -> String {
    let mut rng = rand::rng();
    let bytes: [u8; 32] = rand::Rng::random(&mut rng);
    URL_SAFE_NO_PAD.encode(bytes)
}
