//! # Share Tokens

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::rngs::OsRng;
use rand::RngCore;

/// Random bytes per token
pub const SHARE_TOKEN_BYTES: usize = 32;

/// Encoded length of a token (base64url, no padding)
pub const SHARE_TOKEN_LEN: usize = 43;

/// 256 bits from the OS CSPRNG, base64url encoded
pub fn generate_share_token() -> String {
    let mut bytes = [0u8; SHARE_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Shape check run before any catalog lookup
pub fn is_well_formed(token: &str) -> bool {
    token.len() == SHARE_TOKEN_LEN
        && token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b == b'-' || b == b'_')
}
