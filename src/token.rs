use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use rand::RngCore;

/// Entropy carried by an edit token: 24 bytes, 192 bits.
const TOKEN_BYTES: usize = 24;

/// Generate the capability token that authorizes viewing and editing one
/// order without a login. URL-safe, no padding (32 chars).
pub fn generate_edit_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_is_url_safe_and_long_enough() {
        let token = generate_edit_token();
        assert_eq!(token.len(), 32);
        assert!(
            token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
    }

    #[test]
    fn tokens_do_not_repeat() {
        let a = generate_edit_token();
        let b = generate_edit_token();
        assert_ne!(a, b);
    }
}
