use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use rand::Rng;

const TOKEN_BYTES: usize = 32;

/// Encoded length of a share token.
pub const TOKEN_LEN: usize = 43;

/// 32 random bytes from the thread CSPRNG, base64url without padding.
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::rng().fill(&mut bytes);
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Whether `token` could have come from [`generate_token`].
pub fn is_well_formed(token: &str) -> bool {
    token.len() == TOKEN_LEN
        && URL_SAFE_NO_PAD
            .decode(token)
            .is_ok_and(|bytes| bytes.len() == TOKEN_BYTES)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_url_safe_and_distinct() {
        let first = generate_token();
        let second = generate_token();
        assert_eq!(first.len(), TOKEN_LEN);
        assert!(first
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
        assert_ne!(first, second);
        assert!(is_well_formed(&first));
    }

    #[test]
    fn rejects_malformed_tokens() {
        assert!(!is_well_formed(""));
        assert!(!is_well_formed("short"));
        assert!(!is_well_formed(&"!".repeat(TOKEN_LEN)));
        assert!(!is_well_formed(&format!("{}=", generate_token())));
    }
}
