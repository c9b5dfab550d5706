//! SCS name tokens.
//!
//! Part and variant names are stored by the game as tokens: at most twelve
//! characters from `[a-z0-9_]`.

/// Maximum token length.
pub const TOKEN_MAX_LEN: usize = 12;

/// Fallback used when a name has no characters left.
pub const DEFAULT_TOKEN: &str = "default";

/// Normalise a name to a valid token.
///
/// Letters are lowercased, any other character outside `[a-z0-9_]` becomes
/// `_`, and the result is cut to [`TOKEN_MAX_LEN`] characters.
pub fn tokenize_name(name: &str) -> String {
    let token: String = name
        .trim()
        .chars()
        .map(|c| {
            let c = c.to_ascii_lowercase();
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_' {
                c
            } else {
                '_'
            }
        })
        .take(TOKEN_MAX_LEN)
        .collect();

    if token.is_empty() {
        DEFAULT_TOKEN.to_string()
    } else {
        token
    }
}

/// Whether `name` is already a valid token.
pub fn is_valid_token(name: &str) -> bool {
    !name.is_empty()
        && name.len() <= TOKEN_MAX_LEN
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_name() {
        assert_eq!(tokenize_name("body"), "body");
        assert_eq!(tokenize_name("Wheel Front"), "wheel_front");
        assert_eq!(tokenize_name("cabin.interior.lod0"), "cabin_interi");
        assert_eq!(tokenize_name(""), "default");
        assert_eq!(tokenize_name("   "), "default");
    }

    #[test]
    fn test_tokenized_names_are_valid() {
        for name in ["Part 1", "ÄÖÜ", "abcdefghijklmnop", "x"] {
            assert!(is_valid_token(&tokenize_name(name)), "{}", name);
        }
        assert!(!is_valid_token("Upper"));
        assert!(!is_valid_token("waytoolongtoken"));
    }
}
