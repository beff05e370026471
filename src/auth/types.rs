// Authentication types

/// Access/refresh token pair as issued by the backend
#[derive(Debug, Clone, PartialEq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Session lifecycle notifications for the hosting application
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Refresh failed terminally: credentials were wiped and the user must sign in again
    Expired {
        /// Where the host should send the user
        sign_in_path: String,
        /// Refresh failure description
        reason: String,
    },
}

/// First characters of a token, safe for logs
pub(crate) fn token_preview(token: &str) -> String {
    let prefix: String = token.chars().take(8).collect();
    format!("{}...", prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_preview_truncates() {
        assert_eq!(token_preview("abcdefghijklmnop"), "abcdefgh...");
        assert_eq!(token_preview("abc"), "abc...");
        assert_eq!(token_preview(""), "...");
    }
}
