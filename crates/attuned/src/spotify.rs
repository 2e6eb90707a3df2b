//! Client-credentials token exchange with the streaming service.
//!
//! Playlist embeds work without a token; the exchange only validates the
//! configured credentials at startup, so the token itself is not kept.

use serde::Deserialize;
use thiserror::Error;

const TOKEN_URL: &str = "https://accounts.spotify.com/api/token";

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("token request failed: {0}")]
    Request(String),
    #[error("failed to read token response: {0}")]
    Body(#[from] std::io::Error),
    #[error("malformed token response: {0}")]
    Parse(#[from] serde_json::Error),
}

/// The parts of a token grant worth logging.
#[derive(Debug, Deserialize)]
pub struct TokenGrant {
    pub token_type: String,
    pub expires_in: u64,
}

/// Exchange client credentials for an access token. Blocking.
pub fn request_token(client_id: &str, client_secret: &str) -> Result<TokenGrant, TokenError> {
    let response = ureq::post(TOKEN_URL)
        .send_form(&[
            ("grant_type", "client_credentials"),
            ("client_id", client_id),
            ("client_secret", client_secret),
        ])
        .map_err(|e| TokenError::Request(e.to_string()))?;

    let body = response.into_string()?;
    parse_grant(&body)
}

fn parse_grant(body: &str) -> Result<TokenGrant, TokenError> {
    Ok(serde_json::from_str(body)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_grant() {
        let grant = parse_grant(
            r#"{"access_token":"abc123","token_type":"Bearer","expires_in":3600}"#,
        )
        .unwrap();
        assert_eq!(grant.token_type, "Bearer");
        assert_eq!(grant.expires_in, 3600);
    }

    #[test]
    fn test_parse_grant_rejects_error_body() {
        assert!(parse_grant(r#"{"error":"invalid_client"}"#).is_err());
    }

    #[test]
    fn test_grant_debug_never_holds_token() {
        let grant = parse_grant(
            r#"{"access_token":"secret-value","token_type":"Bearer","expires_in":1}"#,
        )
        .unwrap();
        assert!(!format!("{grant:?}").contains("secret-value"));
    }
}
