//! Core identity provider traits and types.
//!
//! A [`Provider`] drives one identity service through the OAuth2 authorization
//! code flow. The host hands out the [`Session`] produced by
//! [`Provider::begin_auth`], persists it across the redirect with
//! [`Session::marshal`], completes it with [`Session::authorize`] and finally
//! resolves the user with [`Provider::fetch_user`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("{provider} cannot get user information without accessToken")]
    MissingAccessToken { provider: String },

    #[error("an AuthURL has not been set")]
    MissingAuthUrl,

    #[error("Missing authorization code")]
    MissingAuthorizationCode,

    #[error("Invalid token received from provider")]
    InvalidToken,

    #[error("{provider} responded with a {status} trying to fetch user information")]
    UnexpectedStatus { provider: String, status: u16 },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error(transparent)]
    TokenExchange(Box<dyn std::error::Error + Send + Sync>),
}

pub type IdentityResult<T> = Result<T, IdentityError>;

/// Normalized user record produced by [`Provider::fetch_user`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub raw_data: serde_json::Map<String, serde_json::Value>,
    pub provider: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub nick_name: String,
    pub user_id: String,
    pub avatar_url: String,
    pub location: String,
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Token pair returned by a refresh.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Token {
    pub access_token: String,
    pub token_type: String,
    pub refresh_token: Option<String>,
    pub expires_at: Option<DateTime<Utc>>,
}

/// Read-only view over the query parameters of an OAuth2 callback.
pub trait Params: Send + Sync {
    fn get(&self, key: &str) -> Option<&str>;
}

impl Params for HashMap<String, String> {
    fn get(&self, key: &str) -> Option<&str> {
        HashMap::get(self, key).map(String::as_str)
    }
}

/// Per-login-attempt state threaded through the authorization flow.
#[async_trait]
pub trait Session: Serialize + DeserializeOwned + Send + Sync {
    type Provider: Send + Sync;

    /// URL the user has to be redirected to.
    fn auth_url(&self) -> IdentityResult<&str>;

    /// Exchange the callback's authorization code for tokens and store them
    /// in the session. Returns the new access token.
    async fn authorize(
        &mut self,
        provider: &Self::Provider,
        params: &dyn Params,
    ) -> IdentityResult<String>;

    fn marshal(&self) -> IdentityResult<String> {
        Ok(serde_json::to_string(self)?)
    }
}

#[async_trait]
pub trait Provider: Send + Sync {
    type Session: Session;

    /// Name used to retrieve this provider from a registry.
    fn name(&self) -> &str;

    /// Rebind the name, needed when several providers of one type are registered.
    fn set_name(&mut self, name: String);

    fn begin_auth(&self, state: &str) -> IdentityResult<Self::Session>;

    async fn fetch_user(&self, session: &Self::Session) -> IdentityResult<User>;

    fn unmarshal_session(&self, data: &str) -> IdentityResult<Self::Session>;

    fn refresh_token_available(&self) -> bool;

    async fn refresh_token(&self, refresh_token: &str) -> IdentityResult<Token>;
}

static DEFAULT_HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(reqwest::Client::new);

static DEFAULT_TOKEN_HTTP_CLIENT: Lazy<reqwest::Client> = Lazy::new(|| {
    // Token endpoints must not be followed through redirects.
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("Failed to create HTTP client")
});

/// The process-wide HTTP client, created on first use. Follows redirects.
pub fn default_http_client() -> reqwest::Client {
    DEFAULT_HTTP_CLIENT.clone()
}

/// The process-wide client for token endpoint requests, created on first use.
/// Never follows redirects.
pub fn default_token_http_client() -> reqwest::Client {
    DEFAULT_TOKEN_HTTP_CLIENT.clone()
}

/// Returns `client` when set, otherwise the process-wide default.
pub fn http_client_with_fallback(client: Option<&reqwest::Client>) -> reqwest::Client {
    client.cloned().unwrap_or_else(default_http_client)
}

/// Returns `client` when set, otherwise the process-wide token client.
pub fn token_http_client_with_fallback(client: Option<&reqwest::Client>) -> reqwest::Client {
    client.cloned().unwrap_or_else(default_token_http_client)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_lookup() {
        let mut params = HashMap::new();
        params.insert("code".to_string(), "abc123".to_string());

        let params: &dyn Params = &params;
        assert_eq!(params.get("code"), Some("abc123"));
        assert_eq!(params.get("state"), None);
    }

    #[test]
    fn test_error_messages() {
        let err = IdentityError::MissingAccessToken {
            provider: "autodeskforge".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "autodeskforge cannot get user information without accessToken"
        );

        let err = IdentityError::UnexpectedStatus {
            provider: "autodeskforge".to_string(),
            status: 403,
        };
        assert!(err.to_string().contains("403"));
    }

    #[test]
    fn test_token_exchange_error_is_transparent() {
        let source = std::io::Error::other("invalid_grant");
        let err = IdentityError::TokenExchange(Box::new(source));
        assert_eq!(err.to_string(), "invalid_grant");
    }

    #[test]
    fn test_user_serializes_with_defaults() {
        let user = User {
            provider: "autodeskforge".to_string(),
            user_id: "42".to_string(),
            ..Default::default()
        };

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["provider"], "autodeskforge");
        assert_eq!(json["user_id"], "42");
        assert!(json["expires_at"].is_null());
    }
}
