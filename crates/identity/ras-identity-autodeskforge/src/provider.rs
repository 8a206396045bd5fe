//! Autodesk Forge provider implementation.

use crate::config::Endpoints;
use crate::session::AutodeskForgeSession;
use crate::types::ForgeUserProfile;
use async_trait::async_trait;
use chrono::Utc;
use oauth2::basic::{BasicClient, BasicTokenResponse};
use oauth2::{
    AuthType, AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet,
    EndpointSet, RedirectUrl, RefreshToken, Scope, TokenResponse, TokenUrl,
};
use ras_identity_core::{
    IdentityError, IdentityResult, Provider, Token, User, http_client_with_fallback,
    token_http_client_with_fallback,
};
use reqwest::StatusCode;
use tracing::{debug, error, info};

pub const PROVIDER_NAME: &str = "autodeskforge";

type ForgeOAuthClient =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Provider for accessing `developer.api.autodesk.com`.
#[derive(Debug, Clone)]
pub struct AutodeskForgeProvider {
    client_key: String,
    secret: String,
    callback_url: String,
    http_client: Option<reqwest::Client>,
    endpoints: Endpoints,
    scopes: Vec<String>,
    oauth_client: ForgeOAuthClient,
    provider_name: String,
}

impl AutodeskForgeProvider {
    pub fn new(
        client_key: impl Into<String>,
        secret: impl Into<String>,
        callback_url: impl Into<String>,
    ) -> Self {
        let client_key = client_key.into();
        let secret = secret.into();
        let callback_url = callback_url.into();
        let endpoints = Endpoints::default();
        let oauth_client = oauth_client(&client_key, &secret, &callback_url, &endpoints);

        Self {
            client_key,
            secret,
            callback_url,
            http_client: None,
            endpoints,
            scopes: Vec::new(),
            oauth_client,
            provider_name: PROVIDER_NAME.to_string(),
        }
    }

    /// Scopes requested by the OAuth2 client on top of the fixed
    /// `data:read` of the authorization URL.
    pub fn with_scopes<I, S>(mut self, scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.scopes = scopes.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.oauth_client = oauth_client(
            &self.client_key,
            &self.secret,
            &self.callback_url,
            &endpoints,
        );
        self.endpoints = endpoints;
        self
    }

    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = Some(client);
        self
    }

    pub fn set_http_client(&mut self, client: Option<reqwest::Client>) {
        self.http_client = client;
    }

    pub fn client_key(&self) -> &str {
        &self.client_key
    }

    pub fn secret(&self) -> &str {
        &self.secret
    }

    pub fn callback_url(&self) -> &str {
        &self.callback_url
    }

    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    pub fn endpoints(&self) -> &Endpoints {
        &self.endpoints
    }

    /// The configured HTTP client, or the process-wide default.
    pub fn client(&self) -> reqwest::Client {
        http_client_with_fallback(self.http_client.as_ref())
    }

    /// Client for token endpoint requests; the fallback does not follow redirects.
    fn token_client(&self) -> reqwest::Client {
        token_http_client_with_fallback(self.http_client.as_ref())
    }

    /// Exchange an authorization code at the token endpoint.
    pub(crate) async fn exchange_code(&self, code: &str) -> IdentityResult<Token> {
        let http_client = self.token_client();
        let response = self
            .oauth_client
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&http_client)
            .await
            .map_err(|e| {
                error!("Token exchange failed for {}: {}", self.provider_name, e);
                IdentityError::TokenExchange(Box::new(e))
            })?;

        info!("Successfully exchanged code for tokens");
        Ok(token_from_response(&response, None))
    }
}

/// Build the OAuth2 client. The authorization URL always carries
/// `scope=data:read`, whatever scopes were configured.
fn oauth_client(
    client_key: &str,
    secret: &str,
    callback_url: &str,
    endpoints: &Endpoints,
) -> ForgeOAuthClient {
    let mut auth_url = endpoints.authorize.clone();
    auth_url.set_query(Some(&format!(
        "response_type=code&client_id={client_key}&redirect_uri={callback_url}&scope=data:read"
    )));

    let client = BasicClient::new(ClientId::new(client_key.to_string()))
        .set_client_secret(ClientSecret::new(secret.to_string()))
        .set_auth_type(AuthType::RequestBody)
        .set_auth_uri(AuthUrl::from_url(auth_url))
        .set_token_uri(TokenUrl::from_url(endpoints.token.clone()));

    // Relative callbacks such as "/foo" only live in the authorization URL.
    match RedirectUrl::new(callback_url.to_string()) {
        Ok(redirect_url) => client.set_redirect_uri(redirect_url),
        Err(e) => {
            debug!("Callback URL {} not registered as redirect URI: {}", callback_url, e);
            client
        }
    }
}

/// Convert a token endpoint response. `fallback_refresh` is kept when the
/// endpoint does not rotate the refresh token.
fn token_from_response(response: &BasicTokenResponse, fallback_refresh: Option<&str>) -> Token {
    let expires_at = response
        .expires_in()
        .and_then(|ttl| chrono::Duration::from_std(ttl).ok())
        .map(|ttl| Utc::now() + ttl);

    Token {
        access_token: response.access_token().secret().clone(),
        token_type: response.token_type().as_ref().to_string(),
        refresh_token: response
            .refresh_token()
            .map(|token| token.secret().clone())
            .or_else(|| fallback_refresh.map(String::from)),
        expires_at,
    }
}

fn map_profile(user: &mut User, profile: ForgeUserProfile) {
    user.user_id = profile.user_id;
    user.nick_name = profile.user_name;
    user.first_name = profile.first_name;
    user.last_name = profile.last_name;
    user.email = profile.email_id;
    user.location = profile.country_code;
    user.avatar_url = profile.profile_images.size_x120;
}

#[async_trait]
impl Provider for AutodeskForgeProvider {
    type Session = AutodeskForgeSession;

    fn name(&self) -> &str {
        &self.provider_name
    }

    fn set_name(&mut self, name: String) {
        self.provider_name = name;
    }

    fn begin_auth(&self, state: &str) -> IdentityResult<AutodeskForgeSession> {
        let (url, _) = self
            .oauth_client
            .authorize_url(|| CsrfToken::new(state.to_string()))
            .add_scopes(self.scopes.iter().cloned().map(Scope::new))
            .url();

        debug!(
            "Generated authorization URL for provider {}",
            self.provider_name
        );

        Ok(AutodeskForgeSession {
            auth_url: url.to_string(),
            ..Default::default()
        })
    }

    async fn fetch_user(&self, session: &AutodeskForgeSession) -> IdentityResult<User> {
        let mut user = User {
            access_token: session.access_token.clone(),
            provider: self.name().to_string(),
            refresh_token: session.refresh_token.clone(),
            expires_at: session.expires_at,
            ..Default::default()
        };

        if user.access_token.is_empty() {
            return Err(IdentityError::MissingAccessToken {
                provider: self.provider_name.clone(),
            });
        }

        let response = self
            .client()
            .get(self.endpoints.user_profile.clone())
            .bearer_auth(&session.access_token)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            error!("User info request to {} failed: {}", self.provider_name, status);
            return Err(IdentityError::UnexpectedStatus {
                provider: self.provider_name.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        let raw: serde_json::Value = serde_json::from_str(&body)?;
        // A `null` body decodes as an empty profile.
        let profile: ForgeUserProfile =
            serde_json::from_value::<Option<ForgeUserProfile>>(raw.clone())?.unwrap_or_default();

        if let serde_json::Value::Object(raw_data) = raw {
            user.raw_data = raw_data;
        }
        map_profile(&mut user, profile);

        debug!(
            "Successfully retrieved user info for subject: {}",
            user.user_id
        );
        Ok(user)
    }

    fn unmarshal_session(&self, data: &str) -> IdentityResult<AutodeskForgeSession> {
        Ok(serde_json::from_str(data)?)
    }

    fn refresh_token_available(&self) -> bool {
        true
    }

    async fn refresh_token(&self, refresh_token: &str) -> IdentityResult<Token> {
        let http_client = self.token_client();
        let response = self
            .oauth_client
            .exchange_refresh_token(&RefreshToken::new(refresh_token.to_string()))
            .request_async(&http_client)
            .await
            .map_err(|e| {
                error!("Token refresh failed for {}: {}", self.provider_name, e);
                IdentityError::TokenExchange(Box::new(e))
            })?;

        info!("Successfully refreshed tokens for {}", self.provider_name);
        Ok(token_from_response(&response, Some(refresh_token)))
    }
}
