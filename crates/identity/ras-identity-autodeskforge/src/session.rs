//! Login state for one Autodesk Forge authorization attempt.

use crate::provider::AutodeskForgeProvider;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ras_identity_core::{IdentityError, IdentityResult, Params, Session};
use serde::{Deserialize, Serialize};

/// Serialized as `{"AuthURL", "AccessToken", "RefreshToken", "ExpiresAt"}` so
/// hosts can persist it between the redirect and the callback.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutodeskForgeSession {
    #[serde(rename = "AuthURL")]
    pub auth_url: String,
    #[serde(rename = "AccessToken")]
    pub access_token: String,
    #[serde(rename = "RefreshToken")]
    pub refresh_token: String,
    #[serde(rename = "ExpiresAt")]
    pub expires_at: Option<DateTime<Utc>>,
}

#[async_trait]
impl Session for AutodeskForgeSession {
    type Provider = AutodeskForgeProvider;

    fn auth_url(&self) -> IdentityResult<&str> {
        if self.auth_url.is_empty() {
            return Err(IdentityError::MissingAuthUrl);
        }
        Ok(&self.auth_url)
    }

    async fn authorize(
        &mut self,
        provider: &AutodeskForgeProvider,
        params: &dyn Params,
    ) -> IdentityResult<String> {
        let code = params
            .get("code")
            .filter(|code| !code.is_empty())
            .ok_or(IdentityError::MissingAuthorizationCode)?;

        let token = provider.exchange_code(code).await?;
        if token.access_token.is_empty() {
            return Err(IdentityError::InvalidToken);
        }

        self.access_token = token.access_token.clone();
        self.refresh_token = token.refresh_token.unwrap_or_default();
        self.expires_at = token.expires_at;
        Ok(token.access_token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_marshal_uses_host_key_casing() {
        let session = AutodeskForgeSession {
            auth_url: "https://developer.api.autodesk.com/authentication/v1/authorize".to_string(),
            access_token: "1234567890".to_string(),
            refresh_token: "r-1".to_string(),
            expires_at: Some(Utc.with_ymd_and_hms(2030, 1, 2, 3, 4, 5).unwrap()),
        };

        let json: serde_json::Value = serde_json::from_str(&session.marshal().unwrap()).unwrap();
        assert_eq!(
            json["AuthURL"],
            "https://developer.api.autodesk.com/authentication/v1/authorize"
        );
        assert_eq!(json["AccessToken"], "1234567890");
        assert_eq!(json["RefreshToken"], "r-1");
        assert_eq!(json["ExpiresAt"], "2030-01-02T03:04:05Z");

        let decoded: AutodeskForgeSession = serde_json::from_value(json).unwrap();
        assert_eq!(decoded, session);
    }

    #[test]
    fn test_zero_time_expiry_is_accepted() {
        let session: AutodeskForgeSession = serde_json::from_str(
            r#"{"AuthURL":"","AccessToken":"a","RefreshToken":"","ExpiresAt":"0001-01-01T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(session.access_token, "a");
        assert!(session.expires_at.is_some());
    }

    #[test]
    fn test_auth_url_missing() {
        let session = AutodeskForgeSession::default();
        assert!(matches!(session.auth_url(), Err(IdentityError::MissingAuthUrl)));

        let session = AutodeskForgeSession {
            auth_url: "https://example.com/authorize".to_string(),
            ..Default::default()
        };
        assert_eq!(session.auth_url().unwrap(), "https://example.com/authorize");
    }
}
