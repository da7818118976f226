use reqwest::header;
use serde::{Deserialize, Serialize};
use serde_json::json;
use url::Url;

use crate::config::OAuthConfig;

/// Errors that can occur during Atlassian OAuth operations.
#[derive(Debug, thiserror::Error)]
pub enum OAuthError {
    /// The HTTP request to Atlassian failed (network error, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Atlassian rejected the request (invalid code, revoked refresh token, ...).
    #[error("Atlassian returned {status}: {body}")]
    Status { status: u16, body: String },

    /// The response could not be parsed as expected.
    #[error("failed to parse response: {0}")]
    Parse(String),

    /// Client id, secret or redirect uri is missing.
    #[error("OAuth is not configured")]
    NotConfigured,
}

/// Response from `POST /oauth/token`.
#[derive(Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub scope: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
}

impl std::fmt::Debug for TokenResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenResponse")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &self.refresh_token.as_ref().map(|_| "[REDACTED]"))
            .field("expires_in", &self.expires_in)
            .field("scope", &self.scope)
            .finish()
    }
}

/// A site the token may act on, from `/oauth/token/accessible-resources`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct AccessibleResource {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
}

impl AccessibleResource {
    /// Match a site hint against the site url (with or without scheme) or name.
    pub fn matches(&self, site: &str) -> bool {
        let site = site.trim().trim_end_matches('/').to_ascii_lowercase();
        if site.is_empty() {
            return false;
        }
        let url = self.url.trim_end_matches('/').to_ascii_lowercase();
        let host = url
            .strip_prefix("https://")
            .or_else(|| url.strip_prefix("http://"))
            .unwrap_or(&url);

        url == site || host == site || self.name.eq_ignore_ascii_case(&site)
    }
}

/// Pick the site a new session should bind to.
pub fn select_resource<'a>(resources: &'a [AccessibleResource], site: Option<&str>) -> Option<&'a AccessibleResource> {
    match site {
        Some(site) if !site.trim().is_empty() => resources.iter().find(|r| r.matches(site)),
        _ => resources.first(),
    }
}

/// OAuth 2.0 (3LO) client for Atlassian Cloud.
#[derive(Debug, Clone)]
pub struct AtlassianOAuthClient {
    config: OAuthConfig,
    http_client: reqwest::Client,
}

impl AtlassianOAuthClient {
    pub fn new(config: OAuthConfig, http_client: reqwest::Client) -> Self {
        Self { config, http_client }
    }

    pub fn is_enabled(&self) -> bool {
        self.config.is_enabled()
    }

    pub fn api_base_url(&self) -> &str {
        &self.config.api_base_url
    }

    fn ensure_enabled(&self) -> Result<(), OAuthError> {
        if self.config.is_enabled() {
            Ok(())
        } else {
            Err(OAuthError::NotConfigured)
        }
    }

    /// Build the consent URL the user is sent to.
    #[tracing::instrument(skip(self, state), fields(client_id = %self.config.client_id))]
    pub fn authorization_url(&self, state: &str) -> Result<String, OAuthError> {
        self.ensure_enabled()?;

        let mut url = Url::parse(&format!("{}/authorize", self.config.auth_base_url))
            .map_err(|e| OAuthError::Parse(format!("invalid authorize URL: {e}")))?;

        url.query_pairs_mut()
            .append_pair("audience", "api.atlassian.com")
            .append_pair("client_id", &self.config.client_id)
            .append_pair("scope", &self.config.scopes_string())
            .append_pair("redirect_uri", &self.config.redirect_uri)
            .append_pair("state", state)
            .append_pair("response_type", "code")
            .append_pair("prompt", "consent");

        Ok(url.to_string())
    }

    /// Exchange an authorization code for tokens.
    #[tracing::instrument(skip(self, code), name = "AtlassianOAuthClient::exchange_code")]
    pub async fn exchange_code(&self, code: &str) -> Result<TokenResponse, OAuthError> {
        self.ensure_enabled()?;
        tracing::debug!("exchanging authorization code for access token");

        self.token_request(json!({
            "grant_type": "authorization_code",
            "client_id": self.config.client_id,
            "client_secret": self.config.client_secret,
            "code": code,
            "redirect_uri": self.config.redirect_uri,
        }))
        .await
    }

    /// Trade a refresh token for a fresh access token (rotating refresh tokens).
    #[tracing::instrument(skip(self, refresh_token), name = "AtlassianOAuthClient::refresh")]
    pub async fn refresh(&self, refresh_token: &str) -> Result<TokenResponse, OAuthError> {
        self.ensure_enabled()?;
        tracing::debug!("refreshing access token");

        self.token_request(json!({
            "grant_type": "refresh_token",
            "client_id": self.config.client_id,
            "client_secret": self.config.client_secret,
            "refresh_token": refresh_token,
        }))
        .await
    }

    async fn token_request(&self, body: serde_json::Value) -> Result<TokenResponse, OAuthError> {
        let response = self
            .http_client
            .post(format!("{}/oauth/token", self.config.auth_base_url))
            .header(header::ACCEPT, "application/json")
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(OAuthError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        serde_json::from_str(&text).map_err(|e| OAuthError::Parse(format!("failed to parse token response: {e}")))
    }

    /// List the Jira sites the access token can reach.
    #[tracing::instrument(skip(self, access_token), name = "AtlassianOAuthClient::accessible_resources")]
    pub async fn accessible_resources(&self, access_token: &str) -> Result<Vec<AccessibleResource>, OAuthError> {
        let response = self
            .http_client
            .get(format!("{}/oauth/token/accessible-resources", self.config.api_base_url))
            .header(header::ACCEPT, "application/json")
            .bearer_auth(access_token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(OAuthError::Status {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| OAuthError::Parse(format!("failed to parse accessible resources: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    fn enabled_config() -> OAuthConfig {
        let mut config = AppConfig::development().oauth;
        config.client_id = "client-123".to_string();
        config.client_secret = "shh".to_string();
        config.redirect_uri = "https://bridge.example.com/oauth/callback".to_string();
        config
    }

    fn resource(id: &str, name: &str, url: &str) -> AccessibleResource {
        AccessibleResource {
            id: id.to_string(),
            name: name.to_string(),
            url: url.to_string(),
            scopes: vec![],
            avatar_url: None,
        }
    }

    #[test]
    fn authorization_url_carries_all_parameters() {
        let client = AtlassianOAuthClient::new(enabled_config(), reqwest::Client::new());
        let url = Url::parse(&client.authorization_url("state-xyz").unwrap()).unwrap();

        assert_eq!(url.host_str(), Some("auth.atlassian.com"));
        assert_eq!(url.path(), "/authorize");
        let pairs: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs["audience"], "api.atlassian.com");
        assert_eq!(pairs["client_id"], "client-123");
        assert_eq!(pairs["state"], "state-xyz");
        assert_eq!(pairs["response_type"], "code");
        assert_eq!(pairs["prompt"], "consent");
        assert_eq!(pairs["redirect_uri"], "https://bridge.example.com/oauth/callback");
        assert!(pairs["scope"].contains("offline_access"));
        assert!(!url.as_str().contains("shh"));
    }

    #[test]
    fn authorization_url_requires_configuration() {
        let client = AtlassianOAuthClient::new(AppConfig::development().oauth, reqwest::Client::new());
        assert!(matches!(client.authorization_url("s"), Err(OAuthError::NotConfigured)));
    }

    #[test]
    fn select_resource_prefers_site_hint() {
        let resources = vec![
            resource("1", "alpha", "https://alpha.atlassian.net"),
            resource("2", "beta", "https://beta.atlassian.net"),
        ];

        assert_eq!(select_resource(&resources, None).unwrap().id, "1");
        assert_eq!(select_resource(&resources, Some("beta.atlassian.net")).unwrap().id, "2");
        assert_eq!(select_resource(&resources, Some("https://beta.atlassian.net/")).unwrap().id, "2");
        assert_eq!(select_resource(&resources, Some("BETA")).unwrap().id, "2");
        assert!(select_resource(&resources, Some("gamma")).is_none());
        assert!(select_resource(&[], None).is_none());
    }

    #[test]
    fn token_response_debug_is_redacted() {
        let token: TokenResponse = serde_json::from_value(serde_json::json!({
            "access_token": "at-secret",
            "refresh_token": "rt-secret",
            "expires_in": 3600
        }))
        .unwrap();
        let printed = format!("{:?}", token);
        assert!(!printed.contains("at-secret"));
        assert!(!printed.contains("rt-secret"));
    }
}
