use serde::{Deserialize, Serialize};
use std::env;

use crate::jira::client::{Credentials, JiraTarget};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub jira: JiraConfig,
    pub oauth: OAuthConfig,
    pub session: SessionConfig,
    pub impact: ImpactConfig,
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn parse(value: &str) -> Self {
        match value {
            "production" | "prod" => Environment::Production,
            "staging" | "stage" => Environment::Staging,
            _ => Environment::Development,
        }
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct JiraConfig {
    pub base_url: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub api_token: String,
    pub project_key: Option<String>,
    pub request_timeout_secs: u64,
}

// Hand-written so the API token never ends up in logs.
impl std::fmt::Debug for JiraConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JiraConfig")
            .field("base_url", &self.base_url)
            .field("email", &self.email)
            .field("api_token", &"[REDACTED]")
            .field("project_key", &self.project_key)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .finish()
    }
}

impl JiraConfig {
    /// Basic-auth target built from `JIRA_URL`/`JIRA_EMAIL`/`JIRA_TOKEN`, if all are set.
    pub fn static_target(&self) -> Option<JiraTarget> {
        if self.base_url.is_empty() || self.email.is_empty() || self.api_token.is_empty() {
            return None;
        }

        Some(JiraTarget {
            base_url: self.base_url.trim_end_matches('/').to_string(),
            credentials: Credentials::Basic {
                email: self.email.clone(),
                token: self.api_token.clone(),
            },
        })
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct OAuthConfig {
    pub client_id: String,
    #[serde(skip_serializing)]
    pub client_secret: String,
    pub redirect_uri: String,
    pub scopes: Vec<String>,
    pub auth_base_url: String,
    pub api_base_url: String,
}

impl std::fmt::Debug for OAuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"[REDACTED]")
            .field("redirect_uri", &self.redirect_uri)
            .field("scopes", &self.scopes)
            .field("auth_base_url", &self.auth_base_url)
            .field("api_base_url", &self.api_base_url)
            .finish()
    }
}

impl OAuthConfig {
    pub fn is_enabled(&self) -> bool {
        !self.client_id.is_empty() && !self.client_secret.is_empty() && !self.redirect_uri.is_empty()
    }

    pub fn scopes_string(&self) -> String {
        self.scopes.join(" ")
    }

    /// Split a scope string on spaces or commas.
    pub fn parse_scopes(scope_str: &str) -> Vec<String> {
        scope_str
            .split([' ', ','])
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    fn default_scopes() -> Vec<String> {
        ["read:jira-work", "write:jira-work", "read:jira-user", "offline_access"]
            .iter()
            .map(|s| s.to_string())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    pub max_sessions: usize,
    pub state_ttl_secs: u64,
    pub default_ttl_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImpactConfig {
    pub max_results: u32,
    pub min_description_words: usize,
    pub parent_issue_types: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub port: u16,
    pub enable_request_logging: bool,
    pub cors_origins: Vec<String>,
    pub max_request_size_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = Environment::parse(env::var("APP_ENV").as_deref().unwrap_or_default());

        // Set defaults based on environment, then override with specific env vars
        Self::for_environment(environment).with_env_overrides()
    }

    pub fn for_environment(environment: Environment) -> Self {
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
    }

    fn with_env_overrides(mut self) -> Self {
        // Jira overrides
        if let Ok(v) = env::var("JIRA_URL") {
            self.jira.base_url = v.trim().trim_end_matches('/').to_string();
        }
        if let Ok(v) = env::var("JIRA_EMAIL") {
            self.jira.email = v.trim().to_string();
        }
        if let Ok(v) = env::var("JIRA_TOKEN") {
            self.jira.api_token = v.trim().to_string();
        }
        if let Ok(v) = env::var("JIRA_PROJECT") {
            let v = v.trim();
            self.jira.project_key = (!v.is_empty()).then(|| v.to_string());
        }
        if let Ok(v) = env::var("JIRA_TIMEOUT_SECS") {
            self.jira.request_timeout_secs = v.parse().unwrap_or(self.jira.request_timeout_secs);
        }

        // OAuth overrides
        if let Ok(v) = env::var("ATLASSIAN_CLIENT_ID") {
            self.oauth.client_id = v.trim().to_string();
        }
        if let Ok(v) = env::var("ATLASSIAN_CLIENT_SECRET") {
            self.oauth.client_secret = v.trim().to_string();
        }
        if let Ok(v) = env::var("ATLASSIAN_REDIRECT_URI") {
            self.oauth.redirect_uri = v.trim().to_string();
        }
        if let Ok(v) = env::var("ATLASSIAN_SCOPES") {
            let scopes = OAuthConfig::parse_scopes(&v);
            if !scopes.is_empty() {
                self.oauth.scopes = scopes;
            }
        }
        if let Ok(v) = env::var("ATLASSIAN_AUTH_URL") {
            self.oauth.auth_base_url = v.trim_end_matches('/').to_string();
        }
        if let Ok(v) = env::var("ATLASSIAN_API_URL") {
            self.oauth.api_base_url = v.trim_end_matches('/').to_string();
        }

        // Session overrides
        if let Ok(v) = env::var("SESSION_MAX") {
            self.session.max_sessions = v.parse().unwrap_or(self.session.max_sessions);
        }
        if let Ok(v) = env::var("SESSION_STATE_TTL_SECS") {
            self.session.state_ttl_secs = v.parse().unwrap_or(self.session.state_ttl_secs);
        }
        if let Ok(v) = env::var("SESSION_DEFAULT_TTL_SECS") {
            self.session.default_ttl_secs = v.parse().unwrap_or(self.session.default_ttl_secs);
        }

        // Impact overrides
        if let Ok(v) = env::var("IMPACT_MAX_RESULTS") {
            self.impact.max_results = v.parse().unwrap_or(self.impact.max_results);
        }
        if let Ok(v) = env::var("IMPACT_MIN_DESCRIPTION_WORDS") {
            self.impact.min_description_words = v.parse().unwrap_or(self.impact.min_description_words);
        }
        if let Ok(v) = env::var("IMPACT_PARENT_TYPES") {
            self.impact.parent_issue_types = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        // API overrides
        if let Ok(v) = env::var("PORT") {
            self.api.port = v.parse().unwrap_or(self.api.port);
        }
        if let Ok(v) = env::var("API_ENABLE_REQUEST_LOGGING") {
            self.api.enable_request_logging = v.parse().unwrap_or(self.api.enable_request_logging);
        }
        if let Ok(v) = env::var("CORS_ORIGINS") {
            self.api.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }
        if let Ok(v) = env::var("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }

        self
    }

    fn base(environment: Environment) -> Self {
        Self {
            environment,
            jira: JiraConfig {
                base_url: String::new(),
                email: String::new(),
                api_token: String::new(),
                project_key: None,
                request_timeout_secs: 30,
            },
            oauth: OAuthConfig {
                client_id: String::new(),
                client_secret: String::new(),
                redirect_uri: String::new(),
                scopes: OAuthConfig::default_scopes(),
                auth_base_url: "https://auth.atlassian.com".to_string(),
                api_base_url: "https://api.atlassian.com".to_string(),
            },
            session: SessionConfig {
                max_sessions: 1000,
                state_ttl_secs: 600,
                default_ttl_secs: 3600,
            },
            impact: ImpactConfig {
                max_results: 100,
                min_description_words: 8,
                parent_issue_types: vec!["Epic".to_string()],
            },
            api: ApiConfig {
                port: 8000,
                enable_request_logging: true,
                cors_origins: Vec::new(),
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
            },
        }
    }

    pub fn development() -> Self {
        Self::base(Environment::Development)
    }

    pub fn staging() -> Self {
        let mut config = Self::base(Environment::Staging);
        config.session.max_sessions = 500;
        config.api.max_request_size_bytes = 5 * 1024 * 1024; // 5MB
        config
    }

    pub fn production() -> Self {
        let mut config = Self::base(Environment::Production);
        config.jira.request_timeout_secs = 15;
        config.session.max_sessions = 5000;
        config.session.state_ttl_secs = 300;
        config.api.enable_request_logging = false;
        config.api.max_request_size_bytes = 5 * 1024 * 1024; // 5MB
        config
    }
}
