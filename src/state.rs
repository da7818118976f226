use std::sync::Arc;

use crate::config::AppConfig;
use crate::jira::client::build_http_client;
use crate::oauth::{AtlassianOAuthClient, SessionStore, StateStore};

/// Shared application state handed to every handler.
#[derive(Debug, Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub http: reqwest::Client,
    pub oauth: Arc<AtlassianOAuthClient>,
    pub sessions: Arc<SessionStore>,
    pub states: Arc<StateStore>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, reqwest::Error> {
        let http = build_http_client(config.jira.request_timeout_secs)?;
        let oauth = AtlassianOAuthClient::new(config.oauth.clone(), http.clone());
        let sessions = SessionStore::new(config.session.max_sessions);
        let states = StateStore::new(config.session.state_ttl_secs, config.session.max_sessions);

        Ok(Self {
            config: Arc::new(config),
            http,
            oauth: Arc::new(oauth),
            sessions: Arc::new(sessions),
            states: Arc::new(states),
        })
    }
}

impl AppState {
    /// Periodically drop expired sessions and stale OAuth states.
    pub fn spawn_purge_task(&self, every: std::time::Duration) -> tokio::task::JoinHandle<()> {
        let sessions = self.sessions.clone();
        let states = self.states.clone();

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let dropped_sessions = sessions.purge_expired().await;
                let dropped_states = states.purge_expired().await;
                if dropped_sessions > 0 || dropped_states > 0 {
                    tracing::debug!(dropped_sessions, dropped_states, "purged expired OAuth entries");
                }
            }
        })
    }
}
