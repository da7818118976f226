#![allow(dead_code)]

use anyhow::{Context, Result};
use axum::body::Body;
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use tower::ServiceExt;
use wiremock::MockServer;

use jira_bridge::{AppConfig, AppState};

pub const PROJECT: &str = "PAY";
pub const JIRA_EMAIL: &str = "bot@example.com";
pub const JIRA_TOKEN: &str = "static-token";
pub const CLOUD_ID: &str = "cloud-1";

/// A router wired to a wiremock server standing in for Jira and Atlassian.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub upstream: MockServer,
}

/// Static basic-auth credentials, OAuth disabled.
pub async fn static_app() -> TestApp {
    build(|config, upstream| {
        config.jira.base_url = upstream.to_string();
        config.jira.email = JIRA_EMAIL.to_string();
        config.jira.api_token = JIRA_TOKEN.to_string();
    })
    .await
}

/// OAuth enabled, no static credentials.
pub async fn oauth_app() -> TestApp {
    build(|config, upstream| {
        config.oauth.client_id = "client-123".to_string();
        config.oauth.client_secret = "client-secret".to_string();
        config.oauth.redirect_uri = "https://bridge.example.com/oauth/callback".to_string();
        config.oauth.auth_base_url = upstream.to_string();
        config.oauth.api_base_url = upstream.to_string();
    })
    .await
}

/// Neither credential source configured.
pub async fn bare_app() -> TestApp {
    build(|_, _| {}).await
}

async fn build(configure: impl FnOnce(&mut AppConfig, &str)) -> TestApp {
    let upstream = MockServer::start().await;

    let mut config = AppConfig::development();
    config.jira.base_url = String::new();
    config.jira.email = String::new();
    config.jira.api_token = String::new();
    config.jira.project_key = Some(PROJECT.to_string());
    config.oauth.client_id = String::new();
    config.oauth.client_secret = String::new();
    config.oauth.redirect_uri = String::new();
    configure(&mut config, &upstream.uri());

    let state = AppState::new(config).expect("http client");
    let router = jira_bridge::app(state.clone());

    TestApp { router, state, upstream }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Vec<u8>,
}

impl TestResponse {
    pub fn json(&self) -> Result<Value> {
        serde_json::from_slice(&self.body).context("response body is not JSON")
    }

    pub fn header(&self, name: header::HeaderName) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }
}

impl TestApp {
    pub async fn send(&self, request: Request<Body>) -> Result<TestResponse> {
        let response = self.router.clone().oneshot(request).await?;
        let status = response.status();
        let headers = response.headers().clone();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await?;
        Ok(TestResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }

    pub async fn get(&self, uri: &str) -> Result<TestResponse> {
        self.send(Request::builder().uri(uri).body(Body::empty())?).await
    }

    pub async fn get_with_session(&self, uri: &str, session: &str) -> Result<TestResponse> {
        let request = Request::builder()
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {}", session))
            .body(Body::empty())?;
        self.send(request).await
    }

    pub async fn send_json(&self, method: Method, uri: &str, body: Value) -> Result<TestResponse> {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?;
        self.send(request).await
    }
}

/// Minimal issue payload as Jira returns it.
pub fn issue_json(key: &str, summary: &str, issue_type: &str, description: &str) -> Value {
    serde_json::json!({
        "key": key,
        "fields": {
            "summary": summary,
            "description": jira_bridge::jira::adf::paragraph_doc(description),
            "issuetype": { "name": issue_type },
            "status": { "name": "To Do" },
            "labels": [],
            "components": [],
            "subtasks": []
        }
    })
}
