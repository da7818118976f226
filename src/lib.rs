pub mod attachments;
pub mod config;
pub mod error;
pub mod export;
pub mod handlers;
pub mod impact;
pub mod jira;
pub mod middleware;
pub mod oauth;
pub mod state;

use axum::{
    extract::{DefaultBodyLimit, Request},
    http::HeaderValue,
    routing::{get, patch, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

pub use config::AppConfig;
pub use state::AppState;

/// Build the full router for the given state.
pub fn app(state: AppState) -> Router {
    let api = &state.config.api;

    let mut router = Router::new()
        // Public
        .route("/", get(handlers::system::root))
        .route("/health", get(handlers::system::health))
        .merge(oauth_routes())
        // Jira proxy
        .merge(ticket_routes())
        .merge(impact_routes())
        .layer(DefaultBodyLimit::max(api.max_request_size_bytes))
        .layer(cors_layer(&api.cors_origins));

    if api.enable_request_logging {
        router = router.layer(axum::middleware::from_fn(middleware::request_log_middleware));
    }

    // Span on path only; the query string may carry a session token.
    router = router.layer(TraceLayer::new_for_http().make_span_with(|request: &Request| {
        tracing::info_span!("http", method = %request.method(), path = %request.uri().path())
    }));

    router.with_state(state)
}

fn oauth_routes() -> Router<AppState> {
    use handlers::oauth;

    Router::new()
        .route("/oauth/login", get(oauth::login))
        .route("/oauth/callback", get(oauth::callback))
        .route("/oauth/session", get(oauth::session_info).delete(oauth::logout))
}

fn ticket_routes() -> Router<AppState> {
    use handlers::{attachments, comments, projects, tickets};

    Router::new()
        .route("/projects", get(projects::list))
        .route("/ticket", post(tickets::create))
        .route("/ticket/:key", get(tickets::get).patch(tickets::update))
        .route("/ticket/:key/comments", get(comments::list).post(comments::add))
        .route("/ticket/:key/comments/:comment_id", patch(comments::update))
        .route("/ticket/:key/attachments", post(attachments::upload))
}

fn impact_routes() -> Router<AppState> {
    use handlers::impact;

    Router::new()
        .route("/impact/label/:label", get(impact::by_label))
        .route("/impact/component/:component", get(impact::by_component))
        .route("/impact/module/:keyword", get(impact::by_module))
        .route("/impact/ticket/:key", get(impact::by_ticket))
        .route("/export/impact/:kind/:value", get(impact::export_by_kind))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    if origins.is_empty() || origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed)
        .allow_methods(Any)
        .allow_headers(Any)
}
