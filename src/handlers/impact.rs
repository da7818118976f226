use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;

use super::{resolve_project, validate_issue_key};
use crate::error::{ApiError, ApiResult};
use crate::export::{self, ExportFormat};
use crate::impact::{self, ImpactItem, ImpactKind, ImpactQuery};
use crate::middleware::ResolvedJira;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct ImpactParams {
    /// Kept as text so out-of-range numbers clamp instead of failing extraction.
    pub max_results: Option<String>,
    #[serde(default)]
    pub raw: bool,
    pub project: Option<String>,
    #[serde(default)]
    pub format: ExportFormat,
}

impl ImpactParams {
    /// Requested page size, clamped to `1..=limit`.
    pub fn max_results(&self, limit: u32) -> ApiResult<u32> {
        let limit = limit.max(1);
        let Some(raw) = self.max_results.as_deref().map(str::trim).filter(|v| !v.is_empty()) else {
            return Ok(limit);
        };

        let requested: i128 = raw
            .parse()
            .map_err(|_| ApiError::bad_request(format!("Invalid max_results '{}'; expected an integer", raw)))?;
        Ok(requested.clamp(1, i128::from(limit)) as u32)
    }
}

async fn run(state: &AppState, jira: &ResolvedJira, query: &ImpactQuery, params: &ImpactParams) -> ApiResult<Vec<ImpactItem>> {
    match query {
        ImpactQuery::Ticket(key) => validate_issue_key(key)?,
        ImpactQuery::By(_, value) if value.trim().is_empty() => {
            return Err(ApiError::bad_request("Search value must not be empty"));
        }
        ImpactQuery::By(..) => {}
    }

    let project = resolve_project(state, params.project.as_deref())?;
    let limits = &state.config.impact;

    let items = impact::analyze(
        &jira.client,
        &project,
        query,
        limits,
        params.max_results(limits.max_results)?,
        params.raw,
    )
    .await?;
    Ok(items)
}

async fn search(state: AppState, jira: ResolvedJira, query: ImpactQuery, params: ImpactParams) -> ApiResult<Json<Vec<ImpactItem>>> {
    run(&state, &jira, &query, &params).await.map(Json)
}

async fn export(state: AppState, jira: ResolvedJira, query: ImpactQuery, params: ImpactParams) -> ApiResult<Response> {
    let items = run(&state, &jira, &query, &params).await?;
    let disposition = export::content_disposition(&query.slug(), params.format);

    let body = match params.format {
        ExportFormat::Csv => export::csv::render(&items).into_bytes(),
        ExportFormat::Docx => export::docx::render(&query.title(), &items).map_err(|e| {
            tracing::error!("DOCX export failed: {}", e);
            ApiError::internal_server_error("Failed to build document")
        })?,
    };

    Ok((
        [
            (header::CONTENT_TYPE, params.format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}

/// GET /impact/label/:label
pub async fn by_label(
    State(state): State<AppState>,
    jira: ResolvedJira,
    Path(label): Path<String>,
    Query(params): Query<ImpactParams>,
) -> ApiResult<Json<Vec<ImpactItem>>> {
    search(state, jira, ImpactQuery::By(ImpactKind::Label, label), params).await
}

/// GET /impact/component/:component
pub async fn by_component(
    State(state): State<AppState>,
    jira: ResolvedJira,
    Path(component): Path<String>,
    Query(params): Query<ImpactParams>,
) -> ApiResult<Json<Vec<ImpactItem>>> {
    search(state, jira, ImpactQuery::By(ImpactKind::Component, component), params).await
}

/// GET /impact/module/:keyword - summary keyword search
pub async fn by_module(
    State(state): State<AppState>,
    jira: ResolvedJira,
    Path(keyword): Path<String>,
    Query(params): Query<ImpactParams>,
) -> ApiResult<Json<Vec<ImpactItem>>> {
    search(state, jira, ImpactQuery::By(ImpactKind::Module, keyword), params).await
}

/// GET /impact/ticket/:key - tickets related to an existing ticket
pub async fn by_ticket(
    State(state): State<AppState>,
    jira: ResolvedJira,
    Path(key): Path<String>,
    Query(params): Query<ImpactParams>,
) -> ApiResult<Json<Vec<ImpactItem>>> {
    search(state, jira, ImpactQuery::Ticket(key), params).await
}

/// GET /export/impact/:kind/:value?format=csv|docx
pub async fn export_by_kind(
    State(state): State<AppState>,
    jira: ResolvedJira,
    Path((kind, value)): Path<(String, String)>,
    Query(params): Query<ImpactParams>,
) -> ApiResult<Response> {
    let query = match kind.as_str() {
        "ticket" => ImpactQuery::Ticket(value),
        other => {
            let kind = ImpactKind::parse(other)
                .ok_or_else(|| ApiError::not_found(format!("Unknown impact kind '{}'", other)))?;
            ImpactQuery::By(kind, value)
        }
    };
    export(state, jira, query, params).await
}
