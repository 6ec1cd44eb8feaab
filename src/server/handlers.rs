//! Route handlers.

use super::{AppState, blocking, page};
use crate::graph::{RenderContext, Scene};
use crate::models::{Idea, IdeaSummary};
use crate::{Error, Result};
use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::header;
use axum::response::{Html, IntoResponse, Response};
use serde::{Deserialize, Serialize};

/// Source recorded on ideas submitted over HTTP.
const WEB_SOURCE: &str = "web";

/// Body of `POST /process-idea`.
#[derive(Debug, Deserialize)]
pub struct ProcessRequest {
    #[serde(default)]
    idea: Option<String>,
}

/// Reply when a submission produced several ideas.
#[derive(Debug, Serialize)]
struct ProcessedMany {
    ideas: Vec<Idea>,
    count: usize,
    failed: usize,
}

/// Query of the graph routes.
#[derive(Debug, Default, Deserialize)]
pub struct GraphQuery {
    /// Id of the node to highlight.
    #[serde(default)]
    highlight: Option<String>,
    /// Zoom steps; negative values zoom out.
    #[serde(default)]
    zoom: Option<i32>,
}

pub async fn index() -> Html<&'static str> {
    Html(page::INDEX_HTML)
}

pub async fn process_idea(
    State(state): State<AppState>,
    body: std::result::Result<Json<ProcessRequest>, JsonRejection>,
) -> Result<Response> {
    let idea = body
        .map_err(|e| Error::InvalidInput(e.body_text()))?
        .0
        .idea
        .filter(|i| !i.trim().is_empty())
        .ok_or_else(|| Error::InvalidInput("Idea text required".to_string()))?;

    let preview: String = idea.chars().take(50).collect();
    tracing::info!(preview = %preview, "Processing idea");

    let service = state.service.clone();
    let mut outcome = blocking(move || service.process(&idea, WEB_SOURCE)).await?;
    tracing::info!(
        saved = outcome.saved.len(),
        failed = outcome.failed,
        "Idea processed"
    );

    if outcome.saved.len() == 1 && outcome.failed == 0 {
        if let Some(idea) = outcome.saved.pop() {
            return Ok(Json(idea).into_response());
        }
    }

    Ok(Json(ProcessedMany {
        count: outcome.saved.len(),
        ideas: outcome.saved,
        failed: outcome.failed,
    })
    .into_response())
}

pub async fn list_ideas(State(state): State<AppState>) -> Result<Json<Vec<IdeaSummary>>> {
    let service = state.service.clone();
    blocking(move || service.list()).await.map(Json)
}

pub async fn get_idea(State(state): State<AppState>, Path(id): Path<String>) -> Result<Response> {
    let service = state.service.clone();
    let markdown = blocking(move || service.raw(&id)).await?;
    Ok((
        [(header::CONTENT_TYPE, "text/markdown; charset=utf-8")],
        markdown,
    )
        .into_response())
}

pub async fn graph_scene(
    State(state): State<AppState>,
    Query(query): Query<GraphQuery>,
) -> Result<Json<Scene>> {
    let ctx = layout(state, query).await?;
    Ok(Json(ctx.scene()))
}

pub async fn graph_svg(
    State(state): State<AppState>,
    Query(query): Query<GraphQuery>,
) -> Result<Response> {
    let ctx = layout(state, query).await?;
    Ok(([(header::CONTENT_TYPE, "image/svg+xml")], ctx.to_svg()).into_response())
}

/// Resolves the collection and runs the layout to rest off the async runtime.
async fn layout(state: AppState, query: GraphQuery) -> Result<RenderContext> {
    let AppState { service, canvas } = state;
    blocking(move || {
        let mut ctx = RenderContext::settled(service.graph()?, canvas);
        if let Some(id) = query.highlight.as_deref().filter(|id| !id.is_empty()) {
            if !ctx.highlight(id) {
                tracing::debug!(id, "Highlight target not in graph");
            }
        }
        if let Some(steps) = query.zoom {
            ctx.zoom_by(steps.clamp(-50, 50));
        }
        Ok(ctx)
    })
    .await
}
