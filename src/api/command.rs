//! Classifier endpoints
//!
//! `POST /api/command` classifies one command and appends it to the
//! command log. `GET /api/commands` lists recent log entries.

use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;

use super::{ApiError, ApiState};
use crate::assistant::{COMMAND_PATH, CommandResponse};
use crate::db::{CommandRecord, record_command};

/// Default page size for `GET /api/commands`
pub const DEFAULT_HISTORY_LIMIT: usize = 20;

/// Build classifier router
pub fn router(state: Arc<ApiState>) -> Router {
    Router::new()
        .route(COMMAND_PATH, post(classify))
        .route("/api/commands", get(history))
        .with_state(state)
}

/// Classification request
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommandRequest {
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

/// Classify a command
async fn classify(
    State(state): State<Arc<ApiState>>,
    body: Bytes,
) -> Result<Json<CommandResponse>, ApiError> {
    let request: CommandRequest = if body.is_empty() {
        CommandRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|_| ApiError::BadRequest("Invalid JSON body"))?
    };

    let command = request
        .command
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty())
        .ok_or(ApiError::BadRequest("Command is required"))?;

    let response = state.classifier.classify(command);
    tracing::info!(
        command,
        user_id = request.user_id.as_deref().unwrap_or("anonymous"),
        action = response.action.as_str(),
        "command classified"
    );

    if let Some(log) = &state.command_log {
        record_command(log, command, &response, request.user_id.as_deref());
    }

    Ok(Json(response))
}

#[derive(Debug, Deserialize)]
struct HistoryQuery {
    limit: Option<usize>,
}

/// List recent commands, newest first
async fn history(
    State(state): State<Arc<ApiState>>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<CommandRecord>>, ApiError> {
    let log = state
        .command_log
        .as_ref()
        .ok_or(ApiError::NotConfigured("Command log not configured"))?;

    let limit = query.limit.unwrap_or(DEFAULT_HISTORY_LIMIT);
    Ok(Json(log.recent(limit)?))
}
