use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use homelink_shared::{
    now_ms, parse_directives, DirectiveRequest, DirectiveResponse, EndpointQuery, PendingResponse,
    PollResponse, RequestError, StatusResponse, SubmitRequest, SubmitResponse,
};
use std::sync::Arc;
use tracing::{debug, info};

use super::ApiError;
use crate::command::CommandQueue;
use crate::session::PresenceRegistry;

/// Shared handles for every request
#[derive(Clone)]
pub struct AppState {
    pub queue: Arc<CommandQueue>,
    pub presence: Arc<PresenceRegistry>,
}

/// Build the relay router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/command", post(submit_command))
        .route("/poll", get(poll_command))
        .route("/status", get(status))
        .route("/pending", get(pending))
        .route("/directives", post(submit_directives))
        .with_state(state)
}

/// `POST /command`: a producer queues one command
async fn submit_command(
    State(state): State<AppState>,
    body: Result<Json<SubmitRequest>, JsonRejection>,
) -> Result<Json<SubmitResponse>, ApiError> {
    let Json(req) = body.map_err(|e| {
        debug!(error = %e, "rejected command body");
        RequestError::MissingCommandFields
    })?;
    let (endpoint, command) = req.validate()?;
    let ack = state.queue.enqueue(&endpoint, command).await?;
    debug!(command_id = ack.command_id, depth = ack.depth, "command accepted");
    Ok(Json(SubmitResponse::ok()))
}

/// `GET /poll`: the consumer takes its next command, if any
async fn poll_command(
    State(state): State<AppState>,
    query: Result<Query<EndpointQuery>, QueryRejection>,
) -> Result<Json<PollResponse>, ApiError> {
    let Query(query) = query.map_err(|_| RequestError::MissingEndpoint)?;
    let endpoint = query.validate()?;
    let command = state.queue.dequeue_one(&endpoint).await;
    Ok(Json(PollResponse {
        command: command.map(|c| c.token),
    }))
}

/// `GET /status`: one endpoint's liveness, or whether any consumer is online
async fn status(
    State(state): State<AppState>,
    query: Result<Query<EndpointQuery>, QueryRejection>,
) -> Json<StatusResponse> {
    let query = query.map(|Query(q)| q).unwrap_or_default();
    let online = if query.is_empty() {
        !state.presence.online_endpoints_at(now_ms()).await.is_empty()
    } else {
        match query.validate() {
            Ok(endpoint) => state.queue.is_online(&endpoint).await,
            Err(_) => false,
        }
    };
    Json(StatusResponse { online })
}

/// `GET /pending`: backlog diagnostics for one endpoint. Does not count as a poll.
async fn pending(
    State(state): State<AppState>,
    query: Result<Query<EndpointQuery>, QueryRejection>,
) -> Result<Json<PendingResponse>, ApiError> {
    let Query(query) = query.map_err(|_| RequestError::MissingEndpoint)?;
    let endpoint = query.validate()?;
    let summary = state.queue.pending_summary(&endpoint, now_ms()).await;
    Ok(Json(PendingResponse {
        pending: summary.pending,
        oldest_age_ms: summary.oldest_age_ms,
        online: state.queue.is_online(&endpoint).await,
    }))
}

/// `POST /directives`: queue every directive found in an AI reply
async fn submit_directives(
    State(state): State<AppState>,
    body: Result<Json<DirectiveRequest>, JsonRejection>,
) -> Result<Json<DirectiveResponse>, ApiError> {
    let Json(req) = body.map_err(|_| RequestError::MissingDirectiveFields)?;
    let (endpoint, text) = req.validate()?;

    let queued: Vec<String> = parse_directives(text).iter().map(|d| d.token()).collect();
    if queued.is_empty() {
        debug!(endpoint = %endpoint, "reply contained no directives");
        return Ok(Json(DirectiveResponse { queued }));
    }

    // A reply is queued whole or not at all so a retry never duplicates commands
    state.queue.enqueue_batch(&endpoint, queued.clone()).await?;
    info!(endpoint = %endpoint, count = queued.len(), "queued directives from reply");
    Ok(Json(DirectiveResponse { queued }))
}
