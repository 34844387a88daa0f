// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! HTTP endpoints and request handling.

use std::future::Future;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::rejection::JsonRejection;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use pgstash_adapters::SnapshotStore;
use pgstash_core::{Clock, Interrupted, OpContext, SystemClock};
use pgstash_engine::{EngineError, Stash};
use tokio::net::TcpListener;
use tracing::{info, warn, Instrument};

use crate::protocol::{
    BackupRequest, CleanupRequest, Response, RestoreRequest, WalArchiveRequest, WalRestoreRequest,
};

/// Shared handler state
pub struct AppState<S, C = SystemClock> {
    stash: Arc<Stash<S, C>>,
    /// Cancelled on shutdown; every request context derives from it
    root: OpContext,
    wal_max_age: Option<Duration>,
}

impl<S, C> Clone for AppState<S, C> {
    fn clone(&self) -> Self {
        Self {
            stash: Arc::clone(&self.stash),
            root: self.root.clone(),
            wal_max_age: self.wal_max_age,
        }
    }
}

impl<S: SnapshotStore, C: Clock> AppState<S, C> {
    pub fn new(stash: Stash<S, C>, root: OpContext) -> Self {
        Self {
            stash: Arc::new(stash),
            root,
            wal_max_age: None,
        }
    }

    /// Age used by `/cleanup` when the request names no cutoff
    pub fn with_wal_max_age(mut self, age: Option<Duration>) -> Self {
        self.wal_max_age = age;
        self
    }

    fn context(&self) -> OpContext {
        self.stash.context(&self.root)
    }
}

/// A failed request: status plus message
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
}

impl ApiError {
    fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        let status = match &err {
            EngineError::InvalidSegmentName(_) | EngineError::InvalidArgument { .. } => {
                StatusCode::BAD_REQUEST
            }
            EngineError::SegmentNotFound { .. } => StatusCode::NOT_FOUND,
            EngineError::Busy { .. } => StatusCode::CONFLICT,
            EngineError::Cancelled {
                reason: Interrupted::Cancelled,
                ..
            } => StatusCode::SERVICE_UNAVAILABLE,
            EngineError::Cancelled {
                reason: Interrupted::TimedOut(_),
                ..
            } => StatusCode::GATEWAY_TIMEOUT,
            EngineError::TimelineUnresolved { .. }
            | EngineError::RestoreFailed { .. }
            | EngineError::StoreUnavailable { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        if self.status.is_server_error() {
            warn!(status = self.status.as_u16(), error = %self.message, "request failed");
        }
        (self.status, Json(Response::failed(self.message))).into_response()
    }
}

type ApiResult = Result<Json<Response>, ApiError>;

fn require<'a>(value: &'a str, field: &str) -> Result<&'a str, ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::bad_request(format!("{field} is required")));
    }
    Ok(value)
}

/// Build the router
pub fn router<S: SnapshotStore, C: Clock>(state: AppState<S, C>) -> Router {
    Router::new()
        .route("/backup", post(backup::<S, C>))
        .route("/restore", post(restore::<S, C>))
        .route("/wal-archive", post(wal_archive::<S, C>))
        .route("/wal-restore", post(wal_restore::<S, C>))
        .route("/cleanup", post(cleanup::<S, C>))
        .route("/health", get(health))
        .layer(middleware::from_fn(trace_request))
        .with_state(state)
}

/// Serve until `shutdown` resolves, then finish in-flight requests
pub async fn serve<S, C, F>(listener: TcpListener, state: AppState<S, C>, shutdown: F) -> std::io::Result<()>
where
    S: SnapshotStore,
    C: Clock,
    F: Future<Output = ()> + Send + 'static,
{
    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
}

async fn trace_request(request: Request, next: Next) -> axum::response::Response {
    let span = tracing::info_span!(
        "request",
        id = %uuid::Uuid::new_v4(),
        method = %request.method(),
        path = %request.uri().path(),
    );
    async move {
        let start = Instant::now();
        let response = next.run(request).await;
        info!(
            status = response.status().as_u16(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "handled"
        );
        response
    }
    .instrument(span)
    .await
}

async fn health() -> Json<Response> {
    Json(Response::ok("ok"))
}

async fn backup<S: SnapshotStore, C: Clock>(
    State(state): State<AppState<S, C>>,
    payload: Result<Json<BackupRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload?;
    let data_folder = require(&req.data_folder, "dataFolder")?;
    info!(backup_id = %req.backup_id, data_folder, "backup requested");

    let receipt = state
        .stash
        .backups
        .create_backup(&state.context(), Path::new(data_folder))
        .await?;

    Ok(Json(
        Response::ok("backup completed")
            .with_backup_id(receipt.snapshot_id)
            .with_timeline(receipt.timeline.get()),
    ))
}

async fn restore<S: SnapshotStore, C: Clock>(
    State(state): State<AppState<S, C>>,
    payload: Result<Json<RestoreRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload?;
    let backup_id = require(&req.backup_id, "backupID")?;
    let dest_folder = require(&req.dest_folder, "destFolder")?;

    state
        .stash
        .restores
        .restore_backup(
            &state.context(),
            backup_id,
            Path::new(dest_folder),
            req.recovery_target.as_ref(),
        )
        .await?;

    Ok(Json(Response::ok("restore completed").with_backup_id(Some(backup_id.to_string()))))
}

async fn wal_archive<S: SnapshotStore, C: Clock>(
    State(state): State<AppState<S, C>>,
    payload: Result<Json<WalArchiveRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload?;
    let wal_path = Path::new(require(&req.wal_file_path, "walFilePath")?);
    let base_name = wal_path.file_name().map(|n| n.to_string_lossy());
    if !req.wal_file_name.is_empty() && base_name.as_deref() != Some(req.wal_file_name.as_str()) {
        return Err(ApiError::bad_request(format!(
            "walFileName {} does not match walFilePath {}",
            req.wal_file_name,
            wal_path.display()
        )));
    }

    let segment = state
        .stash
        .archiver
        .archive(&state.context(), wal_path)
        .await?;

    Ok(Json(
        Response::ok(format!("archived {}", segment.file_name()))
            .with_backup_id(segment.backup_id)
            .with_timeline(segment.key.timeline.get()),
    ))
}

async fn wal_restore<S: SnapshotStore, C: Clock>(
    State(state): State<AppState<S, C>>,
    payload: Result<Json<WalRestoreRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload?;
    let wal_file_name = require(&req.wal_file_name, "walFileName")?;
    let dest_folder = require(&req.dest_folder, "destFolder")?;
    let target = Path::new(dest_folder).join(wal_file_name);

    let segment = state
        .stash
        .restores
        .restore_segment(&state.context(), wal_file_name, &target)
        .await?;

    Ok(Json(
        Response::ok(format!("restored {} to {}", segment.file_name(), target.display()))
            .with_backup_id(segment.backup_id),
    ))
}

async fn cleanup<S: SnapshotStore, C: Clock>(
    State(state): State<AppState<S, C>>,
    payload: Result<Json<CleanupRequest>, JsonRejection>,
) -> ApiResult {
    let Json(req) = payload?;
    let ctx = state.context();
    let retention = &state.stash.retention;

    let deleted = match (req.before, req.older_than.as_deref()) {
        (Some(_), Some(_)) => {
            return Err(ApiError::bad_request("give either before or olderThan, not both"));
        }
        (Some(before), None) => retention.cleanup_before(&ctx, before).await?,
        (None, Some(age)) => {
            let age = humantime::parse_duration(age)
                .map_err(|e| ApiError::bad_request(format!("invalid olderThan: {e}")))?;
            retention.cleanup_older_than(&ctx, age).await?
        }
        (None, None) => match state.wal_max_age {
            Some(age) => retention.cleanup_older_than(&ctx, age).await?,
            None => {
                return Err(ApiError::bad_request(
                    "before or olderThan is required when no retention age is configured",
                ));
            }
        },
    };

    Ok(Json(Response::ok(format!("deleted {deleted} WAL snapshots")).with_deleted(deleted)))
}

#[cfg(test)]
#[path = "server_tests.rs"]
mod tests;
