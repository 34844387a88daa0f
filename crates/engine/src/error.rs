// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the coordinators

use crate::lease::OperationKind;
use pgstash_adapters::StoreError;
use pgstash_core::{Interrupted, OpContext, SegmentError, Timeline};
use std::future::Future;
use thiserror::Error;

/// Errors surfaced by every coordinator operation
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid WAL segment name: {0}")]
    InvalidSegmentName(#[from] SegmentError),
    #[error("{operation}: {message}")]
    InvalidArgument {
        operation: &'static str,
        message: String,
    },
    #[error("cannot determine current timeline: {detail}")]
    TimelineUnresolved { detail: String },
    #[error("WAL segment {name} not found in repository")]
    SegmentNotFound { name: String },
    #[error("restore of snapshot {snapshot_id} failed: {source}")]
    RestoreFailed {
        snapshot_id: String,
        #[source]
        source: StoreError,
    },
    #[error("{operation} failed: {source}")]
    StoreUnavailable {
        operation: &'static str,
        #[source]
        source: StoreError,
    },
    #[error("{operation} {reason}")]
    Cancelled {
        operation: &'static str,
        reason: Interrupted,
    },
    #[error("{operation} already in progress on timeline {timeline}")]
    Busy {
        operation: OperationKind,
        timeline: Timeline,
    },
}

impl EngineError {
    pub(crate) fn invalid(operation: &'static str, message: impl Into<String>) -> Self {
        EngineError::InvalidArgument {
            operation,
            message: message.into(),
        }
    }

    /// True when the same call may succeed later without changing its input
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::StoreUnavailable { .. }
            | EngineError::RestoreFailed { .. }
            | EngineError::Cancelled { .. }
            | EngineError::Busy { .. } => true,
            EngineError::InvalidSegmentName(_)
            | EngineError::InvalidArgument { .. }
            | EngineError::TimelineUnresolved { .. }
            | EngineError::SegmentNotFound { .. } => false,
        }
    }
}

/// Run one store call under `ctx`, classifying the failure
pub(crate) async fn store_call<T, F>(
    ctx: &OpContext,
    operation: &'static str,
    fut: F,
) -> Result<T, EngineError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match ctx.run(fut).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(source)) => Err(EngineError::StoreUnavailable { operation, source }),
        Err(reason) => Err(EngineError::Cancelled { operation, reason }),
    }
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
