// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-call cancellation and timeout
//!
//! Every coordinator call takes an [`OpContext`]. Store calls are raced
//! against the context; when the context wins, the store future is dropped,
//! which aborts the underlying work (the restic adapter kills its child
//! process on drop).

use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;

/// Why a call did not run to completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Interrupted {
    #[error("cancelled")]
    Cancelled,
    #[error("timed out after {0:?}")]
    TimedOut(Duration),
}

/// Cancellation token plus optional per-call timeout
#[derive(Debug, Clone, Default)]
pub struct OpContext {
    token: CancellationToken,
    timeout: Option<Duration>,
}

impl OpContext {
    /// Context that is never cancelled and has no timeout
    pub fn background() -> Self {
        Self::default()
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Child context: cancelled with its parent, cancellable on its own
    pub fn child(&self) -> Self {
        Self {
            token: self.token.child_token(),
            timeout: self.timeout,
        }
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Run `fut` unless the context is cancelled or the timeout elapses first.
    ///
    /// An already-cancelled context never polls `fut`.
    pub async fn run<F, T>(&self, fut: F) -> Result<T, Interrupted>
    where
        F: Future<Output = T>,
    {
        if self.token.is_cancelled() {
            return Err(Interrupted::Cancelled);
        }

        match self.timeout {
            Some(limit) => tokio::select! {
                biased;
                _ = self.token.cancelled() => Err(Interrupted::Cancelled),
                res = tokio::time::timeout(limit, fut) => res.map_err(|_| Interrupted::TimedOut(limit)),
            },
            None => tokio::select! {
                biased;
                _ = self.token.cancelled() => Err(Interrupted::Cancelled),
                out = fut => Ok(out),
            },
        }
    }
}

#[cfg(test)]
#[path = "context_tests.rs"]
mod tests;
