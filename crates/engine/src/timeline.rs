// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Current-timeline discovery from archived WAL segments

use crate::error::{store_call, EngineError};
use pgstash_adapters::SnapshotStore;
use pgstash_core::tags::wal_query;
use pgstash_core::{sort_newest_first, OpContext, Snapshot, Timeline};
use serde::{Deserialize, Serialize};

/// How snapshot listings are ordered before picking "the latest"
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListingOrder {
    /// Most recent snapshot time first; ties keep store order
    #[default]
    NewestFirst,
    /// Trust the order the store returned
    StoreOrder,
}

impl ListingOrder {
    pub fn apply(self, snapshots: &mut [Snapshot]) {
        match self {
            ListingOrder::NewestFirst => sort_newest_first(snapshots),
            ListingOrder::StoreOrder => {}
        }
    }
}

/// Reports the timeline of the most recently archived WAL segment
#[derive(Clone)]
pub struct TimelineResolver<S> {
    store: S,
    order: ListingOrder,
}

impl<S: SnapshotStore> TimelineResolver<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            order: ListingOrder::default(),
        }
    }

    pub fn with_order(mut self, order: ListingOrder) -> Self {
        self.order = order;
        self
    }

    pub fn order(&self) -> ListingOrder {
        self.order
    }

    /// Timeline of the latest archived WAL segment, or timeline 1 when
    /// nothing has been archived yet.
    pub async fn current_timeline(&self, ctx: &OpContext) -> Result<Timeline, EngineError> {
        let mut snapshots =
            store_call(ctx, "list WAL snapshots", self.store.find_snapshots(&wal_query())).await?;
        self.order.apply(&mut snapshots);

        let Some(latest) = snapshots.first() else {
            tracing::debug!("no WAL segments archived yet, using timeline {}", Timeline::FIRST);
            return Ok(Timeline::FIRST);
        };

        match latest.tags.wal_segment() {
            Some(key) => {
                tracing::debug!(snapshot_id = %latest.id, wal_file = %key, timeline = %key.timeline, "resolved timeline");
                Ok(key.timeline)
            }
            None => Err(EngineError::TimelineUnresolved {
                detail: format!("latest WAL snapshot {} carries no WAL file name", latest.id),
            }),
        }
    }
}

#[cfg(test)]
#[path = "timeline_tests.rs"]
mod tests;
