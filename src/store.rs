// SPDX-License-Identifier: PMPL-1.0-or-later
//! Single-slot holder for the most recent scan.
//!
//! Callers that scan and fix in separate steps (a long-running process, a
//! REPL) publish each snapshot here and read it back later. Publishing
//! replaces the previous snapshot wholesale; readers never observe a
//! half-written one.

use crate::config::FixConfig;
use crate::error::{Error, Result};
use crate::findings::ScanSnapshot;
use crate::fix;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Shared, cloneable handle to the last published snapshot
#[derive(Debug, Clone, Default)]
pub struct SnapshotStore {
    inner: Arc<RwLock<Option<Arc<ScanSnapshot>>>>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the stored snapshot
    pub async fn publish(&self, snapshot: ScanSnapshot) {
        debug!("Publishing snapshot for {} ({} findings)", snapshot.url, snapshot.len());
        *self.inner.write().await = Some(Arc::new(snapshot));
    }

    /// The most recently published snapshot, if any
    pub async fn latest(&self) -> Option<Arc<ScanSnapshot>> {
        self.inner.read().await.clone()
    }

    /// Apply fixes to the stored snapshot
    pub async fn apply_fixes(&self, config: &FixConfig) -> Result<String> {
        let snapshot = self.latest().await.ok_or(Error::NoSnapshot)?;
        fix::apply_fixes(&snapshot, config)
    }

    pub async fn clear(&self) {
        *self.inner.write().await = None;
    }
}
