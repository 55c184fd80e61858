use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use super::Persisted;
use crate::constants::storage_keys;
use crate::errors::StorageError;
use crate::storage::SharedStore;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SidebarState {
    is_collapsed: bool,
}

/// Collapse state survives restarts; the mobile drawer always starts closed
#[derive(Clone)]
pub struct SidebarStore {
    inner: Persisted<SidebarState>,
    mobile_open: Arc<AtomicBool>,
}

impl SidebarStore {
    pub async fn hydrate(store: SharedStore) -> Self {
        Self {
            inner: Persisted::hydrate(store, storage_keys::SIDEBAR).await,
            mobile_open: Arc::new(AtomicBool::new(false)),
        }
    }

    pub async fn is_collapsed(&self) -> bool {
        self.inner.get().await.is_collapsed
    }

    pub async fn set_collapsed(&self, collapsed: bool) -> Result<(), StorageError> {
        self.inner.update(|s| s.is_collapsed = collapsed).await?;
        Ok(())
    }

    pub async fn toggle_collapse(&self) -> Result<bool, StorageError> {
        let state = self.inner.update(|s| s.is_collapsed = !s.is_collapsed).await?;
        Ok(state.is_collapsed)
    }

    pub fn is_mobile_open(&self) -> bool {
        self.mobile_open.load(Ordering::SeqCst)
    }

    pub fn set_mobile_open(&self, open: bool) {
        self.mobile_open.store(open, Ordering::SeqCst);
    }

    pub fn toggle_mobile(&self) -> bool {
        !self.mobile_open.fetch_xor(true, Ordering::SeqCst)
    }

    pub fn close_mobile(&self) {
        self.set_mobile_open(false);
    }
}
