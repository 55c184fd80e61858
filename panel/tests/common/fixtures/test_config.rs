//! Panel state pointed at a mock backend

use nimbus_panel::storage::SharedStore;
use nimbus_panel::{Config, MemoryStorage, PanelState};
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;

pub struct TestPanel {
    pub state: PanelState,
    pub store: SharedStore,
    pub temp_dir: TempDir,
}

impl TestPanel {
    pub async fn new(base_url: &str) -> Self {
        Self::with_store(base_url, MemoryStorage::shared()).await
    }

    /// Reuse `store` so persisted state carries over between panels
    pub async fn with_store(base_url: &str, store: SharedStore) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config = Config {
            api_base_url: base_url.to_string(),
            request_timeout_seconds: 5,
            storage_path: temp_dir.path().join("panel.db").display().to_string(),
            download_dir: temp_dir.path().join("downloads").display().to_string(),
            log_level: None,
        };
        let state = PanelState::new(Arc::new(config), store.clone())
            .await
            .expect("Failed to build panel state");

        Self {
            state,
            store,
            temp_dir,
        }
    }

    pub fn download_dir(&self) -> PathBuf {
        self.temp_dir.path().join("downloads")
    }

    pub async fn sign_in(&self, token: &str) {
        self.state
            .session
            .set_session(token.to_string(), None)
            .await
            .expect("Failed to store session");
    }
}
