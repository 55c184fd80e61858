//! Client-side state containers
//!
//! Each container is initialised independently: persisted ones hydrate from
//! their own storage key on start and flush after every change; transient ones
//! (command palette, sidebar mobile drawer) reset on every start.

pub mod command_palette;
pub mod preferences;
pub mod session;
pub mod sidebar;
pub mod theme;

use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::errors::StorageError;
use crate::storage::{load_json, save_json, SharedStore};

pub use command_palette::{Command, CommandGroup, CommandPalette};
pub use preferences::{DefaultView, Preferences, PreferencesStore};
pub use session::{SessionStore, UserProfile};
pub use sidebar::SidebarStore;
pub use theme::{Theme, ThemeStore};

/// A state value mirrored to one storage key
pub struct Persisted<T> {
    key: &'static str,
    store: SharedStore,
    state: Arc<RwLock<T>>,
}

impl<T> Clone for Persisted<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            store: self.store.clone(),
            state: self.state.clone(),
        }
    }
}

impl<T> Persisted<T>
where
    T: Serialize + DeserializeOwned + Default + Clone + Send + Sync,
{
    /// Load the stored value, falling back to defaults when absent or unreadable
    pub async fn hydrate(store: SharedStore, key: &'static str) -> Self {
        let state = match load_json::<T>(store.as_ref(), key).await {
            Ok(Some(value)) => {
                debug!("Hydrated '{}' from storage", key);
                value
            }
            Ok(None) => T::default(),
            Err(e) => {
                warn!("Ignoring stored '{}': {}", key, e);
                T::default()
            }
        };

        Self {
            key,
            store,
            state: Arc::new(RwLock::new(state)),
        }
    }

    pub async fn get(&self) -> T {
        self.state.read().await.clone()
    }

    /// Apply a change and flush it to storage
    pub async fn update<F>(&self, change: F) -> Result<T, StorageError>
    where
        F: FnOnce(&mut T),
    {
        let snapshot = {
            let mut state = self.state.write().await;
            change(&mut state);
            state.clone()
        };
        save_json(self.store.as_ref(), self.key, &snapshot).await?;
        Ok(snapshot)
    }

    pub async fn reset(&self) -> Result<T, StorageError> {
        self.update(|state| *state = T::default()).await
    }

    pub fn key(&self) -> &'static str {
        self.key
    }
}
