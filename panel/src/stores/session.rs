//! Auth token and signed-in user profile
//!
//! The token is stored verbatim under `token`, the profile as JSON under
//! `user`. The HTTP client reads the token before every request and clears
//! both keys when the backend answers 401.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::constants::storage_keys;
use crate::errors::StorageError;
use crate::storage::{load_json, save_json, SharedStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(rename = "_id", alias = "id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub username: String,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Default, Clone)]
struct SessionState {
    token: Option<String>,
    user: Option<UserProfile>,
}

#[derive(Clone)]
pub struct SessionStore {
    store: SharedStore,
    state: Arc<RwLock<SessionState>>,
}

impl SessionStore {
    pub async fn hydrate(store: SharedStore) -> Self {
        let token = match store.get(storage_keys::TOKEN).await {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!("Could not read stored token: {}", e);
                None
            }
        };
        let user = match load_json::<UserProfile>(store.as_ref(), storage_keys::USER).await {
            Ok(user) => user,
            Err(e) => {
                warn!("Ignoring stored user profile: {}", e);
                None
            }
        };

        Self {
            store,
            state: Arc::new(RwLock::new(SessionState { token, user })),
        }
    }

    pub async fn token(&self) -> Option<String> {
        self.state.read().await.token.clone()
    }

    pub async fn user(&self) -> Option<UserProfile> {
        self.state.read().await.user.clone()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.state.read().await.token.is_some()
    }

    pub async fn set_session(
        &self,
        token: String,
        user: Option<UserProfile>,
    ) -> Result<(), StorageError> {
        self.store.set(storage_keys::TOKEN, &token).await?;
        match &user {
            Some(profile) => save_json(self.store.as_ref(), storage_keys::USER, profile).await?,
            None => self.store.remove(storage_keys::USER).await?,
        }

        let mut state = self.state.write().await;
        state.token = Some(token);
        state.user = user;
        Ok(())
    }

    /// Drop stored credentials
    pub async fn clear(&self) -> Result<(), StorageError> {
        {
            let mut state = self.state.write().await;
            state.token = None;
            state.user = None;
        }
        self.store.remove(storage_keys::TOKEN).await?;
        self.store.remove(storage_keys::USER).await?;
        info!("Session credentials cleared");
        Ok(())
    }
}
