//! Shared console state
//!
//! `PanelState` wires the long-lived pieces together once at start-up and
//! hands out cheap clones to pages. Every clone shares the same cache,
//! mutation tracker, notification center and stores.

use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::{AnalyticsApi, AuthApi, Resource, ResourceApi};
use crate::config::Config;
use crate::export::Exporter;
use crate::http::{ApiClient, SessionEvent};
use crate::notifications::{NotificationInbox, ToastCenter};
use crate::query::{AnalyticsHooks, MutationTracker, QueryCache, ResourceHooks};
use crate::storage::SharedStore;
use crate::stores::{PreferencesStore, SessionStore, SidebarStore, ThemeStore};

#[derive(Clone)]
pub struct PanelState {
    pub config: Arc<Config>,
    pub client: ApiClient,
    pub cache: QueryCache,
    pub tracker: MutationTracker,
    pub toasts: ToastCenter,
    pub inbox: NotificationInbox,
    pub session: SessionStore,
    pub theme: ThemeStore,
    pub sidebar: SidebarStore,
    pub preferences: PreferencesStore,
    pub exporter: Exporter,
}

impl PanelState {
    /// Hydrate every persisted container from `store` and build the API client
    pub async fn new(config: Arc<Config>, store: SharedStore) -> Result<Self> {
        let session = SessionStore::hydrate(store.clone()).await;
        let theme = ThemeStore::hydrate(store.clone()).await;
        let sidebar = SidebarStore::hydrate(store.clone()).await;
        let preferences = PreferencesStore::hydrate(store).await;
        let toasts = ToastCenter::new();
        let client = ApiClient::new(&config, session.clone(), toasts.clone())?;

        info!(
            "Panel state ready (signed in: {})",
            session.is_authenticated().await
        );

        Ok(Self {
            exporter: Exporter::from_config(&config),
            config,
            client,
            cache: QueryCache::new(),
            tracker: MutationTracker::new(),
            toasts,
            inbox: NotificationInbox::new(),
            session,
            theme,
            sidebar,
            preferences,
        })
    }

    pub fn hooks<R: Resource>(&self) -> ResourceHooks<R> {
        ResourceHooks::new(
            ResourceApi::new(self.client.clone()),
            self.cache.clone(),
            self.tracker.clone(),
        )
    }

    pub fn analytics(&self) -> AnalyticsHooks {
        AnalyticsHooks::new(AnalyticsApi::new(self.client.clone()), self.cache.clone())
    }

    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.client.clone())
    }

    /// Drop cached data when the backend expires the session
    pub fn watch_session(&self) -> tokio::task::JoinHandle<()> {
        let mut events = self.client.session_events();
        let cache = self.cache.clone();
        tokio::spawn(async move {
            while let Ok(event) = events.recv().await {
                match event {
                    SessionEvent::Expired { redirect_to } => {
                        warn!("Session expired, returning to {}", redirect_to);
                        cache.clear().await;
                    }
                }
            }
        })
    }
}
