use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Persisted;
use crate::constants::{pagination, refresh, storage_keys};
use crate::errors::StorageError;
use crate::storage::SharedStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum DefaultView {
    #[default]
    Table,
    Grid,
    Cards,
}

impl fmt::Display for DefaultView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DefaultView::Table => write!(f, "table"),
            DefaultView::Grid => write!(f, "grid"),
            DefaultView::Cards => write!(f, "cards"),
        }
    }
}

impl FromStr for DefaultView {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(DefaultView::Table),
            "grid" => Ok(DefaultView::Grid),
            "cards" => Ok(DefaultView::Cards),
            other => Err(format!("unknown view '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub items_per_page: usize,
    pub default_view: DefaultView,
    pub show_notifications: bool,
    pub auto_refresh: bool,
    pub refresh_interval: u64,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            items_per_page: pagination::DEFAULT_PAGE_SIZE,
            default_view: DefaultView::Table,
            show_notifications: true,
            auto_refresh: true,
            refresh_interval: refresh::NORMAL_MS,
        }
    }
}

#[derive(Clone)]
pub struct PreferencesStore {
    inner: Persisted<Preferences>,
}

impl PreferencesStore {
    pub async fn hydrate(store: SharedStore) -> Self {
        Self {
            inner: Persisted::hydrate(store, storage_keys::PREFERENCES).await,
        }
    }

    pub async fn get(&self) -> Preferences {
        self.inner.get().await
    }

    pub async fn set_items_per_page(&self, items: usize) -> Result<(), StorageError> {
        self.inner.update(|p| p.items_per_page = items.max(1)).await?;
        Ok(())
    }

    pub async fn set_default_view(&self, view: DefaultView) -> Result<(), StorageError> {
        self.inner.update(|p| p.default_view = view).await?;
        Ok(())
    }

    pub async fn set_show_notifications(&self, show: bool) -> Result<(), StorageError> {
        self.inner.update(|p| p.show_notifications = show).await?;
        Ok(())
    }

    pub async fn set_auto_refresh(&self, enabled: bool) -> Result<(), StorageError> {
        self.inner.update(|p| p.auto_refresh = enabled).await?;
        Ok(())
    }

    pub async fn set_refresh_interval(&self, millis: u64) -> Result<(), StorageError> {
        self.inner
            .update(|p| p.refresh_interval = millis.max(refresh::FAST_MS))
            .await?;
        Ok(())
    }

    pub async fn reset(&self) -> Result<Preferences, StorageError> {
        self.inner.reset().await
    }
}
