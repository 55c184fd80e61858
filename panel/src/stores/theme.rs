use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::Persisted;
use crate::constants::storage_keys;
use crate::errors::StorageError;
use crate::storage::SharedStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    Light,
    Dark,
    #[default]
    System,
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
            Theme::System => write!(f, "system"),
        }
    }
}

impl FromStr for Theme {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "light" => Ok(Theme::Light),
            "dark" => Ok(Theme::Dark),
            "system" => Ok(Theme::System),
            other => Err(format!("unknown theme '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct ThemeState {
    theme: Theme,
}

#[derive(Clone)]
pub struct ThemeStore {
    inner: Persisted<ThemeState>,
}

impl ThemeStore {
    pub async fn hydrate(store: SharedStore) -> Self {
        Self {
            inner: Persisted::hydrate(store, storage_keys::THEME).await,
        }
    }

    pub async fn theme(&self) -> Theme {
        self.inner.get().await.theme
    }

    pub async fn set_theme(&self, theme: Theme) -> Result<(), StorageError> {
        self.inner.update(|s| s.theme = theme).await?;
        Ok(())
    }

    /// Light becomes dark; dark and system become light
    pub async fn toggle(&self) -> Result<Theme, StorageError> {
        let state = self
            .inner
            .update(|s| {
                s.theme = if s.theme == Theme::Light {
                    Theme::Dark
                } else {
                    Theme::Light
                }
            })
            .await?;
        Ok(state.theme)
    }
}
