use serde::Serialize;
use tracing::info;

use crate::app::PanelState;
use crate::errors::{PanelError, PanelResult};
use crate::notifications::ToastCenter;
use crate::stores::{DefaultView, Preferences, PreferencesStore, SidebarStore, Theme, ThemeStore};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SettingsView {
    pub theme: Theme,
    pub sidebar_collapsed: bool,
    pub preferences: Preferences,
}

/// Theme, sidebar and preference editing
pub struct SettingsPage {
    theme: ThemeStore,
    sidebar: SidebarStore,
    preferences: PreferencesStore,
    toasts: ToastCenter,
}

impl SettingsPage {
    pub fn new(state: &PanelState) -> Self {
        Self {
            theme: state.theme.clone(),
            sidebar: state.sidebar.clone(),
            preferences: state.preferences.clone(),
            toasts: state.toasts.clone(),
        }
    }

    pub async fn view(&self) -> SettingsView {
        SettingsView {
            theme: self.theme.theme().await,
            sidebar_collapsed: self.sidebar.is_collapsed().await,
            preferences: self.preferences.get().await,
        }
    }

    pub async fn set_theme(&self, theme: Theme) -> PanelResult<()> {
        self.theme.set_theme(theme).await?;
        self.saved("Appearance").await;
        Ok(())
    }

    pub async fn toggle_sidebar(&self) -> PanelResult<bool> {
        Ok(self.sidebar.toggle_collapse().await?)
    }

    /// Set one preference by its camelCase name, parsing the value from text
    pub async fn set_preference(&self, key: &str, value: &str) -> PanelResult<()> {
        match key {
            "itemsPerPage" => {
                self.preferences
                    .set_items_per_page(parse(key, value)?)
                    .await?
            }
            "defaultView" => {
                let view: DefaultView = value.parse().map_err(PanelError::Other)?;
                self.preferences.set_default_view(view).await?
            }
            "showNotifications" => {
                self.preferences
                    .set_show_notifications(parse(key, value)?)
                    .await?
            }
            "autoRefresh" => self.preferences.set_auto_refresh(parse(key, value)?).await?,
            "refreshInterval" => {
                self.preferences
                    .set_refresh_interval(parse(key, value)?)
                    .await?
            }
            other => {
                return Err(PanelError::Other(format!("Unknown preference '{}'", other)));
            }
        }
        info!("Preference {} set to {}", key, value);
        self.saved("Preferences").await;
        Ok(())
    }

    pub async fn reset(&self) -> PanelResult<SettingsView> {
        self.theme.set_theme(Theme::default()).await?;
        self.sidebar.set_collapsed(false).await?;
        self.preferences.reset().await?;
        self.toasts.success("Settings reset to defaults").await;
        Ok(self.view().await)
    }

    async fn saved(&self, section: &str) {
        self.toasts
            .success(format!("{} settings saved successfully", section))
            .await;
    }
}

fn parse<T: std::str::FromStr>(key: &str, value: &str) -> PanelResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| PanelError::Other(format!("Invalid value '{}' for {}", value, key)))
}
