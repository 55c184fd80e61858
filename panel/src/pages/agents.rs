use tracing::info;

use super::ResourcePage;
use crate::api::Agents;
use crate::app::PanelState;
use crate::errors::PanelResult;
use crate::schemas::Agent;
use crate::table::columns::agent_columns;

/// Agents list with row selection for bulk delete
pub struct AgentsPage {
    page: ResourcePage<Agents>,
}

impl AgentsPage {
    pub fn new(state: &PanelState) -> Self {
        Self {
            page: ResourcePage::new(state.hooks::<Agents>(), agent_columns()).with_selection(),
        }
    }

    pub fn page(&self) -> &ResourcePage<Agents> {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut ResourcePage<Agents> {
        &mut self.page
    }

    /// Delete every selected agent in one request; returns how many were deleted
    pub async fn delete_selected(&mut self) -> PanelResult<usize> {
        let ids = self.page.table().selected_ids();
        if ids.is_empty() {
            return Ok(0);
        }

        self.page.hooks().bulk_delete(&ids).await?;
        info!("Deleted {} selected agent(s)", ids.len());
        self.page.table_mut().clear_selection();
        self.page.reload().await;
        Ok(ids.len())
    }

    pub async fn set_enabled(&mut self, id: &str, enabled: bool) -> PanelResult<Agent> {
        let agent = self.page.hooks().set_enabled(id, enabled).await?;
        self.page.reload().await;
        Ok(agent)
    }
}
