use super::{agent_options, ResourcePage};
use crate::api::{Agents, Rules};
use crate::app::PanelState;
use crate::errors::{ApiError, PanelResult};
use crate::form::ResourceForm;
use crate::query::ResourceHooks;
use crate::schemas::RuleSchema;
use crate::table::columns::rule_columns;

/// Rules list; the agent field offers "name (ip)" choices
pub struct RulesPage {
    page: ResourcePage<Rules>,
    agents: ResourceHooks<Agents>,
}

impl RulesPage {
    pub fn new(state: &PanelState) -> Self {
        Self {
            page: ResourcePage::new(state.hooks::<Rules>(), rule_columns()),
            agents: state.hooks::<Agents>(),
        }
    }

    pub fn page(&self) -> &ResourcePage<Rules> {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut ResourcePage<Rules> {
        &mut self.page
    }

    pub async fn load_options(&mut self) -> Result<(), ApiError> {
        let options = agent_options(&self.agents).await?;
        self.page.set_reference_options("agent", options);
        Ok(())
    }

    pub async fn open_create(&mut self) -> PanelResult<&mut ResourceForm<RuleSchema>> {
        self.load_options().await?;
        Ok(self.page.open_create())
    }

    pub async fn open_edit(&mut self, id: &str) -> PanelResult<&mut ResourceForm<RuleSchema>> {
        self.load_options().await?;
        self.page.open_edit(id).await
    }
}
