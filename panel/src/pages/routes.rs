use super::{agent_options, rule_options, ResourcePage};
use crate::api::{Agents, Routes, Rules};
use crate::app::PanelState;
use crate::errors::{ApiError, PanelResult};
use crate::form::ResourceForm;
use crate::query::ResourceHooks;
use crate::schemas::RouteSchema;
use crate::table::columns::route_columns;

pub struct RoutesPage {
    page: ResourcePage<Routes>,
    agents: ResourceHooks<Agents>,
    rules: ResourceHooks<Rules>,
}

impl RoutesPage {
    pub fn new(state: &PanelState) -> Self {
        Self {
            page: ResourcePage::new(state.hooks::<Routes>(), route_columns()),
            agents: state.hooks::<Agents>(),
            rules: state.hooks::<Rules>(),
        }
    }

    pub fn page(&self) -> &ResourcePage<Routes> {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut ResourcePage<Routes> {
        &mut self.page
    }

    pub async fn load_options(&mut self) -> Result<(), ApiError> {
        let (agents, rules) =
            futures::try_join!(agent_options(&self.agents), rule_options(&self.rules))?;
        self.page.set_reference_options("agents", agents);
        self.page.set_reference_options("rules", rules);
        Ok(())
    }

    pub async fn open_create(&mut self) -> PanelResult<&mut ResourceForm<RouteSchema>> {
        self.load_options().await?;
        Ok(self.page.open_create())
    }

    pub async fn open_edit(&mut self, id: &str) -> PanelResult<&mut ResourceForm<RouteSchema>> {
        self.load_options().await?;
        self.page.open_edit(id).await
    }
}
