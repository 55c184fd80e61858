use super::{agent_options, route_options, ResourcePage};
use crate::api::{Agents, GeoDns, Routes};
use crate::app::PanelState;
use crate::errors::{ApiError, PanelResult};
use crate::form::ResourceForm;
use crate::query::ResourceHooks;
use crate::schemas::GeoDnsSchema;
use crate::table::columns::geodns_columns;

pub struct GeoDnsPage {
    page: ResourcePage<GeoDns>,
    agents: ResourceHooks<Agents>,
    routes: ResourceHooks<Routes>,
}

impl GeoDnsPage {
    pub fn new(state: &PanelState) -> Self {
        Self {
            page: ResourcePage::new(state.hooks::<GeoDns>(), geodns_columns()),
            agents: state.hooks::<Agents>(),
            routes: state.hooks::<Routes>(),
        }
    }

    pub fn page(&self) -> &ResourcePage<GeoDns> {
        &self.page
    }

    pub fn page_mut(&mut self) -> &mut ResourcePage<GeoDns> {
        &mut self.page
    }

    pub async fn load_options(&mut self) -> Result<(), ApiError> {
        let (agents, routes) =
            futures::try_join!(agent_options(&self.agents), route_options(&self.routes))?;
        self.page.set_reference_options("agents", agents);
        self.page.set_reference_options("routes", routes);
        Ok(())
    }

    pub async fn open_create(&mut self) -> PanelResult<&mut ResourceForm<GeoDnsSchema>> {
        self.load_options().await?;
        Ok(self.page.open_create())
    }

    pub async fn open_edit(&mut self, id: &str) -> PanelResult<&mut ResourceForm<GeoDnsSchema>> {
        self.load_options().await?;
        self.page.open_edit(id).await
    }
}
