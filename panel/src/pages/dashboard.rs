use serde::Serialize;
use tracing::debug;

use crate::api::{ActivityItem, Agents, DashboardStats, GeoDns, Routes, Rules, Users};
use crate::app::PanelState;
use crate::query::{AnalyticsHooks, ResourceHooks};

/// Everything the overview screen shows
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardView {
    pub stats: DashboardStats,
    pub recent_activity: Vec<ActivityItem>,
}

impl DashboardView {
    /// Connected/disconnected split for the agent status chart
    pub fn agent_status(&self) -> [(&'static str, usize); 2] {
        [
            ("Connected", self.stats.connected_agents),
            ("Disconnected", self.stats.disconnected_agents),
        ]
    }
}

pub struct DashboardPage {
    agents: ResourceHooks<Agents>,
    rules: ResourceHooks<Rules>,
    routes: ResourceHooks<Routes>,
    geodns: ResourceHooks<GeoDns>,
    users: ResourceHooks<Users>,
    analytics: AnalyticsHooks,
}

impl DashboardPage {
    pub fn new(state: &PanelState) -> Self {
        Self {
            agents: state.hooks(),
            rules: state.hooks(),
            routes: state.hooks(),
            geodns: state.hooks(),
            users: state.hooks(),
            analytics: state.analytics(),
        }
    }

    /// Counts come from the cached resource lists; a list that fails to load counts as empty
    pub async fn load(&self) -> DashboardView {
        let (agents, rules, routes, records, users, activity) = futures::join!(
            self.agents.list(),
            self.rules.list(),
            self.routes.list(),
            self.geodns.list(),
            self.users.list(),
            self.analytics.recent_activity(),
        );

        let agents = agents.unwrap_or_default();
        let rules = rules.unwrap_or_default();
        let routes = routes.unwrap_or_default();
        let records = records.unwrap_or_default();
        let users = users.unwrap_or_default();

        let stats = DashboardStats::from_lists(&agents, &rules, &routes, &records, &users);
        debug!("Dashboard stats: {:?}", stats);

        DashboardView {
            stats,
            recent_activity: activity.unwrap_or_default(),
        }
    }
}
