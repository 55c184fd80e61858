//! Screen controllers
//!
//! A page composes the building blocks for one screen: cached hooks, a
//! `DataTable`, and a `ResourceForm` dialog. Pages hold view state only;
//! the data they show always comes through the query cache.

pub mod agents;
pub mod analytics;
pub mod audit_log;
pub mod dashboard;
pub mod geodns;
pub mod resource;
pub mod routes;
pub mod rules;
pub mod settings;
pub mod users;

use crate::api::{Agents, Routes, Rules};
use crate::errors::ApiError;
use crate::form::SelectOption;
use crate::query::ResourceHooks;

pub use agents::AgentsPage;
pub use analytics::AnalyticsPage;
pub use audit_log::AuditLogPage;
pub use dashboard::{DashboardPage, DashboardView};
pub use geodns::GeoDnsPage;
pub use resource::ResourcePage;
pub use routes::RoutesPage;
pub use rules::RulesPage;
pub use settings::{SettingsPage, SettingsView};
pub use users::{users_page, UsersPage};

/// Agent choices labelled "name (ip)"
pub async fn agent_options(agents: &ResourceHooks<Agents>) -> Result<Vec<SelectOption>, ApiError> {
    Ok(agents
        .list()
        .await?
        .into_iter()
        .map(|agent| SelectOption::new(agent.id, format!("{} ({})", agent.name, agent.ip)))
        .collect())
}

pub async fn rule_options(rules: &ResourceHooks<Rules>) -> Result<Vec<SelectOption>, ApiError> {
    Ok(rules
        .list()
        .await?
        .into_iter()
        .map(|rule| SelectOption::new(rule.id, rule.name))
        .collect())
}

pub async fn route_options(routes: &ResourceHooks<Routes>) -> Result<Vec<SelectOption>, ApiError> {
    Ok(routes
        .list()
        .await?
        .into_iter()
        .map(|route| SelectOption::new(route.id, route.name))
        .collect())
}
