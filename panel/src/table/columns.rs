//! Column sets for each resource list

use super::{CellValue, Column};
use crate::api::ActivityItem;
use crate::format::{capitalize, format_ip_port, truncate};
use crate::schemas::{Agent, Choice, GeoDnsRecord, Route, Rule, User};

/// Long free-text cells are cut to this many characters
const TEXT_CELL_WIDTH: usize = 40;

fn truncated(value: &CellValue) -> String {
    truncate(&value.to_string(), TEXT_CELL_WIDTH)
}

pub fn agent_columns() -> Vec<Column<Agent>> {
    vec![
        Column::new("name", "Name", |a: &Agent| CellValue::text(&a.name)),
        Column::new("ip", "IP Address", |a: &Agent| {
            CellValue::Text(format_ip_port(&a.ip, Some(a.port)))
        }),
        Column::new("status", "Status", |a: &Agent| CellValue::text(a.status.as_str())),
        Column::new("capabilities", "Capabilities", |a: &Agent| {
            CellValue::List(
                a.capabilities
                    .enabled()
                    .into_iter()
                    .map(str::to_uppercase)
                    .collect(),
            )
        })
        .unsortable(),
        Column::new("lastHeartbeat", "Last Heartbeat", |a: &Agent| {
            CellValue::optional_date(a.last_heartbeat)
        }),
    ]
}

pub fn rule_columns() -> Vec<Column<Rule>> {
    vec![
        Column::new("name", "Name", |r: &Rule| CellValue::text(&r.name)),
        Column::new("type", "Type", |r: &Rule| CellValue::text(r.rule_type.as_str()))
            .render_with(|v| v.to_string().to_uppercase()),
        Column::new("match", "Match Pattern", |r: &Rule| CellValue::text(&r.match_pattern))
            .render_with(truncated)
            .unsortable(),
        Column::new("action", "Action", |r: &Rule| CellValue::text(r.action.as_str()))
            .render_with(|v| capitalize(&v.to_string())),
        Column::new("target", "Target", |r: &Rule| CellValue::text(&r.target))
            .render_with(truncated)
            .unsortable(),
    ]
}

pub fn route_columns() -> Vec<Column<Route>> {
    vec![
        Column::new("name", "Name", |r: &Route| CellValue::text(&r.name)),
        Column::new("protocol", "Protocol", |r: &Route| {
            CellValue::text(r.protocol.as_str())
        })
        .render_with(|v| v.to_string().to_uppercase()),
        Column::new("source", "Source", |r: &Route| CellValue::text(&r.source))
            .render_with(truncated)
            .unsortable(),
        Column::new("destination", "Destination", |r: &Route| {
            CellValue::text(&r.destination)
        })
        .render_with(truncated)
        .unsortable(),
        Column::new("agents", "Agents", |r: &Route| CellValue::Number(r.agents.len() as f64))
            .render_with(|v| match v {
                CellValue::Number(n) if *n == 1.0 => "1 agent".to_string(),
                other => format!("{} agents", other),
            })
            .unsortable(),
    ]
}

pub fn geodns_columns() -> Vec<Column<GeoDnsRecord>> {
    vec![
        Column::new("domain", "Domain", |r: &GeoDnsRecord| CellValue::text(&r.domain)),
        Column::new("recordType", "Type", |r: &GeoDnsRecord| {
            CellValue::text(r.record_type.as_str())
        }),
        Column::new("target", "Target", |r: &GeoDnsRecord| CellValue::text(&r.target))
            .render_with(truncated)
            .unsortable(),
        Column::new("location", "Location", |r: &GeoDnsRecord| {
            let location = &r.location;
            match (location.city.is_empty(), location.country.is_empty()) {
                (true, true) => CellValue::Empty,
                (false, false) => CellValue::Text(format!("{}, {}", location.city, location.country)),
                (true, false) => CellValue::text(&location.country),
                (false, true) => CellValue::text(&location.city),
            }
        })
        .unsortable(),
        Column::new("anycast", "Anycast", |r: &GeoDnsRecord| CellValue::Bool(r.anycast))
            .render_with(|v| match v {
                CellValue::Bool(true) => "Enabled".to_string(),
                _ => "Disabled".to_string(),
            })
            .unsortable(),
    ]
}

pub fn user_columns() -> Vec<Column<User>> {
    vec![
        Column::new("username", "Username", |u: &User| CellValue::text(&u.username)),
        Column::new("role", "Role", |u: &User| CellValue::text(u.role.as_str()))
            .render_with(|v| capitalize(&v.to_string())),
        Column::new("apiKey", "API Key", |u: &User| match &u.api_key {
            Some(key) if !key.is_empty() => CellValue::text(key),
            _ => CellValue::Empty,
        })
        .render_with(|v| match v {
            CellValue::Text(key) => format!("{}...", key.chars().take(8).collect::<String>()),
            _ => "Not set".to_string(),
        })
        .unsortable(),
        Column::new("createdAt", "Created", |u: &User| CellValue::optional_date(u.created_at)),
    ]
}

pub fn activity_columns() -> Vec<Column<ActivityItem>> {
    vec![
        Column::new("timestamp", "Timestamp", |a: &ActivityItem| {
            CellValue::optional_date(a.timestamp)
        }),
        Column::new("user", "User", |a: &ActivityItem| CellValue::text(a.actor())),
        Column::new("action", "Action", |a: &ActivityItem| CellValue::text(&a.action)),
        Column::new("description", "Description", |a: &ActivityItem| {
            CellValue::text(&a.description)
        })
        .render_with(|v| truncate(&v.to_string(), 60))
        .unsortable(),
        Column::new("severity", "Severity", |a: &ActivityItem| {
            CellValue::text(a.severity.as_str())
        })
        .render_with(|v| capitalize(&v.to_string())),
        Column::new("ip", "IP Address", |a: &ActivityItem| match &a.ip {
            Some(ip) => CellValue::text(ip),
            None => CellValue::Empty,
        })
        .hidden(),
    ]
}
