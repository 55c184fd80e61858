use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::ApiError;
use crate::http::ApiClient;
use crate::schemas::{Agent, GeoDnsRecord, Route, Rule, User};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Info,
    Success,
    Warning,
    Error,
}

impl Severity {
    pub const ALL: [Severity; 4] = [
        Severity::Info,
        Severity::Success,
        Severity::Warning,
        Severity::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "info",
            Severity::Success => "success",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.as_str() == value)
    }
}

/// One entry of the activity feed / audit log.
///
/// The feed and the audit log name the same fields differently
/// (`type`/`action`, `message`/`description`); both spellings are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityItem {
    #[serde(alias = "_id", default)]
    pub id: String,
    #[serde(default)]
    pub timestamp: Option<DateTime<Utc>>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(alias = "type", default)]
    pub action: String,
    #[serde(alias = "message", default)]
    pub description: String,
    #[serde(default)]
    pub severity: Severity,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub details: Value,
}

impl ActivityItem {
    /// Actor shown next to the entry
    pub fn actor(&self) -> &str {
        self.user.as_deref().unwrap_or("System")
    }
}

/// Headline counts shown on the dashboard, derived from the resource lists
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_agents: usize,
    pub connected_agents: usize,
    pub disconnected_agents: usize,
    pub total_rules: usize,
    pub total_routes: usize,
    #[serde(rename = "totalDNSRecords")]
    pub total_dns_records: usize,
    pub total_users: usize,
    pub admin_users: usize,
}

impl DashboardStats {
    pub fn from_lists(
        agents: &[Agent],
        rules: &[Rule],
        routes: &[Route],
        records: &[GeoDnsRecord],
        users: &[User],
    ) -> Self {
        let connected = agents.iter().filter(|a| a.is_connected()).count();
        Self {
            total_agents: agents.len(),
            connected_agents: connected,
            disconnected_agents: agents.len() - connected,
            total_rules: rules.len(),
            total_routes: routes.len(),
            total_dns_records: records.len(),
            total_users: users.len(),
            admin_users: users.iter().filter(|u| u.is_admin()).count(),
        }
    }
}

/// Query window for traffic analytics
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrafficRange {
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
}

impl TrafficRange {
    pub fn new(start_date: DateTime<Utc>, end_date: DateTime<Utc>) -> Self {
        Self {
            start_date,
            end_date,
        }
    }

    /// From the start of the day `days` ago to the end of today
    pub fn last_days(days: i64) -> Self {
        let today = Utc::now().date_naive();
        let start = (today - Duration::days(days))
            .and_hms_opt(0, 0, 0)
            .map(|dt| dt.and_utc())
            .unwrap_or_else(Utc::now);
        let end = today
            .and_hms_opt(23, 59, 59)
            .map(|dt| dt.and_utc())
            .unwrap_or_else(Utc::now);
        Self::new(start, end)
    }

    /// Stable text used as the query key parameter
    pub fn cache_param(&self) -> String {
        format!("{}..{}", self.start_date.to_rfc3339(), self.end_date.to_rfc3339())
    }
}

#[derive(Clone)]
pub struct AnalyticsApi {
    client: ApiClient,
}

impl AnalyticsApi {
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Server-side statistics; shape is backend defined
    pub async fn stats(&self) -> Result<Value, ApiError> {
        self.client.get("/admin/stats").await
    }

    pub async fn activity(&self) -> Result<Vec<ActivityItem>, ApiError> {
        self.client.get("/admin/activity").await
    }

    pub async fn traffic(&self, range: &TrafficRange) -> Result<Value, ApiError> {
        self.client
            .get_with_query("/admin/analytics/traffic", range)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_activity_item_accepts_both_spellings() {
        let feed: ActivityItem = serde_json::from_value(serde_json::json!({
            "_id": "1",
            "type": "agent.create",
            "message": "Created new agent",
            "timestamp": "2025-02-10T04:51:23Z"
        }))
        .unwrap();
        assert_eq!(feed.action, "agent.create");
        assert_eq!(feed.description, "Created new agent");
        assert_eq!(feed.severity, Severity::Info);
        assert_eq!(feed.actor(), "System");

        let audit: ActivityItem = serde_json::from_value(serde_json::json!({
            "id": "2",
            "action": "user.login",
            "description": "User logged in successfully",
            "severity": "success",
            "user": "john.doe",
            "ip": "192.168.1.105",
            "details": {"userId": "user-002"}
        }))
        .unwrap();
        assert_eq!(audit.severity, Severity::Success);
        assert_eq!(audit.actor(), "john.doe");
        assert_eq!(audit.details["userId"], "user-002");
    }

    #[test]
    fn test_traffic_range_covers_whole_days() {
        let range = TrafficRange::last_days(7);
        assert_eq!(range.end_date - range.start_date, Duration::days(8) - Duration::seconds(1));
        let query = serde_json::to_value(range).unwrap();
        assert!(query.get("startDate").is_some());
        assert!(query.get("endDate").is_some());
    }
}
