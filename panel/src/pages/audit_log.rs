//! Audit log viewer
//!
//! Search matches description, user and action case-insensitively. The type
//! filter matches the action prefix (`agent.create` is an `agent` entry).

use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::api::{ActivityItem, Severity};
use crate::app::PanelState;
use crate::errors::{ApiError, PanelResult};
use crate::export::Exporter;
use crate::format::format_date_with;
use crate::query::AnalyticsHooks;
use crate::table::columns::activity_columns;
use crate::table::DataTable;

pub const ALL: &str = "all";

/// Action prefixes offered by the type filter
pub const ACTION_TYPES: &[&str] = &["agent", "rule", "route", "geodns", "user", "system", "settings"];

const EXPORT_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct AuditLogPage {
    analytics: AnalyticsHooks,
    exporter: Exporter,
    entries: Vec<ActivityItem>,
    search: String,
    action_type: Option<String>,
    severity: Option<Severity>,
    table: DataTable<ActivityItem>,
}

impl AuditLogPage {
    pub fn new(state: &PanelState) -> Self {
        Self {
            analytics: state.analytics(),
            exporter: state.exporter.clone(),
            entries: Vec::new(),
            search: String::new(),
            action_type: None,
            severity: None,
            table: DataTable::new(activity_columns(), |a: &ActivityItem| a.id.clone()),
        }
    }

    pub async fn refresh(&mut self) -> Result<usize, ApiError> {
        let entries = self.analytics.recent_activity().await?;
        self.set_entries(entries);
        Ok(self.entries.len())
    }

    pub fn set_entries(&mut self, entries: Vec<ActivityItem>) {
        self.entries = entries;
        self.apply_filters();
    }

    pub fn set_search(&mut self, search: &str) {
        self.search = search.to_string();
        self.apply_filters();
    }

    /// `"all"` or one of `ACTION_TYPES`
    pub fn set_action_type(&mut self, action_type: &str) {
        self.action_type = (action_type != ALL && !action_type.is_empty())
            .then(|| action_type.to_string());
        self.apply_filters();
    }

    /// `"all"` or a severity name; unknown names select nothing
    pub fn set_severity(&mut self, severity: &str) -> bool {
        let parsed = match severity {
            ALL | "" => None,
            other => match Severity::parse(other) {
                Some(parsed) => Some(parsed),
                None => return false,
            },
        };
        self.severity = parsed;
        self.apply_filters();
        true
    }

    fn matches(&self, entry: &ActivityItem) -> bool {
        let needle = self.search.to_lowercase();
        let matches_search = needle.is_empty()
            || entry.description.to_lowercase().contains(&needle)
            || entry.actor().to_lowercase().contains(&needle)
            || entry.action.to_lowercase().contains(&needle);
        let matches_type = self
            .action_type
            .as_deref()
            .map_or(true, |prefix| entry.action.starts_with(prefix));
        let matches_severity = self.severity.map_or(true, |s| entry.severity == s);

        matches_search && matches_type && matches_severity
    }

    fn apply_filters(&mut self) {
        let filtered = self.filtered();
        self.table.set_data(filtered);
        self.table.set_page(0);
    }

    pub fn filtered(&self) -> Vec<ActivityItem> {
        self.entries
            .iter()
            .filter(|entry| self.matches(entry))
            .cloned()
            .collect()
    }

    pub fn table(&self) -> &DataTable<ActivityItem> {
        &self.table
    }

    pub fn table_mut(&mut self) -> &mut DataTable<ActivityItem> {
        &mut self.table
    }

    /// Counts per severity over all loaded entries
    pub fn severity_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts: BTreeMap<&'static str, usize> =
            Severity::ALL.iter().map(|s| (s.as_str(), 0)).collect();
        for entry in &self.entries {
            *counts.entry(entry.severity.as_str()).or_default() += 1;
        }
        counts
    }

    pub fn total(&self) -> usize {
        self.entries.len()
    }

    fn export_rows(&self) -> Vec<Value> {
        self.filtered()
            .iter()
            .map(|entry| {
                json!({
                    "Timestamp": format_date_with(entry.timestamp, EXPORT_TIMESTAMP_FORMAT),
                    "Severity": entry.severity.as_str(),
                    "User": entry.actor(),
                    "Action": entry.action,
                    "Description": entry.description,
                    "IP": entry.ip,
                })
            })
            .collect()
    }

    pub async fn export_csv(&self) -> PanelResult<PathBuf> {
        Ok(self
            .exporter
            .export_csv(&self.export_rows(), "audit-logs", None)
            .await?)
    }

    pub async fn export_json(&self) -> PanelResult<PathBuf> {
        Ok(self
            .exporter
            .export_json(&self.filtered(), "audit-logs")
            .await?)
    }
}
