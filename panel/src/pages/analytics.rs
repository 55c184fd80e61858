use serde_json::{json, Value};
use std::path::PathBuf;

use crate::api::TrafficRange;
use crate::app::PanelState;
use crate::errors::{ApiError, PanelResult};
use crate::export::Exporter;
use crate::query::AnalyticsHooks;

pub const DEFAULT_RANGE_DAYS: i64 = 7;

/// Traffic analytics for a date range
pub struct AnalyticsPage {
    analytics: AnalyticsHooks,
    exporter: Exporter,
    range: TrafficRange,
    traffic: Option<Value>,
}

impl AnalyticsPage {
    pub fn new(state: &PanelState) -> Self {
        Self {
            analytics: state.analytics(),
            exporter: state.exporter.clone(),
            range: TrafficRange::last_days(DEFAULT_RANGE_DAYS),
            traffic: None,
        }
    }

    pub fn range(&self) -> TrafficRange {
        self.range
    }

    /// A new range drops the loaded data until the next `load`
    pub fn set_range(&mut self, range: TrafficRange) {
        if range != self.range {
            self.range = range;
            self.traffic = None;
        }
    }

    pub async fn load(&mut self) -> Result<&Value, ApiError> {
        let traffic = self.analytics.traffic(self.range).await?;
        Ok(self.traffic.insert(traffic))
    }

    pub fn traffic(&self) -> Option<&Value> {
        self.traffic.as_ref()
    }

    /// Per-period rows of the loaded traffic data
    pub fn rows(&self) -> Vec<Value> {
        match &self.traffic {
            Some(Value::Array(items)) => items.clone(),
            Some(Value::Object(fields)) => ["trafficData", "traffic", "data"]
                .iter()
                .find_map(|key| fields.get(*key).and_then(Value::as_array).cloned())
                .unwrap_or_else(|| vec![Value::Object(fields.clone())]),
            _ => Vec::new(),
        }
    }

    pub async fn export_csv(&self) -> PanelResult<PathBuf> {
        Ok(self
            .exporter
            .export_csv(&self.rows(), "analytics-traffic", None)
            .await?)
    }

    pub async fn export_json(&self) -> PanelResult<PathBuf> {
        let data = json!({
            "dateRange": self.range,
            "traffic": self.traffic,
        });
        Ok(self.exporter.export_json(&data, "analytics-full").await?)
    }
}
