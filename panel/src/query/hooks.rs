use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{info, instrument, warn};

use super::cache::{QueryCache, QueryKey};
use super::mutation_tracker::{MutationGuard, MutationTracker};
use crate::api::{
    ActivityItem, Agents, AnalyticsApi, CreatePayload, Resource, ResourceApi, TrafficRange,
    UpdatePayload,
};
use crate::constants::query_keys;
use crate::errors::{ApiError, PanelError, PanelResult};
use crate::notifications::ToastCenter;
use crate::schemas::Agent;

/// Cached reads and cache-aware mutations for one resource.
///
/// Mutation failures are not notified here: the HTTP client has already
/// raised the single error toast for them.
pub struct ResourceHooks<R: Resource> {
    api: ResourceApi<R>,
    cache: QueryCache,
    tracker: MutationTracker,
    toasts: ToastCenter,
}

impl<R: Resource> Clone for ResourceHooks<R> {
    fn clone(&self) -> Self {
        Self {
            api: self.api.clone(),
            cache: self.cache.clone(),
            tracker: self.tracker.clone(),
            toasts: self.toasts.clone(),
        }
    }
}

impl<R: Resource> ResourceHooks<R> {
    pub fn new(api: ResourceApi<R>, cache: QueryCache, tracker: MutationTracker) -> Self {
        let toasts = api.client().toasts().clone();
        Self {
            api,
            cache,
            tracker,
            toasts,
        }
    }

    pub fn api(&self) -> &ResourceApi<R> {
        &self.api
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    pub async fn list(&self) -> Result<Vec<R::Record>, ApiError> {
        let api = self.api.clone();
        self.cache
            .fetch_query(QueryKey::list(R::KEY), move || {
                let api = api.clone();
                async move { api.list().await }
            })
            .await
    }

    pub async fn get(&self, id: &str) -> Result<R::Record, ApiError> {
        let api = self.api.clone();
        let record_id = id.to_string();
        self.cache
            .fetch_query(QueryKey::detail(R::KEY, id), move || {
                let api = api.clone();
                let record_id = record_id.clone();
                async move { api.get(&record_id).await }
            })
            .await
    }

    #[instrument(skip_all, fields(resource = R::KEY))]
    pub async fn create(&self, data: CreatePayload<R>) -> PanelResult<R::Record> {
        let created = self.api.create(&data).await?;

        self.toasts
            .success(format!("{} created successfully!", R::SINGULAR))
            .await;
        self.cache.invalidate_queries(R::KEY).await;
        Ok(created)
    }

    /// Optimistic update: the cached detail and list entries change at once
    /// and are restored if the backend rejects the write.
    #[instrument(skip(self, data), fields(resource = R::KEY))]
    pub async fn update(&self, id: &str, data: UpdatePayload<R>) -> PanelResult<R::Record> {
        let claim = self.claim(R::KEY, id, "update").await?;
        let updated = self.update_optimistically(id, &data).await;
        drop(claim);
        let updated = updated?;

        self.toasts
            .success(format!("{} updated successfully!", R::SINGULAR))
            .await;
        self.cache.invalidate_queries(R::KEY).await;
        Ok(updated)
    }

    #[instrument(skip(self), fields(resource = R::KEY))]
    pub async fn delete(&self, id: &str) -> PanelResult<()> {
        let claim = self.claim(R::KEY, id, "delete").await?;
        let deleted = self.api.delete(id).await;
        drop(claim);
        deleted?;

        self.toasts
            .success(format!("{} deleted successfully!", R::SINGULAR))
            .await;
        self.cache.invalidate_queries(R::KEY).await;
        Ok(())
    }

    async fn update_optimistically(&self, id: &str, data: &UpdatePayload<R>) -> PanelResult<R::Record> {
        let patch = optimistic_patch(data, R::WRITE_ONLY)?;
        let detail_key = QueryKey::detail(R::KEY, id);
        let list_key = QueryKey::list(R::KEY);

        // A read landing mid-request would overwrite the optimistic state
        self.cache.cancel_queries(R::KEY).await;
        let snapshots = vec![
            self.cache.snapshot(&detail_key).await,
            self.cache.snapshot(&list_key).await,
        ];

        let mut patched_item = None;
        self.cache
            .update_query_data(&list_key, |list| {
                if let Value::Array(items) = list {
                    for item in items.iter_mut().filter(|item| record_id(item) == Some(id)) {
                        merge_patch(item, &patch);
                        patched_item = Some(item.clone());
                    }
                }
            })
            .await;
        let detail_cached = self
            .cache
            .update_query_data(&detail_key, |record| merge_patch(record, &patch))
            .await;
        if let (false, Some(item)) = (detail_cached, patched_item) {
            self.cache.set_query_data(detail_key, item).await;
        }

        match self.api.update(id, data).await {
            Ok(updated) => Ok(updated),
            Err(e) => {
                for snapshot in snapshots {
                    self.cache.restore(snapshot).await;
                }
                warn!("Rolled back optimistic update of {}/{}", R::KEY, id);
                Err(e.into())
            }
        }
    }

    /// Reserve a record for a mutation; a rejection is surfaced as a warning
    async fn claim(&self, resource: &str, id: &str, operation: &str) -> PanelResult<MutationGuard> {
        let target = MutationTracker::target(resource, id);
        match self.tracker.try_start(&target, operation) {
            Ok(guard) => Ok(guard),
            Err(busy) => {
                self.toasts.warning(busy.to_string()).await;
                Err(busy)
            }
        }
    }
}

impl ResourceHooks<Agents> {
    #[instrument(skip(self))]
    pub async fn bulk_delete(&self, ids: &[String]) -> PanelResult<()> {
        if ids.is_empty() {
            return Ok(());
        }
        self.api.bulk_delete(ids).await?;

        self.toasts
            .success(format!("{} agent(s) deleted successfully!", ids.len()))
            .await;
        self.cache.invalidate_queries(Agents::KEY).await;
        info!("Bulk deleted {} agents", ids.len());
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn set_enabled(&self, id: &str, enabled: bool) -> PanelResult<Agent> {
        let claim = self.claim(Agents::KEY, id, "toggle").await?;
        let agent = self.api.set_enabled(id, enabled).await;
        drop(claim);
        let agent = agent?;

        let state = if enabled { "enabled" } else { "disabled" };
        self.toasts
            .success(format!("Agent {} successfully!", state))
            .await;
        self.cache.invalidate_queries(Agents::KEY).await;
        Ok(agent)
    }
}

/// Cached analytics reads
#[derive(Clone)]
pub struct AnalyticsHooks {
    api: AnalyticsApi,
    cache: QueryCache,
}

impl AnalyticsHooks {
    pub fn new(api: AnalyticsApi, cache: QueryCache) -> Self {
        Self { api, cache }
    }

    pub async fn recent_activity(&self) -> Result<Vec<ActivityItem>, ApiError> {
        let api = self.api.clone();
        self.cache
            .fetch_query(QueryKey::list(query_keys::RECENT_ACTIVITY), move || {
                let api = api.clone();
                async move { api.activity().await }
            })
            .await
    }

    pub async fn traffic(&self, range: TrafficRange) -> Result<Value, ApiError> {
        let api = self.api.clone();
        let key = QueryKey::with_params(
            query_keys::DASHBOARD_STATS,
            format!("traffic:{}", range.cache_param()),
        );
        self.cache
            .fetch_query(key, move || {
                let api = api.clone();
                async move { api.traffic(&range).await }
            })
            .await
    }

    pub async fn server_stats(&self) -> Result<Value, ApiError> {
        let api = self.api.clone();
        self.cache
            .fetch_query(QueryKey::list(query_keys::DASHBOARD_STATS), move || {
                let api = api.clone();
                async move { api.stats().await }
            })
            .await
    }
}

fn optimistic_patch<P: Serialize>(data: &P, write_only: &[&str]) -> PanelResult<Map<String, Value>> {
    match serde_json::to_value(data) {
        Ok(Value::Object(mut fields)) => {
            for field in write_only {
                fields.remove(*field);
            }
            Ok(fields)
        }
        Ok(_) => Ok(Map::new()),
        Err(e) => Err(PanelError::Other(format!("Failed to encode update: {}", e))),
    }
}

/// Shallow merge; nested objects are replaced as a whole
fn merge_patch(target: &mut Value, patch: &Map<String, Value>) {
    if let Value::Object(fields) = target {
        for (key, value) in patch {
            fields.insert(key.clone(), value.clone());
        }
    }
}

fn record_id(record: &Value) -> Option<&str> {
    record
        .get("_id")
        .or_else(|| record.get("id"))
        .and_then(Value::as_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schemas::UpdateUser;

    #[test]
    fn test_patch_drops_write_only_fields() {
        let update = UpdateUser {
            username: Some("renamed".to_string()),
            password: Some("Secret123".to_string()),
            ..Default::default()
        };
        let patch = optimistic_patch(&update, &["password"]).unwrap();
        assert_eq!(patch.get("username"), Some(&Value::from("renamed")));
        assert!(!patch.contains_key("password"));
    }

    #[test]
    fn test_merge_replaces_nested_objects() {
        let mut record = serde_json::json!({
            "_id": "a1",
            "name": "edge-01",
            "capabilities": {"http": true, "dns": true}
        });
        let patch = serde_json::json!({"capabilities": {"tcp": true}});
        merge_patch(&mut record, patch.as_object().unwrap());

        assert_eq!(record["name"], "edge-01");
        assert_eq!(record["capabilities"], serde_json::json!({"tcp": true}));
        assert_eq!(record_id(&record), Some("a1"));
    }
}
