//! Resource API modules
//!
//! Each backend resource is a zero-sized marker implementing `Resource`; the
//! generic `ResourceApi` maps the CRUD verbs onto `R::BASE_PATH`. Modules hold
//! no business logic and never notify: failures are classified and reported
//! by the HTTP client before they reach the caller.

pub mod agents;
pub mod analytics;
pub mod auth;
pub mod geodns;
pub mod routes;
pub mod rules;
pub mod users;

use std::marker::PhantomData;
use tracing::debug;

use crate::errors::ApiError;
use crate::http::ApiClient;
use crate::schemas::{Record, Schema};

pub use agents::Agents;
pub use analytics::{ActivityItem, AnalyticsApi, DashboardStats, Severity, TrafficRange};
pub use auth::{AuthApi, LoginResponse};
pub use geodns::GeoDns;
pub use routes::Routes;
pub use rules::Rules;
pub use users::Users;

/// A REST resource managed by the console
pub trait Resource: Send + Sync + 'static {
    type Record: Record;
    type Schema: Schema;

    /// Root query key; every cached entry of this resource lives under it
    const KEY: &'static str;

    const BASE_PATH: &'static str;

    /// Name of one record in messages ("Agent", "DNS record")
    const SINGULAR: &'static str;

    /// Lower-case plural used in messages ("agents", "DNS records")
    const PLURAL: &'static str;

    /// Fields accepted on write but never echoed back
    const WRITE_ONLY: &'static [&'static str] = &[];

    fn detail_path(id: &str) -> String {
        format!("{}/{}", Self::BASE_PATH, id)
    }
}

pub type CreatePayload<R> = <<R as Resource>::Schema as Schema>::Create;
pub type UpdatePayload<R> = <<R as Resource>::Schema as Schema>::Update;

pub struct ResourceApi<R: Resource> {
    client: ApiClient,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> Clone for ResourceApi<R> {
    fn clone(&self) -> Self {
        Self::new(self.client.clone())
    }
}

impl<R: Resource> ResourceApi<R> {
    pub fn new(client: ApiClient) -> Self {
        Self {
            client,
            _resource: PhantomData,
        }
    }

    pub fn client(&self) -> &ApiClient {
        &self.client
    }

    pub async fn list(&self) -> Result<Vec<R::Record>, ApiError> {
        debug!("GET {}", R::BASE_PATH);
        self.client.get(R::BASE_PATH).await
    }

    pub async fn get(&self, id: &str) -> Result<R::Record, ApiError> {
        self.client.get(&R::detail_path(id)).await
    }

    pub async fn create(&self, data: &CreatePayload<R>) -> Result<R::Record, ApiError> {
        self.client.post(R::BASE_PATH, data).await
    }

    pub async fn update(&self, id: &str, data: &UpdatePayload<R>) -> Result<R::Record, ApiError> {
        self.client.put(&R::detail_path(id), data).await
    }

    pub async fn delete(&self, id: &str) -> Result<(), ApiError> {
        self.client.delete(&R::detail_path(id)).await
    }
}
