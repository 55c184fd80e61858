use serde::Serialize;

use super::{Resource, ResourceApi};
use crate::constants::query_keys;
use crate::errors::ApiError;
use crate::schemas::{Agent, AgentSchema};

pub struct Agents;

impl Resource for Agents {
    type Record = Agent;
    type Schema = AgentSchema;

    const KEY: &'static str = query_keys::AGENTS;
    const BASE_PATH: &'static str = "/admin/agents";
    const SINGULAR: &'static str = "Agent";
    const PLURAL: &'static str = "agents";
}

#[derive(Serialize)]
struct BulkDelete<'a> {
    ids: &'a [String],
}

#[derive(Serialize)]
struct SetEnabled {
    enabled: bool,
}

impl ResourceApi<Agents> {
    pub async fn bulk_delete(&self, ids: &[String]) -> Result<(), ApiError> {
        let path = format!("{}/bulk-delete", Agents::BASE_PATH);
        self.client().post_no_content(&path, &BulkDelete { ids }).await
    }

    pub async fn set_enabled(&self, id: &str, enabled: bool) -> Result<Agent, ApiError> {
        self.client()
            .put(&Agents::detail_path(id), &SetEnabled { enabled })
            .await
    }
}
