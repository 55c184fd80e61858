//! Integration tests for agent management against a mock backend
//!
//! These cover the full path from form input to request payload, cache
//! invalidation, optimistic updates and their rollback.

mod common;

use common::fixtures::*;
use nimbus_panel::api::{Agents, Resource};
use nimbus_panel::notifications::ToastKind;
use nimbus_panel::pages::AgentsPage;
use nimbus_panel::query::QueryKey;
use nimbus_panel::schemas::{Agent, UpdateAgent};
use nimbus_panel::{ApiError, PanelError};
use serde_json::json;
use std::time::Duration;
use wiremock::matchers::{method, path};
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_create_agent_sends_validated_payload_and_refetches() {
    let mock = MockNimbusServer::start().await;
    mock.mock_list("/admin/agents", agents(2)).await;
    mock.mock_create(
        "/admin/agents",
        json!({
            "name": "edge-99",
            "ip": "10.0.0.99",
            "port": 8080,
            "capabilities": { "http": true, "https": false, "tcp": false, "udp": true, "dns": false }
        }),
        agent_json("agent-099", "edge-99", "10.0.0.99", false),
    )
    .await;

    let panel = TestPanel::new(&mock.base_url).await;
    panel.sign_in(tokens::VALID).await;

    let mut agents_page = AgentsPage::new(&panel.state);
    agents_page.page_mut().refresh().await.unwrap();

    let form = agents_page.page_mut().open_create();
    assert_eq!(form.submit_button().label(), "Create Agent");
    form.set_text("name", "edge-99");
    form.set_text("ip", "10.0.0.99");
    form.set_bool("capabilities.http", true);
    form.set_bool("capabilities.udp", true);

    let created = agents_page.page_mut().submit().await.unwrap();
    assert_eq!(created.id, "agent-099");
    assert!(!agents_page.page().is_dialog_open());

    let posts = mock.requests_to("POST", "/admin/agents").await;
    assert_eq!(posts.len(), 1);
    assert_eq!(
        posts[0].headers.get("authorization").unwrap(),
        "Bearer test-token-123"
    );

    // Invalidation forces the list to be fetched again
    assert_eq!(mock.requests_to("GET", "/admin/agents").await.len(), 2);
    assert_eq!(
        panel.state.toasts.last().await.unwrap().message,
        "Agent created successfully!"
    );
}

#[tokio::test]
async fn test_invalid_form_sends_nothing() {
    let mock = MockNimbusServer::start().await;
    mock.mock_list("/admin/agents", agents(1)).await;

    let panel = TestPanel::new(&mock.base_url).await;
    let mut agents_page = AgentsPage::new(&panel.state);

    let form = agents_page.page_mut().open_create();
    form.set_text("name", "edge 99");
    form.set_text("ip", "10.0.0");

    let result = agents_page.page_mut().submit().await;
    assert!(matches!(result, Err(PanelError::Validation(_))));

    let form = agents_page.page().form().unwrap();
    assert_eq!(form.field_error("ip"), Some("Invalid IPv4 address"));
    assert!(form.field_error("name").is_some());
    assert!(mock.requests_to("POST", "/admin/agents").await.is_empty());
}

#[tokio::test]
async fn test_server_rejection_keeps_dialog_open_with_root_error() {
    let mock = MockNimbusServer::start().await;
    mock.mock_list("/admin/agents", agents(2)).await;
    mock.mock_error(
        "POST",
        "/admin/agents",
        422,
        "Agent name already exists",
        Duration::ZERO,
    )
    .await;

    let panel = TestPanel::new(&mock.base_url).await;
    let mut agents_page = AgentsPage::new(&panel.state);
    agents_page.page_mut().refresh().await.unwrap();

    let form = agents_page.page_mut().open_create();
    form.set_text("name", "edge-01");
    form.set_text("ip", "10.0.0.1");

    let result = agents_page.page_mut().submit().await;
    assert!(matches!(
        result,
        Err(PanelError::Api(ApiError::Validation { .. }))
    ));

    let form = agents_page.page().form().expect("dialog stays open");
    assert_eq!(form.root_error(), Some("Agent name already exists"));
    assert!(!form.is_submitting());

    // One error toast from the HTTP layer, no refetch
    assert_eq!(panel.state.toasts.count(ToastKind::Error).await, 1);
    assert_eq!(panel.state.toasts.count(ToastKind::Success).await, 0);
    assert_eq!(mock.requests_to("GET", "/admin/agents").await.len(), 1);
}

#[tokio::test]
async fn test_update_is_applied_optimistically_and_blocks_double_submit() {
    let mock = MockNimbusServer::start().await;
    mock.mock_list("/admin/agents", agents(3)).await;
    mock.mock_update(
        "/admin/agents/agent-002",
        agent_json("agent-002", "edge-renamed", "10.0.0.2", true),
        Duration::from_millis(400),
    )
    .await;

    let panel = TestPanel::new(&mock.base_url).await;
    let hooks = panel.state.hooks::<Agents>();
    hooks.list().await.unwrap();
    let list_key = QueryKey::list(Agents::KEY);

    let rename = UpdateAgent {
        name: Some("edge-renamed".to_string()),
        ..Default::default()
    };

    let (updated, (cached, second)) = tokio::join!(hooks.update("agent-002", rename), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        let cached: Vec<Agent> = panel.state.cache.get_query_data(&list_key).await.unwrap();
        let second = hooks.update("agent-002", UpdateAgent::default()).await;
        (cached, second)
    });

    assert_eq!(cached[1].name, "edge-renamed");
    assert_eq!(cached[0].name, "edge-01");
    assert!(matches!(second, Err(PanelError::Busy { .. })));
    assert_eq!(panel.state.toasts.count(ToastKind::Warning).await, 1);

    assert_eq!(updated.unwrap().name, "edge-renamed");
    assert!(!panel.state.cache.is_fresh(&list_key).await);
    assert_eq!(mock.requests_to("PUT", "/admin/agents/agent-002").await.len(), 1);
}

#[tokio::test]
async fn test_failed_update_rolls_back_cached_list() {
    let mock = MockNimbusServer::start().await;
    mock.mock_list("/admin/agents", agents(3)).await;
    mock.mock_error(
        "PUT",
        "/admin/agents/agent-002",
        422,
        "IP address already in use",
        Duration::from_millis(300),
    )
    .await;

    let panel = TestPanel::new(&mock.base_url).await;
    let hooks = panel.state.hooks::<Agents>();
    hooks.list().await.unwrap();
    let list_key = QueryKey::list(Agents::KEY);

    let change = UpdateAgent {
        name: Some("edge-moved".to_string()),
        ..Default::default()
    };
    let (result, during) = tokio::join!(hooks.update("agent-002", change), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        let cached: Vec<Agent> = panel.state.cache.get_query_data(&list_key).await.unwrap();
        cached[1].name.clone()
    });

    assert_eq!(during, "edge-moved");
    assert!(result.is_err());

    let after: Vec<Agent> = panel.state.cache.get_query_data(&list_key).await.unwrap();
    assert_eq!(after[1].name, "edge-02");
    assert_eq!(
        panel.state.toasts.last().await.unwrap().message,
        "IP address already in use"
    );

    // The record is free again
    assert!(!panel.state.tracker.is_busy("agents/agent-002"));
}

#[tokio::test]
async fn test_failed_update_rolls_back_cached_detail() {
    let mock = MockNimbusServer::start().await;
    mock.mock_list(
        "/admin/agents/agent-002",
        agent_json("agent-002", "edge-02", "10.0.0.2", true),
    )
    .await;
    mock.mock_error(
        "PUT",
        "/admin/agents/agent-002",
        422,
        "Agent name already exists",
        Duration::from_millis(300),
    )
    .await;

    let panel = TestPanel::new(&mock.base_url).await;
    let hooks = panel.state.hooks::<Agents>();
    assert_eq!(hooks.get("agent-002").await.unwrap().name, "edge-02");
    let detail_key = QueryKey::detail(Agents::KEY, "agent-002");

    let change = UpdateAgent {
        name: Some("edge-new".to_string()),
        ..Default::default()
    };
    let (result, during) = tokio::join!(hooks.update("agent-002", change), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        let cached: Agent = panel.state.cache.get_query_data(&detail_key).await.unwrap();
        cached.name
    });

    assert_eq!(during, "edge-new");
    assert!(matches!(
        result,
        Err(PanelError::Api(ApiError::Validation { .. }))
    ));

    let after: Agent = panel.state.cache.get_query_data(&detail_key).await.unwrap();
    assert_eq!(after.name, "edge-02");
    assert_eq!(after.ip, "10.0.0.2");
    assert_eq!(panel.state.toasts.count(ToastKind::Error).await, 1);
    assert_eq!(
        panel.state.toasts.last().await.unwrap().message,
        "Agent name already exists"
    );
}

#[tokio::test]
async fn test_update_seeds_detail_from_cached_list_until_rollback() {
    let mock = MockNimbusServer::start().await;
    mock.mock_list("/admin/agents", agents(3)).await;
    mock.mock_error(
        "PUT",
        "/admin/agents/agent-003",
        500,
        "Internal error",
        Duration::from_millis(300),
    )
    .await;

    let panel = TestPanel::new(&mock.base_url).await;
    let hooks = panel.state.hooks::<Agents>();
    hooks.list().await.unwrap();
    let detail_key = QueryKey::detail(Agents::KEY, "agent-003");
    assert!(!panel.state.cache.contains(&detail_key).await);

    let change = UpdateAgent {
        name: Some("edge-west".to_string()),
        ..Default::default()
    };
    let (result, during) = tokio::join!(hooks.update("agent-003", change), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        panel.state.cache.get_query_data::<Agent>(&detail_key).await
    });

    let during = during.expect("detail entry seeded from the list");
    assert_eq!(during.name, "edge-west");
    assert_eq!(during.ip, "10.0.0.3");
    assert!(result.is_err());

    // Nothing was cached for the record before, so nothing is left behind
    assert!(!panel.state.cache.contains(&detail_key).await);
}

#[tokio::test]
async fn test_read_in_flight_does_not_clobber_optimistic_update() {
    let mock = MockNimbusServer::start().await;
    mock.mock_list_times("/admin/agents", agents(3), 1).await;
    Mock::given(method("GET"))
        .and(path("/admin/agents"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(agents(3))
                .set_delay(Duration::from_millis(200)),
        )
        .mount(&mock.server)
        .await;
    mock.mock_update(
        "/admin/agents/agent-002",
        agent_json("agent-002", "edge-renamed", "10.0.0.2", true),
        Duration::from_millis(400),
    )
    .await;

    let panel = TestPanel::new(&mock.base_url).await;
    let hooks = panel.state.hooks::<Agents>();
    hooks.list().await.unwrap();
    panel.state.cache.invalidate_queries(Agents::KEY).await;
    let list_key = QueryKey::list(Agents::KEY);

    let rename = UpdateAgent {
        name: Some("edge-renamed".to_string()),
        ..Default::default()
    };
    let (refetched, updated, during) = tokio::join!(
        hooks.list(),
        async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            hooks.update("agent-002", rename).await
        },
        async {
            // The slow read has landed by now
            tokio::time::sleep(Duration::from_millis(300)).await;
            let cached: Vec<Agent> = panel.state.cache.get_query_data(&list_key).await.unwrap();
            cached[1].name.clone()
        }
    );

    // Its caller still gets the server's answer
    assert_eq!(refetched.unwrap()[1].name, "edge-02");
    assert_eq!(during, "edge-renamed");
    assert_eq!(updated.unwrap().name, "edge-renamed");
}

#[tokio::test]
async fn test_cancelled_update_releases_the_record() {
    let mock = MockNimbusServer::start().await;
    mock.mock_update(
        "/admin/agents/agent-002",
        agent_json("agent-002", "edge-renamed", "10.0.0.2", true),
        Duration::from_millis(500),
    )
    .await;

    let panel = TestPanel::new(&mock.base_url).await;
    let hooks = panel.state.hooks::<Agents>();
    let rename = || UpdateAgent {
        name: Some("edge-renamed".to_string()),
        ..Default::default()
    };

    let abandoned =
        tokio::time::timeout(Duration::from_millis(100), hooks.update("agent-002", rename())).await;
    assert!(abandoned.is_err());
    assert!(!panel.state.tracker.is_busy("agents/agent-002"));

    let retried = hooks.update("agent-002", rename()).await;
    assert_eq!(retried.unwrap().name, "edge-renamed");
    assert_eq!(panel.state.toasts.count(ToastKind::Warning).await, 0);
    assert_eq!(
        panel.state.toasts.last().await.unwrap().message,
        "Agent updated successfully!"
    );
}

#[tokio::test]
async fn test_delete_requires_confirmation() {
    let mock = MockNimbusServer::start().await;
    mock.mock_list("/admin/agents", agents(2)).await;
    mock.mock_delete("/admin/agents/agent-001").await;

    let panel = TestPanel::new(&mock.base_url).await;
    let mut agents_page = AgentsPage::new(&panel.state);
    agents_page.page_mut().refresh().await.unwrap();

    agents_page.page_mut().request_delete("agent-001");
    assert_eq!(agents_page.page().pending_delete(), Some("agent-001"));
    assert!(mock.requests_to("DELETE", "/admin/agents/agent-001").await.is_empty());

    agents_page.page_mut().confirm_delete().await.unwrap();
    assert!(agents_page.page().pending_delete().is_none());
    assert_eq!(
        panel.state.toasts.last().await.unwrap().message,
        "Agent deleted successfully!"
    );

    let again = agents_page.page_mut().confirm_delete().await;
    assert!(matches!(again, Err(PanelError::Other(_))));
}

#[tokio::test]
async fn test_bulk_delete_sends_selected_ids() {
    let mock = MockNimbusServer::start().await;
    mock.mock_list("/admin/agents", agents(4)).await;
    mock.mock_bulk_delete(&["agent-001", "agent-003"]).await;

    let panel = TestPanel::new(&mock.base_url).await;
    let mut agents_page = AgentsPage::new(&panel.state);
    agents_page.page_mut().refresh().await.unwrap();

    let table = agents_page.page_mut().table_mut();
    table.select_row("agent-003", true);
    table.select_row("agent-001", true);
    table.select_row("agent-404", true);
    assert_eq!(table.selected_ids().len(), 2);

    let deleted = agents_page.delete_selected().await.unwrap();
    assert_eq!(deleted, 2);
    assert!(agents_page.page().table().selected_ids().is_empty());
    assert_eq!(
        panel.state.toasts.last().await.unwrap().message,
        "2 agent(s) deleted successfully!"
    );
}
