//! Integration tests for list pages: paging, sorting and filtering of
//! backend data

mod common;

use common::fixtures::*;
use nimbus_panel::pages::{users_page, AgentsPage};
use nimbus_panel::table::SortDirection;
use rstest::rstest;
use serde_json::json;

async fn loaded_agents(count: usize) -> (MockNimbusServer, TestPanel, AgentsPage) {
    let mock = MockNimbusServer::start().await;
    mock.mock_list("/admin/agents", agents(count)).await;
    let panel = TestPanel::new(&mock.base_url).await;
    let mut page = AgentsPage::new(&panel.state);
    page.page_mut().refresh().await.unwrap();
    (mock, panel, page)
}

#[tokio::test]
async fn test_twenty_five_rows_span_three_pages() {
    let (_mock, _panel, mut page) = loaded_agents(25).await;
    let table = page.page_mut().table_mut();

    assert_eq!(table.page_count(), 3);
    assert_eq!(table.page_rows().len(), 10);
    assert!(!table.can_previous_page());

    table.set_page(2);
    assert_eq!(table.page_rows().len(), 5);
    assert!(!table.can_next_page());

    table.set_page(99);
    assert_eq!(table.page_index(), 2);

    assert!(table.set_page_size(25));
    assert_eq!(table.page_count(), 1);
    assert!(!table.set_page_size(0));
    assert_eq!(table.page_size(), 25);

    assert!(table.set_page_size(12));
    assert_eq!(table.page_count(), 3);
    assert_eq!(table.page_index(), 0);
    assert_eq!(table.page_rows().len(), 12);
}

#[tokio::test]
async fn test_sort_cycles_through_directions() {
    let (_mock, _panel, mut page) = loaded_agents(12).await;
    let table = page.page_mut().table_mut();

    let asc = table.toggle_sort("name").unwrap();
    assert_eq!(asc.direction, SortDirection::Ascending);
    assert_eq!(table.page_rows()[0].name, "edge-01");

    let desc = table.toggle_sort("name").unwrap();
    assert_eq!(desc.direction, SortDirection::Descending);
    assert_eq!(table.page_rows()[0].name, "edge-12");

    assert!(table.toggle_sort("name").is_none());
    assert!(table.sort_state().is_none());

    // Capabilities are not sortable
    assert!(table.toggle_sort("capabilities").is_none());
}

#[rstest]
#[case("edge-1", 3)]
#[case("EDGE-0", 9)]
#[case("nothing-matches", 0)]
#[tokio::test]
async fn test_global_filter(#[case] filter: &str, #[case] expected: usize) {
    let (_mock, _panel, mut page) = loaded_agents(12).await;
    let table = page.page_mut().table_mut();

    table.set_page(1);
    table.set_global_filter(filter);
    assert_eq!(table.filtered_count(), expected);
    assert_eq!(table.page_index(), 0);

    if expected == 0 {
        assert!(table.render_text().contains("No results found."));
    }
}

#[tokio::test]
async fn test_users_page_renders_rows() {
    let mock = MockNimbusServer::start().await;
    mock.mock_list(
        "/auth/users",
        json!([
            user_json("user-001", "admin", "admin"),
            user_json("user-002", "operator", "user"),
        ]),
    )
    .await;

    let panel = TestPanel::new(&mock.base_url).await;
    let mut page = users_page(&panel.state);
    assert_eq!(page.refresh().await.unwrap(), 2);

    let text = page.table().render_text();
    assert!(text.contains("operator"));
    assert!(text.contains("Page 1 of 1"));
}
