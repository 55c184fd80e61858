//! Mock Nimbus backend for testing
//!
//! Serves the admin API endpoints the console calls, without a real backend.

use serde_json::{json, Value};
use std::time::Duration;
use wiremock::{
    matchers::{body_json, method, path},
    Mock, MockServer, Request, ResponseTemplate,
};

pub struct MockNimbusServer {
    pub server: MockServer,
    pub base_url: String,
}

impl MockNimbusServer {
    pub async fn start() -> Self {
        let server = MockServer::start().await;
        let base_url = server.uri();
        Self { server, base_url }
    }

    /// GET `endpoint` answers with `body`
    pub async fn mock_list(&self, endpoint: &str, body: Value) {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&self.server)
            .await;
    }

    /// GET `endpoint` answers with `body`, but only `times` times
    pub async fn mock_list_times(&self, endpoint: &str, body: Value, times: u64) {
        Mock::given(method("GET"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .up_to_n_times(times)
            .mount(&self.server)
            .await;
    }

    /// POST `endpoint` with exactly `expected` answers 201 with `created`
    pub async fn mock_create(&self, endpoint: &str, expected: Value, created: Value) {
        Mock::given(method("POST"))
            .and(path(endpoint))
            .and(body_json(expected))
            .respond_with(ResponseTemplate::new(201).set_body_json(created))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// PUT `endpoint` answers with `updated` after `delay`
    pub async fn mock_update(&self, endpoint: &str, updated: Value, delay: Duration) {
        Mock::given(method("PUT"))
            .and(path(endpoint))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(updated)
                    .set_delay(delay),
            )
            .mount(&self.server)
            .await;
    }

    pub async fn mock_delete(&self, endpoint: &str) {
        Mock::given(method("DELETE"))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    pub async fn mock_bulk_delete(&self, ids: &[&str]) {
        Mock::given(method("POST"))
            .and(path("/admin/agents/bulk-delete"))
            .and(body_json(json!({ "ids": ids })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "deleted": ids.len() })))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    /// `verb endpoint` fails with `status` and a `{"message": ...}` body
    pub async fn mock_error(
        &self,
        verb: &str,
        endpoint: &str,
        status: u16,
        message: &str,
        delay: Duration,
    ) {
        Mock::given(method(verb))
            .and(path(endpoint))
            .respond_with(
                ResponseTemplate::new(status)
                    .set_body_json(json!({ "message": message }))
                    .set_delay(delay),
            )
            .mount(&self.server)
            .await;
    }

    pub async fn mock_login_success(&self, token: &str, username: &str) {
        Mock::given(method("POST"))
            .and(path("/auth/login"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "token": token,
                "user": { "_id": "user-001", "username": username, "role": "admin" }
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_unauthorized(&self, verb: &str, endpoint: &str) {
        Mock::given(method(verb))
            .and(path(endpoint))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "message": "Token expired"
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn requests(&self) -> Vec<Request> {
        self.server.received_requests().await.unwrap_or_default()
    }

    /// Requests made with `verb` to `endpoint`
    pub async fn requests_to(&self, verb: &str, endpoint: &str) -> Vec<Request> {
        self.requests()
            .await
            .into_iter()
            .filter(|r| r.method.as_str() == verb && r.url.path() == endpoint)
            .collect()
    }
}
