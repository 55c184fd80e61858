//! Common test data

use serde_json::{json, Value};

pub mod tokens {
    pub const VALID: &str = "test-token-123";
}

pub fn agent_json(id: &str, name: &str, ip: &str, connected: bool) -> Value {
    json!({
        "_id": id,
        "name": name,
        "ip": ip,
        "port": 8080,
        "capabilities": { "http": true, "https": false, "tcp": false, "udp": false, "dns": false },
        "status": if connected { "connected" } else { "disconnected" },
        "createdAt": "2025-02-10T04:51:23Z"
    })
}

/// `count` agents named edge-01.. with alternating status
pub fn agents(count: usize) -> Value {
    Value::Array(
        (1..=count)
            .map(|i| {
                agent_json(
                    &format!("agent-{:03}", i),
                    &format!("edge-{:02}", i),
                    &format!("10.0.0.{}", i),
                    i % 2 == 0,
                )
            })
            .collect(),
    )
}

pub fn user_json(id: &str, username: &str, role: &str) -> Value {
    json!({
        "_id": id,
        "username": username,
        "role": role,
        "createdAt": "2025-01-01T00:00:00Z"
    })
}

pub fn activity_json(
    id: &str,
    action: &str,
    description: &str,
    severity: &str,
    user: Option<&str>,
) -> Value {
    json!({
        "id": id,
        "timestamp": "2025-02-10T04:51:23Z",
        "action": action,
        "description": description,
        "severity": severity,
        "user": user,
        "ip": "192.168.1.105"
    })
}

pub fn audit_entries() -> Value {
    json!([
        activity_json("log-1", "agent.create", "Created agent edge-01", "success", Some("admin")),
        activity_json("log-2", "user.login", "User logged in successfully", "info", Some("john.doe")),
        activity_json("log-3", "agent.delete", "Deleted agent edge-02, \"old\"", "warning", Some("admin")),
        activity_json("log-4", "system.backup", "Backup failed", "error", None),
    ])
}
