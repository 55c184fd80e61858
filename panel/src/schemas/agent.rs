use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::patterns::{IDENTIFIER, IPV4};
use super::validator::Validator;
use super::{FieldKind, FieldSpec, FormValues, Record, Schema};
use crate::constants::limits::NAME_MAX_LEN;
use crate::errors::FieldErrors;

pub const AGENT_CAPABILITIES: &[&str] = &["http", "https", "tcp", "udp", "dns"];

choice_enum! {
    /// Connection state reported by the backend
    AgentStatus default Disconnected {
        Connected => "connected",
        Disconnected => "disconnected",
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    #[serde(default)]
    pub http: bool,
    #[serde(default)]
    pub https: bool,
    #[serde(default)]
    pub tcp: bool,
    #[serde(default)]
    pub udp: bool,
    #[serde(default)]
    pub dns: bool,
}

impl Capabilities {
    /// Names of the enabled capabilities, in declaration order
    pub fn enabled(&self) -> Vec<&'static str> {
        AGENT_CAPABILITIES
            .iter()
            .zip([self.http, self.https, self.tcp, self.udp, self.dns])
            .filter_map(|(name, on)| on.then_some(*name))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Agent {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: String,
    pub ip: String,
    pub port: u16,
    #[serde(default)]
    pub capabilities: Capabilities,
    #[serde(default)]
    pub status: AgentStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_heartbeat: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Agent {
    pub fn is_connected(&self) -> bool {
        self.status == AgentStatus::Connected
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateAgent {
    pub name: String,
    pub ip: String,
    pub port: u16,
    pub capabilities: Capabilities,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UpdateAgent {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<Capabilities>,
}

const NAME_REQUIRED: &str = "Name is required";
const NAME_TOO_LONG: &str = "Name must be less than 100 characters";
const NAME_PATTERN: &str = "Name can only contain letters, numbers, hyphens, and underscores";
const IP_REQUIRED: &str = "IP address is required";
const IP_INVALID: &str = "Invalid IPv4 address";
const PORT_NAN: &str = "Port must be a number";
const PORT_INTEGER: &str = "Port must be an integer";
const PORT_MIN: &str = "Port must be at least 1";
const PORT_MAX: &str = "Port must be at most 65535";

static FIELDS: &[FieldSpec] = &[
    FieldSpec::new("name", "Agent Name", FieldKind::Text)
        .required()
        .placeholder("Enter agent name")
        .describe("A unique name to identify this agent"),
    FieldSpec::new("ip", "IP Address", FieldKind::Text)
        .required()
        .placeholder("192.168.1.100")
        .describe("The IP address of the agent server"),
    FieldSpec::new("port", "Port", FieldKind::Number)
        .required()
        .placeholder("8080")
        .describe("Port number (1-65535)"),
    FieldSpec::new("capabilities.http", "HTTP", FieldKind::Checkbox).describe("Handle HTTP traffic"),
    FieldSpec::new("capabilities.https", "HTTPS", FieldKind::Checkbox)
        .describe("Handle HTTPS traffic"),
    FieldSpec::new("capabilities.tcp", "TCP", FieldKind::Checkbox).describe("Handle TCP connections"),
    FieldSpec::new("capabilities.udp", "UDP", FieldKind::Checkbox).describe("Handle UDP packets"),
    FieldSpec::new("capabilities.dns", "DNS", FieldKind::Checkbox).describe("Handle DNS queries"),
];

pub struct AgentSchema;

impl AgentSchema {
    fn capabilities(v: &mut Validator<'_>) -> Capabilities {
        Capabilities {
            http: v.flag("capabilities.http"),
            https: v.flag("capabilities.https"),
            tcp: v.flag("capabilities.tcp"),
            udp: v.flag("capabilities.udp"),
            dns: v.flag("capabilities.dns"),
        }
    }
}

impl Schema for AgentSchema {
    type Create = CreateAgent;
    type Update = UpdateAgent;

    const ENTITY: &'static str = "Agent";

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn defaults() -> FormValues {
        FormValues::new()
            .with_text("name", "")
            .with_text("ip", "")
            .with_text("port", "8080")
            .with_bool("capabilities.http", false)
            .with_bool("capabilities.https", false)
            .with_bool("capabilities.tcp", false)
            .with_bool("capabilities.udp", false)
            .with_bool("capabilities.dns", false)
    }

    fn validate_create(values: &FormValues) -> Result<CreateAgent, FieldErrors> {
        let mut v = Validator::new(values);

        let name = v
            .text("name")
            .min_len(1, NAME_REQUIRED)
            .max_len(NAME_MAX_LEN, NAME_TOO_LONG)
            .matches(&IDENTIFIER, NAME_PATTERN)
            .finish();
        let ip = v
            .text("ip")
            .min_len(1, IP_REQUIRED)
            .matches(&IPV4, IP_INVALID)
            .finish();
        let port = v
            .number("port", PORT_NAN)
            .integer(PORT_INTEGER)
            .min(1.0, PORT_MIN)
            .max(65535.0, PORT_MAX)
            .finish();
        let capabilities = Self::capabilities(&mut v);

        v.finish(|| {
            Some(CreateAgent {
                name: name?,
                ip: ip?,
                port: port? as u16,
                capabilities,
            })
        })
    }

    fn validate_update(values: &FormValues) -> Result<UpdateAgent, FieldErrors> {
        let mut v = Validator::new(values);

        let name = v
            .optional_text("name")
            .min_len(1, NAME_REQUIRED)
            .max_len(NAME_MAX_LEN, NAME_TOO_LONG)
            .matches(&IDENTIFIER, NAME_PATTERN)
            .finish();
        let ip = v
            .optional_text("ip")
            .min_len(1, IP_REQUIRED)
            .matches(&IPV4, IP_INVALID)
            .finish();
        let port = v
            .optional_number("port", PORT_NAN)
            .integer(PORT_INTEGER)
            .min(1.0, PORT_MIN)
            .max(65535.0, PORT_MAX)
            .finish();
        let capabilities = values
            .has_group("capabilities")
            .then(|| Self::capabilities(&mut v));

        v.finish(|| {
            Some(UpdateAgent {
                name,
                ip,
                port: port.map(|p| p as u16),
                capabilities,
            })
        })
    }
}

impl Record for Agent {
    fn id(&self) -> &str {
        &self.id
    }

    fn to_form_values(&self) -> FormValues {
        FormValues::new()
            .with_text("name", self.name.clone())
            .with_text("ip", self.ip.clone())
            .with_text("port", self.port.to_string())
            .with_bool("capabilities.http", self.capabilities.http)
            .with_bool("capabilities.https", self.capabilities.https)
            .with_bool("capabilities.tcp", self.capabilities.tcp)
            .with_bool("capabilities.udp", self.capabilities.udp)
            .with_bool("capabilities.dns", self.capabilities.dns)
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn valid_agent() -> FormValues {
        AgentSchema::defaults()
            .with_text("name", "edge-01")
            .with_text("ip", "10.0.0.5")
            .with_text("port", "8080")
            .with_bool("capabilities.http", true)
    }

    #[test]
    fn test_create_coerces_port_and_defaults_capabilities() {
        let agent = AgentSchema::validate_create(&valid_agent()).unwrap();
        assert_eq!(agent.port, 8080);
        assert!(agent.capabilities.http);
        assert!(!agent.capabilities.dns);

        let body = serde_json::to_value(&agent).unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "name": "edge-01",
                "ip": "10.0.0.5",
                "port": 8080,
                "capabilities": {"http": true, "https": false, "tcp": false, "udp": false, "dns": false}
            })
        );
    }

    #[rstest]
    #[case("port", "0", PORT_MIN)]
    #[case("port", "65536", PORT_MAX)]
    #[case("port", "80.5", PORT_INTEGER)]
    #[case("port", "http", PORT_NAN)]
    #[case("ip", "256.1.1.1", IP_INVALID)]
    #[case("ip", "", IP_REQUIRED)]
    #[case("name", "edge 01", NAME_PATTERN)]
    #[case("name", "", NAME_REQUIRED)]
    fn test_create_rejects(#[case] path: &str, #[case] value: &str, #[case] message: &str) {
        let values = valid_agent().with_text(path, value);
        let errors = AgentSchema::validate_create(&values).unwrap_err();
        assert_eq!(errors.first(path), Some(message));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_create_reports_every_failing_field() {
        let errors = AgentSchema::validate_create(&AgentSchema::defaults()).unwrap_err();
        assert!(errors.contains("name"));
        assert!(errors.contains("ip"));
        assert!(!errors.contains("port"));
    }

    #[test]
    fn test_update_is_partial() {
        let values = FormValues::new().with_text("port", "9090");
        let update = AgentSchema::validate_update(&values).unwrap();
        assert_eq!(update.port, Some(9090));
        assert!(update.capabilities.is_none());
        assert_eq!(serde_json::to_value(&update).unwrap(), serde_json::json!({"port": 9090}));
    }

    #[test]
    fn test_update_sends_capabilities_as_a_whole() {
        let values = FormValues::new().with_bool("capabilities.tcp", true);
        let update = AgentSchema::validate_update(&values).unwrap();
        let caps = update.capabilities.unwrap();
        assert!(caps.tcp);
        assert!(!caps.http);
    }

    #[test]
    fn test_record_round_trips_into_form() {
        let agent: Agent = serde_json::from_value(serde_json::json!({
            "_id": "a1",
            "name": "edge-01",
            "ip": "10.0.0.5",
            "port": 8080,
            "capabilities": {"http": true, "dns": true},
            "status": "connected",
            "lastHeartbeat": "2024-01-15T10:30:00Z"
        }))
        .unwrap();

        assert!(agent.is_connected());
        assert_eq!(agent.capabilities.enabled(), vec!["http", "dns"]);

        let form = agent.to_form_values();
        let update = AgentSchema::validate_update(&form).unwrap();
        assert_eq!(update.name.as_deref(), Some("edge-01"));
        assert_eq!(update.port, Some(8080));
    }
}
