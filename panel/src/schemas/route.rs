use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validator::Validator;
use super::{FieldKind, FieldSpec, FormValues, Record, Schema};
use crate::constants::limits::{NAME_MAX_LEN, ROUTE_MAX_AGENTS, ROUTE_MIN_AGENTS, TEXT_MAX_LEN};
use crate::constants::query_keys;
use crate::errors::FieldErrors;

choice_enum! {
    RouteProtocol default Http {
        Http => "http",
        Https => "https",
        Tcp => "tcp",
        Udp => "udp",
    }
}

pub const ROUTE_PROTOCOLS: &[&str] = RouteProtocol::NAMES;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: String,
    pub source: String,
    pub destination: String,
    pub protocol: RouteProtocol,
    #[serde(default)]
    pub agents: Vec<String>,
    #[serde(default)]
    pub rules: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateRoute {
    pub name: String,
    pub source: String,
    pub destination: String,
    pub protocol: RouteProtocol,
    pub agents: Vec<String>,
    pub rules: Vec<String>,
}

/// Partial update; `agents` stays mandatory
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateRoute {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol: Option<RouteProtocol>,
    pub agents: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rules: Option<Vec<String>>,
}

const NAME_REQUIRED: &str = "Name is required";
const NAME_TOO_LONG: &str = "Name must be less than 100 characters";
const SOURCE_REQUIRED: &str = "Source is required";
const SOURCE_TOO_LONG: &str = "Source must be less than 500 characters";
const DESTINATION_REQUIRED: &str = "Destination is required";
const DESTINATION_TOO_LONG: &str = "Destination must be less than 500 characters";
const PROTOCOL_INVALID: &str = "Protocol must be one of: http, https, tcp, udp";
const AGENTS_MIN: &str = "At least one agent is required";
const AGENTS_MAX: &str = "Maximum 50 agents allowed";

static FIELDS: &[FieldSpec] = &[
    FieldSpec::new("name", "Route Name", FieldKind::Text)
        .required()
        .placeholder("Enter route name")
        .describe("A unique name to identify this route"),
    FieldSpec::new("protocol", "Protocol", FieldKind::Select(ROUTE_PROTOCOLS)).required(),
    FieldSpec::new("source", "Source", FieldKind::Text)
        .required()
        .placeholder("e.g., 0.0.0.0:8080 or :8080")
        .describe("Source address and port"),
    FieldSpec::new("destination", "Destination", FieldKind::Text)
        .required()
        .placeholder("e.g., backend.example.com:8080")
        .describe("Destination address and port"),
    FieldSpec::new(
        "agents",
        "Agents",
        FieldKind::Reference {
            resource: query_keys::AGENTS,
            multiple: true,
        },
    )
    .required()
    .describe("Agents serving this route (1-50)"),
    FieldSpec::new(
        "rules",
        "Rules",
        FieldKind::Reference {
            resource: query_keys::RULES,
            multiple: true,
        },
    ),
];

pub struct RouteSchema;

impl RouteSchema {
    fn agents(v: &mut Validator<'_>) -> Option<Vec<String>> {
        v.list("agents")
            .min_items(ROUTE_MIN_AGENTS, AGENTS_MIN)
            .max_items(ROUTE_MAX_AGENTS, AGENTS_MAX)
            .finish()
    }
}

impl Schema for RouteSchema {
    type Create = CreateRoute;
    type Update = UpdateRoute;

    const ENTITY: &'static str = "Route";

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn defaults() -> FormValues {
        FormValues::new()
            .with_text("name", "")
            .with_text("source", "")
            .with_text("destination", "")
            .with_text("protocol", RouteProtocol::Http.to_string())
            .with_list("agents", Vec::<String>::new())
            .with_list("rules", Vec::<String>::new())
    }

    fn validate_create(values: &FormValues) -> Result<CreateRoute, FieldErrors> {
        let mut v = Validator::new(values);

        let name = v
            .text("name")
            .min_len(1, NAME_REQUIRED)
            .max_len(NAME_MAX_LEN, NAME_TOO_LONG)
            .finish();
        let source = v
            .text("source")
            .min_len(1, SOURCE_REQUIRED)
            .max_len(TEXT_MAX_LEN, SOURCE_TOO_LONG)
            .finish();
        let destination = v
            .text("destination")
            .min_len(1, DESTINATION_REQUIRED)
            .max_len(TEXT_MAX_LEN, DESTINATION_TOO_LONG)
            .finish();
        let protocol = v.choice::<RouteProtocol>("protocol", PROTOCOL_INVALID);
        let agents = Self::agents(&mut v);
        let rules = v.list("rules").finish();

        v.finish(|| {
            Some(CreateRoute {
                name: name?,
                source: source?,
                destination: destination?,
                protocol: protocol?,
                agents: agents?,
                rules: rules.unwrap_or_default(),
            })
        })
    }

    fn validate_update(values: &FormValues) -> Result<UpdateRoute, FieldErrors> {
        let mut v = Validator::new(values);

        let name = v
            .optional_text("name")
            .min_len(1, NAME_REQUIRED)
            .max_len(NAME_MAX_LEN, NAME_TOO_LONG)
            .finish();
        let source = v
            .optional_text("source")
            .min_len(1, SOURCE_REQUIRED)
            .max_len(TEXT_MAX_LEN, SOURCE_TOO_LONG)
            .finish();
        let destination = v
            .optional_text("destination")
            .min_len(1, DESTINATION_REQUIRED)
            .max_len(TEXT_MAX_LEN, DESTINATION_TOO_LONG)
            .finish();
        let protocol = v.optional_choice::<RouteProtocol>("protocol", PROTOCOL_INVALID);
        let agents = Self::agents(&mut v);
        let rules = v.optional_list("rules").finish();

        v.finish(|| {
            Some(UpdateRoute {
                name,
                source,
                destination,
                protocol,
                agents: agents?,
                rules,
            })
        })
    }
}

impl Record for Route {
    fn id(&self) -> &str {
        &self.id
    }

    fn to_form_values(&self) -> FormValues {
        FormValues::new()
            .with_text("name", self.name.clone())
            .with_text("source", self.source.clone())
            .with_text("destination", self.destination.clone())
            .with_text("protocol", self.protocol.to_string())
            .with_list("agents", self.agents.clone())
            .with_list("rules", self.rules.clone())
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}
