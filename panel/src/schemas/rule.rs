use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::validator::Validator;
use super::{FieldKind, FieldSpec, FormValues, Record, Schema};
use crate::constants::limits::{NAME_MAX_LEN, TEXT_MAX_LEN};
use crate::constants::query_keys;
use crate::errors::FieldErrors;

choice_enum! {
    /// Protocol a rule applies to
    RuleType default Http {
        Http => "http",
        Https => "https",
        Tcp => "tcp",
        Udp => "udp",
        Dns => "dns",
    }
}

choice_enum! {
    /// What happens to matched traffic
    RuleAction default Proxy {
        Proxy => "proxy",
        Redirect => "redirect",
        Block => "block",
    }
}

pub const RULE_TYPES: &[&str] = RuleType::NAMES;
pub const RULE_ACTIONS: &[&str] = RuleAction::NAMES;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub rule_type: RuleType,
    #[serde(rename = "match")]
    pub match_pattern: String,
    pub action: RuleAction,
    pub target: String,
    /// Agent id
    pub agent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CreateRule {
    pub name: String,
    #[serde(rename = "type")]
    pub rule_type: RuleType,
    #[serde(rename = "match")]
    pub match_pattern: String,
    pub action: RuleAction,
    pub target: String,
    pub agent: String,
}

/// Partial update; `agent` stays mandatory
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateRule {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub rule_type: Option<RuleType>,
    #[serde(rename = "match", skip_serializing_if = "Option::is_none")]
    pub match_pattern: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<RuleAction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    pub agent: String,
}

const NAME_REQUIRED: &str = "Name is required";
const NAME_TOO_LONG: &str = "Name must be less than 100 characters";
const TYPE_INVALID: &str = "Type must be one of: http, https, tcp, udp, dns";
const MATCH_REQUIRED: &str = "Match pattern is required";
const MATCH_TOO_LONG: &str = "Match pattern must be less than 500 characters";
const ACTION_INVALID: &str = "Action must be one of: proxy, redirect, block";
const TARGET_REQUIRED: &str = "Target is required";
const TARGET_TOO_LONG: &str = "Target must be less than 500 characters";
const AGENT_REQUIRED: &str = "Agent is required";

static FIELDS: &[FieldSpec] = &[
    FieldSpec::new("name", "Rule Name", FieldKind::Text)
        .required()
        .placeholder("Enter rule name")
        .describe("A unique name to identify this rule"),
    FieldSpec::new("type", "Protocol Type", FieldKind::Select(RULE_TYPES)).required(),
    FieldSpec::new("action", "Action", FieldKind::Select(RULE_ACTIONS)).required(),
    FieldSpec::new("match", "Match Pattern", FieldKind::TextArea)
        .required()
        .placeholder("e.g., example.com or *.example.com")
        .describe("Pattern to match incoming requests"),
    FieldSpec::new("target", "Target", FieldKind::Text)
        .required()
        .placeholder("e.g., backend.example.com:8080")
        .describe("Destination for matched requests"),
    FieldSpec::new(
        "agent",
        "Agent",
        FieldKind::Reference {
            resource: query_keys::AGENTS,
            multiple: false,
        },
    )
    .required()
    .placeholder("Select an agent")
    .describe("The agent that will handle this rule"),
];

pub struct RuleSchema;

impl RuleSchema {
    fn agent(v: &mut Validator<'_>) -> Option<String> {
        v.text("agent").min_len(1, AGENT_REQUIRED).finish()
    }
}

impl Schema for RuleSchema {
    type Create = CreateRule;
    type Update = UpdateRule;

    const ENTITY: &'static str = "Rule";

    fn fields() -> &'static [FieldSpec] {
        FIELDS
    }

    fn defaults() -> FormValues {
        FormValues::new()
            .with_text("name", "")
            .with_text("type", RuleType::Http.to_string())
            .with_text("match", "")
            .with_text("action", RuleAction::Proxy.to_string())
            .with_text("target", "")
            .with_text("agent", "")
    }

    fn validate_create(values: &FormValues) -> Result<CreateRule, FieldErrors> {
        let mut v = Validator::new(values);

        let name = v
            .text("name")
            .min_len(1, NAME_REQUIRED)
            .max_len(NAME_MAX_LEN, NAME_TOO_LONG)
            .finish();
        let rule_type = v.choice::<RuleType>("type", TYPE_INVALID);
        let match_pattern = v
            .text("match")
            .min_len(1, MATCH_REQUIRED)
            .max_len(TEXT_MAX_LEN, MATCH_TOO_LONG)
            .finish();
        let action = v.choice::<RuleAction>("action", ACTION_INVALID);
        let target = v
            .text("target")
            .min_len(1, TARGET_REQUIRED)
            .max_len(TEXT_MAX_LEN, TARGET_TOO_LONG)
            .finish();
        let agent = Self::agent(&mut v);

        v.finish(|| {
            Some(CreateRule {
                name: name?,
                rule_type: rule_type?,
                match_pattern: match_pattern?,
                action: action?,
                target: target?,
                agent: agent?,
            })
        })
    }

    fn validate_update(values: &FormValues) -> Result<UpdateRule, FieldErrors> {
        let mut v = Validator::new(values);

        let name = v
            .optional_text("name")
            .min_len(1, NAME_REQUIRED)
            .max_len(NAME_MAX_LEN, NAME_TOO_LONG)
            .finish();
        let rule_type = v.optional_choice::<RuleType>("type", TYPE_INVALID);
        let match_pattern = v
            .optional_text("match")
            .min_len(1, MATCH_REQUIRED)
            .max_len(TEXT_MAX_LEN, MATCH_TOO_LONG)
            .finish();
        let action = v.optional_choice::<RuleAction>("action", ACTION_INVALID);
        let target = v
            .optional_text("target")
            .min_len(1, TARGET_REQUIRED)
            .max_len(TEXT_MAX_LEN, TARGET_TOO_LONG)
            .finish();
        let agent = Self::agent(&mut v);

        v.finish(|| {
            Some(UpdateRule {
                name,
                rule_type,
                match_pattern,
                action,
                target,
                agent: agent?,
            })
        })
    }
}

impl Record for Rule {
    fn id(&self) -> &str {
        &self.id
    }

    fn to_form_values(&self) -> FormValues {
        FormValues::new()
            .with_text("name", self.name.clone())
            .with_text("type", self.rule_type.to_string())
            .with_text("match", self.match_pattern.clone())
            .with_text("action", self.action.to_string())
            .with_text("target", self.target.clone())
            .with_text("agent", self.agent.clone())
    }

    fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_rule() -> FormValues {
        RuleSchema::defaults()
            .with_text("name", "block-ads")
            .with_text("match", "*.ads.example.com")
            .with_text("action", "block")
            .with_text("target", "sinkhole:80")
            .with_text("agent", "a1")
    }

    #[test]
    fn test_create_uses_wire_names() {
        let rule = RuleSchema::validate_create(&valid_rule()).unwrap();
        let body = serde_json::to_value(&rule).unwrap();
        assert_eq!(body["type"], "http");
        assert_eq!(body["match"], "*.ads.example.com");
        assert_eq!(body["action"], "block");
        assert_eq!(body["agent"], "a1");
    }

    #[test]
    fn test_create_rejects_unknown_choices() {
        let values = valid_rule().with_text("type", "ftp").with_text("action", "drop");
        let errors = RuleSchema::validate_create(&values).unwrap_err();
        assert_eq!(errors.first("type"), Some(TYPE_INVALID));
        assert_eq!(errors.first("action"), Some(ACTION_INVALID));
    }

    #[test]
    fn test_update_still_requires_agent() {
        let values = FormValues::new().with_text("name", "renamed");
        let errors = RuleSchema::validate_update(&values).unwrap_err();
        assert_eq!(errors.first("agent"), Some(AGENT_REQUIRED));
        assert!(!errors.contains("name"));

        let values = values.with_text("agent", "a2");
        let update = RuleSchema::validate_update(&values).unwrap();
        assert_eq!(
            serde_json::to_value(&update).unwrap(),
            serde_json::json!({"name": "renamed", "agent": "a2"})
        );
    }

    #[test]
    fn test_match_pattern_length_limit() {
        let values = valid_rule().with_text("match", "x".repeat(501));
        let errors = RuleSchema::validate_create(&values).unwrap_err();
        assert_eq!(errors.first("match"), Some(MATCH_TOO_LONG));
    }
}
