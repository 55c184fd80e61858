//! Declarative resource schemas
//!
//! A schema describes one resource's form: which fields exist and how they
//! are edited (`FieldSpec`), the blank-form defaults, and two validators:
//!
//! - `validate_create`: strict, every required field must be present and valid
//! - `validate_update`: partial, only structurally required fields must be present
//!
//! Validators read a `FormValues` map keyed by dotted field path and either
//! return the coerced payload or a `FieldErrors` set naming every failing
//! path. There is no partial success.

/// Declare a closed string enum with serde names and `Choice` support
macro_rules! choice_enum {
    (
        $(#[$meta:meta])*
        $name:ident default $default:ident {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ::serde::Serialize, ::serde::Deserialize)]
        pub enum $name {
            $(
                #[serde(rename = $text)]
                $variant,
            )+
        }

        impl $name {
            pub const NAMES: &'static [&'static str] = &[$($text),+];
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl $crate::schemas::Choice for $name {
            const ALL: &'static [Self] = &[$($name::$variant),+];

            fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $text,)+
                }
            }
        }

        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str($crate::schemas::Choice::as_str(self))
            }
        }
    };
}

pub mod agent;
pub mod geodns;
pub mod login;
pub mod patterns;
pub mod route;
pub mod rule;
pub mod user;
pub mod validator;

use chrono::{DateTime, Utc};
use serde::{de::DeserializeOwned, Serialize};
use std::collections::BTreeMap;

use crate::errors::FieldErrors;

pub use agent::{
    Agent, AgentSchema, AgentStatus, Capabilities, CreateAgent, UpdateAgent, AGENT_CAPABILITIES,
};
pub use geodns::{
    CreateGeoDnsRecord, GeoDnsRecord, GeoDnsSchema, Location, RecordType, UpdateGeoDnsRecord,
    DNS_RECORD_TYPES,
};
pub use login::{LoginRequest, LoginSchema};
pub use route::{CreateRoute, Route, RouteProtocol, RouteSchema, UpdateRoute, ROUTE_PROTOCOLS};
pub use rule::{CreateRule, Rule, RuleAction, RuleSchema, RuleType, UpdateRule, RULE_ACTIONS, RULE_TYPES};
pub use user::{CreateUser, UpdateUser, User, UserRole, UserSchema, USER_ROLES};
pub use validator::Validator;

/// One value in a form, before coercion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    Bool(bool),
    List(Vec<String>),
}

impl FieldValue {
    /// Text shown in a control for this value
    pub fn display(&self) -> String {
        match self {
            FieldValue::Text(text) => text.clone(),
            FieldValue::Bool(flag) => flag.to_string(),
            FieldValue::List(items) => items.join(", "),
        }
    }
}

/// Raw form state keyed by dotted field path
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormValues {
    values: BTreeMap<String, FieldValue>,
}

impl FormValues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_text(mut self, path: &str, value: impl Into<String>) -> Self {
        self.set_text(path, value);
        self
    }

    pub fn with_bool(mut self, path: &str, value: bool) -> Self {
        self.set_bool(path, value);
        self
    }

    pub fn with_list<I, S>(mut self, path: &str, items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.set_list(path, items.into_iter().map(Into::into).collect());
        self
    }

    pub fn set(&mut self, path: &str, value: FieldValue) {
        self.values.insert(path.to_string(), value);
    }

    pub fn set_text(&mut self, path: &str, value: impl Into<String>) {
        self.set(path, FieldValue::Text(value.into()));
    }

    pub fn set_bool(&mut self, path: &str, value: bool) {
        self.set(path, FieldValue::Bool(value));
    }

    pub fn set_list(&mut self, path: &str, items: Vec<String>) {
        self.set(path, FieldValue::List(items));
    }

    pub fn remove(&mut self, path: &str) -> Option<FieldValue> {
        self.values.remove(path)
    }

    pub fn get(&self, path: &str) -> Option<&FieldValue> {
        self.values.get(path)
    }

    pub fn text(&self, path: &str) -> Option<&str> {
        match self.values.get(path) {
            Some(FieldValue::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.values.contains_key(path)
    }

    /// True when any field nested under `prefix.` is present
    pub fn has_group(&self, prefix: &str) -> bool {
        let nested = format!("{}.", prefix);
        self.values.keys().any(|k| k.starts_with(&nested))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Overlay another set of values on top of this one
    pub fn merge(&mut self, other: FormValues) {
        self.values.extend(other.values);
    }
}

/// How a field is edited
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Password,
    Number,
    TextArea,
    Checkbox,
    /// Single choice among fixed options
    Select(&'static [&'static str]),
    /// Identifier(s) of another resource; options are supplied at runtime
    Reference { resource: &'static str, multiple: bool },
}

/// Declarative description of one form field
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub path: &'static str,
    pub label: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    pub placeholder: Option<&'static str>,
    pub description: Option<&'static str>,
}

impl FieldSpec {
    pub const fn new(path: &'static str, label: &'static str, kind: FieldKind) -> Self {
        Self {
            path,
            label,
            kind,
            required: false,
            placeholder: None,
            description: None,
        }
    }

    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub const fn placeholder(mut self, placeholder: &'static str) -> Self {
        self.placeholder = Some(placeholder);
        self
    }

    pub const fn describe(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }
}

/// Closed set of string values (record types, protocols, roles...)
pub trait Choice: Sized + Copy + Default + 'static {
    const ALL: &'static [Self];

    fn as_str(&self) -> &'static str;

    fn parse(value: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.as_str() == value)
    }
}

/// Per-resource validation contract
pub trait Schema: Send + Sync + 'static {
    type Create: Serialize + Clone + Send + Sync + 'static;
    type Update: Serialize + Clone + Send + Sync + 'static;

    /// Display name of one record ("Agent", "DNS record")
    const ENTITY: &'static str;

    fn fields() -> &'static [FieldSpec];

    fn defaults() -> FormValues;

    fn validate_create(values: &FormValues) -> Result<Self::Create, FieldErrors>;

    fn validate_update(values: &FormValues) -> Result<Self::Update, FieldErrors>;
}

/// A server-materialised record
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    fn id(&self) -> &str;

    /// Values used to pre-fill an edit form
    fn to_form_values(&self) -> FormValues;

    fn created_at(&self) -> Option<DateTime<Utc>> {
        None
    }
}
