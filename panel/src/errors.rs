//! Error types for the Nimbus panel
//!
//! Provides structured errors for each failure class the console can hit:
//! configuration, backend requests, client-side validation, local storage and
//! export. Transport errors are classified exactly once, in the HTTP layer.

use std::collections::BTreeMap;
use std::fmt;

/// Main error type for the panel
#[derive(Debug, Clone)]
pub enum PanelError {
    /// Configuration-related errors
    Config(ConfigError),

    /// Classified failures of requests to the Nimbus backend
    Api(ApiError),

    /// Client-side schema validation failed; nothing was sent
    Validation(FieldErrors),

    /// Persistent client storage errors
    Storage(StorageError),

    /// Export/import errors
    Export(ExportError),

    /// The record already has a mutation in flight
    Busy { target: String, operation: String },

    /// Other errors with context
    Other(String),
}

/// Configuration error variants
#[derive(Debug, Clone)]
pub enum ConfigError {
    /// Failed to read configuration file
    LoadFailed { path: String, reason: String },

    /// Invalid configuration value
    InvalidValue { field: String, reason: String },

    /// Configuration parsing error
    ParseError { reason: String },
}

/// Failure classes of a backend request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// No response was received (connect failure, timeout)
    Network { reason: String },

    /// 401, stored credentials have been cleared
    Unauthorized,

    /// 403
    Forbidden,

    /// 404
    NotFound,

    /// 422, carrying the server-provided message when there is one
    Validation { message: Option<String> },

    /// 429
    RateLimited,

    /// 5xx
    Server { status: u16 },

    /// Any other non-success status
    Unclassified { status: u16, message: Option<String> },

    /// A success response whose body could not be decoded
    Decode { reason: String },
}

/// Persistent storage error variants
#[derive(Debug, Clone)]
pub enum StorageError {
    /// Storage backend could not be opened
    Unavailable { reason: String },

    /// Reading or writing a key failed
    QueryFailed { key: String, reason: String },

    /// Stored value could not be (de)serialized
    Serialization { key: String, reason: String },
}

/// Export/import error variants
#[derive(Debug, Clone)]
pub enum ExportError {
    /// Nothing to export
    Empty,

    /// Writing or reading the file failed
    Io { path: String, reason: String },

    /// Imported content is malformed
    Parse { reason: String },
}

/// Field-path keyed validation messages.
///
/// Paths use dots for nested fields (`location.country`, `capabilities.http`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: BTreeMap<String, Vec<String>>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.entry(path.into()).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn contains(&self, path: &str) -> bool {
        self.errors.contains_key(path)
    }

    /// First message for a field, which is what a form shows under the control
    pub fn first(&self, path: &str) -> Option<&str> {
        self.errors
            .get(path)
            .and_then(|messages| messages.first())
            .map(String::as_str)
    }

    pub fn messages(&self, path: &str) -> &[String] {
        self.errors.get(path).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.errors.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.errors
            .iter()
            .map(|(path, messages)| (path.as_str(), messages.as_slice()))
    }
}

impl ApiError {
    /// Status code behind the failure, if a response was received
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Network { .. } | ApiError::Decode { .. } => None,
            ApiError::Unauthorized => Some(401),
            ApiError::Forbidden => Some(403),
            ApiError::NotFound => Some(404),
            ApiError::Validation { .. } => Some(422),
            ApiError::RateLimited => Some(429),
            ApiError::Server { status } | ApiError::Unclassified { status, .. } => Some(*status),
        }
    }

    /// Idempotent reads may be repeated once for these classes
    pub fn is_retryable(&self) -> bool {
        matches!(self, ApiError::Network { .. } | ApiError::Server { .. })
    }

    /// Text of the single user-visible notification for this failure
    pub fn notification_message(&self) -> String {
        match self {
            ApiError::Network { .. } => "Network error. Please check your connection.".to_string(),
            ApiError::Unauthorized => "Session expired. Please login again.".to_string(),
            ApiError::Forbidden => "You do not have permission to perform this action.".to_string(),
            ApiError::NotFound => "Resource not found.".to_string(),
            ApiError::Validation { message } => message
                .clone()
                .unwrap_or_else(|| "Validation error. Please check your input.".to_string()),
            ApiError::RateLimited => "Too many requests. Please try again later.".to_string(),
            ApiError::Server { .. } => "Server error. Please try again later.".to_string(),
            ApiError::Unclassified { message, .. } => message
                .clone()
                .unwrap_or_else(|| "An unexpected error occurred.".to_string()),
            ApiError::Decode { .. } => {
                "Received an unexpected response from the server.".to_string()
            }
        }
    }
}

impl PanelError {
    /// Message shown in a form's root error area
    pub fn root_message(&self) -> String {
        match self {
            PanelError::Api(e) => e.notification_message(),
            PanelError::Validation(_) => "Please fix the highlighted fields.".to_string(),
            other => other.to_string(),
        }
    }
}

// Implement Display for all error types
impl fmt::Display for PanelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PanelError::Config(e) => write!(f, "Configuration error: {}", e),
            PanelError::Api(e) => write!(f, "{}", e),
            PanelError::Validation(e) => write!(f, "Validation failed: {}", e),
            PanelError::Storage(e) => write!(f, "Storage error: {}", e),
            PanelError::Export(e) => write!(f, "Export error: {}", e),
            PanelError::Busy { target, operation } => {
                write!(f, "{} is busy with '{}'. Wait for it to finish.", target, operation)
            }
            PanelError::Other(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::LoadFailed { path, reason } => {
                write!(f, "Failed to load config from '{}': {}", path, reason)
            }
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
            ConfigError::ParseError { reason } => {
                write!(f, "Failed to parse config: {}", reason)
            }
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.notification_message())
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Unavailable { reason } => {
                write!(f, "Storage unavailable: {}", reason)
            }
            StorageError::QueryFailed { key, reason } => {
                write!(f, "Storage access for '{}' failed: {}", key, reason)
            }
            StorageError::Serialization { key, reason } => {
                write!(f, "Stored value '{}' is malformed: {}", key, reason)
            }
        }
    }
}

impl fmt::Display for ExportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExportError::Empty => write!(f, "No data to export"),
            ExportError::Io { path, reason } => write!(f, "File '{}': {}", path, reason),
            ExportError::Parse { reason } => write!(f, "Invalid import data: {}", reason),
        }
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .filter_map(|(path, messages)| {
                messages.first().map(|message| format!("{}: {}", path, message))
            })
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

// Implement std::error::Error
impl std::error::Error for PanelError {}
impl std::error::Error for ConfigError {}
impl std::error::Error for ApiError {}
impl std::error::Error for StorageError {}
impl std::error::Error for ExportError {}
impl std::error::Error for FieldErrors {}

// Conversions from anyhow::Error for plumbing code
impl From<anyhow::Error> for PanelError {
    fn from(err: anyhow::Error) -> Self {
        PanelError::Other(err.to_string())
    }
}

// Conversion helpers for sub-errors
impl From<ConfigError> for PanelError {
    fn from(err: ConfigError) -> Self {
        PanelError::Config(err)
    }
}

impl From<ApiError> for PanelError {
    fn from(err: ApiError) -> Self {
        PanelError::Api(err)
    }
}

impl From<FieldErrors> for PanelError {
    fn from(err: FieldErrors) -> Self {
        PanelError::Validation(err)
    }
}

impl From<StorageError> for PanelError {
    fn from(err: StorageError) -> Self {
        PanelError::Storage(err)
    }
}

impl From<ExportError> for PanelError {
    fn from(err: ExportError) -> Self {
        PanelError::Export(err)
    }
}

pub type PanelResult<T> = Result<T, PanelError>;
