pub mod api;
pub mod app;
pub mod config;
pub mod constants;
pub mod errors;
pub mod export;
pub mod form;
pub mod format;
pub mod http;
pub mod notifications;
pub mod pages;
pub mod query;
pub mod schemas;
pub mod storage;
pub mod stores;
pub mod table;

// Re-export commonly used types
pub use app::PanelState;
pub use config::{Config, ConfigManager};
pub use errors::{ApiError, FieldErrors, PanelError, PanelResult};
pub use export::Exporter;
pub use http::ApiClient;
pub use notifications::{NotificationInbox, ToastCenter};
pub use query::{MutationTracker, QueryCache, ResourceHooks};
pub use storage::{KeyValueStore, MemoryStorage, SqliteStorage};
