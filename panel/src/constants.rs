//! Central repository for timeouts, cache lifetimes, limits and storage keys
//!
//! Constants are grouped by the layer that consumes them so every magic number
//! has a single source of truth.

use std::time::Duration;

/// HTTP client constants
pub mod http {
    use super::Duration;

    /// Fixed timeout for every request to the Nimbus backend
    pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

    /// Default backend base URL when nothing is configured
    pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";

    /// Path the UI returns to after the session expires
    pub const ENTRY_PATH: &str = "/";
}

/// Query cache lifetimes
pub mod cache {
    use super::Duration;

    /// Freshness window for resource lists, details and traffic analytics
    pub const RESOURCE_STALE_TIME: Duration = Duration::from_secs(30);

    /// Freshness window for the activity feed
    pub const ACTIVITY_STALE_TIME: Duration = Duration::from_secs(10);

    /// Automatic retries for idempotent reads
    pub const READ_RETRIES: u32 = 1;

    /// Capacity of the cache event channel
    pub const EVENT_CHANNEL_CAPACITY: usize = 256;
}

/// Query keys, one per cached resource family
pub mod query_keys {
    pub const AGENTS: &str = "agents";
    pub const RULES: &str = "rules";
    pub const ROUTES: &str = "routes";
    pub const GEODNS: &str = "geodns";
    pub const USERS: &str = "users";
    pub const DASHBOARD_STATS: &str = "dashboard-stats";
    pub const RECENT_ACTIVITY: &str = "recent-activity";
}

/// Table pagination
pub mod pagination {
    pub const DEFAULT_PAGE_SIZE: usize = 10;

    pub const PAGE_SIZE_OPTIONS: [usize; 4] = [10, 25, 50, 100];
}

/// Refresh intervals used by the preferences store
pub mod refresh {
    pub const FAST_MS: u64 = 10_000;
    pub const NORMAL_MS: u64 = 30_000;
    pub const SLOW_MS: u64 = 60_000;
}

/// Namespaced keys in persistent client storage
pub mod storage_keys {
    pub const TOKEN: &str = "token";
    pub const USER: &str = "user";
    pub const THEME: &str = "nimbus-theme";
    pub const SIDEBAR: &str = "nimbus-sidebar";
    pub const PREFERENCES: &str = "nimbus-preferences";
}

/// Notification limits
pub mod notifications {
    use super::Duration;

    /// Identical toasts inside this window collapse into one
    pub const TOAST_DEDUP_WINDOW: Duration = Duration::from_secs(2);

    /// How many toasts are retained for display
    pub const MAX_TOASTS: usize = 20;

    /// How many in-app notifications the inbox keeps
    pub const MAX_INBOX_ENTRIES: usize = 50;
}

/// Validation limits shared by schemas
pub mod limits {
    pub const ROUTE_MIN_AGENTS: usize = 1;
    pub const ROUTE_MAX_AGENTS: usize = 50;
    pub const NAME_MAX_LEN: usize = 100;
    pub const TEXT_MAX_LEN: usize = 500;
    pub const DOMAIN_MAX_LEN: usize = 255;
    pub const USERNAME_MIN_LEN: usize = 3;
    pub const USERNAME_MAX_LEN: usize = 50;
    pub const PASSWORD_MIN_LEN: usize = 8;
    pub const PASSWORD_MAX_LEN: usize = 100;
    pub const LOGIN_PASSWORD_MIN_LEN: usize = 6;
}

/// Keyboard shortcuts bound by the command palette
pub mod shortcuts {
    pub const COMMAND_PALETTE: [&str; 2] = ["ctrl+k", "cmd+k"];
    pub const NEW_AGENT: [&str; 2] = ["ctrl+shift+a", "cmd+shift+a"];
    pub const NEW_RULE: [&str; 2] = ["ctrl+shift+r", "cmd+shift+r"];
    pub const SETTINGS: [&str; 2] = ["ctrl+,", "cmd+,"];
}
