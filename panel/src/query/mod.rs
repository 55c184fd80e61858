//! Query and mutation layer
//!
//! - `cache`: keyed, stale-time aware cache with in-flight de-duplication
//! - `hooks`: per-resource reads and mutations over the cache
//! - `mutation_tracker`: rejects concurrent mutations of one record

pub mod cache;
pub mod hooks;
pub mod mutation_tracker;

pub use cache::{CacheEvent, QueryCache, QueryKey};
pub use hooks::{AnalyticsHooks, ResourceHooks};
pub use mutation_tracker::{ActiveMutation, MutationGuard, MutationTracker};
