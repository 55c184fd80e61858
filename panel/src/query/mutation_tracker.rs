//! Per-record mutation guard
//!
//! Only one update or delete may be in flight per record. A second request
//! against the same record is rejected with `PanelError::Busy` until the first
//! finishes, whether it came from a form or from a programmatic caller.
//!
//! The claim lives in the returned guard, so it is released even when the
//! caller's future is dropped mid-request.
//!
//! ```ignore
//! let _guard = tracker.try_start("agents/a1", "update")?;
//! // ... perform the request ...
//! ```

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, instrument, warn};

use crate::errors::PanelError;

#[derive(Debug, Clone, Serialize)]
pub struct ActiveMutation {
    pub operation: String,
    pub target: String,
    pub started_at: DateTime<Utc>,
}

type ActiveMap = HashMap<String, ActiveMutation>; // target -> mutation

#[derive(Clone, Default)]
pub struct MutationTracker {
    active: Arc<Mutex<ActiveMap>>,
}

/// Holds a record claim until dropped
#[must_use = "the claim is released as soon as the guard is dropped"]
pub struct MutationGuard {
    active: Arc<Mutex<ActiveMap>>,
    target: String,
}

impl Drop for MutationGuard {
    fn drop(&mut self) {
        if let Some(mutation) = lock(&self.active).remove(&self.target) {
            let took = Utc::now().signed_duration_since(mutation.started_at);
            debug!(
                "Finished '{}' on {} (took {}ms)",
                mutation.operation,
                self.target,
                took.num_milliseconds()
            );
        }
    }
}

// The map holds no invariant a panicking holder could break
fn lock(active: &Mutex<ActiveMap>) -> MutexGuard<'_, ActiveMap> {
    active.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl MutationTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Target key for one record of a resource
    pub fn target(resource: &str, id: &str) -> String {
        format!("{}/{}", resource, id)
    }

    /// Claim `target`, failing if another mutation already holds it
    #[instrument(skip(self))]
    pub fn try_start(&self, target: &str, operation: &str) -> Result<MutationGuard, PanelError> {
        let mut active = lock(&self.active);

        if let Some(current) = active.get(target) {
            warn!(
                "Rejected '{}' on {}: '{}' in flight since {}",
                operation,
                target,
                current.operation,
                current.started_at.format("%H:%M:%S")
            );
            return Err(PanelError::Busy {
                target: target.to_string(),
                operation: current.operation.clone(),
            });
        }

        active.insert(
            target.to_string(),
            ActiveMutation {
                operation: operation.to_string(),
                target: target.to_string(),
                started_at: Utc::now(),
            },
        );
        debug!("Started '{}' on {}", operation, target);
        Ok(MutationGuard {
            active: self.active.clone(),
            target: target.to_string(),
        })
    }

    pub fn is_busy(&self, target: &str) -> bool {
        lock(&self.active).contains_key(target)
    }

    pub fn active(&self, target: &str) -> Option<ActiveMutation> {
        lock(&self.active).get(target).cloned()
    }

    pub fn active_count(&self) -> usize {
        lock(&self.active).len()
    }
}
