//! The resolved caller identity.

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

use super::Role;

/// The identity every engine operation runs as.
///
/// Authentication happens upstream; the engine trusts the worker id,
/// organization and role it is given and scopes all reads and writes to
/// that organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// The calling worker.
    pub worker_id: String,
    /// The organization the caller belongs to.
    pub org_id: String,
    /// The caller's role.
    pub role: Role,
}

impl Actor {
    /// Creates a new actor.
    pub fn new(worker_id: impl Into<String>, org_id: impl Into<String>, role: Role) -> Self {
        Self {
            worker_id: worker_id.into(),
            org_id: org_id.into(),
            role,
        }
    }

    /// Fails with [`EngineError::AccessDenied`] unless the actor is a manager.
    pub fn require_manager(&self, operation: &str) -> EngineResult<()> {
        if self.role.is_manager() {
            Ok(())
        } else {
            Err(EngineError::AccessDenied {
                operation: operation.to_string(),
            })
        }
    }
}
