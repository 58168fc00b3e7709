//! One-shot sensor authorization.

use futures::future::{self, BoxFuture};
use serde::{Deserialize, Serialize};

/// Result of asking the platform for sensor access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionOutcome {
    Granted,
    Denied,
    Failed { reason: String },
}

/// Authorization step some platforms require before sensor access.
pub trait PermissionGate: Send + Sync {
    /// Whether `request` has to be awaited before sampling may start.
    fn requires_authorization(&self) -> bool;

    fn request(&self) -> BoxFuture<'static, PermissionOutcome>;
}

/// Platforms without an authorization step.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoAuthorization;

impl PermissionGate for NoAuthorization {
    fn requires_authorization(&self) -> bool {
        false
    }

    fn request(&self) -> BoxFuture<'static, PermissionOutcome> {
        Box::pin(future::ready(PermissionOutcome::Granted))
    }
}

/// Gate that always answers with a preset outcome.
#[derive(Debug, Clone)]
pub struct FixedPermission {
    outcome: PermissionOutcome,
}

impl FixedPermission {
    pub fn new(outcome: PermissionOutcome) -> Self {
        Self { outcome }
    }

    pub fn granted() -> Self {
        Self::new(PermissionOutcome::Granted)
    }

    pub fn denied() -> Self {
        Self::new(PermissionOutcome::Denied)
    }
}

impl PermissionGate for FixedPermission {
    fn requires_authorization(&self) -> bool {
        true
    }

    fn request(&self) -> BoxFuture<'static, PermissionOutcome> {
        Box::pin(future::ready(self.outcome.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_no_authorization_grants() {
        let gate = NoAuthorization;
        assert!(!gate.requires_authorization());
        assert_eq!(gate.request().await, PermissionOutcome::Granted);
    }

    #[tokio::test]
    async fn test_fixed_permission_replays_outcome() {
        let gate = FixedPermission::new(PermissionOutcome::Failed {
            reason: "no user gesture".to_string(),
        });
        assert!(gate.requires_authorization());
        assert!(matches!(
            gate.request().await,
            PermissionOutcome::Failed { .. }
        ));
        assert_eq!(FixedPermission::denied().request().await, PermissionOutcome::Denied);
    }
}
