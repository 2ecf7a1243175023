//! Primary/secondary strategy composition.

use async_trait::async_trait;
use futures::FutureExt;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::metrics::RESOLVER_ATTEMPTS;

use super::{ResolveError, Resolver};

/// Resolver that tries `primary` first and falls back to `secondary` when the
/// primary fails, panics, or comes back empty.
///
/// Each result is normalized with [`dedup_members`] before the emptiness
/// check. A non-empty primary result is taken as-is; results are never merged.
/// Both strategies failing is reported as `Ok(vec![])`.
pub struct FallbackResolver {
    primary: Arc<dyn Resolver>,
    secondary: Arc<dyn Resolver>,
}

impl FallbackResolver {
    pub fn new(primary: Arc<dyn Resolver>, secondary: Arc<dyn Resolver>) -> Self {
        Self { primary, secondary }
    }

    async fn attempt(strategy: &dyn Resolver, source_url: &str) -> Vec<String> {
        let result = match AssertUnwindSafe(strategy.resolve(source_url))
            .catch_unwind()
            .await
        {
            Ok(result) => result,
            Err(panic) => {
                let detail = panic
                    .downcast_ref::<&str>()
                    .map(|s| s.to_string())
                    .or_else(|| panic.downcast_ref::<String>().cloned())
                    .unwrap_or_else(|| "unknown panic".to_string());
                Err(ResolveError::CommandFailed(format!("strategy panicked: {detail}")))
            }
        };

        match result.map(dedup_members) {
            Ok(members) if members.is_empty() => {
                debug!(strategy = strategy.name(), "Strategy returned no members");
                RESOLVER_ATTEMPTS
                    .with_label_values(&[strategy.name(), "empty"])
                    .inc();
                members
            }
            Ok(members) => {
                debug!(
                    strategy = strategy.name(),
                    count = members.len(),
                    "Strategy resolved members"
                );
                RESOLVER_ATTEMPTS
                    .with_label_values(&[strategy.name(), "found"])
                    .inc();
                members
            }
            Err(e) => {
                warn!(strategy = strategy.name(), error = %e, "Resolution strategy failed");
                RESOLVER_ATTEMPTS
                    .with_label_values(&[strategy.name(), "error"])
                    .inc();
                Vec::new()
            }
        }
    }
}

#[async_trait]
impl Resolver for FallbackResolver {
    fn name(&self) -> &str {
        "fallback"
    }

    async fn resolve(&self, source_url: &str) -> Result<Vec<String>, ResolveError> {
        let members = Self::attempt(self.primary.as_ref(), source_url).await;
        if !members.is_empty() {
            return Ok(members);
        }

        Ok(Self::attempt(self.secondary.as_ref(), source_url).await)
    }
}

/// Drop repeated and blank IDs, keeping the first occurrence of each.
pub fn dedup_members(members: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::with_capacity(members.len());
    members
        .into_iter()
        .map(|m| m.trim().to_string())
        .filter(|m| !m.is_empty() && seen.insert(m.clone()))
        .collect()
}
