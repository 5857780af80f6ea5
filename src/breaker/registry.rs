//! One breaker per downstream target, shared by every caller.

use super::{BreakerConfig, BreakerSnapshot, CircuitBreaker, TransitionHook};
use dashmap::DashMap;
use std::sync::Arc;

/// Hands out the shared breaker for a target, creating it on first use.
pub struct BreakerRegistry {
    config: BreakerConfig,
    breakers: DashMap<String, Arc<CircuitBreaker>>,
    hooks: Vec<TransitionHook>,
}

impl BreakerRegistry {
    pub fn new(config: BreakerConfig) -> Self {
        Self {
            config,
            breakers: DashMap::new(),
            hooks: Vec::new(),
        }
    }

    /// Attach a hook to every breaker created after this call.
    pub fn with_hook(mut self, hook: TransitionHook) -> Self {
        self.hooks.push(hook);
        self
    }

    /// Shared breaker for `target`. Concurrent first calls get the same instance.
    pub fn get_or_create(&self, target: &str) -> Arc<CircuitBreaker> {
        self.breakers
            .entry(target.to_string())
            .or_insert_with(|| {
                let breaker = self
                    .hooks
                    .iter()
                    .cloned()
                    .fold(CircuitBreaker::new(target, self.config.clone()), |b, hook| {
                        b.with_shared_hook(hook)
                    });
                tracing::debug!(target_name = target, "Created circuit breaker");
                Arc::new(breaker)
            })
            .clone()
    }

    pub fn get(&self, target: &str) -> Option<Arc<CircuitBreaker>> {
        self.breakers.get(target).map(|entry| Arc::clone(entry.value()))
    }

    /// Snapshots of every breaker, sorted by target name.
    pub fn snapshots(&self) -> Vec<BreakerSnapshot> {
        let mut snapshots: Vec<_> = self
            .breakers
            .iter()
            .map(|entry| entry.value().snapshot())
            .collect();
        snapshots.sort_by(|a, b| a.name.cmp(&b.name));
        snapshots
    }

    pub fn len(&self) -> usize {
        self.breakers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.breakers.is_empty()
    }
}

impl Default for BreakerRegistry {
    fn default() -> Self {
        Self::new(BreakerConfig::default())
    }
}
