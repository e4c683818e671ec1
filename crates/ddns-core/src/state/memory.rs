// # Memory State Store
//
// In-memory implementation of StateStore.
//
// Keeps the last persisted snapshot and counts writes. Nothing survives a
// restart, so every address looks new to the next process.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::RwLock;
use async_trait::async_trait;

use crate::Error;
use crate::config::ConfigState;
use crate::traits::StateStore;

/// In-memory state store implementation
///
/// Clones share the same storage, so a test can keep one handle and give
/// the other to the engine.
///
/// # Example
///
/// ```rust,no_run
/// use ddns_core::config::ConfigState;
/// use ddns_core::state::MemoryStateStore;
/// use ddns_core::traits::StateStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = MemoryStateStore::new();
///     store.persist(&ConfigState::defaults()).await?;
///
///     assert_eq!(store.write_count(), 1);
///     assert_eq!(store.last().await, Some(ConfigState::defaults()));
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct MemoryStateStore {
    last: Arc<RwLock<Option<ConfigState>>>,
    writes: Arc<AtomicUsize>,
}

impl MemoryStateStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recently persisted snapshot
    pub async fn last(&self) -> Option<ConfigState> {
        self.last.read().await.clone()
    }

    /// Number of successful writes
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StateStore for MemoryStateStore {
    async fn persist(&self, state: &ConfigState) -> Result<(), Error> {
        *self.last.write().await = Some(state.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn location(&self) -> String {
        "memory".to_string()
    }
}
