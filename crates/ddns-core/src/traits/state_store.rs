// # State Store Trait
//
// Defines where the configuration snapshot is written after a confirmed
// update.
//
// ## Purpose
//
// The persisted snapshot carries the IP pool and the last confirmed address,
// so a restart does not push an address the provider already has.
//
// ## Implementations
//
// - File-based: the same `key=value` file the configuration is read from
// - Memory: tests

use async_trait::async_trait;

use crate::config::ConfigState;

/// Trait for state store implementations
///
/// Writes are wholesale: the whole snapshot replaces whatever was stored
/// before. The engine logs and swallows failures; the next confirmed update
/// writes again.
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Replace the stored state with this snapshot
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Successfully written
    /// - `Err(Error)`: Storage error
    async fn persist(&self, state: &ConfigState) -> Result<(), crate::Error>;

    /// Human-readable location (for logging)
    fn location(&self) -> String;
}
