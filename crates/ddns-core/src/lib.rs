// # ddns-core
//
// Core library for the DNSPod dynamic DNS updater.
//
// ## Architecture Overview
//
// The updater keeps one record (`sub_domain.domain`) pointed at the host's
// current address:
// - **ConfigState**: Layered string settings (defaults < file < env < argv)
// - **IpPool**: Window of recently confirmed addresses; suppresses updates
//   when a multi-egress host rotates between known addresses
// - **IpResolver**: Trait for discovering the current address
// - **DnsProvider**: Trait for listing and updating records
// - **StateStore**: Trait for persisting the snapshot after an update
// - **DdnsEngine**: Resolves the record once, then polls on a fixed interval
//
// ## Design Principles
//
// 1. **Library-First**: The daemon only wires collaborators together
// 2. **Confirm, then commit**: Nothing is recorded until the provider
//    acknowledges the update
// 3. **Interval as retry**: No backoff or retry counters; a failed update is
//    simply new again on the next poll
// 4. **Cooperative shutdown**: A token checked once per iteration

pub mod traits;
pub mod engine;
pub mod config;
pub mod error;
pub mod pool;
pub mod shutdown;
pub mod state;

// Re-export core types for convenience
pub use traits::{DnsProvider, IpResolver, StateStore};
pub use engine::{DdnsEngine, EngineEvent, EnginePhase, PollOutcome};
pub use config::{ConfigState, FileLayer, Settings};
pub use error::{Error, Result};
pub use pool::{IpPool, Observation};
pub use shutdown::ShutdownToken;
pub use state::{FileStateStore, MemoryStateStore};
