//! Update engine
//!
//! The DdnsEngine is responsible for:
//! - Resolving the record identifier once at startup
//! - Polling the current address every `interval`
//! - Deduplicating addresses through the [`IpPool`]
//! - Updating the record via DnsProvider when an address is new
//! - Persisting the snapshot after each confirmed update
//!
//! ## Phases
//!
//! ```text
//! Resolving ──► Polling ⇄ Updating
//!                  │
//!                  ▼
//!              Stopping ──► Stopped
//! ```
//!
//! `Resolving` happens once; a failure there is terminal. The shutdown token
//! is checked only at the top of each iteration, after the sleep, so a stop
//! request waits out the current interval and never cuts an update short.
//!
//! ## Poll Flow
//!
//! 1. Ask the IpResolver for the current address (none → log, sleep)
//! 2. Classify it with the pool (known → sleep)
//! 3. New: call DnsProvider::update_record()
//! 4. On success, commit the pool, stamp the snapshot and persist it
//! 5. On failure, leave pool and snapshot as they were; the next poll
//!    classifies the same address as new again

use std::net::IpAddr;

use crate::config::{CURRENT_IP, ConfigState, IP_POOL, LAST_UPDATE_TIME, RECORD_ID, Settings};
use crate::error::{Error, Result};
use crate::pool::{IpPool, Observation};
use crate::shutdown::ShutdownToken;
use crate::traits::{DnsProvider, IpResolver, RecordHandle, RecordUpdate, StateStore};
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

/// Capacity of the engine event channel
pub const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Lifecycle phase of the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnginePhase {
    Resolving,
    Polling,
    Updating,
    Stopping,
    Stopped,
}

/// Events emitted by the DdnsEngine
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineEvent {
    /// Engine started
    Started { fqdn: String },

    /// Record identifier resolved
    RecordResolved { record_id: RecordHandle },

    /// The resolver returned no address this tick
    AddressUnavailable { error: String },

    /// Address already inside the pool window, nothing to do
    AddressKnown { ip: IpAddr },

    /// DNS update confirmed
    UpdateSucceeded { ip: IpAddr, record_id: RecordHandle },

    /// DNS update failed; retried next tick
    UpdateFailed { ip: IpAddr, error: String },

    /// Snapshot could not be written; retried after the next update
    PersistFailed { error: String },

    /// Engine stopped
    Stopped,
}

/// Result of a single poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    /// No address could be determined
    NoAddress,
    /// Address already known
    Known(IpAddr),
    /// Address was new and the update was confirmed
    Updated(IpAddr),
    /// Address was new but the update failed
    UpdateFailed(IpAddr),
}

/// Core DDNS engine
///
/// ## Lifecycle
///
/// 1. Create with [`DdnsEngine::new()`] (validates the configuration,
///    no network traffic)
/// 2. Start with [`DdnsEngine::run()`]
/// 3. Engine runs until the [`ShutdownToken`] is triggered
///
/// ## Threading
///
/// One task, one remote call in flight at a time. The configuration
/// snapshot is only ever touched from that task.
pub struct DdnsEngine {
    /// Source of the current address
    resolver: Box<dyn IpResolver>,

    /// DNS provider for listing and updating records
    provider: Box<dyn DnsProvider>,

    /// Where snapshots go after a confirmed update
    state_store: Box<dyn StateStore>,

    /// Typed view of the validated configuration
    settings: Settings,

    /// Current configuration snapshot
    state: ConfigState,

    /// Window of recently confirmed addresses
    pool: IpPool,

    /// Record identifier, once resolved
    record: Option<RecordHandle>,

    phase: EnginePhase,

    /// Event sender for external monitoring
    event_tx: mpsc::Sender<EngineEvent>,
}

impl DdnsEngine {
    /// Create a new DDNS engine
    ///
    /// # Parameters
    ///
    /// - `resolver`: IP resolver implementation
    /// - `provider`: DNS provider implementation
    /// - `state_store`: State store implementation
    /// - `state`: Merged configuration snapshot
    ///
    /// # Returns
    ///
    /// A tuple of (engine, event_receiver), or [`Error::Config`] when the
    /// snapshot does not validate
    pub fn new(
        resolver: Box<dyn IpResolver>,
        provider: Box<dyn DnsProvider>,
        state_store: Box<dyn StateStore>,
        state: ConfigState,
    ) -> Result<(Self, mpsc::Receiver<EngineEvent>)> {
        let settings = state.validate()?;
        let pool = IpPool::from_setting(state.value(IP_POOL), settings.ip_count);

        let (tx, rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);

        let engine = Self {
            resolver,
            provider,
            state_store,
            settings,
            state,
            pool,
            record: None,
            phase: EnginePhase::Resolving,
            event_tx: tx,
        };

        Ok((engine, rx))
    }

    /// Run the engine until `shutdown` is triggered
    ///
    /// # Returns
    ///
    /// - `Ok(())`: Clean shutdown
    /// - `Err(Error::Resolution)`: The record could not be resolved at startup
    pub async fn run(&mut self, shutdown: ShutdownToken) -> Result<()> {
        let fqdn = self.settings.fqdn();
        self.emit_event(EngineEvent::Started { fqdn: fqdn.clone() });

        if let Err(e) = self.resolve_record().await {
            self.phase = EnginePhase::Stopped;
            return Err(e);
        }
        info!("Watching IP for ddns: {}", fqdn);

        while !shutdown.is_triggered() {
            if let Err(e) = self.poll_once().await {
                error!("Poll failed: {}", e);
            }
            tokio::time::sleep(self.settings.interval).await;
        }

        self.phase = EnginePhase::Stopping;
        info!("Shutdown requested");
        self.phase = EnginePhase::Stopped;
        self.emit_event(EngineEvent::Stopped);
        info!("Stopped");

        Ok(())
    }

    /// Resolve the record identifier for (domain, sub_domain)
    ///
    /// Looks the record up once; the result is kept for the lifetime of the
    /// engine and never refreshed.
    pub async fn resolve_record(&mut self) -> Result<RecordHandle> {
        self.phase = EnginePhase::Resolving;
        let domain = &self.settings.domain;
        let sub_domain = &self.settings.sub_domain;

        let records = self.provider.list_records(domain).await.map_err(|e| {
            Error::resolution(format!("Listing records of {} failed: {}", domain, e))
        })?;

        let entry = records
            .into_iter()
            .find(|record| record.name == *sub_domain)
            .ok_or_else(|| {
                Error::resolution(format!("No record named {} in {}", sub_domain, domain))
            })?;

        info!("Got record_id: {}", entry.id);
        self.state = self.state.with(RECORD_ID, entry.id.as_str());
        self.record = Some(entry.id.clone());
        self.phase = EnginePhase::Polling;
        self.emit_event(EngineEvent::RecordResolved {
            record_id: entry.id.clone(),
        });

        Ok(entry.id)
    }

    /// Perform one poll without sleeping
    ///
    /// # Returns
    ///
    /// - `Ok(PollOutcome)`: What happened this tick
    /// - `Err(Error::Resolution)`: Called before [`DdnsEngine::resolve_record`]
    pub async fn poll_once(&mut self) -> Result<PollOutcome> {
        let record_id = self
            .record
            .clone()
            .ok_or_else(|| Error::resolution("Record identifier not resolved yet"))?;
        self.phase = EnginePhase::Polling;

        let ip = match self.resolver.current_ip(self.settings.using_local_ip).await {
            Ok(ip) => ip,
            Err(e) => {
                warn!(
                    "Get current IP failed ({}): {}",
                    self.resolver.resolver_name(),
                    e
                );
                self.emit_event(EngineEvent::AddressUnavailable {
                    error: e.to_string(),
                });
                return Ok(PollOutcome::NoAddress);
            }
        };

        match self.pool.observe(&ip.to_string()) {
            Observation::Known => {
                debug!("IP {} already in pool, nothing to do", ip);
                self.emit_event(EngineEvent::AddressKnown { ip });
                Ok(PollOutcome::Known(ip))
            }
            Observation::New => {
                info!("New IP found: {}", ip);
                self.phase = EnginePhase::Updating;
                let outcome = self.push_update(record_id, ip).await;
                self.phase = EnginePhase::Polling;
                Ok(outcome)
            }
        }
    }

    /// Send one update and commit it if the provider confirms
    async fn push_update(&mut self, record_id: RecordHandle, ip: IpAddr) -> PollOutcome {
        let update = RecordUpdate::new(
            self.settings.domain.clone(),
            self.settings.sub_domain.clone(),
            record_id,
            ip,
        );

        match self.provider.update_record(&update).await {
            Ok(ack) => {
                info!(
                    "Record updated: {} -> {} (record {})",
                    self.settings.fqdn(),
                    ack.value,
                    ack.record_id
                );
                self.commit(ip).await;
                self.emit_event(EngineEvent::UpdateSucceeded {
                    ip,
                    record_id: update.record_id,
                });
                PollOutcome::Updated(ip)
            }
            Err(e) => {
                error!(
                    "Failed to update {} to {} via {}: {}",
                    self.settings.fqdn(),
                    ip,
                    self.provider.provider_name(),
                    e
                );
                self.emit_event(EngineEvent::UpdateFailed {
                    ip,
                    error: e.to_string(),
                });
                PollOutcome::UpdateFailed(ip)
            }
        }
    }

    /// Fold a confirmed address into the pool and snapshot, then persist
    async fn commit(&mut self, ip: IpAddr) {
        let ip = ip.to_string();
        self.pool.commit(&ip);
        self.state = self
            .state
            .with(CURRENT_IP, ip.as_str())
            .with(IP_POOL, self.pool.to_setting())
            .with(LAST_UPDATE_TIME, chrono::Utc::now().to_rfc3339());

        if let Err(e) = self.state_store.persist(&self.state).await {
            error!(
                "Failed to save state to {}: {}",
                self.state_store.location(),
                e
            );
            self.emit_event(EngineEvent::PersistFailed {
                error: e.to_string(),
            });
        }
    }

    /// Current configuration snapshot
    pub fn state(&self) -> &ConfigState {
        &self.state
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn pool(&self) -> &IpPool {
        &self.pool
    }

    pub fn record(&self) -> Option<&RecordHandle> {
        self.record.as_ref()
    }

    pub fn phase(&self) -> EnginePhase {
        self.phase
    }

    /// Emit an engine event
    fn emit_event(&self, event: EngineEvent) {
        // Nobody listening is fine; a full channel means the consumer lags.
        if let Err(mpsc::error::TrySendError::Full(_)) = self.event_tx.try_send(event) {
            warn!("Event channel full, dropping event");
        }
    }
}
