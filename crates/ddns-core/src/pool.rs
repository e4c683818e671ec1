//! Egress IP pool
//!
//! Hosts behind a load-balancing NAT see their outbound address rotate
//! between a handful of values from one poll to the next. Treating every
//! rotation as a change would hit the provider on nearly every tick. The pool
//! remembers the last `ip_count` distinct addresses that were pushed to DNS
//! and only reports an address as [`Observation::New`] when it is outside
//! that window.
//!
//! Classification and mutation are split on purpose: [`IpPool::observe`]
//! never adds an address, [`IpPool::commit`] does, and the engine calls it
//! only once the remote update succeeded.

use crate::config::AUTO;

/// Classification of an observed address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    /// Already inside the window
    Known,
    /// Never confirmed within the window
    New,
}

/// Bounded window of recently confirmed addresses, newest first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IpPool {
    entries: Vec<String>,
    capacity: usize,
}

impl IpPool {
    /// Empty pool
    ///
    /// Nothing is preallocated; `commit` truncates to `capacity`.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: Vec::new(),
            capacity: capacity.max(1),
        }
    }

    /// Rebuild the pool from the comma-joined `ip_pool` setting
    pub fn from_setting(raw: &str, capacity: usize) -> Self {
        let mut pool = Self::new(capacity);
        pool.entries = raw
            .split(',')
            .map(str::trim)
            .filter(|ip| !ip.is_empty() && *ip != AUTO)
            .map(str::to_string)
            .collect();
        pool.entries.truncate(pool.capacity);
        pool
    }

    /// Classify an address
    ///
    /// A known address is moved to the front so the addresses still in
    /// rotation are the last to age out of the window. Membership never
    /// changes here. The new order lives in memory only; the persisted
    /// `ip_pool` setting keeps the old order until the next confirmed update.
    pub fn observe(&mut self, ip: &str) -> Observation {
        match self.entries.iter().position(|known| known == ip) {
            Some(idx) => {
                let known = self.entries.remove(idx);
                self.entries.insert(0, known);
                Observation::Known
            }
            None => Observation::New,
        }
    }

    /// Record an address whose remote update was confirmed
    pub fn commit(&mut self, ip: &str) {
        self.entries.retain(|known| known != ip);
        self.entries.insert(0, ip.to_string());
        self.entries.truncate(self.capacity);
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Comma-joined form stored in the `ip_pool` setting
    pub fn to_setting(&self) -> String {
        self.entries.join(",")
    }
}
