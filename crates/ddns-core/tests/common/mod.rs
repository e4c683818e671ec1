//! Test doubles and common utilities for engine contract tests
//!
//! The doubles count their calls and record their inputs so tests can assert
//! exactly which remote calls the engine issued.

#![allow(dead_code)]

use async_trait::async_trait;
use ddns_core::config::{ConfigState, DOMAIN, INTERVAL, IP_COUNT, LOGIN_TOKEN, SUB_DOMAIN};
use ddns_core::error::{Error, Result};
use ddns_core::traits::{
    DnsProvider, IpResolver, RecordEntry, RecordHandle, RecordUpdate, StateStore, UpdateAck,
};
use std::collections::VecDeque;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const DOMAIN_NAME: &str = "example.com";
pub const SUB_DOMAIN_NAME: &str = "home";
pub const RECORD_ID_VALUE: &str = "16894439";

/// Shorthand for a dotted IPv4 literal
pub fn ip(text: &str) -> IpAddr {
    text.parse().expect("valid IP literal")
}

/// A resolver that replays a script of answers, one per call
///
/// `None` entries simulate a failed lookup. Once the script runs out the
/// last answer repeats.
#[derive(Clone)]
pub struct ScriptedResolver {
    script: Arc<Mutex<VecDeque<Option<IpAddr>>>>,
    last: Arc<Mutex<Option<IpAddr>>>,
    calls: Arc<AtomicUsize>,
    local_flags: Arc<Mutex<Vec<bool>>>,
}

impl ScriptedResolver {
    pub fn new<I>(answers: I) -> Self
    where
        I: IntoIterator<Item = Option<IpAddr>>,
    {
        Self {
            script: Arc::new(Mutex::new(answers.into_iter().collect())),
            last: Arc::new(Mutex::new(None)),
            calls: Arc::new(AtomicUsize::new(0)),
            local_flags: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Resolver that always answers with the same address
    pub fn fixed(addr: IpAddr) -> Self {
        Self::new([Some(addr)])
    }

    /// Resolver that answers with each address once, in order
    pub fn sequence(addrs: &[&str]) -> Self {
        Self::new(addrs.iter().map(|a| Some(ip(a))).collect::<Vec<_>>())
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn local_flags(&self) -> Vec<bool> {
        self.local_flags.lock().unwrap().clone()
    }
}

#[async_trait]
impl IpResolver for ScriptedResolver {
    async fn current_ip(&self, use_local: bool) -> Result<IpAddr> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.local_flags.lock().unwrap().push(use_local);

        let answer = match self.script.lock().unwrap().pop_front() {
            Some(answer) => {
                *self.last.lock().unwrap() = answer;
                answer
            }
            None => *self.last.lock().unwrap(),
        };

        answer.ok_or_else(|| Error::ip_resolver("scripted lookup failure"))
    }

    fn resolver_name(&self) -> &'static str {
        "scripted"
    }
}

/// A mock DnsProvider that records every call
#[derive(Clone)]
pub struct MockDnsProvider {
    records: Vec<RecordEntry>,
    list_fails: bool,
    /// Number of upcoming update calls that should fail
    failing_updates: Arc<AtomicUsize>,
    /// Delay applied inside update_record
    update_delay: Duration,
    list_calls: Arc<AtomicUsize>,
    updates: Arc<Mutex<Vec<RecordUpdate>>>,
    update_in_flight: Arc<AtomicBool>,
}

impl MockDnsProvider {
    /// Provider holding the managed record plus a couple of unrelated ones
    pub fn new() -> Self {
        Self::with_records(vec![
            RecordEntry {
                name: "@".to_string(),
                id: RecordHandle::new("1"),
            },
            RecordEntry {
                name: SUB_DOMAIN_NAME.to_string(),
                id: RecordHandle::new(RECORD_ID_VALUE),
            },
            RecordEntry {
                name: "mail".to_string(),
                id: RecordHandle::new("3"),
            },
        ])
    }

    pub fn with_records(records: Vec<RecordEntry>) -> Self {
        Self {
            records,
            list_fails: false,
            failing_updates: Arc::new(AtomicUsize::new(0)),
            update_delay: Duration::ZERO,
            list_calls: Arc::new(AtomicUsize::new(0)),
            updates: Arc::new(Mutex::new(Vec::new())),
            update_in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Provider whose record listing always fails
    pub fn unreachable() -> Self {
        Self {
            list_fails: true,
            ..Self::new()
        }
    }

    pub fn with_update_delay(mut self, delay: Duration) -> Self {
        self.update_delay = delay;
        self
    }

    /// Make the next `n` update calls fail
    pub fn fail_next_updates(&self, n: usize) {
        self.failing_updates.store(n, Ordering::SeqCst);
    }

    pub fn list_call_count(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn update_call_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    /// Addresses sent to update_record, in call order
    pub fn updated_ips(&self) -> Vec<IpAddr> {
        self.updates.lock().unwrap().iter().map(|u| u.ip).collect()
    }

    pub fn updates(&self) -> Vec<RecordUpdate> {
        self.updates.lock().unwrap().clone()
    }

    pub fn update_in_flight(&self) -> bool {
        self.update_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DnsProvider for MockDnsProvider {
    async fn list_records(&self, _domain: &str) -> Result<Vec<RecordEntry>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        if self.list_fails {
            return Err(Error::provider("mock", "connection refused"));
        }
        Ok(self.records.clone())
    }

    async fn update_record(&self, update: &RecordUpdate) -> Result<UpdateAck> {
        self.updates.lock().unwrap().push(update.clone());

        self.update_in_flight.store(true, Ordering::SeqCst);
        if !self.update_delay.is_zero() {
            tokio::time::sleep(self.update_delay).await;
        }
        self.update_in_flight.store(false, Ordering::SeqCst);

        let failing = self.failing_updates.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_updates.store(failing - 1, Ordering::SeqCst);
            return Err(Error::provider("mock", "API rate limited"));
        }

        Ok(UpdateAck {
            record_id: update.record_id.clone(),
            value: update.ip.to_string(),
        })
    }

    fn provider_name(&self) -> &'static str {
        "mock"
    }
}

/// A state store whose writes always fail
#[derive(Clone, Default)]
pub struct BrokenStateStore {
    attempts: Arc<AtomicUsize>,
}

impl BrokenStateStore {
    pub fn attempt_count(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl StateStore for BrokenStateStore {
    async fn persist(&self, _state: &ConfigState) -> Result<()> {
        self.attempts.fetch_add(1, Ordering::SeqCst);
        Err(Error::persistence("read-only file system"))
    }

    fn location(&self) -> String {
        "/nonexistent/ddnsrc".to_string()
    }
}

/// Minimal valid configuration for the managed record
pub fn valid_state(ip_count: usize, interval_secs: u64) -> ConfigState {
    ConfigState::defaults()
        .with(LOGIN_TOKEN, "12345,0123456789abcdef")
        .with(DOMAIN, DOMAIN_NAME)
        .with(SUB_DOMAIN, SUB_DOMAIN_NAME)
        .with(IP_COUNT, ip_count.to_string())
        .with(INTERVAL, interval_secs.to_string())
}
