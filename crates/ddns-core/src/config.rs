//! Layered configuration
//!
//! Every setting is a plain string. The effective configuration is merged from
//! four layers, each overwriting the keys it defines:
//!
//! 1. built-in defaults ([`ConfigState::defaults`])
//! 2. the config file ([`FileLayer`])
//! 3. environment variables named exactly like the setting
//! 4. command-line overrides (`--<setting> <value>`)
//!
//! A [`ConfigState`] is an immutable snapshot. The engine never edits it in
//! place; [`ConfigState::with`] hands back a new snapshot, which is what gets
//! persisted after a confirmed update.

use std::fmt::{self, Write as _};
use std::io;
use std::path::Path;
use std::time::Duration;

use crate::error::{Error, Result};

pub const LOGIN_TOKEN: &str = "login_token";
pub const SUB_DOMAIN: &str = "sub_domain";
pub const DOMAIN: &str = "domain";
pub const INTERVAL: &str = "interval";
pub const RECORD_ID: &str = "record_id";
pub const CURRENT_IP: &str = "current_ip";
pub const USING_LOCAL_IP: &str = "using_local_ip";
pub const EMAIL: &str = "email";
pub const IP_COUNT: &str = "ip_count";
pub const IP_POOL: &str = "ip_pool";
pub const LAST_UPDATE_TIME: &str = "last_update_time";

/// Placeholder for values the updater fills in itself
pub const AUTO: &str = "{auto}";

/// The fixed setting set, in persisted order, with built-in defaults
pub const DEFAULTS: [(&str, &str); 11] = [
    (LOGIN_TOKEN, ""),
    (SUB_DOMAIN, ""),
    (DOMAIN, ""),
    (INTERVAL, "5"),
    (RECORD_ID, AUTO),
    (CURRENT_IP, AUTO),
    (USING_LOCAL_IP, "0"),
    (EMAIL, ""),
    (IP_COUNT, "1"),
    (IP_POOL, AUTO),
    (LAST_UPDATE_TIME, AUTO),
];

/// Names of the fixed settings, in persisted order
pub fn setting_names() -> impl Iterator<Item = &'static str> {
    DEFAULTS.iter().map(|(name, _)| *name)
}

/// Snapshot of every setting, in insertion order
#[derive(Clone, PartialEq, Eq)]
pub struct ConfigState {
    entries: Vec<(String, String)>,
}

impl ConfigState {
    /// Snapshot holding only the built-in defaults
    pub fn defaults() -> Self {
        Self {
            entries: DEFAULTS
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        }
    }

    /// Run the full cascade over the defaults
    ///
    /// `env` looks up one environment variable by exact name. It is consulted
    /// for every key known after the file layer, so keys introduced by the
    /// file can be overridden from the environment too.
    pub fn cascade<F>(file: &FileLayer, env: F, argv: &[(String, String)]) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let state = Self::defaults().merge(file.pairs().iter().cloned());

        let env_pairs: Vec<(String, String)> = state
            .keys()
            .filter_map(|key| env(key).map(|value| (key.to_string(), value)))
            .collect();

        state.merge(env_pairs).merge(
            argv.iter()
                .filter(|(key, value)| !key.is_empty() && !value.is_empty())
                .map(|(key, value)| (key.to_lowercase(), value.clone())),
        )
    }

    /// Overlay a layer; later pairs win, unknown keys are appended
    pub fn merge<I>(&self, layer: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut next = self.clone();
        for (key, value) in layer {
            next.set(key, value);
        }
        next
    }

    /// New snapshot with one setting replaced
    pub fn with(&self, key: &str, value: impl Into<String>) -> Self {
        let mut next = self.clone();
        next.set(key.to_string(), value.into());
        next
    }

    fn set(&mut self, key: String, value: String) {
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    /// Look up a setting
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Look up a setting, empty string when missing
    pub fn value(&self, key: &str) -> &str {
        self.get(key).unwrap_or("")
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Check required settings and produce the typed view
    pub fn validate(&self) -> Result<Settings> {
        let login_token = self.required(LOGIN_TOKEN)?;
        let domain = self.required(DOMAIN)?;
        let sub_domain = self.required(SUB_DOMAIN)?;
        let interval = self.positive(INTERVAL)?;
        let ip_count = usize::try_from(self.positive(IP_COUNT)?)
            .map_err(|_| Error::config(format!("{} is too large", IP_COUNT)))?;

        Ok(Settings {
            login_token,
            domain,
            sub_domain,
            email: self.value(EMAIL).trim().to_string(),
            interval: Duration::from_secs(interval),
            ip_count,
            using_local_ip: parse_flag(self.value(USING_LOCAL_IP)),
        })
    }

    fn required(&self, key: &str) -> Result<String> {
        let value = self.value(key).trim();
        if value.is_empty() {
            return Err(Error::config(format!("{} is required", key)));
        }
        Ok(value.to_string())
    }

    fn positive(&self, key: &str) -> Result<u64> {
        let raw = self.value(key).trim();
        match raw.parse::<u64>() {
            Ok(n) if n > 0 => Ok(n),
            _ => Err(Error::config(format!(
                "{} must be a positive integer, got '{}'",
                key, raw
            ))),
        }
    }

    /// Serialize as aligned `key=value` lines, one per setting
    pub fn render(&self) -> String {
        let width = self.entries.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
        let mut out = String::new();
        for (key, value) in &self.entries {
            let _ = writeln!(out, "{:<width$}={}", key, value, width = width);
        }
        out
    }
}

impl Default for ConfigState {
    fn default() -> Self {
        Self::defaults()
    }
}

// Keeps the login token out of logs.
impl fmt::Debug for ConfigState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.entries.iter().map(|(k, v)| {
                let shown = if k == LOGIN_TOKEN && !v.is_empty() {
                    "<REDACTED>"
                } else {
                    v.as_str()
                };
                (k.as_str(), shown)
            }))
            .finish()
    }
}

fn parse_flag(raw: &str) -> bool {
    matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Validated, typed view of a [`ConfigState`]
#[derive(Clone, PartialEq, Eq)]
pub struct Settings {
    pub login_token: String,
    pub domain: String,
    pub sub_domain: String,
    pub email: String,
    /// Pause between polls
    pub interval: Duration,
    /// Capacity of the IP pool window
    pub ip_count: usize,
    /// Report the local interface address instead of the public one
    pub using_local_ip: bool,
}

impl Settings {
    /// Fully qualified name of the managed record
    pub fn fqdn(&self) -> String {
        format!("{}.{}", self.sub_domain, self.domain)
    }
}

impl fmt::Debug for Settings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Settings")
            .field("login_token", &"<REDACTED>")
            .field("domain", &self.domain)
            .field("sub_domain", &self.sub_domain)
            .field("email", &self.email)
            .field("interval", &self.interval)
            .field("ip_count", &self.ip_count)
            .field("using_local_ip", &self.using_local_ip)
            .finish()
    }
}

/// Outcome of reading the config file layer
///
/// Only [`FileLayer::Loaded`] contributes settings. Every other variant
/// leaves the prior state untouched.
#[derive(Debug)]
pub enum FileLayer {
    /// No file at the path
    Absent,
    /// The file exists but could not be read
    Unreadable(io::Error),
    /// A non-blank line without `=`; nothing from the file is applied
    Malformed { line: usize, content: String },
    /// Parsed `key=value` pairs, keys lowercased
    Loaded(Vec<(String, String)>),
}

impl FileLayer {
    /// Read and parse the config file, logging anything unusual
    pub fn read(path: &Path) -> Self {
        let layer = match std::fs::read_to_string(path) {
            Ok(text) => Self::parse(&text),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Self::Absent,
            Err(e) => Self::Unreadable(e),
        };

        match &layer {
            Self::Absent => {
                tracing::debug!("Config file {} not found, using defaults", path.display())
            }
            Self::Unreadable(e) => {
                tracing::warn!("Config file {} is unreadable, ignoring it: {}", path.display(), e)
            }
            Self::Malformed { line, content } => tracing::warn!(
                "Config file {} is malformed at line {} ('{}'), ignoring it",
                path.display(),
                line,
                content
            ),
            Self::Loaded(pairs) => tracing::debug!(
                "Loaded {} setting(s) from {}",
                pairs.len(),
                path.display()
            ),
        }

        layer
    }

    /// Parse config file text
    pub fn parse(text: &str) -> Self {
        let mut pairs = Vec::new();
        for (idx, raw) in text.lines().enumerate() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }

            let Some((key, value)) = line.split_once('=') else {
                return Self::Malformed {
                    line: idx + 1,
                    content: line.to_string(),
                };
            };

            let key = key.trim().to_lowercase();
            let value = value.trim();
            if key.is_empty() || value.is_empty() {
                continue;
            }
            pairs.push((key, value.to_string()));
        }
        Self::Loaded(pairs)
    }

    /// Settings contributed by this layer
    pub fn pairs(&self) -> &[(String, String)] {
        match self {
            Self::Loaded(pairs) => pairs,
            _ => &[],
        }
    }
}

/// Environment lookup backed by the process environment
pub fn process_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}
