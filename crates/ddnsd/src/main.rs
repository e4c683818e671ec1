// # ddnsd - DNSPod DDNS Daemon
//
// A thin integration layer; all update logic lives in ddns-core.
//
// The daemon is responsible for:
// 1. Parsing the command line and setting up logging
// 2. Building the configuration snapshot (defaults < file < env < argv)
// 3. Wiring the DNSPod provider, IP resolver and file state store
// 4. Running the engine until SIGTERM/SIGINT
//
// ## Configuration
//
// Every setting (`login_token`, `domain`, `sub_domain`, `interval`, ...) can
// come from the config file, an environment variable of the same name, or a
// `--<setting> <value>` flag. Confirmed updates are written back to the
// config file.
//
// Logging verbosity is controlled by `DDNS_LOG_LEVEL`
// (trace, debug, info, warn, error; default info).
//
// ## Example
//
// ```bash
// export login_token=12345,0123456789abcdef
// ddnsd -f /etc/dnspod/ddnsrc --domain example.com --sub_domain home
// ```

mod cli;

use anyhow::Result;
use ddns_core::config::{ConfigState, FileLayer, process_env};
use ddns_core::{DdnsEngine, Error, FileStateStore, Settings, ShutdownToken};
use ddns_ip_resolver::SystemIpResolver;
use ddns_provider_dnspod::DnspodProvider;
use std::env;
use std::process::ExitCode;
use tracing::{Level, debug, error, info};
use tracing_subscriber::FmtSubscriber;

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};

/// Exit codes for different termination scenarios
///
/// These codes follow systemd conventions:
/// - 0: Clean shutdown (or help requested)
/// - 1: Configuration or startup error
/// - 2: Runtime error (unexpected)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DdnsExitCode {
    /// Clean shutdown (normal exit)
    CleanShutdown = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
}

impl From<DdnsExitCode> for ExitCode {
    fn from(code: DdnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

fn main() -> ExitCode {
    let args = match cli::parse_from(env::args_os()) {
        Ok(args) => args,
        Err(e) => {
            // -h and -V print to stdout and are not failures
            let code = if e.use_stderr() {
                DdnsExitCode::ConfigError
            } else {
                DdnsExitCode::CleanShutdown
            };
            let _ = e.print();
            return code.into();
        }
    };

    let log_level = match parse_log_level(&env::var("DDNS_LOG_LEVEL").unwrap_or_default()) {
        Ok(level) => level,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder().with_max_level(log_level).finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return DdnsExitCode::ConfigError.into();
    }

    let config_path = args.config_path();
    if args.config_file.is_some() && !config_path.exists() {
        eprintln!("Config file not found: {}", config_path.display());
        eprintln!("{}", cli::command().render_usage());
        return DdnsExitCode::ConfigError.into();
    }

    let file = FileLayer::read(&config_path);
    let state = ConfigState::cascade(&file, process_env, &args.overrides);

    let settings = match state.validate() {
        Ok(settings) => settings,
        Err(e) => {
            error!("{}", e);
            return DdnsExitCode::ConfigError.into();
        }
    };

    info!("Starting ddnsd v{}", env!("CARGO_PKG_VERSION"));
    debug!("Effective settings: {:?}", settings);

    // One thread: the engine loop and the signal listener share it
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return DdnsExitCode::RuntimeError.into();
        }
    };

    rt.block_on(run_daemon(state, settings, FileStateStore::new(&config_path)))
        .into()
}

/// Wire the collaborators and run the engine until shutdown
async fn run_daemon(state: ConfigState, settings: Settings, store: FileStateStore) -> DdnsExitCode {
    let provider = match DnspodProvider::new(settings.login_token.clone(), &settings.email) {
        Ok(provider) => provider,
        Err(e) => {
            error!("{}", e);
            return DdnsExitCode::ConfigError;
        }
    };

    let resolver = match SystemIpResolver::new() {
        Ok(resolver) => resolver,
        Err(e) => {
            error!("{}", e);
            return DdnsExitCode::ConfigError;
        }
    };

    info!("State will be saved to {}", store.path().display());

    let (mut engine, mut events) =
        match DdnsEngine::new(Box::new(resolver), Box::new(provider), Box::new(store), state) {
            Ok(pair) => pair,
            Err(e) => {
                error!("{}", e);
                return DdnsExitCode::ConfigError;
            }
        };

    let shutdown = ShutdownToken::new();
    if let Err(e) = install_shutdown_handler(shutdown.clone()) {
        error!("{:#}", e);
        return DdnsExitCode::RuntimeError;
    }

    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            debug!("Engine event: {:?}", event);
        }
    });

    match engine.run(shutdown).await {
        Ok(()) => DdnsExitCode::CleanShutdown,
        Err(e @ Error::Resolution(_)) => {
            error!("get record_id failed: {}", e);
            DdnsExitCode::ConfigError
        }
        Err(e) if e.is_fatal() => {
            error!("{}", e);
            DdnsExitCode::ConfigError
        }
        Err(e) => {
            error!("Daemon error: {}", e);
            DdnsExitCode::RuntimeError
        }
    }
}

/// Map `DDNS_LOG_LEVEL` to a tracing level; empty means info
fn parse_log_level(raw: &str) -> Result<Level> {
    match raw.trim().to_lowercase().as_str() {
        "" | "info" => Ok(Level::INFO),
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        other => anyhow::bail!(
            "DDNS_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            other
        ),
    }
}

/// Trigger `shutdown` on SIGTERM or SIGINT
///
/// The engine notices the token at the top of its next iteration, so the
/// process exits at most one interval after the signal.
#[cfg(unix)]
fn install_shutdown_handler(shutdown: ShutdownToken) -> Result<()> {
    use anyhow::Context;

    let mut sigterm = signal(SignalKind::terminate()).context("Failed to setup SIGTERM handler")?;
    let mut sigint = signal(SignalKind::interrupt()).context("Failed to setup SIGINT handler")?;

    tokio::spawn(async move {
        let name = tokio::select! {
            _ = sigterm.recv() => "SIGTERM",
            _ = sigint.recv() => "SIGINT",
        };
        info!("Received {}, stopping after the current interval", name);
        shutdown.trigger();
    });

    Ok(())
}

/// Trigger `shutdown` on CTRL-C
///
/// Fallback implementation for non-Unix platforms.
#[cfg(not(unix))]
fn install_shutdown_handler(shutdown: ShutdownToken) -> Result<()> {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                info!("Received CTRL-C, stopping after the current interval");
                shutdown.trigger();
            }
            Err(e) => error!("Failed to wait for CTRL-C: {}", e),
        }
    });

    Ok(())
}
