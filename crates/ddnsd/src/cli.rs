//! Command line surface
//!
//! `-h`, `-f <path>` and one `--<setting> <value>` flag per known setting.
//! The setting flags are generated from the setting table, so they are
//! built with the clap builder API rather than a derive.

use clap::{Arg, ArgAction, Command};
use ddns_core::config::setting_names;
use std::ffi::OsString;
use std::path::PathBuf;

/// Config file used when `-f` is not given
#[cfg(windows)]
pub const DEFAULT_CONFIG_FILE: &str = "ddnspod.cfg";
#[cfg(not(windows))]
pub const DEFAULT_CONFIG_FILE: &str = "/etc/dnspod/ddnsrc";

const FILE_ARG: &str = "config-file";

/// Parsed command line
#[derive(Debug, Default, PartialEq, Eq)]
pub struct CliArgs {
    /// Path given with `-f`, if any
    pub config_file: Option<PathBuf>,
    /// `--<setting> <value>` pairs with non-empty values, in table order
    pub overrides: Vec<(String, String)>,
}

impl CliArgs {
    /// Config file to read: the `-f` path or the platform default
    pub fn config_path(&self) -> PathBuf {
        self.config_file
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE))
    }
}

pub fn command() -> Command {
    let mut cmd = Command::new("ddnsd")
        .about("Keeps a DNSPod A record pointed at this host's address")
        .version(env!("CARGO_PKG_VERSION"))
        .disable_help_flag(true)
        .args_override_self(true)
        .arg(
            Arg::new("help")
                .short('h')
                .action(ArgAction::Help)
                .help("Print this help and exit"),
        )
        .arg(
            Arg::new(FILE_ARG)
                .short('f')
                .value_name("PATH")
                .value_parser(clap::value_parser!(PathBuf))
                .help(format!("Config file (default: {})", DEFAULT_CONFIG_FILE)),
        )
        .after_help(format!(
            "Precedence: command line > environment > config file.\n\
             Every setting can also be set through an environment variable of the same name.\n\
             Default config file: {}",
            DEFAULT_CONFIG_FILE
        ));

    for name in setting_names() {
        cmd = cmd.arg(
            Arg::new(name)
                .long(name)
                .value_name("VALUE")
                .num_args(1)
                .allow_hyphen_values(true),
        );
    }

    cmd
}

/// Parse an argument vector (program name first)
pub fn parse_from<I, T>(args: I) -> Result<CliArgs, clap::Error>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let matches = command().try_get_matches_from(args)?;

    let overrides = setting_names()
        .filter_map(|name| {
            matches
                .get_one::<String>(name)
                .filter(|value| !value.is_empty())
                .map(|value| (name.to_string(), value.clone()))
        })
        .collect();

    Ok(CliArgs {
        config_file: matches.get_one::<PathBuf>(FILE_ARG).cloned(),
        overrides,
    })
}
