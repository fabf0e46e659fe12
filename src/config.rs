//! Configuration and CLI argument parsing for ssh-args

use clap::{Parser, ValueEnum};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

use crate::error::{Result, SshArgsError};
use crate::ssh::{load_defaults, Arguments, Flag, Host, DEFAULT_PORT};

/// How the assembled arguments are printed
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Single space-joined command-line fragment
    #[default]
    Cli,
    /// One argv token per line
    Tokens,
    /// JSON object with `flags` and `options`
    Json,
}

/// ssh-args CLI Arguments
#[derive(Parser, Debug, Clone)]
#[command(name = "ssh-args")]
#[command(version)]
#[command(about = "Build SSH client flags, -o options and multiplexing control paths")]
pub struct Args {
    /// Host to derive the multiplexing control path for
    #[arg(long, env = "SSH_ARGS_HOST")]
    pub host: Option<String>,

    /// SSH port
    #[arg(long, default_value = "22", env = "SSH_ARGS_PORT")]
    pub port: u16,

    /// Flag to pass, either bare (`-A`) or with a value (`-p=2222`). Repeatable.
    #[arg(long = "flag", value_name = "NAME[=VALUE]", allow_hyphen_values = true)]
    pub flags: Vec<String>,

    /// `-o` option to pass as KEY=VALUE. Repeatable.
    #[arg(long = "option", value_name = "KEY=VALUE")]
    pub options: Vec<String>,

    /// Add ControlMaster/ControlPersist/ControlPath defaults for --host
    #[arg(long, default_value = "false", env = "SSH_ARGS_MULTIPLEXING")]
    pub multiplexing: bool,

    /// JSON file with default flags and options, overridden by the command line
    #[arg(long, env = "SSH_ARGS_DEFAULTS")]
    pub defaults: Option<PathBuf>,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Cli)]
    pub format: OutputFormat,

    /// Log debug output to stderr
    #[arg(short, long)]
    pub verbose: bool,
}

/// Parsed and validated configuration
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Target host, if one was given
    pub host: Option<Host>,

    /// Flags from the command line, in order
    pub flags: Vec<Flag>,

    /// Options from the command line, in order
    pub options: Vec<(String, String)>,

    /// Whether to apply multiplexing defaults
    pub multiplexing: bool,

    /// Path to a defaults file
    pub defaults: Option<PathBuf>,

    /// Output format
    pub format: OutputFormat,

    /// Debug logging
    pub verbose: bool,
}

impl Config {
    /// Create Config from CLI Args
    pub fn from_args(args: Args) -> Result<Self> {
        let mut errors = Vec::new();

        let host = match args.host {
            Some(ref h) if h.trim().is_empty() => {
                errors.push("--host cannot be empty".to_string());
                None
            }
            Some(h) => Some(Host::new(h).with_port(args.port)),
            None => None,
        };

        if args.multiplexing && host.is_none() {
            errors.push("--multiplexing requires --host".to_string());
        }

        let mut flags = Vec::with_capacity(args.flags.len());
        for raw in &args.flags {
            match parse_flag(raw) {
                Ok(flag) => flags.push(flag),
                Err(e) => errors.push(e.to_string()),
            }
        }

        let mut options = Vec::with_capacity(args.options.len());
        for raw in &args.options {
            match parse_option(raw) {
                Ok(option) => options.push(option),
                Err(e) => errors.push(e.to_string()),
            }
        }

        if !errors.is_empty() {
            return Err(SshArgsError::Config(format!(
                "Configuration error:\n{}",
                errors.join("\n")
            )));
        }

        Ok(Config {
            host,
            flags,
            options,
            multiplexing: args.multiplexing,
            defaults: args.defaults,
            format: args.format,
            verbose: args.verbose,
        })
    }

    /// Assemble the argument set: command line over defaults file over
    /// multiplexing defaults.
    pub fn build_arguments(&self) -> Result<Arguments> {
        let mut arguments = Arguments::new()
            .with_flags(self.flags.iter().cloned())
            .with_options(self.options.iter().cloned());

        if let Some(ref path) = self.defaults {
            arguments = arguments.with_defaults(&load_defaults(path)?);
        }

        if self.multiplexing {
            let host = self
                .host
                .as_ref()
                .ok_or_else(|| SshArgsError::config("--multiplexing requires --host"))?;
            arguments = arguments.with_multiplexing(host)?;
        }

        Ok(arguments)
    }
}

/// Log filter for the stderr subscriber
///
/// `--verbose` forces `debug`. Otherwise `RUST_LOG` is honoured, falling back
/// to `warn`.
pub fn log_filter(verbose: bool) -> EnvFilter {
    if verbose {
        return EnvFilter::new("debug");
    }

    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Parse a `--flag` value
///
/// - `-A` → boolean flag
/// - `-p=2222` → value flag `-p` with value `2222`
pub fn parse_flag(raw: &str) -> Result<Flag> {
    let raw = raw.trim();
    match raw.split_once('=') {
        Some((name, _)) if name.is_empty() => Err(SshArgsError::config(format!(
            "Flag name cannot be empty: '{}'",
            raw
        ))),
        Some((name, value)) => Ok(Flag::value(name, value)),
        None if raw.is_empty() => Err(SshArgsError::config("Flag cannot be empty")),
        None => Ok(Flag::bool(raw)),
    }
}

/// Parse an `--option` value of the form `KEY=VALUE`
pub fn parse_option(raw: &str) -> Result<(String, String)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(SshArgsError::config(format!(
            "Option must be KEY=VALUE: '{}'",
            raw
        ))),
    }
}
