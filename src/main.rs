//! ssh-args - Entry point
//!
//! Parses CLI arguments, assembles the argument set and prints it to stdout
//! for splicing into an `ssh`/`scp`/`rsync` command line.

use anyhow::Context;
use clap::Parser;
use tracing::{debug, error};
use tracing_subscriber::FmtSubscriber;

use ssh_args::config::{log_filter, Args, Config, OutputFormat};
use ssh_args::ssh::MAX_CONTROL_PATH_LEN;
use ssh_args::SshArgsError;

fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize tracing/logging to stderr (stdout carries the arguments)
    FmtSubscriber::builder()
        .with_env_filter(log_filter(args.verbose))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Validate and create config
    let config = Config::from_args(args)?;

    debug!("ssh-args v{}", env!("CARGO_PKG_VERSION"));
    if let Some(ref host) = config.host {
        debug!("Target {}:{}", host.hostname, host.port);
    }

    let arguments = match config.build_arguments() {
        Err(SshArgsError::ControlPathTooLong { host, path }) => {
            error!("No control path candidate fits in {} bytes", MAX_CONTROL_PATH_LEN);
            anyhow::bail!(
                "Cannot enable multiplexing for {}: control path {} is too long. \
                 Shorten the host alias or home directory path.",
                host,
                path
            );
        }
        other => other.context("Failed to build SSH arguments")?,
    };

    match config.format {
        OutputFormat::Cli => println!("{}", arguments),
        OutputFormat::Tokens => {
            for token in arguments.to_cli_tokens() {
                println!("{}", token);
            }
        }
        OutputFormat::Json => {
            let json = arguments
                .to_json()
                .context("Failed to serialize arguments")?;
            println!("{}", json);
        }
    }

    Ok(())
}
