//! ssh-args - Command-line argument builder for external SSH clients
//!
//! This crate assembles the flags and `-o key=value` options handed to an
//! `ssh`, `scp` or `rsync -e ssh` invocation. Argument sets are immutable
//! values: every `with_*` call returns a new set, and defaults can be layered
//! underneath caller-supplied values.
//!
//! # Features
//!
//! - Boolean (`-A`) and value (`-p 2222`) flags
//! - `-o Name=value` options
//! - Layered defaults, with caller values taking precedence
//! - Connection multiplexing defaults with a `ControlPath` that fits the
//!   104-byte Unix domain socket limit
//! - JSON defaults files
//!
//! # Example Usage (library)
//!
//! ```
//! use ssh_args::{Arguments, Host};
//!
//! let args = Arguments::new()
//!     .with_flag("-A", None)
//!     .with_option("StrictHostKeyChecking", "no")
//!     .with_multiplexing(&Host::new("prod-web-01"))?;
//!
//! assert_eq!(
//!     args.to_string(),
//!     "-A -o ControlMaster=auto -o ControlPersist=60 \
//!      -o ControlPath=~/.ssh/deployer_mux_prod-web-0122 -o StrictHostKeyChecking=no"
//! );
//! # Ok::<(), ssh_args::SshArgsError>(())
//! ```
//!
//! # Example Usage (CLI)
//!
//! ```bash
//! ssh $(ssh-args --host=prod-web-01 --flag=-A --multiplexing) deploy@prod-web-01
//! ```

pub mod config;
pub mod error;
pub mod ssh;

// Re-exports for convenience
pub use config::{Args, Config, OutputFormat};
pub use error::{Result, SshArgsError};
pub use ssh::{generate_control_path, Arguments, Flag, FlagValue, Host, HostDescriptor};
