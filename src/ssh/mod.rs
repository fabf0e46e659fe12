//! SSH client argument construction
//!
//! This module builds argument strings for an external `ssh` (or `scp`/`rsync -e`)
//! invocation, including connection multiplexing defaults.

pub mod arguments;
pub mod control_path;
pub mod defaults;
pub mod host;

// Re-exports
pub use arguments::{Arguments, Flag, FlagValue, DEFAULT_CONTROL_PERSIST};
pub use control_path::{
    generate_control_path, generate_control_path_within, ControlPathCandidate,
    MAX_CONTROL_PATH_LEN,
};
pub use defaults::{load_defaults, parse_defaults};
pub use host::{Host, HostDescriptor, DEFAULT_PORT};
