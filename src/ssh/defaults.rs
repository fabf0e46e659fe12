//! Layered defaults files
//!
//! A defaults file is the JSON form of [`Arguments`]:
//!
//! ```json
//! {
//!   "flags": { "-A": null, "-p": "2222" },
//!   "options": { "ServerAliveInterval": "30" }
//! }
//! ```
//!
//! Either section may be omitted.

use std::path::Path;

use tracing::debug;

use super::arguments::Arguments;
use crate::error::{Result, SshArgsError};

/// Parse defaults from a JSON string
pub fn parse_defaults(content: &str) -> Result<Arguments> {
    serde_json::from_str(content).map_err(|e| SshArgsError::defaults(e.to_string()))
}

/// Load defaults from a JSON file
pub fn load_defaults(path: &Path) -> Result<Arguments> {
    let content = std::fs::read_to_string(path)?;
    let defaults = parse_defaults(&content).map_err(|e| match e {
        SshArgsError::Defaults(msg) => {
            SshArgsError::defaults(format!("{}: {}", path.display(), msg))
        }
        other => other,
    })?;

    debug!(
        "Loaded {} default arguments from {}",
        defaults.len(),
        path.display()
    );

    Ok(defaults)
}
