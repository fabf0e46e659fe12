//! Multiplexing control path derivation
//!
//! SSH binds the `ControlPath` as a Unix domain socket. Paths longer than the
//! socket address allows fail at connect time with
//! `unix_listener: too long for Unix domain socket`, so the path is picked from
//! a fixed list of progressively shorter templates. `%C` asks SSH to substitute
//! a hash of the connection attributes.

use tracing::{debug, trace};

use super::host::HostDescriptor;
use crate::error::{Result, SshArgsError};

/// Maximum control path length in bytes
pub const MAX_CONTROL_PATH_LEN: usize = 104;

/// Control path templates, longest and most descriptive first
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlPathCandidate {
    /// `~/.ssh/deployer_mux_<host><port>`
    SshDirDescriptive,
    /// `~/.ssh/deployer_mux_%C`
    SshDirHash,
    /// `~/deployer_mux_<host><port>`
    HomeDescriptive,
    /// `~/deployer_mux_%C`
    HomeDeployerHash,
    /// `~/mux_%C`
    HomeShortHash,
}

impl ControlPathCandidate {
    /// All candidates in the order they are tried
    pub const ORDERED: [ControlPathCandidate; 5] = [
        ControlPathCandidate::SshDirDescriptive,
        ControlPathCandidate::SshDirHash,
        ControlPathCandidate::HomeDescriptive,
        ControlPathCandidate::HomeDeployerHash,
        ControlPathCandidate::HomeShortHash,
    ];

    /// Render the template for the given connection data
    pub fn render(self, connection_data: &str) -> String {
        match self {
            ControlPathCandidate::SshDirDescriptive => {
                format!("~/.ssh/deployer_mux_{}", connection_data)
            }
            ControlPathCandidate::SshDirHash => "~/.ssh/deployer_mux_%C".to_string(),
            ControlPathCandidate::HomeDescriptive => format!("~/deployer_mux_{}", connection_data),
            ControlPathCandidate::HomeDeployerHash => "~/deployer_mux_%C".to_string(),
            ControlPathCandidate::HomeShortHash => "~/mux_%C".to_string(),
        }
    }
}

/// Derive the control path for a host under [`MAX_CONTROL_PATH_LEN`].
///
/// # Examples
///
/// ```
/// use ssh_args::ssh::{generate_control_path, Host};
///
/// let path = generate_control_path(&Host::new("prod-web-01")).unwrap();
/// assert_eq!(path, "~/.ssh/deployer_mux_prod-web-0122");
/// ```
pub fn generate_control_path(host: &impl HostDescriptor) -> Result<String> {
    generate_control_path_within(host, MAX_CONTROL_PATH_LEN)
}

/// Derive the control path for a host, returning the first candidate whose
/// length is at most `max_len` bytes.
///
/// # Returns
/// * `Ok(String)` - The first fitting candidate in [`ControlPathCandidate::ORDERED`]
/// * `Err(SshArgsError::ControlPathTooLong)` - If no candidate fits
pub fn generate_control_path_within(host: &impl HostDescriptor, max_len: usize) -> Result<String> {
    let connection_data = format!("{}{}", host.identifier(), host.port());
    let mut control_path = String::new();

    for candidate in ControlPathCandidate::ORDERED {
        control_path = candidate.render(&connection_data);
        if control_path.len() <= max_len {
            trace!("Using control path {} ({:?})", control_path, candidate);
            return Ok(control_path);
        }
        debug!(
            "Control path candidate {:?} is {} bytes (max {}), trying a shorter one",
            candidate,
            control_path.len(),
            max_len
        );
    }

    Err(SshArgsError::control_path_too_long(connection_data, control_path))
}
