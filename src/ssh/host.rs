//! Host descriptors
//!
//! The minimal view of a target host needed to derive a control path.

use std::fmt;

/// Default SSH port
pub const DEFAULT_PORT: u16 = 22;

/// Read-only view of a host: a textual identifier and a port.
///
/// The identifier is treated as an opaque string. No character validation
/// happens here; callers sanitize it if their shell or filesystem requires it.
pub trait HostDescriptor {
    /// Hostname, alias or any other stable identifier for the host
    fn identifier(&self) -> String;

    /// SSH port
    fn port(&self) -> u16;
}

impl<T: HostDescriptor + ?Sized> HostDescriptor for &T {
    fn identifier(&self) -> String {
        (**self).identifier()
    }

    fn port(&self) -> u16 {
        (**self).port()
    }
}

/// A concrete host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Host {
    /// Remote hostname, alias or IP address
    pub hostname: String,

    /// SSH port (default: 22)
    pub port: u16,
}

impl Host {
    /// Create a host on the default port
    pub fn new(hostname: impl Into<String>) -> Self {
        Self {
            hostname: hostname.into(),
            port: DEFAULT_PORT,
        }
    }

    /// Set the SSH port
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }
}

impl HostDescriptor for Host {
    fn identifier(&self) -> String {
        self.hostname.clone()
    }

    fn port(&self) -> u16 {
        self.port
    }
}

impl fmt::Display for Host {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.hostname)
    }
}
