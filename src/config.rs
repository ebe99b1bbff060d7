//! Host-side configuration: socket endpoints from `port.config`, platform
//! detection and the acquisition polling policy.

use dso_image::Platform;
use std::fmt;
use std::io;
use std::path::Path;
use std::time::Duration;

/// Default location of the endpoint list, relative to the working directory.
pub const PORT_CONFIG_FILE: &str = "port.config";

/// One `a.b.c.d:port` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SocketEndpoint {
    pub host: String,
    pub port: u16,
}

impl SocketEndpoint {
    /// Parse `a.b.c.d:port`. Entries without exactly three dots in the
    /// address are rejected.
    pub fn parse(entry: &str) -> Option<Self> {
        let entry = entry.trim();
        if entry.matches('.').count() != 3 {
            return None;
        }
        let (host, port) = entry.rsplit_once(':')?;
        Some(Self {
            host: host.to_string(),
            port: port.trim().parse().ok()?,
        })
    }

    /// Resource string in the `TCPIP0::host::port::SOCKET` form.
    pub fn resource_name(&self) -> String {
        format!("TCPIP0::{}::{}::SOCKET", self.host, self.port)
    }
}

impl fmt::Display for SocketEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Endpoints listed under `[SOCKET]` in `port.config`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortConfig {
    pub sockets: Vec<SocketEndpoint>,
}

impl PortConfig {
    pub fn parse(text: &str) -> Self {
        let mut in_socket = false;
        let mut sockets = Vec::new();
        for line in text.lines() {
            if line.starts_with('#') {
                continue;
            }
            if line.contains("[SOCKET]") {
                in_socket = true;
                continue;
            }
            if !in_socket {
                continue;
            }
            match SocketEndpoint::parse(line) {
                Some(ep) => sockets.push(ep),
                None if line.trim().is_empty() => {}
                None => log::warn!("Ignoring port.config entry {:?}", line.trim()),
            }
        }
        Self { sockets }
    }

    /// Load `path`; a missing file yields an empty configuration.
    pub fn load(path: &Path) -> io::Result<Self> {
        match std::fs::read_to_string(path) {
            Ok(text) => {
                log::info!("{} found", path.display());
                Ok(Self::parse(&text))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }
}

/// Detect the host platform from the kernel host name.
pub fn detect_platform() -> Platform {
    let hostname = ["/proc/sys/kernel/hostname", "/etc/hostname"]
        .iter()
        .find_map(|p| std::fs::read_to_string(p).ok())
        .unwrap_or_default();
    platform_for_hostname(&hostname)
}

pub fn platform_for_hostname(hostname: &str) -> Platform {
    if hostname.trim() == "raspberrypi" {
        Platform::RaspberryPi
    } else {
        Platform::Other
    }
}

/// Bounded polling of the acquisition state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub interval: Duration,
    pub max_polls: u32,
}

impl Default for PollPolicy {
    /// 100 ms between polls, 250 polls in total.
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(100),
            max_polls: 250,
        }
    }
}
