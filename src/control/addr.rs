//! Control endpoint addressing
//!
//! A control endpoint is named by a string. Names that look like socket
//! addresses (`127.0.0.1:3892`, `[::1]:3892`, `localhost:3892`) select a
//! loopback TCP listener; an absolute path selects that Unix socket; any
//! other name becomes `<socket_dir>/<name>.sock`. Binding a TCP address
//! that is not loopback is refused.

use std::fmt;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};

/// Resolved control endpoint address
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControlAddr {
    /// Unix domain socket path
    Unix(PathBuf),
    /// Loopback TCP address
    Tcp(SocketAddr),
}

impl ControlAddr {
    /// Resolve an endpoint name
    pub fn resolve(name: &str, socket_dir: &Path) -> Self {
        if let Ok(addr) = name.parse::<SocketAddr>() {
            return ControlAddr::Tcp(addr);
        }

        if let Some(port) = name
            .strip_prefix("localhost:")
            .and_then(|port| port.parse::<u16>().ok())
        {
            return ControlAddr::Tcp(SocketAddr::from((Ipv4Addr::LOCALHOST, port)));
        }

        let path = Path::new(name);
        if path.is_absolute() {
            ControlAddr::Unix(path.to_path_buf())
        } else {
            ControlAddr::Unix(socket_dir.join(format!("{}.sock", name)))
        }
    }

    /// Socket path, for Unix endpoints
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            ControlAddr::Unix(path) => Some(path),
            ControlAddr::Tcp(_) => None,
        }
    }
}

impl fmt::Display for ControlAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControlAddr::Unix(path) => write!(f, "unix:{}", path.display()),
            ControlAddr::Tcp(addr) => write!(f, "tcp:{}", addr),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIR: &str = "/var/run/wireguard";

    #[test]
    fn test_resolve_socket_addr() {
        assert_eq!(
            ControlAddr::resolve("127.0.0.1:3892", Path::new(DIR)),
            ControlAddr::Tcp("127.0.0.1:3892".parse().unwrap())
        );
        assert_eq!(
            ControlAddr::resolve("[::1]:3892", Path::new(DIR)),
            ControlAddr::Tcp("[::1]:3892".parse().unwrap())
        );
    }

    #[test]
    fn test_resolve_localhost() {
        assert_eq!(
            ControlAddr::resolve("localhost:3892", Path::new(DIR)),
            ControlAddr::Tcp("127.0.0.1:3892".parse().unwrap())
        );
    }

    #[test]
    fn test_resolve_paths() {
        assert_eq!(
            ControlAddr::resolve("/tmp/ctl.sock", Path::new(DIR)),
            ControlAddr::Unix(PathBuf::from("/tmp/ctl.sock"))
        );
        let addr = ControlAddr::resolve("wg0", Path::new(DIR));
        assert_eq!(addr.as_path(), Some(Path::new("/var/run/wireguard/wg0.sock")));
    }

    #[test]
    fn test_display() {
        let addr = ControlAddr::resolve("wg0", Path::new(DIR));
        assert_eq!(addr.to_string(), "unix:/var/run/wireguard/wg0.sock");
        let addr = ControlAddr::resolve("localhost:1", Path::new(DIR));
        assert_eq!(addr.to_string(), "tcp:127.0.0.1:1");
    }
}
