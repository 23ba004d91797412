//! Network endpoints.

use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;

/// Well-known port of the service registry.
pub const DEFAULT_REGISTRY_PORT: u16 = 1099;

/// A network-reachable process, identified by host and port.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    /// Create a new endpoint.
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    /// Endpoint on the IPv4 loopback interface.
    #[must_use]
    pub fn localhost(port: u16) -> Self {
        Self::new("127.0.0.1", port)
    }

    /// Where the registry lives unless told otherwise.
    #[must_use]
    pub fn default_registry() -> Self {
        Self::localhost(DEFAULT_REGISTRY_PORT)
    }

    /// Host name or address.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// TCP port.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    /// Same host, different port.
    #[must_use]
    pub fn with_port(&self, port: u16) -> Self {
        Self::new(self.host.clone(), port)
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl From<SocketAddr> for Endpoint {
    fn from(addr: SocketAddr) -> Self {
        Self::new(addr.ip().to_string(), addr.port())
    }
}

impl FromStr for Endpoint {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason| Error::InvalidEndpoint {
            input: s.to_string(),
            reason,
        };

        let (host, port) = s.rsplit_once(':').ok_or_else(|| invalid("missing port"))?;
        let host = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);

        if host.is_empty() {
            return Err(invalid("missing host"));
        }
        if host.contains(':') && !s.starts_with('[') {
            return Err(invalid("IPv6 hosts must be bracketed"));
        }

        let port = port.parse::<u16>().map_err(|_| invalid("invalid port"))?;

        Ok(Self::new(host, port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_host_port() {
        let endpoint: Endpoint = "localhost:8080".parse().unwrap();
        assert_eq!(endpoint.host(), "localhost");
        assert_eq!(endpoint.port(), 8080);
        assert_eq!(endpoint.to_string(), "localhost:8080");
    }

    #[test]
    fn test_parse_ipv6() {
        let endpoint: Endpoint = "[::1]:1099".parse().unwrap();
        assert_eq!(endpoint.host(), "::1");
        assert_eq!(endpoint.to_string(), "[::1]:1099");
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("localhost".parse::<Endpoint>().is_err());
        assert!(":8080".parse::<Endpoint>().is_err());
        assert!("host:99999".parse::<Endpoint>().is_err());
        assert!("::1:80".parse::<Endpoint>().is_err());
    }

    #[test]
    fn test_from_socket_addr() {
        let addr = SocketAddr::from(([127, 0, 0, 1], 4000));
        assert_eq!(Endpoint::from(addr), Endpoint::localhost(4000));
    }

    #[test]
    fn test_default_registry() {
        assert_eq!(Endpoint::default_registry().port(), DEFAULT_REGISTRY_PORT);
    }
}
