use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, SocketAddr};

/// 邏輯服務位址，由 resolver 轉換成實際的 pod 端點
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ServiceAddress {
    pub name: String,
}

impl ServiceAddress {
    pub fn of(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

impl fmt::Display for ServiceAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Endpoint {
    pub ip: IpAddr,
    pub port: u16,
    /// Pod name from the endpoint's `targetRef`, when the resolver knows it.
    pub target: Option<String>,
}

impl Endpoint {
    pub fn new(ip: IpAddr, port: u16) -> Self {
        Self {
            ip,
            port,
            target: None,
        }
    }

    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.target = Some(target.into());
        self
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.ip, self.port)
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.socket_addr())
    }
}

impl From<SocketAddr> for Endpoint {
    fn from(addr: SocketAddr) -> Self {
        Self::new(addr.ip(), addr.port())
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.target {
            Some(target) => write!(f, "{} ({})", self.socket_addr(), target),
            None => write!(f, "{}", self.socket_addr()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceResponse {
    pub remote_address: SocketAddr,
    pub status: u16,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct RequestOptions {
    pub server: ServiceAddress,
    pub uri: String,
    /// Affinity key for hashing balancers, usually the caller's IP.
    pub key: Option<String>,
}

impl RequestOptions {
    pub fn get(server: ServiceAddress, uri: impl Into<String>) -> Self {
        Self {
            server,
            uri: uri.into(),
            key: None,
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_addresses() {
        let endpoint = Endpoint::new("10.1.0.7".parse().unwrap(), 8080);
        assert_eq!(endpoint.socket_addr().to_string(), "10.1.0.7:8080");
        assert_eq!(endpoint.base_url(), "http://10.1.0.7:8080");

        let v6 = Endpoint::new("fd00::1".parse().unwrap(), 80).with_target("hello-node-abc");
        assert_eq!(v6.base_url(), "http://[fd00::1]:80");
        assert_eq!(v6.to_string(), "[fd00::1]:80 (hello-node-abc)");
    }
}
