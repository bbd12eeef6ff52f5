use crate::domain::model::{Endpoint, ServiceAddress};
use crate::domain::ports::AddressResolver;
use crate::utils::error::Result;
use crate::utils::validation::validate_socket_addr;
use async_trait::async_trait;
use std::net::SocketAddr;

/// Resolver backed by a fixed endpoint list, for running outside a cluster.
#[derive(Debug, Clone)]
pub struct StaticResolver {
    endpoints: Vec<Endpoint>,
}

impl StaticResolver {
    pub fn new(addresses: Vec<SocketAddr>) -> Self {
        let mut endpoints: Vec<Endpoint> = addresses.into_iter().map(Endpoint::from).collect();
        endpoints.sort();
        endpoints.dedup();
        Self { endpoints }
    }

    /// 解析以逗號分隔的 `ip:port` 清單
    pub fn parse(list: &str) -> Result<Self> {
        let addresses = list
            .split(',')
            .filter(|entry| !entry.trim().is_empty())
            .map(|entry| validate_socket_addr("static_endpoints", entry))
            .collect::<Result<Vec<_>>>()?;
        Ok(Self::new(addresses))
    }
}

#[async_trait]
impl AddressResolver for StaticResolver {
    async fn resolve(&self, address: &ServiceAddress) -> Result<Vec<Endpoint>> {
        tracing::debug!(
            "Static resolution of {} -> {} endpoint(s)",
            address,
            self.endpoints.len()
        );
        Ok(self.endpoints.clone())
    }

    fn name(&self) -> &str {
        "static"
    }
}
