use crate::domain::model::{Endpoint, ServiceAddress};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Turns a logical service address into the endpoints currently serving it.
#[async_trait]
pub trait AddressResolver: Send + Sync {
    async fn resolve(&self, address: &ServiceAddress) -> Result<Vec<Endpoint>>;

    fn name(&self) -> &str;
}

/// Load view of one endpoint exposed to balancers.
pub trait EndpointMetrics {
    fn in_flight(&self) -> usize;
}

/// Picks one endpoint out of the candidates; `None` only when there are none.
pub trait LoadBalancer: Send + Sync {
    fn select(&self, endpoints: &[&dyn EndpointMetrics], key: Option<&str>) -> Option<usize>;

    fn name(&self) -> &'static str;
}
