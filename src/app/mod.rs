pub mod server;

use crate::config::{ResolverKind, ServiceConfig};
use crate::core::client::LoadBalancedClient;
use crate::core::endpoint_pool::PoolOptions;
use crate::core::kube_resolver::{KubeResolver, KubeResolverOptions};
use crate::core::static_resolver::StaticResolver;
use crate::domain::model::ServiceAddress;
use crate::domain::ports::AddressResolver;
use crate::utils::error::Result;
use std::sync::Arc;
use std::time::Duration;

/// Shared state of the HTTP handler: the balanced client and the service it targets.
#[derive(Clone)]
pub struct AppState {
    pub client: Arc<LoadBalancedClient>,
    pub service: ServiceAddress,
    pub uri: String,
}

impl AppState {
    pub fn new(client: LoadBalancedClient, service: ServiceAddress, uri: impl Into<String>) -> Self {
        Self {
            client: Arc::new(client),
            service,
            uri: uri.into(),
        }
    }

    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let resolver = build_resolver(config)?;
        let client = LoadBalancedClient::builder()
            .with_load_balancer(config.load_balancer.build())
            .with_address_resolver(resolver)
            .with_pool_options(PoolOptions {
                resolve_ttl: Duration::from_secs(config.resolve_ttl_secs),
                ejection_cooldown: Duration::from_secs(config.ejection_cooldown_secs),
                failure_threshold: config.failure_threshold,
            })
            .with_request_timeout(Duration::from_secs(config.request_timeout_secs))
            .with_retries(
                config.retry_attempts,
                Duration::from_millis(config.retry_delay_ms),
            )
            .build()?;

        Ok(Self::new(
            client,
            ServiceAddress::of(config.service_name.clone()),
            config.request_uri.clone(),
        ))
    }
}

pub fn build_resolver(config: &ServiceConfig) -> Result<Arc<dyn AddressResolver>> {
    match config.resolver {
        ResolverKind::Kube => {
            let options = KubeResolverOptions::from_config(config)?;
            Ok(Arc::new(KubeResolver::create(options)?))
        }
        ResolverKind::Static => Ok(Arc::new(StaticResolver::new(config.static_addresses()?))),
    }
}
