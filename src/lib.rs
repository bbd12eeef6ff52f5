pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

pub use app::{server::build_router, AppState};
pub use config::{toml_config::TomlConfig, ResolverKind, ServiceConfig};
pub use crate::core::{
    client::LoadBalancedClient, kube_resolver::KubeResolver, load_balancer::LoadBalancerKind,
    static_resolver::StaticResolver,
};
pub use domain::model::{Endpoint, RequestOptions, ServiceAddress, ServiceResponse};
pub use utils::error::{LbError, Result};
