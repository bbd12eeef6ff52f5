pub mod client;
pub mod endpoint_pool;
pub mod kube_resolver;
pub mod load_balancer;
pub mod static_resolver;

pub use crate::domain::model::{Endpoint, RequestOptions, ServiceAddress, ServiceResponse};
pub use crate::domain::ports::{AddressResolver, EndpointMetrics, LoadBalancer};
pub use crate::utils::error::Result;
