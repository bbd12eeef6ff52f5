// Domain layer: service addressing models and the resolver / balancer ports.

pub mod model;
pub mod ports;
