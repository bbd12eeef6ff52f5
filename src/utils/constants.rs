//! Packaging and deployment defaults shared by the binary, the config layer and the Dockerfile.

/// Container image tag produced by the Dockerfile.
pub const IMAGE_NAME: &str = "client-side-lb/microservice";

/// Port the HTTP server listens on and the container exposes.
pub const DEFAULT_PORT: u16 = 8080;

/// Name of the deployed unit passed to the launcher as its single argument.
pub const DEFAULT_VERTICLE: &str = "io.vertx.howtos.clientsidelb.MicroServiceVerticle";

/// Logical service every inbound request is forwarded to.
pub const DEFAULT_SERVICE_NAME: &str = "hello-node";

pub const KUBERNETES_SERVICE_HOST: &str = "KUBERNETES_SERVICE_HOST";
pub const KUBERNETES_SERVICE_PORT: &str = "KUBERNETES_SERVICE_PORT";

pub const SERVICE_ACCOUNT_TOKEN: &str = "/var/run/secrets/kubernetes.io/serviceaccount/token";
pub const SERVICE_ACCOUNT_CA: &str = "/var/run/secrets/kubernetes.io/serviceaccount/ca.crt";
pub const SERVICE_ACCOUNT_NAMESPACE: &str =
    "/var/run/secrets/kubernetes.io/serviceaccount/namespace";

pub const DEFAULT_NAMESPACE: &str = "default";

/// Upper bound for `retry_attempts`.
pub const MAX_RETRY_ATTEMPTS: u32 = 10;
