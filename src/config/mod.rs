pub mod toml_config;

use crate::core::load_balancer::LoadBalancerKind;
use crate::utils::constants::{
    DEFAULT_PORT, DEFAULT_SERVICE_NAME, DEFAULT_VERTICLE, MAX_RETRY_ATTEMPTS,
    SERVICE_ACCOUNT_CA, SERVICE_ACCOUNT_TOKEN,
};
use crate::utils::error::{LbError, Result};
use crate::utils::validation::{
    validate_dns_label, validate_non_empty_string, validate_path, validate_positive_number,
    validate_range, validate_socket_addr, validate_url, Validate,
};
use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ResolverKind {
    #[default]
    Kube,
    Static,
}

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "microservice")]
#[command(about = "Microservice that load-balances requests across service endpoints")]
pub struct ServiceConfig {
    #[arg(long, env = "HTTP_PORT", default_value_t = DEFAULT_PORT)]
    pub port: u16,

    #[arg(long, env = "BIND_ADDRESS", default_value = "0.0.0.0")]
    pub bind_address: String,

    /// Logical service every inbound request is forwarded to
    #[arg(long, env = "SERVICE_NAME", default_value = DEFAULT_SERVICE_NAME)]
    pub service_name: String,

    #[arg(long, env = "REQUEST_URI", default_value = "/")]
    pub request_uri: String,

    /// Name of the deployed unit; the container entry point passes it as the only argument
    #[arg(default_value = DEFAULT_VERTICLE)]
    pub verticle: String,

    #[arg(long, env = "RESOLVER", value_enum, default_value_t = ResolverKind::Kube)]
    pub resolver: ResolverKind,

    /// Comma separated ip:port list used by the static resolver
    #[arg(long, env = "STATIC_ENDPOINTS", value_delimiter = ',')]
    pub static_endpoints: Vec<String>,

    /// Kubernetes API base URL; defaults to KUBERNETES_SERVICE_HOST/PORT
    #[arg(long, env = "KUBE_API_URL")]
    pub kube_api_url: Option<String>,

    #[arg(long, env = "KUBE_NAMESPACE")]
    pub namespace: Option<String>,

    #[arg(long, default_value = SERVICE_ACCOUNT_TOKEN)]
    pub token_path: String,

    #[arg(long, default_value = SERVICE_ACCOUNT_CA)]
    pub ca_cert_path: String,

    #[arg(long, help = "Accept any certificate from the Kubernetes API")]
    pub insecure_skip_tls_verify: bool,

    /// Endpoint port name to target when a service exposes several ports
    #[arg(long)]
    pub port_name: Option<String>,

    #[arg(long, env = "LOAD_BALANCER", value_enum, default_value_t = LoadBalancerKind::RoundRobin)]
    pub load_balancer: LoadBalancerKind,

    #[arg(long, default_value = "10")]
    pub resolve_ttl_secs: u64,

    #[arg(long, default_value = "5")]
    pub request_timeout_secs: u64,

    #[arg(long, default_value = "0")]
    pub retry_attempts: u32,

    #[arg(long, default_value = "100")]
    pub retry_delay_ms: u64,

    #[arg(long, default_value = "3")]
    pub failure_threshold: u32,

    #[arg(long, default_value = "30")]
    pub ejection_cooldown_secs: u64,

    /// Optional TOML file whose values override the command line
    #[arg(long, env = "LB_CONFIG")]
    pub config: Option<PathBuf>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON")]
    pub json_logs: bool,
}

// 與 #[arg] 的預設值一致，但不讀取環境變數
impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            bind_address: "0.0.0.0".to_string(),
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            request_uri: "/".to_string(),
            verticle: DEFAULT_VERTICLE.to_string(),
            resolver: ResolverKind::Kube,
            static_endpoints: Vec::new(),
            kube_api_url: None,
            namespace: None,
            token_path: SERVICE_ACCOUNT_TOKEN.to_string(),
            ca_cert_path: SERVICE_ACCOUNT_CA.to_string(),
            insecure_skip_tls_verify: false,
            port_name: None,
            load_balancer: LoadBalancerKind::RoundRobin,
            resolve_ttl_secs: 10,
            request_timeout_secs: 5,
            retry_attempts: 0,
            retry_delay_ms: 100,
            failure_threshold: 3,
            ejection_cooldown_secs: 30,
            config: None,
            verbose: false,
            json_logs: false,
        }
    }
}

impl ServiceConfig {
    pub fn listen_address(&self) -> Result<SocketAddr> {
        let ip = self
            .bind_address
            .parse()
            .map_err(|_| LbError::InvalidConfigValueError {
                field: "bind_address".to_string(),
                value: self.bind_address.clone(),
                reason: "Expected an IP address".to_string(),
            })?;
        Ok(SocketAddr::new(ip, self.port))
    }

    pub fn static_addresses(&self) -> Result<Vec<SocketAddr>> {
        self.static_endpoints
            .iter()
            .filter(|entry| !entry.trim().is_empty())
            .map(|entry| validate_socket_addr("static_endpoints", entry))
            .collect()
    }
}

impl Validate for ServiceConfig {
    fn validate(&self) -> Result<()> {
        validate_range("port", self.port, 1, u16::MAX)?;
        self.listen_address()?;
        validate_dns_label("service_name", &self.service_name)?;
        validate_non_empty_string("verticle", &self.verticle)?;

        if !self.request_uri.starts_with('/') {
            return Err(LbError::InvalidConfigValueError {
                field: "request_uri".to_string(),
                value: self.request_uri.clone(),
                reason: "URI must start with '/'".to_string(),
            });
        }

        match self.resolver {
            ResolverKind::Static => {
                if self.static_addresses()?.is_empty() {
                    return Err(LbError::ConfigValidationError {
                        field: "static_endpoints".to_string(),
                        message: "The static resolver needs at least one endpoint".to_string(),
                    });
                }
            }
            ResolverKind::Kube => {
                if let Some(url) = &self.kube_api_url {
                    validate_url("kube_api_url", url)?;
                }
                if let Some(namespace) = &self.namespace {
                    validate_dns_label("namespace", namespace)?;
                }
                validate_path("token_path", &self.token_path)?;
                validate_path("ca_cert_path", &self.ca_cert_path)?;
            }
        }

        validate_positive_number("resolve_ttl_secs", self.resolve_ttl_secs, 1)?;
        validate_positive_number("request_timeout_secs", self.request_timeout_secs, 1)?;
        validate_positive_number("ejection_cooldown_secs", self.ejection_cooldown_secs, 1)?;
        validate_positive_number("failure_threshold", self.failure_threshold.into(), 1)?;
        validate_range("retry_attempts", self.retry_attempts, 0, MAX_RETRY_ATTEMPTS)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_container_contract() {
        let config = ServiceConfig::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.service_name, "hello-node");
        assert_eq!(config.request_uri, "/");
        assert_eq!(
            config.verticle,
            "io.vertx.howtos.clientsidelb.MicroServiceVerticle"
        );
        assert_eq!(config.resolver, ResolverKind::Kube);
        assert_eq!(config.load_balancer, LoadBalancerKind::RoundRobin);
        assert_eq!(config.retry_attempts, 0);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_static_resolver_requires_endpoints() {
        let mut config = ServiceConfig::parse_from(["microservice", "--resolver", "static"]);
        assert!(config.validate().is_err());

        config.static_endpoints = vec!["10.0.0.1:8080".into(), "10.0.0.2:8080".into()];
        assert!(config.validate().is_ok());

        config.static_endpoints.push("bogus".into());
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_cli_flags() {
        let config = ServiceConfig::parse_from([
            "microservice",
            "--port",
            "9000",
            "--load-balancer",
            "least-requests",
            "--static-endpoints",
            "10.0.0.1:80,10.0.0.2:80",
            "--resolver",
            "static",
        ]);
        assert_eq!(config.port, 9000);
        assert_eq!(config.load_balancer, LoadBalancerKind::LeastRequests);
        assert_eq!(config.static_addresses().unwrap().len(), 2);
    }

    #[test]
    fn test_rejects_invalid_values() {
        let mut config = ServiceConfig::default();
        config.request_uri = "hello".into();
        assert!(config.validate().is_err());

        let mut config = ServiceConfig::default();
        config.service_name = "Hello_Node".into();
        assert!(config.validate().is_err());

        let mut config = ServiceConfig::default();
        config.kube_api_url = Some("ftp://cluster".into());
        assert!(config.validate().is_err());

        let mut config = ServiceConfig::default();
        config.failure_threshold = 0;
        assert!(config.validate().is_err());

        let mut config = ServiceConfig::default();
        config.bind_address = "localhost".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_retry_attempts_are_bounded() {
        let mut config = ServiceConfig::default();
        config.retry_attempts = MAX_RETRY_ATTEMPTS;
        assert!(config.validate().is_ok());

        config.retry_attempts = u32::MAX;
        match config.validate().unwrap_err() {
            LbError::InvalidConfigValueError { field, .. } => assert_eq!(field, "retry_attempts"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_unit_name_is_single_positional_argument() {
        let config = ServiceConfig::try_parse_from(["microservice", DEFAULT_VERTICLE]).unwrap();
        assert_eq!(config.verticle, DEFAULT_VERTICLE);

        let config =
            ServiceConfig::try_parse_from(["microservice", "com.example.OtherVerticle"]).unwrap();
        assert_eq!(config.verticle, "com.example.OtherVerticle");

        assert!(ServiceConfig::try_parse_from(["microservice", "--verticle", "x"]).is_err());
    }
}
