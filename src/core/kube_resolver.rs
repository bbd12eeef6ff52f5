use crate::config::ServiceConfig;
use crate::domain::model::{Endpoint, ServiceAddress};
use crate::domain::ports::AddressResolver;
use crate::utils::constants::{
    DEFAULT_NAMESPACE, KUBERNETES_SERVICE_HOST, KUBERNETES_SERVICE_PORT, SERVICE_ACCOUNT_NAMESPACE,
};
use crate::utils::error::{LbError, Result};
use async_trait::async_trait;
use reqwest::{header, Certificate, Client, StatusCode};
use serde::Deserialize;
use std::net::IpAddr;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct KubeResolverOptions {
    pub api_server: String,
    pub namespace: String,
    pub bearer_token: Option<String>,
    /// Token file re-read on every resolution; projected tokens rotate
    pub token_path: Option<String>,
    pub ca_certificate: Option<Vec<u8>>,
    pub insecure_skip_tls_verify: bool,
    pub port_name: Option<String>,
    pub request_timeout: Duration,
}

impl KubeResolverOptions {
    pub fn new(api_server: impl Into<String>) -> Self {
        Self {
            api_server: api_server.into(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            bearer_token: None,
            token_path: None,
            ca_certificate: None,
            insecure_skip_tls_verify: false,
            port_name: None,
            request_timeout: Duration::from_secs(5),
        }
    }

    /// 從設定、環境變數與 service account 檔案組出 resolver 選項
    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        let api_server = match &config.kube_api_url {
            Some(url) => url.clone(),
            None => api_server_from_env(
                std::env::var(KUBERNETES_SERVICE_HOST).ok(),
                std::env::var(KUBERNETES_SERVICE_PORT).ok(),
            )?,
        };

        let namespace = match &config.namespace {
            Some(namespace) => namespace.clone(),
            None => read_trimmed(SERVICE_ACCOUNT_NAMESPACE)?
                .unwrap_or_else(|| DEFAULT_NAMESPACE.to_string()),
        };

        let bearer_token = read_trimmed(&config.token_path)?;
        if bearer_token.is_none() {
            tracing::warn!(
                "Service account token not found at {}, calling the API anonymously",
                config.token_path
            );
        }

        let ca_certificate = if Path::new(&config.ca_cert_path).exists() {
            Some(std::fs::read(&config.ca_cert_path)?)
        } else {
            None
        };

        Ok(Self {
            api_server,
            namespace,
            bearer_token,
            token_path: Some(config.token_path.clone()),
            ca_certificate,
            insecure_skip_tls_verify: config.insecure_skip_tls_verify,
            port_name: config.port_name.clone(),
            request_timeout: Duration::from_secs(config.request_timeout_secs),
        })
    }
}

fn api_server_from_env(host: Option<String>, port: Option<String>) -> Result<String> {
    let host = host.ok_or_else(|| LbError::MissingConfigError {
        field: KUBERNETES_SERVICE_HOST.to_string(),
    })?;
    let port = port.ok_or_else(|| LbError::MissingConfigError {
        field: KUBERNETES_SERVICE_PORT.to_string(),
    })?;

    let port: u16 = port
        .trim()
        .parse()
        .map_err(|_| LbError::InvalidConfigValueError {
            field: KUBERNETES_SERVICE_PORT.to_string(),
            value: port.clone(),
            reason: "Expected a port number".to_string(),
        })?;

    match host.parse::<IpAddr>() {
        Ok(IpAddr::V6(v6)) => Ok(format!("https://[{}]:{}", v6, port)),
        _ => Ok(format!("https://{}:{}", host, port)),
    }
}

fn read_trimmed(path: &str) -> Result<Option<String>> {
    if !Path::new(path).exists() {
        return Ok(None);
    }
    let content = std::fs::read_to_string(path)?;
    let trimmed = content.trim();
    Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
}

#[derive(Debug, Deserialize)]
struct EndpointsObject {
    #[serde(default)]
    subsets: Vec<EndpointSubset>,
}

#[derive(Debug, Deserialize)]
struct EndpointSubset {
    #[serde(default)]
    addresses: Vec<EndpointAddress>,
    #[serde(default)]
    ports: Vec<EndpointPort>,
}

#[derive(Debug, Deserialize)]
struct EndpointAddress {
    ip: String,
    #[serde(rename = "targetRef")]
    target_ref: Option<ObjectReference>,
}

#[derive(Debug, Deserialize)]
struct ObjectReference {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EndpointPort {
    name: Option<String>,
    port: u16,
    protocol: Option<String>,
}

impl EndpointPort {
    fn is_tcp(&self) -> bool {
        self.protocol.as_deref().map_or(true, |p| p == "TCP")
    }
}

/// Flattens the ready addresses of an `Endpoints` object. Not-ready
/// addresses live in a separate field and are never read.
fn collect_endpoints(object: EndpointsObject, port_name: Option<&str>) -> Vec<Endpoint> {
    let mut endpoints = Vec::new();

    for subset in object.subsets {
        let port = match port_name {
            Some(name) => subset
                .ports
                .iter()
                .find(|p| p.name.as_deref() == Some(name)),
            None => subset.ports.iter().find(|p| p.is_tcp()),
        };
        let Some(port) = port else {
            tracing::debug!("Skipping endpoint subset without a matching port");
            continue;
        };

        for address in subset.addresses {
            let ip = match address.ip.parse::<IpAddr>() {
                Ok(ip) => ip,
                Err(_) => {
                    tracing::warn!("⚠️ Ignoring endpoint with invalid IP '{}'", address.ip);
                    continue;
                }
            };
            let mut endpoint = Endpoint::new(ip, port.port);
            if let Some(name) = address.target_ref.and_then(|r| r.name) {
                endpoint = endpoint.with_target(name);
            }
            endpoints.push(endpoint);
        }
    }

    endpoints.sort();
    endpoints.dedup_by(|a, b| a.socket_addr() == b.socket_addr());
    endpoints
}

/// Resolves services through the Kubernetes Endpoints API.
pub struct KubeResolver {
    options: KubeResolverOptions,
    client: Client,
}

impl KubeResolver {
    pub fn create(options: KubeResolverOptions) -> Result<Self> {
        let mut builder = Client::builder()
            .timeout(options.request_timeout)
            .danger_accept_invalid_certs(options.insecure_skip_tls_verify);

        if let Some(pem) = &options.ca_certificate {
            builder = builder.add_root_certificate(Certificate::from_pem(pem)?);
        }

        let client = builder.build()?;

        tracing::info!(
            "Kubernetes resolver targeting {} (namespace: {})",
            options.api_server,
            options.namespace
        );

        Ok(Self { options, client })
    }

    fn endpoints_url(&self, service: &str) -> String {
        format!(
            "{}/api/v1/namespaces/{}/endpoints/{}",
            self.options.api_server.trim_end_matches('/'),
            self.options.namespace,
            service
        )
    }

    /// 每次解析都重新讀取 token 檔；檔案不存在時沿用啟動時讀到的值
    async fn current_token(&self) -> Result<Option<String>> {
        if let Some(path) = &self.options.token_path {
            match tokio::fs::read_to_string(path).await {
                Ok(content) => {
                    let token = content.trim();
                    if !token.is_empty() {
                        return Ok(Some(token.to_string()));
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(self.options.bearer_token.clone())
    }
}

#[async_trait]
impl AddressResolver for KubeResolver {
    async fn resolve(&self, address: &ServiceAddress) -> Result<Vec<Endpoint>> {
        let url = self.endpoints_url(&address.name);
        tracing::debug!("Resolving {} via {}", address, url);

        let mut request = self.client.get(&url);
        if let Some(token) = self.current_token().await? {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }

        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Err(LbError::ResolutionError {
                service: address.name.clone(),
                message: format!("service not found in namespace {}", self.options.namespace),
            });
        }
        if !status.is_success() {
            return Err(LbError::ResolutionError {
                service: address.name.clone(),
                message: format!("Kubernetes API answered {}", status),
            });
        }

        let object: EndpointsObject = serde_json::from_slice(&response.bytes().await?)?;
        let endpoints = collect_endpoints(object, self.options.port_name.as_deref());

        tracing::debug!("Resolved {} to {} endpoint(s)", address, endpoints.len());
        Ok(endpoints)
    }

    fn name(&self) -> &str {
        "kubernetes"
    }
}
