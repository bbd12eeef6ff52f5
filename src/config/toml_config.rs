use crate::config::{ResolverKind, ServiceConfig};
use crate::core::load_balancer::LoadBalancerKind;
use crate::utils::error::{LbError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// 設定檔內容；所有欄位皆可省略，只覆蓋有填寫的值
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    pub server: Option<ServerSection>,
    pub resolver: Option<ResolverSection>,
    pub balancer: Option<BalancerSection>,
    pub client: Option<ClientSection>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    pub port: Option<u16>,
    pub bind_address: Option<String>,
    pub service_name: Option<String>,
    pub request_uri: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolverSection {
    pub r#type: Option<ResolverKind>,
    pub static_endpoints: Option<Vec<String>>,
    pub kube_api_url: Option<String>,
    pub namespace: Option<String>,
    pub token_path: Option<String>,
    pub ca_cert_path: Option<String>,
    pub insecure_skip_tls_verify: Option<bool>,
    pub port_name: Option<String>,
    pub ttl_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BalancerSection {
    pub strategy: Option<LoadBalancerKind>,
    pub failure_threshold: Option<u32>,
    pub ejection_cooldown_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ClientSection {
    pub timeout_secs: Option<u64>,
    pub retry_attempts: Option<u32>,
    pub retry_delay_ms: Option<u64>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(LbError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        toml::from_str(&processed_content).map_err(|e| LbError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${NAMESPACE})，未定義的變數保持原樣
    fn substitute_env_vars(content: &str) -> String {
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .into_owned()
    }

    /// 將設定檔中有填寫的值覆蓋到命令列配置上
    pub fn apply_to(&self, config: &mut ServiceConfig) {
        if let Some(server) = &self.server {
            override_value(&mut config.port, server.port);
            override_value(&mut config.bind_address, server.bind_address.clone());
            override_value(&mut config.service_name, server.service_name.clone());
            override_value(&mut config.request_uri, server.request_uri.clone());
        }

        if let Some(resolver) = &self.resolver {
            override_value(&mut config.resolver, resolver.r#type);
            override_value(&mut config.static_endpoints, resolver.static_endpoints.clone());
            if resolver.kube_api_url.is_some() {
                config.kube_api_url = resolver.kube_api_url.clone();
            }
            if resolver.namespace.is_some() {
                config.namespace = resolver.namespace.clone();
            }
            override_value(&mut config.token_path, resolver.token_path.clone());
            override_value(&mut config.ca_cert_path, resolver.ca_cert_path.clone());
            override_value(
                &mut config.insecure_skip_tls_verify,
                resolver.insecure_skip_tls_verify,
            );
            if resolver.port_name.is_some() {
                config.port_name = resolver.port_name.clone();
            }
            override_value(&mut config.resolve_ttl_secs, resolver.ttl_secs);
        }

        if let Some(balancer) = &self.balancer {
            override_value(&mut config.load_balancer, balancer.strategy);
            override_value(&mut config.failure_threshold, balancer.failure_threshold);
            override_value(
                &mut config.ejection_cooldown_secs,
                balancer.ejection_cooldown_secs,
            );
        }

        if let Some(client) = &self.client {
            override_value(&mut config.request_timeout_secs, client.timeout_secs);
            override_value(&mut config.retry_attempts, client.retry_attempts);
            override_value(&mut config.retry_delay_ms, client.retry_delay_ms);
        }
    }
}

fn override_value<T>(target: &mut T, value: Option<T>) {
    if let Some(value) = value {
        *target = value;
    }
}
