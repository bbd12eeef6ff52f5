use crate::core::endpoint_pool::{EndpointPool, PoolOptions};
use crate::core::load_balancer::RoundRobin;
use crate::domain::model::{RequestOptions, ServiceResponse};
use crate::domain::ports::{AddressResolver, LoadBalancer};
use crate::utils::error::{LbError, Result};
use reqwest::{Client, StatusCode};
use std::sync::Arc;
use std::time::Duration;

/// HTTP client that sends each request to an endpoint chosen by a load
/// balancer among the addresses a resolver returns for the target service.
pub struct LoadBalancedClient {
    http: Client,
    pool: Arc<EndpointPool>,
    retry_attempts: u32,
    retry_delay: Duration,
}

pub struct LoadBalancedClientBuilder {
    load_balancer: Option<Arc<dyn LoadBalancer>>,
    resolver: Option<Arc<dyn AddressResolver>>,
    pool_options: PoolOptions,
    request_timeout: Duration,
    retry_attempts: u32,
    retry_delay: Duration,
}

impl Default for LoadBalancedClientBuilder {
    fn default() -> Self {
        Self {
            load_balancer: None,
            resolver: None,
            pool_options: PoolOptions::default(),
            request_timeout: Duration::from_secs(5),
            retry_attempts: 0,
            retry_delay: Duration::from_millis(100),
        }
    }
}

impl LoadBalancedClientBuilder {
    pub fn with_load_balancer(mut self, load_balancer: Arc<dyn LoadBalancer>) -> Self {
        self.load_balancer = Some(load_balancer);
        self
    }

    pub fn with_address_resolver(mut self, resolver: Arc<dyn AddressResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn with_pool_options(mut self, options: PoolOptions) -> Self {
        self.pool_options = options;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_retries(mut self, attempts: u32, delay: Duration) -> Self {
        self.retry_attempts = attempts;
        self.retry_delay = delay;
        self
    }

    pub fn build(self) -> Result<LoadBalancedClient> {
        let resolver = self.resolver.ok_or_else(|| LbError::MissingConfigError {
            field: "address_resolver".to_string(),
        })?;
        let load_balancer = self
            .load_balancer
            .unwrap_or_else(|| Arc::new(RoundRobin::new()));

        let http = Client::builder().timeout(self.request_timeout).build()?;

        tracing::info!(
            "🔧 Load-balanced client ready (resolver: {}, balancer: {}, retries: {})",
            resolver.name(),
            load_balancer.name(),
            self.retry_attempts
        );

        Ok(LoadBalancedClient {
            http,
            pool: Arc::new(EndpointPool::new(
                resolver,
                load_balancer,
                self.pool_options,
            )),
            retry_attempts: self.retry_attempts,
            retry_delay: self.retry_delay,
        })
    }
}

impl LoadBalancedClient {
    pub fn builder() -> LoadBalancedClientBuilder {
        LoadBalancedClientBuilder::default()
    }

    pub fn pool(&self) -> &Arc<EndpointPool> {
        &self.pool
    }

    /// 首次請求加上重試次數
    fn total_attempts(&self) -> u32 {
        self.retry_attempts.saturating_add(1)
    }

    /// 發送 GET 請求並要求 200 回應；連線錯誤會換節點重試
    pub async fn request(&self, options: &RequestOptions) -> Result<ServiceResponse> {
        let attempts = self.total_attempts();
        let mut last_error: Option<LbError> = None;

        for attempt in 1..=attempts {
            let lease = self
                .pool
                .acquire(&options.server, options.key.as_deref())
                .await?;
            let endpoint = lease.endpoint().clone();
            let url = format!("{}{}", endpoint.base_url(), options.uri);
            tracing::debug!("➡️ GET {} (attempt {}/{})", url, attempt, attempts);

            let response = match self.http.get(&url).send().await {
                Ok(response) => response,
                Err(e) => {
                    let error = LbError::from(e);
                    if !error.is_transport() {
                        return Err(error);
                    }

                    tracing::warn!(
                        "⚠️ Request to {} failed (attempt {}/{}): {}",
                        endpoint,
                        attempt,
                        attempts,
                        error
                    );
                    self.pool.report_failure(&options.server, &lease).await;
                    last_error = Some(error);
                    drop(lease);

                    if attempt < attempts && !self.retry_delay.is_zero() {
                        tokio::time::sleep(self.retry_delay).await;
                    }
                    continue;
                }
            };

            // 節點有回應就算健康，即使狀態碼不符預期
            self.pool.report_success(&lease);

            let status = response.status();
            if status != StatusCode::OK {
                return Err(LbError::UnexpectedStatus {
                    status: status.as_u16(),
                    expected: StatusCode::OK.as_u16(),
                });
            }

            let remote_address = response
                .remote_addr()
                .unwrap_or_else(|| endpoint.socket_addr());
            let body = response.text().await?;

            return Ok(ServiceResponse {
                remote_address,
                status: status.as_u16(),
                body,
            });
        }

        Err(LbError::AllEndpointsFailed {
            service: options.server.name.clone(),
            attempts,
            last_error: last_error
                .map(|e| e.to_string())
                .unwrap_or_else(|| "no attempt was made".to_string()),
        })
    }
}
