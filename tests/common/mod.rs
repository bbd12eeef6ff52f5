#![allow(dead_code)]

use client_side_lb::app::server::serve;
use client_side_lb::core::endpoint_pool::PoolOptions;
use client_side_lb::domain::ports::AddressResolver;
use client_side_lb::{AppState, LoadBalancedClient, LoadBalancerKind, ServiceAddress, StaticResolver};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;

/// Running microservice bound to an ephemeral port; stops when dropped.
pub struct TestApp {
    pub addr: SocketAddr,
    _shutdown: oneshot::Sender<()>,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> (u16, String, String) {
        let response = reqwest::get(self.url(path)).await.unwrap();
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        let body = response.text().await.unwrap();
        (status, content_type, body)
    }
}

pub async fn spawn_app(state: AppState) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (tx, rx) = oneshot::channel::<()>();

    tokio::spawn(serve(listener, state, async {
        let _ = rx.await;
    }));

    TestApp {
        addr,
        _shutdown: tx,
    }
}

pub fn client_for(
    resolver: Arc<dyn AddressResolver>,
    balancer: LoadBalancerKind,
    retry_attempts: u32,
    failure_threshold: u32,
) -> LoadBalancedClient {
    LoadBalancedClient::builder()
        .with_load_balancer(balancer.build())
        .with_address_resolver(resolver)
        .with_pool_options(PoolOptions {
            resolve_ttl: Duration::from_secs(60),
            ejection_cooldown: Duration::from_secs(60),
            failure_threshold,
        })
        .with_request_timeout(Duration::from_secs(2))
        .with_retries(retry_attempts, Duration::from_millis(10))
        .build()
        .unwrap()
}

pub fn static_state(addrs: Vec<SocketAddr>, retry_attempts: u32) -> AppState {
    let client = client_for(
        Arc::new(StaticResolver::new(addrs)),
        LoadBalancerKind::RoundRobin,
        retry_attempts,
        1,
    );
    AppState::new(client, ServiceAddress::of("hello-node"), "/")
}

/// An address nothing listens on.
pub fn closed_port() -> SocketAddr {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap()
}
