use crate::domain::model::{Endpoint, ServiceAddress};
use crate::domain::ports::{AddressResolver, EndpointMetrics, LoadBalancer};
use crate::utils::error::{LbError, Result};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tokio::sync::{Mutex as AsyncMutex, RwLock};

#[derive(Debug, Clone)]
pub struct PoolOptions {
    pub resolve_ttl: Duration,
    pub ejection_cooldown: Duration,
    pub failure_threshold: u32,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            resolve_ttl: Duration::from_secs(10),
            ejection_cooldown: Duration::from_secs(30),
            failure_threshold: 3,
        }
    }
}

/// Health and load state of one endpoint, shared across resolutions.
#[derive(Debug)]
pub struct EndpointStats {
    endpoint: Endpoint,
    in_flight: AtomicUsize,
    failures: AtomicU32,
    ejected_until: Mutex<Option<Instant>>,
}

impl EndpointStats {
    fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            in_flight: AtomicUsize::new(0),
            failures: AtomicU32::new(0),
            ejected_until: Mutex::new(None),
        }
    }

    pub fn endpoint(&self) -> &Endpoint {
        &self.endpoint
    }

    pub fn is_ejected(&self, now: Instant) -> bool {
        let guard = self.ejected_until.lock().unwrap_or_else(|e| e.into_inner());
        matches!(*guard, Some(until) if until > now)
    }

    fn eject(&self, until: Option<Instant>) {
        let mut guard = self.ejected_until.lock().unwrap_or_else(|e| e.into_inner());
        *guard = until;
    }
}

impl EndpointMetrics for EndpointStats {
    fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::Relaxed)
    }
}

/// In-flight marker for a selected endpoint; released on drop.
#[derive(Debug)]
pub struct EndpointLease {
    stats: Arc<EndpointStats>,
}

impl EndpointLease {
    fn new(stats: Arc<EndpointStats>) -> Self {
        stats.in_flight.fetch_add(1, Ordering::Relaxed);
        Self { stats }
    }

    pub fn endpoint(&self) -> &Endpoint {
        self.stats.endpoint()
    }
}

impl Drop for EndpointLease {
    fn drop(&mut self) {
        self.stats.in_flight.fetch_sub(1, Ordering::Relaxed);
    }
}

struct CachedEntry {
    endpoints: Vec<Arc<EndpointStats>>,
    resolved_at: Instant,
    stale: bool,
}

impl CachedEntry {
    fn is_fresh(&self, ttl: Duration) -> bool {
        !self.stale && self.resolved_at.elapsed() < ttl
    }
}

pub struct EndpointPool {
    resolver: Arc<dyn AddressResolver>,
    balancer: Arc<dyn LoadBalancer>,
    options: PoolOptions,
    cache: RwLock<HashMap<String, CachedEntry>>,
    // 每個服務一把鎖，同一時間只有一個解析在進行
    refreshing: AsyncMutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl EndpointPool {
    pub fn new(
        resolver: Arc<dyn AddressResolver>,
        balancer: Arc<dyn LoadBalancer>,
        options: PoolOptions,
    ) -> Self {
        Self {
            resolver,
            balancer,
            options,
            cache: RwLock::new(HashMap::new()),
            refreshing: AsyncMutex::new(HashMap::new()),
        }
    }

    async fn cached(&self, address: &ServiceAddress) -> Option<Vec<Arc<EndpointStats>>> {
        let cache = self.cache.read().await;
        cache
            .get(&address.name)
            .filter(|entry| entry.is_fresh(self.options.resolve_ttl))
            .map(|entry| entry.endpoints.clone())
    }

    async fn refresh_gate(&self, service: &str) -> Arc<AsyncMutex<()>> {
        let mut gates = self.refreshing.lock().await;
        Arc::clone(gates.entry(service.to_string()).or_default())
    }

    /// 取得服務的端點清單，快取在 TTL 內直接回傳
    ///
    /// Concurrent misses for the same service share a single resolver call:
    /// callers that waited on the refresh pick up its result from the cache.
    pub async fn endpoints(&self, address: &ServiceAddress) -> Result<Vec<Arc<EndpointStats>>> {
        if let Some(endpoints) = self.cached(address).await {
            return Ok(endpoints);
        }

        let gate = self.refresh_gate(&address.name).await;
        let _refresh = gate.lock().await;
        if let Some(endpoints) = self.cached(address).await {
            return Ok(endpoints);
        }

        let resolved = self.resolver.resolve(address).await?;

        let mut cache = self.cache.write().await;
        let previous: HashMap<SocketAddr, Arc<EndpointStats>> = cache
            .remove(&address.name)
            .map(|entry| {
                entry
                    .endpoints
                    .into_iter()
                    .map(|stats| (stats.endpoint().socket_addr(), stats))
                    .collect()
            })
            .unwrap_or_default();

        let endpoints: Vec<Arc<EndpointStats>> = resolved
            .into_iter()
            .map(|endpoint| match previous.get(&endpoint.socket_addr()) {
                Some(stats) => Arc::clone(stats),
                None => Arc::new(EndpointStats::new(endpoint)),
            })
            .collect();

        tracing::debug!(
            "Refreshed {} via {} resolver: {} endpoint(s)",
            address,
            self.resolver.name(),
            endpoints.len()
        );

        cache.insert(
            address.name.clone(),
            CachedEntry {
                endpoints: endpoints.clone(),
                resolved_at: Instant::now(),
                stale: false,
            },
        );

        Ok(endpoints)
    }

    pub async fn acquire(&self, address: &ServiceAddress, key: Option<&str>) -> Result<EndpointLease> {
        let all = self.endpoints(address).await?;
        if all.is_empty() {
            return Err(LbError::NoEndpoints {
                service: address.name.clone(),
            });
        }

        let now = Instant::now();
        let mut candidates: Vec<&Arc<EndpointStats>> =
            all.iter().filter(|stats| !stats.is_ejected(now)).collect();
        if candidates.is_empty() {
            tracing::warn!(
                "⚠️ Every endpoint of {} is ejected, selecting among all of them",
                address
            );
            candidates = all.iter().collect();
        }

        let metrics: Vec<&dyn EndpointMetrics> = candidates
            .iter()
            .map(|stats| &***stats as &dyn EndpointMetrics)
            .collect();
        let index = self
            .balancer
            .select(&metrics, key)
            .ok_or_else(|| LbError::NoEndpoints {
                service: address.name.clone(),
            })?;

        let stats = Arc::clone(candidates[index]);
        tracing::debug!(
            "{} selected {} for {}",
            self.balancer.name(),
            stats.endpoint(),
            address
        );
        Ok(EndpointLease::new(stats))
    }

    pub fn report_success(&self, lease: &EndpointLease) {
        lease.stats.failures.store(0, Ordering::Relaxed);
        lease.stats.eject(None);
    }

    pub async fn report_failure(&self, address: &ServiceAddress, lease: &EndpointLease) {
        let failures = lease.stats.failures.fetch_add(1, Ordering::Relaxed) + 1;
        if failures < self.options.failure_threshold {
            return;
        }

        tracing::warn!(
            "⚠️ Ejecting {} for {:?} after {} consecutive failure(s)",
            lease.endpoint(),
            self.options.ejection_cooldown,
            failures
        );
        lease.stats.failures.store(0, Ordering::Relaxed);
        lease
            .stats
            .eject(Some(Instant::now() + self.options.ejection_cooldown));
        self.invalidate(address).await;
    }

    /// Forces the next lookup to re-resolve; endpoint stats carry over.
    pub async fn invalidate(&self, address: &ServiceAddress) {
        if let Some(entry) = self.cache.write().await.get_mut(&address.name) {
            entry.stale = true;
        }
    }
}
