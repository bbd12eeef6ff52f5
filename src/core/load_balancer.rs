use crate::domain::ports::{EndpointMetrics, LoadBalancer};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum LoadBalancerKind {
    #[default]
    RoundRobin,
    LeastRequests,
    ConsistentHashing,
}

impl LoadBalancerKind {
    pub fn build(self) -> Arc<dyn LoadBalancer> {
        match self {
            LoadBalancerKind::RoundRobin => Arc::new(RoundRobin::new()),
            LoadBalancerKind::LeastRequests => Arc::new(LeastRequests),
            LoadBalancerKind::ConsistentHashing => Arc::new(ConsistentHashing::new()),
        }
    }
}

#[derive(Debug, Default)]
pub struct RoundRobin {
    next: AtomicUsize,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LoadBalancer for RoundRobin {
    fn select(&self, endpoints: &[&dyn EndpointMetrics], _key: Option<&str>) -> Option<usize> {
        if endpoints.is_empty() {
            return None;
        }
        Some(self.next.fetch_add(1, Ordering::Relaxed) % endpoints.len())
    }

    fn name(&self) -> &'static str {
        "round-robin"
    }
}

#[derive(Debug, Default)]
pub struct LeastRequests;

impl LoadBalancer for LeastRequests {
    fn select(&self, endpoints: &[&dyn EndpointMetrics], _key: Option<&str>) -> Option<usize> {
        // min_by_key 遇到相同值時回傳第一個，因此索引較小者優先
        endpoints
            .iter()
            .enumerate()
            .min_by_key(|(_, endpoint)| endpoint.in_flight())
            .map(|(index, _)| index)
    }

    fn name(&self) -> &'static str {
        "least-requests"
    }
}

#[derive(Debug, Default)]
pub struct ConsistentHashing {
    fallback: RoundRobin,
}

impl ConsistentHashing {
    pub fn new() -> Self {
        Self::default()
    }

    fn hash_key(key: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        hasher.finish()
    }
}

impl LoadBalancer for ConsistentHashing {
    fn select(&self, endpoints: &[&dyn EndpointMetrics], key: Option<&str>) -> Option<usize> {
        if endpoints.is_empty() {
            return None;
        }
        match key {
            Some(key) => Some((Self::hash_key(key) % endpoints.len() as u64) as usize),
            None => self.fallback.select(endpoints, None),
        }
    }

    fn name(&self) -> &'static str {
        "consistent-hashing"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedLoad(usize);

    impl EndpointMetrics for FixedLoad {
        fn in_flight(&self) -> usize {
            self.0
        }
    }

    fn candidates(loads: &[usize]) -> Vec<FixedLoad> {
        loads.iter().map(|load| FixedLoad(*load)).collect()
    }

    fn as_metrics(endpoints: &[FixedLoad]) -> Vec<&dyn EndpointMetrics> {
        endpoints.iter().map(|e| e as &dyn EndpointMetrics).collect()
    }

    #[test]
    fn test_round_robin_cycles_in_order() {
        let balancer = RoundRobin::new();
        let endpoints = candidates(&[0, 0, 0]);
        let metrics = as_metrics(&endpoints);

        let picks: Vec<usize> = (0..6)
            .map(|_| balancer.select(&metrics, None).unwrap())
            .collect();
        assert_eq!(picks, vec![0, 1, 2, 0, 1, 2]);
    }

    #[test]
    fn test_empty_candidates_select_nothing() {
        let empty: Vec<&dyn EndpointMetrics> = Vec::new();
        assert_eq!(RoundRobin::new().select(&empty, None), None);
        assert_eq!(LeastRequests.select(&empty, None), None);
        assert_eq!(ConsistentHashing::new().select(&empty, Some("10.0.0.1")), None);
    }

    #[test]
    fn test_least_requests_prefers_idle_endpoint() {
        let endpoints = candidates(&[3, 1, 4, 1]);
        let metrics = as_metrics(&endpoints);
        assert_eq!(LeastRequests.select(&metrics, None), Some(1));
    }

    #[test]
    fn test_consistent_hashing_is_sticky() {
        let balancer = ConsistentHashing::new();
        let endpoints = candidates(&[0, 0, 0, 0]);
        let metrics = as_metrics(&endpoints);

        let first = balancer.select(&metrics, Some("192.168.1.20")).unwrap();
        for _ in 0..10 {
            assert_eq!(balancer.select(&metrics, Some("192.168.1.20")), Some(first));
        }
    }

    #[test]
    fn test_kind_builds_matching_balancer() {
        assert_eq!(LoadBalancerKind::default().build().name(), "round-robin");
        assert_eq!(LoadBalancerKind::LeastRequests.build().name(), "least-requests");
        assert_eq!(
            LoadBalancerKind::ConsistentHashing.build().name(),
            "consistent-hashing"
        );
    }
}
