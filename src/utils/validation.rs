use crate::utils::error::{LbError, Result};
use regex::Regex;
use std::net::SocketAddr;
use std::sync::OnceLock;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(LbError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: "URL cannot be empty".to_string(),
        });
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(LbError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: url_str.to_string(),
                reason: format!("Unsupported URL scheme: {}", scheme),
            }),
        },
        Err(e) => Err(LbError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: url_str.to_string(),
            reason: format!("Invalid URL format: {}", e),
        }),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(LbError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(LbError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_positive_number(field_name: &str, value: u64, min_value: u64) -> Result<()> {
    if value < min_value {
        return Err(LbError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be at least {}", min_value),
        });
    }
    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(LbError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(LbError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

pub fn validate_socket_addr(field_name: &str, value: &str) -> Result<SocketAddr> {
    value
        .trim()
        .parse::<SocketAddr>()
        .map_err(|e| LbError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Expected ip:port ({})", e),
        })
}

/// Kubernetes 服務名稱必須符合 RFC 1123 label
pub fn validate_dns_label(field_name: &str, value: &str) -> Result<()> {
    static LABEL: OnceLock<Regex> = OnceLock::new();
    let re = LABEL.get_or_init(|| {
        Regex::new(r"^[a-z0-9]([-a-z0-9]*[a-z0-9])?$").expect("DNS label pattern is valid")
    });

    if value.len() > 63 || !re.is_match(value) {
        return Err(LbError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Must be a lowercase RFC 1123 label of at most 63 characters".to_string(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_url() {
        assert!(validate_url("kube_api_url", "https://10.96.0.1:443").is_ok());
        assert!(validate_url("kube_api_url", "http://127.0.0.1:8001").is_ok());
        assert!(validate_url("kube_api_url", "").is_err());
        assert!(validate_url("kube_api_url", "invalid-url").is_err());
        assert!(validate_url("kube_api_url", "ftp://example.com").is_err());
    }

    #[test]
    fn test_validate_positive_number() {
        assert!(validate_positive_number("resolve_ttl_secs", 5, 1).is_ok());
        assert!(validate_positive_number("resolve_ttl_secs", 0, 1).is_err());
    }

    #[test]
    fn test_validate_socket_addr() {
        assert_eq!(
            validate_socket_addr("static_endpoints", " 10.0.0.1:8080").unwrap(),
            "10.0.0.1:8080".parse::<SocketAddr>().unwrap()
        );
        assert!(validate_socket_addr("static_endpoints", "[::1]:80").is_ok());
        assert!(validate_socket_addr("static_endpoints", "hello-node:8080").is_err());
        assert!(validate_socket_addr("static_endpoints", "10.0.0.1").is_err());
    }

    #[test]
    fn test_validate_dns_label() {
        assert!(validate_dns_label("service_name", "hello-node").is_ok());
        assert!(validate_dns_label("service_name", "a1").is_ok());
        assert!(validate_dns_label("service_name", "Hello").is_err());
        assert!(validate_dns_label("service_name", "-node").is_err());
        assert!(validate_dns_label("service_name", "node-").is_err());
        assert!(validate_dns_label("service_name", &"a".repeat(64)).is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("port", 8080u16, 1, u16::MAX).is_ok());
        assert!(validate_range("port", 0u16, 1, u16::MAX).is_err());
    }
}
