use thiserror::Error;

#[derive(Error, Debug)]
pub enum LbError {
    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Missing configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Failed to resolve service {service}: {message}")]
    ResolutionError { service: String, message: String },

    #[error("No endpoints available for service {service}")]
    NoEndpoints { service: String },

    #[error("Response status code {status} is not equal to {expected}")]
    UnexpectedStatus { status: u16, expected: u16 },

    #[error("All {attempts} attempt(s) against service {service} failed: {last_error}")]
    AllEndpointsFailed {
        service: String,
        attempts: u32,
        last_error: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Discovery,
    Network,
    Upstream,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl LbError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            LbError::MissingConfigError { .. }
            | LbError::InvalidConfigValueError { .. }
            | LbError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            LbError::ResolutionError { .. } | LbError::NoEndpoints { .. } => {
                ErrorCategory::Discovery
            }
            LbError::HttpError(_) | LbError::AllEndpointsFailed { .. } => ErrorCategory::Network,
            LbError::UnexpectedStatus { .. } | LbError::SerializationError(_) => {
                ErrorCategory::Upstream
            }
            LbError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Upstream => ErrorSeverity::Low,
            ErrorCategory::Discovery | ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// 傳輸層錯誤（連線失敗、逾時）才需要換節點重試
    pub fn is_transport(&self) -> bool {
        match self {
            LbError::HttpError(e) => e.is_connect() || e.is_timeout() || e.is_request(),
            _ => false,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Discovery => format!("Service discovery failed: {}", self),
            ErrorCategory::Network => format!("Could not reach the service: {}", self),
            ErrorCategory::Upstream => format!("The service answered unexpectedly: {}", self),
            ErrorCategory::System => format!("System error: {}", self),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            LbError::MissingConfigError { .. } => {
                "Set KUBERNETES_SERVICE_HOST/KUBERNETES_SERVICE_PORT or pass --kube-api-url"
            }
            LbError::ResolutionError { .. } => {
                "Check that the service exists and the service account may read endpoints"
            }
            LbError::NoEndpoints { .. } => "Check that the service has ready pods",
            LbError::AllEndpointsFailed { .. } | LbError::HttpError(_) => {
                "Check pod health and network policies, or raise --retry-attempts"
            }
            LbError::UnexpectedStatus { .. } => "Inspect the logs of the responding pod",
            LbError::IoError(_) => "Check file permissions and that the port is free",
            _ => "Review the command line flags and the configuration file",
        }
    }
}

pub type Result<T> = std::result::Result<T, LbError>;
