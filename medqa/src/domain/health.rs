use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Unhealthy,
    NotInitialized,
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Healthy => "healthy",
            Self::Unhealthy => "unhealthy",
            Self::NotInitialized => "not_initialized",
        };
        f.write_str(s)
    }
}

/// Health of one service plus free-form diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceHealth {
    pub status: HealthStatus,
    #[serde(flatten)]
    pub details: BTreeMap<String, String>,
}

impl ServiceHealth {
    pub const fn healthy() -> Self {
        Self {
            status: HealthStatus::Healthy,
            details: BTreeMap::new(),
        }
    }

    pub const fn not_initialized() -> Self {
        Self {
            status: HealthStatus::NotInitialized,
            details: BTreeMap::new(),
        }
    }

    pub fn unhealthy(error: impl fmt::Display) -> Self {
        Self {
            status: HealthStatus::Unhealthy,
            details: BTreeMap::new(),
        }
        .with_detail("error", error)
    }

    #[must_use]
    pub fn with_detail(mut self, key: &str, value: impl fmt::Display) -> Self {
        self.details.insert(key.to_string(), value.to_string());
        self
    }

    pub fn detail(&self, key: &str) -> Option<&str> {
        self.details.get(key).map(String::as_str)
    }

    pub fn is_healthy(&self) -> bool {
        self.status == HealthStatus::Healthy
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverallStatus {
    Healthy,
    Degraded,
}

/// Combined view over every service, as reported by the health endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemHealth {
    pub status: OverallStatus,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub services: BTreeMap<String, HealthStatus>,
}

impl SystemHealth {
    /// Embeddings are reached through the vector store, so they share its status.
    pub fn combine(version: &str, vector_store: &ServiceHealth, qa_service: &ServiceHealth) -> Self {
        let embeddings = if vector_store.is_healthy() {
            HealthStatus::Healthy
        } else {
            HealthStatus::Unhealthy
        };
        let services = BTreeMap::from([
            ("vector_store".to_string(), vector_store.status),
            ("qa_service".to_string(), qa_service.status),
            ("embeddings".to_string(), embeddings),
        ]);
        let status = if services.values().all(|s| *s == HealthStatus::Healthy) {
            OverallStatus::Healthy
        } else {
            OverallStatus::Degraded
        };
        Self {
            status,
            version: version.to_string(),
            timestamp: Utc::now(),
            services,
        }
    }
}
