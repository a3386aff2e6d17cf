//! Ports and Adapters Infrastructure
//!
//! Shared types for the storage ports each domain crate defines. The
//! invoicing and membership domains declare their own port traits on top of
//! the marker and error types here; adapters (in-memory, PostgreSQL)
//! implement them.
//!
//! ```text
//!        Application services (invoicing, membership)
//!                         │
//!                         ▼
//!          Port traits (InvoicePort, UserPort)
//!                ▲                      ▲
//!     ┌──────────┴───────┐   ┌──────────┴─────────┐
//!     │ In-memory adapter │   │ PostgreSQL adapter │
//!     └──────────────────┘   └────────────────────┘
//! ```

use std::fmt;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Storage failures as the domain sees them
///
/// Adapters translate backend errors into these variants; services decide
/// what each means for the caller.
#[derive(Debug, Error)]
pub enum PortError {
    #[error("Not found: {entity_type} with id {id}")]
    NotFound { entity_type: String, id: String },

    /// The backend rejected the data (e.g. a check constraint)
    #[error("Rejected by storage: {message}")]
    Validation { message: String },

    /// A uniqueness rule was violated
    #[error("Conflict: {message}")]
    Conflict { message: String },

    /// The backend could not be reached; retrying may succeed
    #[error("Storage unavailable: {message}")]
    Connection { message: String },

    #[error("Internal storage error: {message}")]
    Internal { message: String },
}

impl PortError {
    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        PortError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        PortError::Validation { message: message.into() }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        PortError::Conflict { message: message.into() }
    }

    pub fn connection(message: impl Into<String>) -> Self {
        PortError::Connection { message: message.into() }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        PortError::Internal { message: message.into() }
    }

    /// Connection failures are the only ones worth retrying
    pub fn is_transient(&self) -> bool {
        matches!(self, PortError::Connection { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, PortError::Conflict { .. })
    }
}

/// Marker trait for all domain ports
///
/// Ports must be shareable across request-handling tasks.
pub trait DomainPort: Send + Sync + 'static {}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterHealth {
    Healthy,
    Unhealthy,
}

/// Outcome of probing one storage adapter, reported by `/health/ready`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    /// e.g. `postgres-invoices`
    pub adapter_id: String,
    pub status: AdapterHealth,
    pub latency_ms: u64,
    /// Failure reason when unhealthy
    pub message: Option<String>,
    pub checked_at: chrono::DateTime<chrono::Utc>,
}

impl HealthCheckResult {
    /// A healthy result for the given adapter
    pub fn healthy(adapter_id: impl Into<String>, latency_ms: u64) -> Self {
        Self {
            adapter_id: adapter_id.into(),
            status: AdapterHealth::Healthy,
            latency_ms,
            message: None,
            checked_at: chrono::Utc::now(),
        }
    }

    /// An unhealthy result with a reason
    pub fn unhealthy(adapter_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            adapter_id: adapter_id.into(),
            status: AdapterHealth::Unhealthy,
            latency_ms: 0,
            message: Some(message.into()),
            checked_at: chrono::Utc::now(),
        }
    }
}

#[async_trait]
pub trait HealthCheckable: Send + Sync {
    async fn health_check(&self) -> HealthCheckResult;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_error_not_found() {
        let error = PortError::not_found("Invoice", "IVC-123");
        assert!(error.is_not_found());
        assert!(!error.is_transient());
        assert_eq!(error.to_string(), "Not found: Invoice with id IVC-123");
    }

    #[test]
    fn test_port_error_transient() {
        assert!(PortError::connection("refused").is_transient());
        assert!(!PortError::validation("Invalid email").is_transient());
    }

    #[test]
    fn test_port_error_conflict() {
        let error = PortError::conflict("email already registered");
        assert!(error.is_conflict());
        assert!(!error.is_not_found());
    }

    #[test]
    fn test_health_results() {
        assert_eq!(HealthCheckResult::healthy("memory", 0).status, AdapterHealth::Healthy);
        let down = HealthCheckResult::unhealthy("postgres", "pool closed");
        assert_eq!(down.status, AdapterHealth::Unhealthy);
        assert_eq!(down.message.as_deref(), Some("pool closed"));
    }
}
