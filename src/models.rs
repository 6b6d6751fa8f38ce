//! Data models and DTOs (Data Transfer Objects)
//!
//! Contains the request/response structures used by the API and CLI.

pub mod governance;

// Re-export commonly used types
pub use governance::*;

use serde::Serialize;

/// Message-only response (no data)
#[derive(Serialize)]
pub struct MessageResponse {
    pub success: bool,
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

/// Service identity reported by `/health`, `/` and the `health` command
#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub service: String,
    pub version: &'static str,
}

impl HealthStatus {
    pub fn healthy(service: impl Into<String>) -> Self {
        Self {
            status: "healthy",
            service: service.into(),
            version: env!("CARGO_PKG_VERSION"),
        }
    }
}
