//! crates/rag_client_core/src/ports.rs
//!
//! Defines the contracts (traits) for the collaborators the core talks to.
//! These traits form the boundary of the hexagonal architecture, so the stores
//! can run against the real HTTP client or an in-memory double in tests.

use crate::domain::{UploadFile, UploadProgress};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

//=========================================================================================
// Wire Envelope and Transport Outcome
//=========================================================================================

/// The uniform wrapper every backend response uses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub code: i32,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub data: Value,
    #[serde(default)]
    pub timestamp: Option<i64>,
}

impl Envelope {
    /// The sole success sentinel, independent of the HTTP status.
    pub const OK: i32 = 200;

    pub fn ok(data: Value) -> Self {
        Self {
            code: Self::OK,
            message: Some("success".to_string()),
            data,
            timestamp: None,
        }
    }

    pub fn error(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: Some(message.into()),
            data: Value::Null,
            timestamp: None,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.code == Self::OK
    }
}

/// A failure of the transport itself: an HTTP error status, a timeout, or a
/// request that never produced a response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransportFailure {
    /// HTTP status, when a response was received.
    pub status: Option<u16>,
    /// Envelope parsed from the error response body, if it carried one.
    pub envelope: Option<Envelope>,
    /// Set when the request was aborted by the client-side timeout.
    pub timed_out: bool,
    /// Diagnostic text for logs, never shown to the user.
    pub detail: String,
}

impl TransportFailure {
    pub fn http(status: u16, envelope: Option<Envelope>) -> Self {
        Self {
            status: Some(status),
            envelope,
            detail: format!("HTTP {status}"),
            ..Default::default()
        }
    }

    pub fn timeout(detail: impl Into<String>) -> Self {
        Self {
            timed_out: true,
            detail: detail.into(),
            ..Default::default()
        }
    }

    pub fn network(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
            ..Default::default()
        }
    }
}

/// What every gateway verb eventually produces.
pub type GatewayResult = Result<Envelope, TransportFailure>;

/// Invoked by the gateway while an upload body is being sent.
pub type ProgressCallback = Arc<dyn Fn(UploadProgress) + Send + Sync>;

//=========================================================================================
// Collaborator Ports (Traits)
//=========================================================================================

/// The HTTP client collaborator. Paths are relative to the API base path.
#[async_trait]
pub trait RequestGateway: Send + Sync {
    /// Sends `file` as a multipart form under the `file` field.
    async fn upload(
        &self,
        path: &str,
        file: UploadFile,
        progress: Option<ProgressCallback>,
    ) -> GatewayResult;

    async fn get(&self, path: &str, query: &[(&str, String)]) -> GatewayResult;

    async fn post(&self, path: &str, body: Value) -> GatewayResult;

    async fn delete(&self, path: &str) -> GatewayResult;
}

/// Surfaces a display-worthy error message to the user. Fire-and-forget.
pub trait Notifier: Send + Sync {
    fn notify_error(&self, message: &str);
}
