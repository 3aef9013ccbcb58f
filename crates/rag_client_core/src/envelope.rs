//! crates/rag_client_core/src/envelope.rs
//!
//! The response envelope classifier. Every raw gateway outcome passes through
//! here exactly once; this is the only place that notifies the user about a
//! failed call.

use crate::error::{ClientError, ClientResult};
use crate::ports::{Envelope, GatewayResult, Notifier, TransportFailure};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, warn};

//=========================================================================================
// User-facing Messages
//=========================================================================================

const MSG_REQUEST_FAILED: &str = "请求失败";
const MSG_BAD_REQUEST: &str = "请求参数错误";
const MSG_NOT_FOUND: &str = "请求的资源不存在";
const MSG_PAYLOAD_TOO_LARGE: &str = "文件过大";
const MSG_INTERNAL_ERROR: &str = "服务器内部错误";
const MSG_BAD_GATEWAY: &str = "外部服务调用失败";
const MSG_UNAVAILABLE: &str = "服务暂时不可用";
const MSG_TIMEOUT: &str = "请求超时，请稍后重试";
const MSG_NETWORK: &str = "网络错误，请稍后重试";
const MSG_MALFORMED: &str = "响应数据格式错误";

/// Message for a known HTTP error status, if any.
pub fn status_message(status: u16) -> Option<&'static str> {
    match status {
        400 => Some(MSG_BAD_REQUEST),
        404 => Some(MSG_NOT_FOUND),
        413 => Some(MSG_PAYLOAD_TOO_LARGE),
        500 => Some(MSG_INTERNAL_ERROR),
        502 => Some(MSG_BAD_GATEWAY),
        503 => Some(MSG_UNAVAILABLE),
        _ => None,
    }
}

fn envelope_message(envelope: Option<&Envelope>) -> Option<&str> {
    envelope
        .and_then(|e| e.message.as_deref())
        .filter(|m| !m.is_empty())
}

/// Picks the message for a transport failure by priority: envelope message,
/// known status code, timeout, generic network failure.
pub fn transport_message(failure: &TransportFailure) -> String {
    if let Some(message) = envelope_message(failure.envelope.as_ref()) {
        return message.to_string();
    }
    match failure.status {
        Some(status) => status_message(status).unwrap_or(MSG_NETWORK).to_string(),
        None if failure.timed_out => MSG_TIMEOUT.to_string(),
        None => MSG_NETWORK.to_string(),
    }
}

//=========================================================================================
// The Classifier
//=========================================================================================

/// Turns gateway outcomes into payloads or classified, already-notified errors.
#[derive(Clone)]
pub struct ResponseClassifier {
    notifier: Arc<dyn Notifier>,
}

impl ResponseClassifier {
    pub fn new(notifier: Arc<dyn Notifier>) -> Self {
        Self { notifier }
    }

    /// Classifies `outcome` and decodes the envelope payload into `T`.
    ///
    /// Use `T = ()` for endpoints whose payload is `null`.
    pub fn classify<T: DeserializeOwned>(&self, outcome: GatewayResult) -> ClientResult<T> {
        let error = match outcome {
            Ok(envelope) if envelope.is_ok() => {
                return serde_json::from_value(envelope.data).map_err(|e| {
                    warn!("Envelope payload did not match the expected shape: {}", e);
                    self.reject(ClientError::Decode(MSG_MALFORMED.to_string()))
                });
            }
            Ok(envelope) => {
                debug!("Business error with code {}", envelope.code);
                ClientError::Business {
                    code: envelope.code,
                    message: envelope_message(Some(&envelope))
                        .unwrap_or(MSG_REQUEST_FAILED)
                        .to_string(),
                }
            }
            Err(failure) => {
                warn!(
                    status = ?failure.status,
                    timed_out = failure.timed_out,
                    "Transport failure: {}",
                    failure.detail
                );
                ClientError::Transport {
                    status: failure.status,
                    message: transport_message(&failure),
                }
            }
        };
        Err(self.reject(error))
    }

    /// Notifies the user about `error` and hands it back for propagation.
    pub(crate) fn reject(&self, error: ClientError) -> ClientError {
        self.notifier.notify_error(&error.to_string());
        error
    }
}
