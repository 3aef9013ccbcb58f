//! services/client/src/adapters/http_gateway.rs
//!
//! This module contains the HTTP adapter for the backend API.
//! It implements the `RequestGateway` port from the `core` crate on top of `reqwest`.

use crate::config::Config;
use async_trait::async_trait;
use bytes::Bytes;
use rag_client_core::ports::{
    Envelope, GatewayResult, ProgressCallback, RequestGateway, TransportFailure,
};
use rag_client_core::{UploadFile, UploadProgress};
use reqwest::{multipart, Client, RequestBuilder};
use serde_json::Value;
use std::path::PathBuf;
use tracing::{debug, warn};

/// Size of the pieces an upload body is streamed in.
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

//=========================================================================================
// Credentials
//=========================================================================================

/// Where the bearer token comes from. A fixed token wins over the token file.
#[derive(Clone, Debug, Default)]
pub struct Credentials {
    token: Option<String>,
    token_path: Option<PathBuf>,
}

impl Credentials {
    pub fn new(token: Option<String>, token_path: Option<PathBuf>) -> Self {
        Self { token, token_path }
    }

    /// The token to attach to the next request, if any is stored.
    async fn bearer(&self) -> Option<String> {
        if let Some(token) = &self.token {
            return Some(token.clone());
        }
        let path = self.token_path.as_ref()?;
        match tokio::fs::read_to_string(path).await {
            Ok(contents) => Some(contents.trim().to_string()).filter(|t| !t.is_empty()),
            Err(e) => {
                debug!("No token read from {}: {}", path.display(), e);
                None
            }
        }
    }
}

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements `RequestGateway` against the backend's REST API.
#[derive(Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
    credentials: Credentials,
}

impl HttpGateway {
    /// Creates a new `HttpGateway` with the configured base URL, timeout and credentials.
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(config.request_timeout).build()?;
        Ok(Self {
            client,
            base_url: config.api_base_url.clone(),
            credentials: Credentials::new(config.api_token.clone(), config.token_path.clone()),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Attaches credentials, sends the request and reads the envelope.
    async fn send(&self, request: RequestBuilder) -> GatewayResult {
        let request = match self.credentials.bearer().await {
            Some(token) => request.bearer_auth(token),
            None => request,
        };

        let response = request.send().await.map_err(map_reqwest_error)?;
        let status = response.status();
        let body = response.bytes().await.map_err(map_reqwest_error)?;
        let envelope = serde_json::from_slice::<Envelope>(&body).ok();

        if status.is_success() {
            envelope.ok_or_else(|| TransportFailure {
                status: Some(status.as_u16()),
                detail: format!("HTTP {} with a body that is not an envelope", status),
                ..Default::default()
            })
        } else {
            warn!("Backend answered with HTTP {}", status);
            Err(TransportFailure::http(status.as_u16(), envelope))
        }
    }
}

fn map_reqwest_error(e: reqwest::Error) -> TransportFailure {
    if e.is_timeout() {
        TransportFailure::timeout(e.to_string())
    } else {
        TransportFailure::network(e.to_string())
    }
}

/// Builds a streamed body that reports progress as each piece is taken by
/// the connection.
fn progress_body(bytes: Bytes, progress: Option<ProgressCallback>) -> reqwest::Body {
    reqwest::Body::wrap_stream(progress_stream(bytes, progress))
}

/// Splits `bytes` into pieces. `loaded` counts a piece only once the consumer
/// comes back for the next one, so 100% is reported after the last piece left.
fn progress_stream(
    bytes: Bytes,
    progress: Option<ProgressCallback>,
) -> impl futures::Stream<Item = Result<Bytes, std::io::Error>> + Send + 'static {
    let total = bytes.len() as u64;
    async_stream::stream! {
        let mut offset = 0;
        while offset < bytes.len() {
            let end = (offset + UPLOAD_CHUNK_SIZE).min(bytes.len());
            yield Ok::<Bytes, std::io::Error>(bytes.slice(offset..end));
            offset = end;
            if let Some(report) = &progress {
                report(UploadProgress { loaded: offset as u64, total });
            }
        }
    }
}

//=========================================================================================
// `RequestGateway` Trait Implementation
//=========================================================================================

#[async_trait]
impl RequestGateway for HttpGateway {
    async fn upload(
        &self,
        path: &str,
        file: UploadFile,
        progress: Option<ProgressCallback>,
    ) -> GatewayResult {
        let content_type = file.content_type.clone().unwrap_or_else(|| {
            mime_guess::from_path(&file.file_name)
                .first_or_octet_stream()
                .to_string()
        });
        let length = file.len();
        debug!("POST {} (multipart, {} bytes)", path, length);

        let part = multipart::Part::stream_with_length(progress_body(file.bytes, progress), length)
            .file_name(file.file_name)
            .mime_str(&content_type)
            .map_err(|e| TransportFailure::network(format!("Invalid content type: {e}")))?;
        let form = multipart::Form::new().part("file", part);

        self.send(self.client.post(self.url(path)).multipart(form)).await
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> GatewayResult {
        debug!("GET {} {:?}", path, query);
        self.send(self.client.get(self.url(path)).query(query)).await
    }

    async fn post(&self, path: &str, body: Value) -> GatewayResult {
        debug!("POST {}", path);
        self.send(self.client.post(self.url(path)).json(&body)).await
    }

    async fn delete(&self, path: &str) -> GatewayResult {
        debug!("DELETE {}", path);
        self.send(self.client.delete(self.url(path))).await
    }
}
