//! crates/rag_client_core/src/domain.rs
//!
//! Defines the core data structures shared by the stores and the gateway.
//! Field names follow the backend's camelCase JSON so the same types are used
//! on the wire and in store state.

use bytes::Bytes;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

//=========================================================================================
// Conversation Messages
//=========================================================================================

/// Client-side correlation identifier attached to every message in a session log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(Uuid);

impl MessageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// A question typed by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMessage {
    pub id: MessageId,
    pub content: String,
    /// Epoch milliseconds.
    pub timestamp: i64,
}

/// An answer produced by the query backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantMessage {
    pub id: MessageId,
    pub content: String,
    /// `Some` for answers received from a live query, `None` for answers
    /// rebuilt from the history feed, which does not carry references.
    pub references: Option<Vec<ChunkReference>>,
    pub timestamp: i64,
    pub response_time_ms: Option<u64>,
}

/// One turn in a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "lowercase")]
pub enum Message {
    User(UserMessage),
    Assistant(AssistantMessage),
}

impl Message {
    pub fn user(content: impl Into<String>, timestamp: i64) -> Self {
        Message::User(UserMessage {
            id: MessageId::new(),
            content: content.into(),
            timestamp,
        })
    }

    pub fn id(&self) -> MessageId {
        match self {
            Message::User(m) => m.id,
            Message::Assistant(m) => m.id,
        }
    }

    pub fn role(&self) -> Role {
        match self {
            Message::User(_) => Role::User,
            Message::Assistant(_) => Role::Assistant,
        }
    }

    pub fn content(&self) -> &str {
        match self {
            Message::User(m) => &m.content,
            Message::Assistant(m) => &m.content,
        }
    }

    pub fn timestamp(&self) -> i64 {
        match self {
            Message::User(m) => m.timestamp,
            Message::Assistant(m) => m.timestamp,
        }
    }
}

/// Evidence cited by an assistant answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkReference {
    pub document_id: i64,
    pub document_name: String,
    pub content: String,
    pub score: f64,
}

//=========================================================================================
// Query Payloads
//=========================================================================================

/// Body of `POST /query`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    pub query: String,
    pub top_k: u32,
}

/// Payload returned by `POST /query`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResponse {
    pub query: String,
    pub answer: String,
    #[serde(default)]
    pub references: Vec<ChunkReference>,
    pub response_time_ms: u64,
}

/// One persisted question/answer exchange from `GET /query/history`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: i64,
    pub query_text: String,
    pub answer: String,
    pub query_time: QueryTime,
    #[serde(default)]
    pub response_time_ms: Option<u64>,
}

/// The stored query time of a history record.
///
/// The backend serializes it as a local date-time string, but epoch
/// milliseconds are accepted too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryTime {
    Millis(i64),
    Text(String),
}

impl QueryTime {
    /// Converts the stored time to epoch milliseconds. Date-times without an
    /// offset are read in the local time zone, as the backend writes them;
    /// an ambiguous local time resolves to its earlier instant.
    pub fn epoch_millis(&self) -> Option<i64> {
        match self {
            QueryTime::Millis(ms) => Some(*ms),
            QueryTime::Text(text) => {
                let text = text.trim();
                if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
                    return Some(dt.timestamp_millis());
                }
                ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
                    .iter()
                    .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
                    .and_then(|naive| Local.from_local_datetime(&naive).earliest())
                    .map(|local| local.timestamp_millis())
            }
        }
    }
}

//=========================================================================================
// Documents
//=========================================================================================

/// An ingested source file as reported by the ingestion backend.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub id: i64,
    pub file_name: String,
    pub file_size: u64,
    pub file_type: String,
    /// Server-managed lifecycle tag, treated as opaque.
    pub status: String,
    #[serde(default)]
    pub upload_time: Option<String>,
    #[serde(default)]
    pub chunk_count: u32,
}

/// A retrievable text segment of a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentChunk {
    pub id: i64,
    pub chunk_index: u32,
    pub content: String,
    #[serde(default)]
    pub char_count: u32,
}

/// Payload of `GET /documents/{id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentDetail {
    #[serde(flatten)]
    pub document: Document,
    #[serde(default)]
    pub process_time: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    #[serde(default)]
    pub chunks: Vec<DocumentChunk>,
}

/// A page of records as returned by the paginated endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageResult<T> {
    pub total: u64,
    pub page: u32,
    pub size: u32,
    #[serde(default = "Vec::new")]
    pub records: Vec<T>,
}

/// A file selected for upload.
#[derive(Debug, Clone)]
pub struct UploadFile {
    pub file_name: String,
    /// MIME type of the file, if known.
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

impl UploadFile {
    pub fn new(file_name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: None,
            bytes: bytes.into(),
        }
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn len(&self) -> u64 {
        self.bytes.len() as u64
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Upload progress reported by the gateway while the body is being sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadProgress {
    pub loaded: u64,
    pub total: u64,
}
