pub mod domain;
pub mod envelope;
pub mod error;
pub mod ports;
pub mod stores;

pub use domain::{
    AssistantMessage, ChunkReference, Document, DocumentChunk, DocumentDetail, HistoryRecord,
    Message, MessageId, PageResult, QueryRequest, QueryResponse, QueryTime, Role, UploadFile,
    UploadProgress, UserMessage,
};
pub use envelope::ResponseClassifier;
pub use error::{ClientError, ClientResult};
pub use ports::{
    Envelope, GatewayResult, Notifier, ProgressCallback, RequestGateway, TransportFailure,
};
pub use stores::{ConversationState, ConversationStore, DocumentStore, InventoryState};
