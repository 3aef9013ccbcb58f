//! crates/rag_client_core/src/stores/conversation.rs
//!
//! The conversation session store: an ordered message log with optimistic
//! query submission, rollback on failure and reconstruction from the
//! backend's history feed.

use super::{now_millis, InFlight, Pending};
use crate::domain::{
    AssistantMessage, HistoryRecord, Message, MessageId, PageResult, QueryRequest, QueryResponse,
    UserMessage,
};
use crate::envelope::ResponseClassifier;
use crate::error::{ClientError, ClientResult};
use crate::ports::{Notifier, RequestGateway};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info, warn};

const QUERY_PATH: &str = "/query";
const HISTORY_PATH: &str = "/query/history";

pub const DEFAULT_TOP_K: u32 = 5;
pub const DEFAULT_HISTORY_PAGE_SIZE: u32 = 50;

//=========================================================================================
// Session State
//=========================================================================================

/// Snapshot of one chat session as seen by observers.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationState {
    /// Insertion order is display order.
    pub messages: Vec<Message>,
    /// True while at least one submission or history fetch is outstanding.
    pub loading: bool,
    /// Text of the most recent in-flight query; empty when idle.
    pub current_query: String,
    #[serde(skip)]
    in_flight: usize,
}

impl ConversationState {
    fn position_of(&self, id: MessageId) -> Option<usize> {
        self.messages.iter().position(|m| m.id() == id)
    }
}

impl Pending for ConversationState {
    fn in_flight_mut(&mut self) -> &mut usize {
        &mut self.in_flight
    }

    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }

    fn on_idle(&mut self) {
        self.current_query.clear();
    }
}

//=========================================================================================
// The Store
//=========================================================================================

/// Owns the message log of one chat session.
pub struct ConversationStore {
    gateway: Arc<dyn RequestGateway>,
    classifier: ResponseClassifier,
    state: watch::Sender<ConversationState>,
    top_k: u32,
    history_page_size: u32,
}

impl ConversationStore {
    /// Creates an empty session.
    pub fn new(gateway: Arc<dyn RequestGateway>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            gateway,
            classifier: ResponseClassifier::new(notifier),
            state: watch::Sender::new(ConversationState::default()),
            top_k: DEFAULT_TOP_K,
            history_page_size: DEFAULT_HISTORY_PAGE_SIZE,
        }
    }

    /// Sets the `topK` sent with `submit_query`.
    pub fn with_top_k(mut self, top_k: u32) -> Self {
        self.top_k = top_k;
        self
    }

    /// Sets how many history records `fetch_history` requests.
    pub fn with_history_page_size(mut self, size: u32) -> Self {
        self.history_page_size = size;
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<ConversationState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> ConversationState {
        self.state.borrow().clone()
    }

    pub fn messages(&self) -> Vec<Message> {
        self.state.borrow().messages.clone()
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub fn current_query(&self) -> String {
        self.state.borrow().current_query.clone()
    }

    /// Submits `text` with the store's default `topK`.
    pub async fn submit_query(&self, text: &str) -> ClientResult<QueryResponse> {
        self.submit_query_with_top_k(text, self.top_k).await
    }

    /// Appends the user's message before the request is sent. On success the
    /// answer is placed right after it; on failure, or if this future is
    /// dropped before the call settles, that message is removed again.
    pub async fn submit_query_with_top_k(
        &self,
        text: &str,
        top_k: u32,
    ) -> ClientResult<QueryResponse> {
        let pending = PendingSubmission::begin(&self.state, text);

        let request = QueryRequest {
            query: text.to_string(),
            top_k,
        };
        let body = serde_json::to_value(&request)
            .map_err(|e| self.classifier.reject(ClientError::LocalState(e.to_string())))?;

        debug!(top_k, "Submitting query");
        let outcome = self.gateway.post(QUERY_PATH, body).await;

        let response: QueryResponse = self.classifier.classify(outcome)?;
        info!(
            references = response.references.len(),
            response_time_ms = response.response_time_ms,
            "Query answered"
        );
        pending.complete(&response);
        Ok(response)
    }

    /// Replaces the whole log with the most recent page of persisted
    /// exchanges, oldest first. Returns the number of exchanges restored.
    pub async fn fetch_history(&self) -> ClientResult<usize> {
        let _slot = InFlight::enter(&self.state);

        let query = [
            ("page", "1".to_string()),
            ("size", self.history_page_size.to_string()),
        ];
        let outcome = self.gateway.get(HISTORY_PATH, &query).await;
        let page: PageResult<HistoryRecord> = self.classifier.classify(outcome)?;

        let restored = page.records.len();
        let messages = messages_from_history(page.records);
        self.state.send_modify(|s| s.messages = messages);
        info!(restored, "Conversation rebuilt from history");
        Ok(restored)
    }

    /// Empties the log. Local only and not reversible: answers to queries
    /// still in flight are dropped when they arrive.
    pub fn clear_history(&self) {
        self.state.send_modify(|s| {
            s.messages.clear();
            s.current_query.clear();
        });
        debug!("Conversation cleared");
    }
}

/// Expands a newest-first page of history records into an oldest-first log
/// where each record becomes a user message followed by its answer. Both
/// messages of a pair carry the record's query time.
pub fn messages_from_history(records: Vec<HistoryRecord>) -> Vec<Message> {
    records
        .into_iter()
        .rev()
        .flat_map(|record| {
            let timestamp = record.query_time.epoch_millis().unwrap_or_else(|| {
                warn!(record = record.id, "Unreadable query time in history record");
                0
            });
            [
                Message::User(UserMessage {
                    id: MessageId::new(),
                    content: record.query_text,
                    timestamp,
                }),
                Message::Assistant(AssistantMessage {
                    id: MessageId::new(),
                    content: record.answer,
                    references: None,
                    timestamp,
                    response_time_ms: record.response_time_ms,
                }),
            ]
        })
        .collect()
}

//=========================================================================================
// Optimistic Submission
//=========================================================================================

/// The optimistic user message of one in-flight submission, tracked by id.
struct PendingSubmission<'a> {
    state: &'a watch::Sender<ConversationState>,
    user_id: MessageId,
    settled: bool,
    // Declared last so the slot is released after the rollback in `drop`.
    _slot: InFlight<'a, ConversationState>,
}

impl<'a> PendingSubmission<'a> {
    fn begin(state: &'a watch::Sender<ConversationState>, text: &str) -> Self {
        let user = Message::user(text, now_millis());
        let user_id = user.id();
        state.send_modify(|s| s.messages.push(user));
        let slot = InFlight::enter(state);
        state.send_modify(|s| s.current_query = text.to_string());
        Self {
            state,
            user_id,
            settled: false,
            _slot: slot,
        }
    }

    fn complete(mut self, response: &QueryResponse) {
        let answer = Message::Assistant(AssistantMessage {
            id: MessageId::new(),
            content: response.answer.clone(),
            references: Some(response.references.clone()),
            timestamp: now_millis(),
            response_time_ms: Some(response.response_time_ms),
        });
        let id = self.user_id;
        self.state.send_modify(|s| match s.position_of(id) {
            Some(index) => s.messages.insert(index + 1, answer),
            // The log was cleared or replaced while the call was in flight.
            None => debug!("Dropped answer to a query no longer in the log"),
        });
        self.settled = true;
    }
}

impl Drop for PendingSubmission<'_> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        let id = self.user_id;
        self.state.send_modify(|s| s.messages.retain(|m| m.id() != id));
        debug!("Rolled back optimistic query message");
    }
}
