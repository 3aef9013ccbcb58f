//! Shared test doubles for the store integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use rag_client_core::{
    Envelope, GatewayResult, Notifier, ProgressCallback, RequestGateway, TransportFailure,
    UploadFile,
};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::sync::{oneshot, watch};

/// A scripted reply for the next gateway call.
pub enum Reply {
    Ready(GatewayResult),
    /// Resolves when the test sends the outcome; a dropped sender reads as a
    /// network failure.
    Gated(oneshot::Receiver<GatewayResult>),
}

/// A call the store made through the gateway.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Upload { path: String, file_name: String },
    Get { path: String, query: Vec<(String, String)> },
    Post { path: String, body: Value },
    Delete { path: String },
}

/// An in-memory gateway that answers calls from a queue of scripted replies.
#[derive(Default)]
pub struct ScriptedGateway {
    replies: Mutex<VecDeque<Reply>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedGateway {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, outcome: GatewayResult) {
        self.replies.lock().unwrap().push_back(Reply::Ready(outcome));
    }

    pub fn reply_ok(&self, data: Value) {
        self.reply(Ok(Envelope::ok(data)));
    }

    /// Queues a reply the test releases later through the returned sender.
    pub fn reply_gated(&self) -> oneshot::Sender<GatewayResult> {
        let (tx, rx) = oneshot::channel();
        self.replies.lock().unwrap().push_back(Reply::Gated(rx));
        tx
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    async fn answer(&self, call: Call) -> GatewayResult {
        self.calls.lock().unwrap().push(call);
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some(Reply::Ready(outcome)) => outcome,
            Some(Reply::Gated(rx)) => rx
                .await
                .unwrap_or_else(|_| Err(TransportFailure::network("gate dropped"))),
            None => Err(TransportFailure::network("no scripted reply")),
        }
    }
}

#[async_trait]
impl RequestGateway for ScriptedGateway {
    async fn upload(
        &self,
        path: &str,
        file: UploadFile,
        _progress: Option<ProgressCallback>,
    ) -> GatewayResult {
        self.answer(Call::Upload {
            path: path.to_string(),
            file_name: file.file_name,
        })
        .await
    }

    async fn get(&self, path: &str, query: &[(&str, String)]) -> GatewayResult {
        self.answer(Call::Get {
            path: path.to_string(),
            query: query
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        })
        .await
    }

    async fn post(&self, path: &str, body: Value) -> GatewayResult {
        self.answer(Call::Post {
            path: path.to_string(),
            body,
        })
        .await
    }

    async fn delete(&self, path: &str) -> GatewayResult {
        self.answer(Call::Delete {
            path: path.to_string(),
        })
        .await
    }
}

/// Collects every notification the stores emit.
#[derive(Default)]
pub struct RecordingNotifier(Mutex<Vec<String>>);

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn messages(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify_error(&self, message: &str) {
        self.0.lock().unwrap().push(message.to_string());
    }
}

/// Waits until the observed state satisfies `pred`.
pub async fn wait_until<S>(rx: &mut watch::Receiver<S>, pred: impl FnMut(&S) -> bool) {
    rx.wait_for(pred).await.expect("store dropped");
}
