//! crates/rag_client_core/src/stores/documents.rs
//!
//! The document inventory store: a paginated view of the ingested documents,
//! kept in step with uploads and deletions once the backend confirms them.

use super::{InFlight, Pending};
use crate::domain::{Document, DocumentDetail, PageResult, UploadFile};
use crate::envelope::ResponseClassifier;
use crate::error::ClientResult;
use crate::ports::{Notifier, ProgressCallback, RequestGateway};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{debug, info};

const DOCUMENTS_PATH: &str = "/documents";

pub const DEFAULT_PAGE: u32 = 1;
pub const DEFAULT_PAGE_SIZE: u32 = 10;

//=========================================================================================
// Inventory State
//=========================================================================================

/// Snapshot of the document inventory as seen by observers.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryState {
    /// Newest uploads first, otherwise in server order.
    pub documents: Vec<Document>,
    pub current_page: u32,
    pub page_size: u32,
    /// Server-reported count, adjusted locally on upload and delete.
    pub total: u64,
    pub loading: bool,
    #[serde(skip)]
    in_flight: usize,
}

impl Default for InventoryState {
    fn default() -> Self {
        Self {
            documents: Vec::new(),
            current_page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
            total: 0,
            loading: false,
            in_flight: 0,
        }
    }
}

impl Pending for InventoryState {
    fn in_flight_mut(&mut self) -> &mut usize {
        &mut self.in_flight
    }

    fn set_loading(&mut self, loading: bool) {
        self.loading = loading;
    }
}

//=========================================================================================
// The Store
//=========================================================================================

/// Owns the client's view of the document inventory.
pub struct DocumentStore {
    gateway: Arc<dyn RequestGateway>,
    classifier: ResponseClassifier,
    state: watch::Sender<InventoryState>,
}

impl DocumentStore {
    pub fn new(gateway: Arc<dyn RequestGateway>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            gateway,
            classifier: ResponseClassifier::new(notifier),
            state: watch::Sender::new(InventoryState::default()),
        }
    }

    /// Starts the inventory with a page size other than the default.
    pub fn with_page_size(self, page_size: u32) -> Self {
        self.state.send_modify(|s| s.page_size = page_size);
        self
    }

    pub fn subscribe(&self) -> watch::Receiver<InventoryState> {
        self.state.subscribe()
    }

    pub fn snapshot(&self) -> InventoryState {
        self.state.borrow().clone()
    }

    pub fn documents(&self) -> Vec<Document> {
        self.state.borrow().documents.clone()
    }

    pub fn total(&self) -> u64 {
        self.state.borrow().total
    }

    pub fn is_loading(&self) -> bool {
        self.state.borrow().loading
    }

    pub async fn upload(&self, file: UploadFile) -> ClientResult<Document> {
        self.upload_with_progress(file, None).await
    }

    /// Uploads `file` and, once the backend confirms it, puts the returned
    /// document at the front of the inventory.
    pub async fn upload_with_progress(
        &self,
        file: UploadFile,
        progress: Option<ProgressCallback>,
    ) -> ClientResult<Document> {
        let _slot = InFlight::enter(&self.state);
        debug!(file = %file.file_name, bytes = file.len(), "Uploading document");

        let outcome = self.gateway.upload(DOCUMENTS_PATH, file, progress).await;
        let document: Document = self.classifier.classify(outcome)?;

        self.state.send_modify(|s| {
            s.documents.insert(0, document.clone());
            s.total += 1;
        });
        info!(id = document.id, "Document uploaded");
        Ok(document)
    }

    /// Replaces the visible documents with one page from the backend. The
    /// previous page stays in place if the request fails.
    pub async fn fetch_page(&self, page: u32, size: u32) -> ClientResult<()> {
        let _slot = InFlight::enter(&self.state);

        let query = [("page", page.to_string()), ("size", size.to_string())];
        let outcome = self.gateway.get(DOCUMENTS_PATH, &query).await;
        let result: PageResult<Document> = self.classifier.classify(outcome)?;

        debug!(page, size, records = result.records.len(), "Fetched document page");
        self.state.send_modify(|s| {
            s.documents = result.records;
            s.total = result.total;
            s.current_page = page;
            s.page_size = size;
        });
        Ok(())
    }

    /// Fetches the page currently on display again.
    pub async fn refresh(&self) -> ClientResult<()> {
        let (page, size) = {
            let state = self.state.borrow();
            (state.current_page, state.page_size)
        };
        self.fetch_page(page, size).await
    }

    /// Deletes a document and, once confirmed, drops it from the view.
    ///
    /// `total` is decremented even when `id` is not on the current page: the
    /// backend confirmed the deletion, so its count shrank either way.
    pub async fn delete(&self, id: i64) -> ClientResult<()> {
        let _slot = InFlight::enter(&self.state);

        let outcome = self.gateway.delete(&format!("{DOCUMENTS_PATH}/{id}")).await;
        self.classifier.classify::<()>(outcome)?;

        self.state.send_modify(|s| {
            if let Some(index) = s.documents.iter().position(|d| d.id == id) {
                s.documents.remove(index);
            } else {
                debug!(id, "Deleted document was not on the current page");
            }
            s.total = s.total.saturating_sub(1);
        });
        info!(id, "Document deleted");
        Ok(())
    }

    /// Loads one document with its chunks. The inventory itself is untouched.
    pub async fn fetch_detail(&self, id: i64) -> ClientResult<DocumentDetail> {
        let _slot = InFlight::enter(&self.state);

        let outcome = self
            .gateway
            .get(&format!("{DOCUMENTS_PATH}/{id}"), &[])
            .await;
        self.classifier.classify(outcome)
    }
}
