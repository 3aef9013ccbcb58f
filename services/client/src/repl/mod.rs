//! services/client/src/repl/mod.rs
//!
//! The terminal front-end: reads commands from stdin, invokes store
//! operations and prints the resulting store state.

pub mod command;
pub mod render;

pub use command::{Command, CommandError};

use crate::adapters::read_upload;
use crate::error::AppError;
use rag_client_core::{ConversationStore, DocumentStore, ProgressCallback, UploadProgress};
use std::io::Write as _;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Whether the loop keeps reading after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// The stores one terminal session drives.
pub struct Repl {
    pub conversation: Arc<ConversationStore>,
    pub documents: Arc<DocumentStore>,
}

impl Repl {
    pub fn new(conversation: Arc<ConversationStore>, documents: Arc<DocumentStore>) -> Self {
        Self {
            conversation,
            documents,
        }
    }

    /// Runs until `/quit`, end of input, or `shutdown` is cancelled. Dropping
    /// an in-flight operation on shutdown rolls back its optimistic state.
    pub async fn run(
        &self,
        notifications: mpsc::UnboundedReceiver<String>,
        shutdown: CancellationToken,
    ) -> Result<(), AppError> {
        let printer_stop = CancellationToken::new();
        let printer = tokio::spawn(forward_notifications(
            notifications,
            printer_stop.clone(),
            |message| eprintln!("error: {message}"),
        ));

        println!("{}", Command::usage());
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            prompt();
            let line = tokio::select! {
                _ = shutdown.cancelled() => break,
                line = lines.next_line() => line?,
            };
            let Some(line) = line else { break };

            let command = match Command::parse(&line) {
                Ok(Some(command)) => command,
                Ok(None) => continue,
                Err(e) => {
                    eprintln!("{e}");
                    continue;
                }
            };

            let flow = tokio::select! {
                _ = shutdown.cancelled() => break,
                flow = self.execute(command) => flow,
            };
            if flow == Flow::Quit {
                break;
            }
        }

        info!("Terminal session ended");
        printer_stop.cancel();
        if let Err(e) = printer.await {
            warn!("Notification printer failed: {}", e);
        }
        Ok(())
    }

    /// Executes one command and prints the outcome. Failed store calls have
    /// already been reported through the notifier, so they are only logged.
    pub async fn execute(&self, command: Command) -> Flow {
        match command {
            Command::Ask { question, top_k } => {
                let result = match top_k {
                    Some(k) => self.conversation.submit_query_with_top_k(&question, k).await,
                    None => self.conversation.submit_query(&question).await,
                };
                match result {
                    Ok(_) => {
                        if let Some(answer) = self.conversation.messages().last() {
                            println!("{}", render::message(answer));
                        }
                    }
                    Err(e) => debug!("Query failed: {}", e),
                }
            }
            Command::Upload { path } => {
                let file = match read_upload(&path).await {
                    Ok(file) => file,
                    Err(e) => {
                        eprintln!("error: cannot read {}: {}", path.display(), e);
                        return Flow::Continue;
                    }
                };
                let progress: ProgressCallback = Arc::new(print_progress);
                match self.documents.upload_with_progress(file, Some(progress)).await {
                    Ok(doc) => println!("\nuploaded #{} {} ({})", doc.id, doc.file_name, doc.status),
                    Err(e) => debug!("Upload failed: {}", e),
                }
            }
            Command::Documents { page, size } => {
                let current = self.documents.snapshot();
                let page = page.unwrap_or(current.current_page);
                let size = size.unwrap_or(current.page_size);
                match self.documents.fetch_page(page, size).await {
                    Ok(()) => println!("{}", render::inventory(&self.documents.snapshot())),
                    Err(e) => debug!("Listing documents failed: {}", e),
                }
            }
            Command::ShowDocument { id } => match self.documents.fetch_detail(id).await {
                Ok(detail) => println!("{}", render::document_detail(&detail)),
                Err(e) => debug!("Loading document {} failed: {}", id, e),
            },
            Command::DeleteDocument { id } => match self.documents.delete(id).await {
                Ok(()) => println!("deleted #{id}"),
                Err(e) => debug!("Deleting document {} failed: {}", id, e),
            },
            Command::History => match self.conversation.fetch_history().await {
                Ok(_) => println!("{}", render::conversation(&self.conversation.messages())),
                Err(e) => debug!("Loading history failed: {}", e),
            },
            Command::Clear => {
                self.conversation.clear_history();
                println!("conversation cleared");
            }
            Command::Help => println!("{}", Command::usage()),
            Command::Quit => return Flow::Quit,
        }
        Flow::Continue
    }
}

/// Hands every notification to `show` until `stop` is cancelled, then
/// drains whatever is still queued so no failure goes unreported.
pub async fn forward_notifications(
    mut notifications: mpsc::UnboundedReceiver<String>,
    stop: CancellationToken,
    mut show: impl FnMut(String),
) {
    loop {
        tokio::select! {
            biased;
            message = notifications.recv() => match message {
                Some(message) => show(message),
                None => return,
            },
            _ = stop.cancelled() => break,
        }
    }
    while let Ok(message) = notifications.try_recv() {
        show(message);
    }
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

fn print_progress(progress: UploadProgress) {
    let percent = if progress.total == 0 {
        100
    } else {
        progress.loaded * 100 / progress.total
    };
    eprint!("\ruploading… {percent:>3}%");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn queued_notifications_are_shown_after_stop() {
        let (sender, receiver) = mpsc::unbounded_channel();
        sender.send("网络错误，请稍后重试".to_string()).unwrap();
        sender.send("服务器内部错误".to_string()).unwrap();
        let stop = CancellationToken::new();
        stop.cancel();

        let mut shown = Vec::new();
        forward_notifications(receiver, stop, |m| shown.push(m)).await;

        assert_eq!(shown, vec!["网络错误，请稍后重试", "服务器内部错误"]);
    }

    #[tokio::test]
    async fn notification_sent_just_before_stop_is_not_lost() {
        let (sender, receiver) = mpsc::unbounded_channel();
        let stop = CancellationToken::new();
        let shown = std::sync::Arc::new(std::sync::Mutex::new(Vec::new()));
        let sink = shown.clone();
        let printer = tokio::spawn(forward_notifications(receiver, stop.clone(), move |m| {
            sink.lock().unwrap().push(m)
        }));

        sender.send("请求超时，请稍后重试".to_string()).unwrap();
        stop.cancel();
        printer.await.unwrap();

        assert_eq!(*shown.lock().unwrap(), vec!["请求超时，请稍后重试"]);
    }
}
