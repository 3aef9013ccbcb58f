//! services/client/src/bin/rag_chat.rs

use rag_client_core::{ConversationStore, DocumentStore, Notifier, RequestGateway};
use rag_client_lib::{
    adapters::{ChannelNotifier, HttpGateway},
    config::Config,
    error::AppError,
    repl::Repl,
};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    // --- 1. Load Configuration & Set Up Logging ---
    let config = Config::from_env()?;
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(config.log_level.to_string()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
    info!("Configuration loaded. Backend at {}", config.api_base_url);

    // --- 2. Initialize Adapters ---
    let gateway: Arc<dyn RequestGateway> = Arc::new(HttpGateway::new(&config)?);
    let (notifier, notifications) = ChannelNotifier::new();
    let notifier: Arc<dyn Notifier> = Arc::new(notifier);

    // --- 3. Build the Stores ---
    let conversation = Arc::new(
        ConversationStore::new(gateway.clone(), notifier.clone())
            .with_top_k(config.query_top_k)
            .with_history_page_size(config.history_page_size),
    );
    let documents = Arc::new(
        DocumentStore::new(gateway, notifier).with_page_size(config.document_page_size),
    );

    // --- 4. Wire Shutdown ---
    let shutdown = CancellationToken::new();
    let on_signal = shutdown.clone();
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("Interrupt received, shutting down"),
            Err(e) => warn!("Cannot listen for interrupts: {}", e),
        }
        on_signal.cancel();
    });

    // --- 5. Run the Terminal Session ---
    Repl::new(conversation, documents)
        .run(notifications, shutdown)
        .await
}
