//! services/client/src/repl/render.rs
//!
//! Plain-text rendering of store state for the terminal.

use chrono::{Local, TimeZone};
use rag_client_core::{DocumentDetail, InventoryState, Message};
use std::fmt::Write;

/// How much of a chunk or reference excerpt is shown.
const EXCERPT_CHARS: usize = 120;

fn clock(timestamp_ms: i64) -> String {
    Local
        .timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|t| t.format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "--:--:--".to_string())
}

fn excerpt(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= EXCERPT_CHARS {
        flat
    } else {
        let cut: String = flat.chars().take(EXCERPT_CHARS).collect();
        format!("{cut}…")
    }
}

pub fn message(message: &Message) -> String {
    let mut out = String::new();
    match message {
        Message::User(m) => {
            let _ = write!(out, "[{}] you: {}", clock(m.timestamp), m.content);
        }
        Message::Assistant(m) => {
            let _ = write!(out, "[{}] assistant: {}", clock(m.timestamp), m.content);
            if let Some(ms) = m.response_time_ms {
                let _ = write!(out, "\n    ({ms} ms)");
            }
            for (i, reference) in m.references.iter().flatten().enumerate() {
                let _ = write!(
                    out,
                    "\n    [{}] {} #{} score {:.2}: {}",
                    i + 1,
                    reference.document_name,
                    reference.document_id,
                    reference.score,
                    excerpt(&reference.content)
                );
            }
        }
    }
    out
}

pub fn conversation(messages: &[Message]) -> String {
    if messages.is_empty() {
        return "(no messages)".to_string();
    }
    messages.iter().map(message).collect::<Vec<_>>().join("\n")
}

pub fn inventory(state: &InventoryState) -> String {
    let mut out = format!(
        "documents page {} (size {}), {} in total",
        state.current_page, state.page_size, state.total
    );
    if state.documents.is_empty() {
        out.push_str("\n  (none)");
    }
    for doc in &state.documents {
        let _ = write!(
            out,
            "\n  #{:<5} {:<40} {:<12} {:>5} chunks  {} bytes",
            doc.id, doc.file_name, doc.status, doc.chunk_count, doc.file_size
        );
    }
    out
}

pub fn document_detail(detail: &DocumentDetail) -> String {
    let doc = &detail.document;
    let mut out = format!(
        "#{} {} ({}, {} bytes)\nstatus: {}",
        doc.id, doc.file_name, doc.file_type, doc.file_size, doc.status
    );
    if let Some(uploaded) = &doc.upload_time {
        let _ = write!(out, "\nuploaded: {uploaded}");
    }
    if let Some(processed) = &detail.process_time {
        let _ = write!(out, "\nprocessed: {processed}");
    }
    if let Some(error) = &detail.error_message {
        let _ = write!(out, "\nerror: {error}");
    }
    let _ = write!(out, "\nchunks: {}", detail.chunks.len());
    for chunk in &detail.chunks {
        let _ = write!(out, "\n  [{}] {}", chunk.chunk_index, excerpt(&chunk.content));
    }
    out
}
