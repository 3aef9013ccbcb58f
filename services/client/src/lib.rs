//! services/client/src/lib.rs
//!
//! Adapters, configuration and the terminal front-end for the RAG client.

pub mod adapters;
pub mod config;
pub mod error;
pub mod repl;
