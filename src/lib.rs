#![deny(missing_docs)]

//! Core library for the DocuWhiz document chat server.

/// HTTP routing and REST handlers.
pub mod api;
/// Environment-driven configuration management.
pub mod config;
/// Document-to-text extraction backends.
pub mod extraction;
/// Remote text-generation clients.
pub mod generation;
/// Structured logging and tracing setup.
pub mod logging;
/// Upload and chat activity counters.
pub mod metrics;
/// Upload and chat orchestration.
pub mod orchestration;
/// Session identifiers and the shared document text store.
pub mod session;
