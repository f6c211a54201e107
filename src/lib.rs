//! Indexes manage-offer operations from a Stellar Horizon ledger stream into
//! an in-memory store and serves them over HTTP.

/// Read-only HTTP API over the record store
pub mod api;
/// Environment-driven configuration
pub mod config;
/// Horizon client and resource types
pub mod horizon;
/// Ledger ingestion pipeline
pub mod ingest;
/// Shared append-only record store
pub mod store;
