//! Ledger Ingestion Module
//!
//! This module provides the pipeline that turns the upstream ledger stream into stored offer records.
//! It is composed of several submodules, each responsible for one stage:
//!
//! - `cursor`: Resolves the starting point of the subscription from the most recent ledger.
//! - `subscription`: A resumable, cancellable, strictly ordered source of closed ledgers.
//! - `fetcher`: Retrieves a ledger's operations and keeps only the manage-offer ones.
//! - `extractor`: Validates offer payloads and discards incomplete ones.
//! - `stats`: Counts processed ledgers and stored offers and logs progress.
//! - `orchestrator`: The background loop that wires the stages together and feeds the record store.

/// Starting cursor resolution with bounded retries
pub mod cursor;
/// Offer validation
pub mod extractor;
/// Two-phase operation retrieval
pub mod fetcher;
/// Main ingestion loop
pub mod orchestrator;
/// Ingestion progress counters
pub mod stats;
/// Resumable ledger stream
pub mod subscription;
/// Offer and record types plus ingestion errors
pub mod types;

#[cfg(test)]
pub(crate) mod testing;

pub use orchestrator::*;
pub use types::*;
