//! Horizon integration module
//!
//! This module provides the client and types for interacting with a Stellar Horizon server.
//! Horizon exposes closed ledgers both as paged REST collections and as a server-sent event
//! stream, and links each ledger to the collection of operations it contains.

/// REST/SSE client and the `LedgerSource` seam
mod client;
/// Server-sent event framing
mod sse;
/// Type definitions for Horizon resources
mod types;

pub use client::{HorizonClient, LedgerSource, LedgerStream};
pub use sse::{SseDecoder, SseEvent};
pub use types::*;
