// src/source/memory/mod.rs

//! In-memory message source.
//!
//! A pure in-process implementation of the domain-level `MessageSource`
//! trait, intended for tests, local execution, and as the reference for
//! delivery semantics.
//!
//! ## Reference Semantics
//!
//! - Once `subscribe()` returns successfully, messages published *after* that
//!   point to the same destination are deliverable.
//! - Delivery is deterministic within a single process and preserves publish
//!   order per subscriber.
//! - No messages are dropped due to timing or scheduling.
//!
//! ## Non-Goals
//!
//! No persistence, acknowledgment, or redelivery. The source exists to give
//! listeners and dispatchers a deterministic baseline to run against.

mod source;

pub use source::{create_source, create_source_with_capacity, DEFAULT_INBOX_CAPACITY};
