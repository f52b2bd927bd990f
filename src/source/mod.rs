//! Message source implementations.
//!
//! Concrete implementations of the domain-level `MessageSource` trait,
//! exposed only through constructor functions. Domain code must not depend
//! on source-specific types.

mod memory;

pub use memory::create_source as create_memory_source;
pub use memory::create_source_with_capacity as create_memory_source_with_capacity;
pub use memory::DEFAULT_INBOX_CAPACITY;
