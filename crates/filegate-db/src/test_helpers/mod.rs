//! In-memory repositories for testing without a database

mod in_memory;

pub use in_memory::{InMemoryFileRecordStore, InMemorySubjectRegistry};
