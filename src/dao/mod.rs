//! Persistence layer for match and commentary records.

/// Match and commentary storage operations.
pub mod match_store;
/// Database model definitions.
pub mod models;
/// Storage abstraction layer for database operations.
pub mod storage;
