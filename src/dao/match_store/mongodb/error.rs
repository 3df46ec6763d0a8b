//! Error surface of the MongoDB match store.

use mongodb::error::Error as MongoError;
use thiserror::Error;

/// Result alias for MongoDB store operations.
pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Errors raised by the MongoDB match store.
#[derive(Debug, Error)]
pub enum MongoDaoError {
    /// The connection URI could not be parsed.
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        /// The offending URI.
        uri: String,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The client could not be built from the parsed options.
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The initial connection ping kept failing.
    #[error("MongoDB ping failed during initial connection after {attempts} attempt(s)")]
    InitialPing {
        /// How many pings were attempted.
        attempts: u32,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A health-check ping failed.
    #[error("MongoDB ping health check failed")]
    HealthPing {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// Creating an index failed.
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        /// Collection the index belongs to.
        collection: &'static str,
        /// Index key description.
        index: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The id counter could not be advanced.
    #[error("failed to allocate next id from counter `{counter}`")]
    AllocateId {
        /// Counter document name.
        counter: &'static str,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A match row could not be written.
    #[error("failed to save match `{id}`")]
    SaveMatch {
        /// Match identifier.
        id: i64,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A match row could not be read.
    #[error("failed to load match `{id}`")]
    LoadMatch {
        /// Match identifier.
        id: i64,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The match listing query failed.
    #[error("failed to list matches")]
    ListMatches {
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A commentary row could not be written.
    #[error("failed to save commentary for match `{match_id}`")]
    SaveCommentary {
        /// Match the entry belongs to.
        match_id: i64,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// The commentary listing query failed.
    #[error("failed to list commentary for match `{match_id}`")]
    ListCommentary {
        /// Match the listing was scoped to.
        match_id: i64,
        /// Driver error.
        #[source]
        source: MongoError,
    },
    /// A commentary row could not be deleted.
    #[error("failed to delete commentary `{id}`")]
    DeleteCommentary {
        /// Commentary identifier.
        id: i64,
        /// Driver error.
        #[source]
        source: MongoError,
    },
}
