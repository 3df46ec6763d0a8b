//! Connection configuration for the MongoDB match store.

use mongodb::options::ClientOptions;

use super::error::{MongoDaoError, MongoResult};

/// Default database name when none is configured.
const DEFAULT_DATABASE: &str = "sportz";

/// Parsed client options plus the target database name.
#[derive(Clone)]
pub struct MongoConfig {
    /// Parsed driver options.
    pub options: ClientOptions,
    /// Database holding the match and commentary collections.
    pub database_name: String,
}

impl MongoConfig {
    /// Parse a connection URI, using `db_name` or the built-in default as the
    /// database.
    pub async fn from_uri(uri: &str, db_name: Option<&str>) -> MongoResult<Self> {
        let database_name = db_name.unwrap_or(DEFAULT_DATABASE).to_owned();
        let options =
            ClientOptions::parse(uri)
                .await
                .map_err(|source| MongoDaoError::InvalidUri {
                    uri: uri.to_owned(),
                    source,
                })?;

        Ok(Self {
            options,
            database_name,
        })
    }
}
