//! Storage abstraction for match and commentary records.

#[cfg(feature = "mongo-store")]
pub mod mongodb;

use futures::future::BoxFuture;

use crate::dao::models::{CommentaryRecord, MatchPatch, MatchRecord, NewCommentary, NewMatch};
use crate::dao::storage::StorageResult;
use crate::state::phase::MatchPhase;

/// Abstraction over the persistence layer for matches and commentary.
///
/// This is the row-store collaborator consumed by the write path and the
/// status sync job: inserts and updates return the affected row so callers
/// can broadcast exactly what was persisted.
pub trait MatchStore: Send + Sync {
    /// Persist a new match and return the stored row.
    fn insert_match(&self, new_match: NewMatch) -> BoxFuture<'static, StorageResult<MatchRecord>>;
    /// List matches, newest first, up to `limit`.
    fn list_matches(&self, limit: i64) -> BoxFuture<'static, StorageResult<Vec<MatchRecord>>>;
    /// Load a single match by identifier.
    fn find_match(&self, id: i64) -> BoxFuture<'static, StorageResult<Option<MatchRecord>>>;
    /// Apply a partial update and return the updated row, if the match exists.
    fn update_match(
        &self,
        id: i64,
        patch: MatchPatch,
    ) -> BoxFuture<'static, StorageResult<Option<MatchRecord>>>;
    /// Replace both scores and return the updated row, if the match exists.
    fn update_score(
        &self,
        id: i64,
        home_score: i32,
        away_score: i32,
    ) -> BoxFuture<'static, StorageResult<Option<MatchRecord>>>;
    /// Persist a phase transition and return the updated row, if the match
    /// exists.
    fn set_match_phase(
        &self,
        id: i64,
        phase: MatchPhase,
    ) -> BoxFuture<'static, StorageResult<Option<MatchRecord>>>;
    /// List every match whose persisted phase is not terminal
    /// (`scheduled` or `live`). Finished matches are excluded at the query
    /// level.
    fn list_unfinished(&self) -> BoxFuture<'static, StorageResult<Vec<MatchRecord>>>;
    /// Persist a new commentary entry and return the stored row.
    fn insert_commentary(
        &self,
        entry: NewCommentary,
    ) -> BoxFuture<'static, StorageResult<CommentaryRecord>>;
    /// List commentary for a match, newest first, up to `limit`.
    fn list_commentary(
        &self,
        match_id: i64,
        limit: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<CommentaryRecord>>>;
    /// Delete a commentary entry scoped to its match, returning the deleted
    /// row if it existed.
    fn delete_commentary(
        &self,
        match_id: i64,
        id: i64,
    ) -> BoxFuture<'static, StorageResult<Option<CommentaryRecord>>>;
    /// Verify the backend is reachable.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    /// Re-establish the backend connection after a failed health check.
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
