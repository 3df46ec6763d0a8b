//! MongoDB match store implementation.

use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database,
    bson::{Document, doc},
    options::{IndexOptions, ReturnDocument},
};
use time::OffsetDateTime;
use tokio::sync::RwLock;

use super::{
    config::MongoConfig,
    connection::establish_connection,
    error::{MongoDaoError, MongoResult},
    models::{
        CounterDocument, MongoCommentaryDocument, MongoMatchDocument, to_bson_datetime,
    },
};
use crate::dao::{
    match_store::MatchStore,
    models::{CommentaryRecord, MatchPatch, MatchRecord, NewCommentary, NewMatch},
    storage::StorageResult,
};
use crate::state::phase::MatchPhase;

const MATCH_COLLECTION_NAME: &str = "matches";
const COMMENTARY_COLLECTION_NAME: &str = "commentary";
const COUNTER_COLLECTION_NAME: &str = "counters";

/// Match store backed by a MongoDB database.
#[derive(Clone)]
pub struct MongoMatchStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };

        database
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|source| MongoDaoError::HealthPing { source })?;
        Ok(())
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) =
            establish_connection(&self.config.options, &self.config.database_name).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoMatchStore {
    /// Establish a connection to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) =
            establish_connection(&config.options, &config.database_name).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;

        // The status sync job filters on status every tick.
        let matches = database.collection::<MongoMatchDocument>(MATCH_COLLECTION_NAME);
        let status_index = mongodb::IndexModel::builder()
            .keys(doc! {"status": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("match_status_idx".to_owned()))
                    .build(),
            )
            .build();
        matches
            .create_index(status_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: MATCH_COLLECTION_NAME,
                index: "status",
                source,
            })?;

        // Commentary listings are scoped per match, newest first.
        let commentary = database.collection::<MongoCommentaryDocument>(COMMENTARY_COLLECTION_NAME);
        let commentary_index = mongodb::IndexModel::builder()
            .keys(doc! {"match_id": 1, "created_at": -1})
            .options(
                IndexOptions::builder()
                    .name(Some("commentary_match_idx".to_owned()))
                    .build(),
            )
            .build();
        commentary
            .create_index(commentary_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: COMMENTARY_COLLECTION_NAME,
                index: "match_id,created_at",
                source,
            })?;

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn match_collection(&self) -> Collection<MongoMatchDocument> {
        self.database()
            .await
            .collection::<MongoMatchDocument>(MATCH_COLLECTION_NAME)
    }

    async fn commentary_collection(&self) -> Collection<MongoCommentaryDocument> {
        self.database()
            .await
            .collection::<MongoCommentaryDocument>(COMMENTARY_COLLECTION_NAME)
    }

    /// Allocate the next value of a named monotonic counter.
    async fn next_id(&self, counter: &'static str) -> MongoResult<i64> {
        let counters = self
            .database()
            .await
            .collection::<CounterDocument>(COUNTER_COLLECTION_NAME);

        let document = counters
            .find_one_and_update(doc! {"_id": counter}, doc! {"$inc": {"seq": 1_i64}})
            .upsert(true)
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::AllocateId { counter, source })?;

        // Upsert with ReturnDocument::After always yields a document.
        Ok(document.map(|doc| doc.seq).unwrap_or(1))
    }

    async fn insert_match(&self, new_match: NewMatch) -> MongoResult<MatchRecord> {
        let id = self.next_id(MATCH_COLLECTION_NAME).await?;
        let record = MatchRecord {
            id,
            sport: new_match.sport,
            home_team: new_match.home_team,
            away_team: new_match.away_team,
            status: new_match.status,
            start_time: new_match.start_time,
            end_time: new_match.end_time,
            home_score: new_match.home_score,
            away_score: new_match.away_score,
            created_at: OffsetDateTime::now_utc(),
        };

        let document: MongoMatchDocument = record.clone().into();
        self.match_collection()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::SaveMatch { id, source })?;

        Ok(record)
    }

    async fn list_matches(&self, limit: i64) -> MongoResult<Vec<MatchRecord>> {
        let documents: Vec<MongoMatchDocument> = self
            .match_collection()
            .await
            .find(doc! {})
            .sort(doc! {"created_at": -1})
            .limit(limit)
            .await
            .map_err(|source| MongoDaoError::ListMatches { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListMatches { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn find_match(&self, id: i64) -> MongoResult<Option<MatchRecord>> {
        let document = self
            .match_collection()
            .await
            .find_one(doc! {"_id": id})
            .await
            .map_err(|source| MongoDaoError::LoadMatch { id, source })?;

        Ok(document.map(Into::into))
    }

    async fn update_match(&self, id: i64, patch: MatchPatch) -> MongoResult<Option<MatchRecord>> {
        let mut set = Document::new();
        if let Some(sport) = patch.sport {
            set.insert("sport", sport);
        }
        if let Some(home_team) = patch.home_team {
            set.insert("home_team", home_team);
        }
        if let Some(away_team) = patch.away_team {
            set.insert("away_team", away_team);
        }
        if let Some(status) = patch.status {
            set.insert("status", status.as_str());
        }
        if let Some(start_time) = patch.start_time {
            set.insert("start_time", to_bson_datetime(start_time));
        }
        if let Some(end_time) = patch.end_time {
            set.insert("end_time", to_bson_datetime(end_time));
        }

        if set.is_empty() {
            return self.find_match(id).await;
        }

        let updated = self
            .match_collection()
            .await
            .find_one_and_update(doc! {"_id": id}, doc! {"$set": set})
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::SaveMatch { id, source })?;

        Ok(updated.map(Into::into))
    }

    async fn update_score(
        &self,
        id: i64,
        home_score: i32,
        away_score: i32,
    ) -> MongoResult<Option<MatchRecord>> {
        let updated = self
            .match_collection()
            .await
            .find_one_and_update(
                doc! {"_id": id},
                doc! {"$set": {"home_score": home_score, "away_score": away_score}},
            )
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::SaveMatch { id, source })?;

        Ok(updated.map(Into::into))
    }

    async fn set_match_phase(
        &self,
        id: i64,
        phase: MatchPhase,
    ) -> MongoResult<Option<MatchRecord>> {
        let updated = self
            .match_collection()
            .await
            .find_one_and_update(
                doc! {"_id": id},
                doc! {"$set": {"status": phase.as_str()}},
            )
            .return_document(ReturnDocument::After)
            .await
            .map_err(|source| MongoDaoError::SaveMatch { id, source })?;

        Ok(updated.map(Into::into))
    }

    async fn list_unfinished(&self) -> MongoResult<Vec<MatchRecord>> {
        let filter = doc! {
            "status": {"$in": [MatchPhase::Scheduled.as_str(), MatchPhase::Live.as_str()]}
        };

        let documents: Vec<MongoMatchDocument> = self
            .match_collection()
            .await
            .find(filter)
            .await
            .map_err(|source| MongoDaoError::ListMatches { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListMatches { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn insert_commentary(&self, entry: NewCommentary) -> MongoResult<CommentaryRecord> {
        let id = self.next_id(COMMENTARY_COLLECTION_NAME).await?;
        let record = CommentaryRecord {
            id,
            match_id: entry.match_id,
            minute: entry.minute,
            sequence: entry.sequence,
            period: entry.period,
            event_type: entry.event_type,
            actor: entry.actor,
            team: entry.team,
            message: entry.message,
            metadata: entry.metadata,
            tags: entry.tags,
            created_at: OffsetDateTime::now_utc(),
        };

        let document: MongoCommentaryDocument = record.clone().into();
        self.commentary_collection()
            .await
            .insert_one(&document)
            .await
            .map_err(|source| MongoDaoError::SaveCommentary {
                match_id: record.match_id,
                source,
            })?;

        Ok(record)
    }

    async fn list_commentary(
        &self,
        match_id: i64,
        limit: i64,
    ) -> MongoResult<Vec<CommentaryRecord>> {
        let documents: Vec<MongoCommentaryDocument> = self
            .commentary_collection()
            .await
            .find(doc! {"match_id": match_id})
            .sort(doc! {"created_at": -1})
            .limit(limit)
            .await
            .map_err(|source| MongoDaoError::ListCommentary { match_id, source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListCommentary { match_id, source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn delete_commentary(
        &self,
        match_id: i64,
        id: i64,
    ) -> MongoResult<Option<CommentaryRecord>> {
        let deleted = self
            .commentary_collection()
            .await
            .find_one_and_delete(doc! {"_id": id, "match_id": match_id})
            .await
            .map_err(|source| MongoDaoError::DeleteCommentary { id, source })?;

        Ok(deleted.map(Into::into))
    }
}

impl MatchStore for MongoMatchStore {
    fn insert_match(&self, new_match: NewMatch) -> BoxFuture<'static, StorageResult<MatchRecord>> {
        let store = self.clone();
        Box::pin(async move { store.insert_match(new_match).await.map_err(Into::into) })
    }

    fn list_matches(&self, limit: i64) -> BoxFuture<'static, StorageResult<Vec<MatchRecord>>> {
        let store = self.clone();
        Box::pin(async move { store.list_matches(limit).await.map_err(Into::into) })
    }

    fn find_match(&self, id: i64) -> BoxFuture<'static, StorageResult<Option<MatchRecord>>> {
        let store = self.clone();
        Box::pin(async move { store.find_match(id).await.map_err(Into::into) })
    }

    fn update_match(
        &self,
        id: i64,
        patch: MatchPatch,
    ) -> BoxFuture<'static, StorageResult<Option<MatchRecord>>> {
        let store = self.clone();
        Box::pin(async move { store.update_match(id, patch).await.map_err(Into::into) })
    }

    fn update_score(
        &self,
        id: i64,
        home_score: i32,
        away_score: i32,
    ) -> BoxFuture<'static, StorageResult<Option<MatchRecord>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .update_score(id, home_score, away_score)
                .await
                .map_err(Into::into)
        })
    }

    fn set_match_phase(
        &self,
        id: i64,
        phase: MatchPhase,
    ) -> BoxFuture<'static, StorageResult<Option<MatchRecord>>> {
        let store = self.clone();
        Box::pin(async move { store.set_match_phase(id, phase).await.map_err(Into::into) })
    }

    fn list_unfinished(&self) -> BoxFuture<'static, StorageResult<Vec<MatchRecord>>> {
        let store = self.clone();
        Box::pin(async move { store.list_unfinished().await.map_err(Into::into) })
    }

    fn insert_commentary(
        &self,
        entry: NewCommentary,
    ) -> BoxFuture<'static, StorageResult<CommentaryRecord>> {
        let store = self.clone();
        Box::pin(async move { store.insert_commentary(entry).await.map_err(Into::into) })
    }

    fn list_commentary(
        &self,
        match_id: i64,
        limit: i64,
    ) -> BoxFuture<'static, StorageResult<Vec<CommentaryRecord>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .list_commentary(match_id, limit)
                .await
                .map_err(Into::into)
        })
    }

    fn delete_commentary(
        &self,
        match_id: i64,
        id: i64,
    ) -> BoxFuture<'static, StorageResult<Option<CommentaryRecord>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .delete_commentary(match_id, id)
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
