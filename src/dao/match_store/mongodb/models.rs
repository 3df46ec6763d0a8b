//! BSON document shapes for the match and commentary collections.

use std::time::SystemTime;

use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::dao::models::{CommentaryRecord, MatchRecord};
use crate::state::phase::MatchPhase;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoMatchDocument {
    #[serde(rename = "_id")]
    id: i64,
    sport: String,
    home_team: String,
    away_team: String,
    status: MatchPhase,
    start_time: DateTime,
    end_time: DateTime,
    home_score: i32,
    away_score: i32,
    created_at: DateTime,
}

impl From<MatchRecord> for MongoMatchDocument {
    fn from(value: MatchRecord) -> Self {
        Self {
            id: value.id,
            sport: value.sport,
            home_team: value.home_team,
            away_team: value.away_team,
            status: value.status,
            start_time: to_bson_datetime(value.start_time),
            end_time: to_bson_datetime(value.end_time),
            home_score: value.home_score,
            away_score: value.away_score,
            created_at: to_bson_datetime(value.created_at),
        }
    }
}

impl From<MongoMatchDocument> for MatchRecord {
    fn from(value: MongoMatchDocument) -> Self {
        Self {
            id: value.id,
            sport: value.sport,
            home_team: value.home_team,
            away_team: value.away_team,
            status: value.status,
            start_time: from_bson_datetime(value.start_time),
            end_time: from_bson_datetime(value.end_time),
            home_score: value.home_score,
            away_score: value.away_score,
            created_at: from_bson_datetime(value.created_at),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoCommentaryDocument {
    #[serde(rename = "_id")]
    id: i64,
    match_id: i64,
    minute: Option<i32>,
    sequence: Option<i32>,
    period: Option<String>,
    event_type: Option<String>,
    actor: Option<String>,
    team: Option<String>,
    message: String,
    metadata: Option<serde_json::Value>,
    tags: Option<Vec<String>>,
    created_at: DateTime,
}

impl From<CommentaryRecord> for MongoCommentaryDocument {
    fn from(value: CommentaryRecord) -> Self {
        Self {
            id: value.id,
            match_id: value.match_id,
            minute: value.minute,
            sequence: value.sequence,
            period: value.period,
            event_type: value.event_type,
            actor: value.actor,
            team: value.team,
            message: value.message,
            metadata: value.metadata,
            tags: value.tags,
            created_at: to_bson_datetime(value.created_at),
        }
    }
}

impl From<MongoCommentaryDocument> for CommentaryRecord {
    fn from(value: MongoCommentaryDocument) -> Self {
        Self {
            id: value.id,
            match_id: value.match_id,
            minute: value.minute,
            sequence: value.sequence,
            period: value.period,
            event_type: value.event_type,
            actor: value.actor,
            team: value.team,
            message: value.message,
            metadata: value.metadata,
            tags: value.tags,
            created_at: from_bson_datetime(value.created_at),
        }
    }
}

/// Counter document backing the monotonic integer id allocation.
#[derive(Debug, Serialize, Deserialize)]
pub struct CounterDocument {
    #[serde(rename = "_id")]
    pub name: String,
    pub seq: i64,
}

pub fn to_bson_datetime(value: OffsetDateTime) -> DateTime {
    DateTime::from_system_time(SystemTime::from(value))
}

pub fn from_bson_datetime(value: DateTime) -> OffsetDateTime {
    OffsetDateTime::from(value.to_system_time())
}
