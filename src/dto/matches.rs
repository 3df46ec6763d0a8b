//! Request and response shapes for match endpoints.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, PickFirst, serde_as};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};
use utoipa::{IntoParams, ToSchema};
use validator::{Validate, ValidationError};

use crate::{
    dao::models::MatchRecord,
    dto::{format_timestamp, validation::validate_rfc3339},
    state::phase::MatchPhase,
};

/// Payload used to create a new match.
#[serde_as]
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = validate_match_window))]
pub struct CreateMatchRequest {
    /// Sport discipline.
    #[validate(length(min = 1, message = "sport must not be empty"))]
    pub sport: String,
    /// Home team display name.
    #[validate(length(min = 1, message = "homeTeam must not be empty"))]
    pub home_team: String,
    /// Away team display name.
    #[validate(length(min = 1, message = "awayTeam must not be empty"))]
    pub away_team: String,
    /// Scheduled start as an RFC 3339 instant.
    #[validate(custom(function = validate_rfc3339))]
    pub start_time: String,
    /// Scheduled end as an RFC 3339 instant, strictly after the start.
    #[validate(custom(function = validate_rfc3339))]
    pub end_time: String,
    /// Optional initial home score (number or numeric string).
    #[serde(default)]
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    #[validate(range(min = 0))]
    #[schema(value_type = Option<i32>)]
    pub home_score: Option<i32>,
    /// Optional initial away score (number or numeric string).
    #[serde(default)]
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    #[validate(range(min = 0))]
    #[schema(value_type = Option<i32>)]
    pub away_score: Option<i32>,
}

impl CreateMatchRequest {
    /// Parsed match window, when both instants are valid.
    pub fn window(&self) -> Option<(OffsetDateTime, OffsetDateTime)> {
        let start = OffsetDateTime::parse(&self.start_time, &Rfc3339).ok()?;
        let end = OffsetDateTime::parse(&self.end_time, &Rfc3339).ok()?;
        Some((start, end))
    }
}

/// Ensure the end of the window lies strictly after its start.
fn validate_match_window(request: &CreateMatchRequest) -> Result<(), ValidationError> {
    // Unparseable instants are already reported by the per-field rules.
    let Some((start, end)) = request.window() else {
        return Ok(());
    };

    if end <= start {
        let mut err = ValidationError::new("match_window");
        err.message = Some("endTime must be after startTime".into());
        return Err(err);
    }

    Ok(())
}

/// Partial update applied to an existing match.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = validate_update_has_fields))]
pub struct UpdateMatchRequest {
    /// New sport discipline.
    #[validate(length(min = 1, message = "sport must not be empty"))]
    pub sport: Option<String>,
    /// New home team display name.
    #[validate(length(min = 1, message = "homeTeam must not be empty"))]
    pub home_team: Option<String>,
    /// New away team display name.
    #[validate(length(min = 1, message = "awayTeam must not be empty"))]
    pub away_team: Option<String>,
    /// New start of the match window, as an RFC 3339 instant.
    #[validate(custom(function = validate_rfc3339))]
    pub start_time: Option<String>,
    /// New end of the match window, as an RFC 3339 instant.
    #[validate(custom(function = validate_rfc3339))]
    pub end_time: Option<String>,
    /// Explicit lifecycle phase override.
    pub status: Option<MatchPhase>,
}

impl UpdateMatchRequest {
    /// Whether any field is present.
    pub fn is_empty(&self) -> bool {
        self.sport.is_none()
            && self.home_team.is_none()
            && self.away_team.is_none()
            && self.start_time.is_none()
            && self.end_time.is_none()
            && self.status.is_none()
    }
}

/// Reject updates that carry no fields at all.
fn validate_update_has_fields(request: &UpdateMatchRequest) -> Result<(), ValidationError> {
    if request.is_empty() {
        let mut err = ValidationError::new("empty_update");
        err.message = Some("at least one field must be provided".into());
        return Err(err);
    }

    Ok(())
}

/// Payload used to replace both scores of a match.
#[serde_as]
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateScoreRequest {
    /// New home team score (number or numeric string).
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    #[validate(range(min = 0))]
    #[schema(value_type = i32)]
    pub home_score: i32,
    /// New away team score (number or numeric string).
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    #[validate(range(min = 0))]
    #[schema(value_type = i32)]
    pub away_score: i32,
}

/// Query parameters accepted when listing matches.
#[derive(Debug, Default, Deserialize, IntoParams, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ListMatchesQuery {
    /// Maximum number of rows returned.
    #[validate(range(min = 1, max = 100))]
    pub limit: Option<i64>,
}

/// A match as returned to clients and carried by broadcast events.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    /// Stable match identifier.
    pub id: i64,
    /// Sport discipline.
    pub sport: String,
    /// Home team display name.
    pub home_team: String,
    /// Away team display name.
    pub away_team: String,
    /// Current lifecycle phase.
    pub status: MatchPhase,
    /// Scheduled start, RFC 3339.
    pub start_time: String,
    /// Scheduled end, RFC 3339.
    pub end_time: String,
    /// Current home team score.
    pub home_score: i32,
    /// Current away team score.
    pub away_score: i32,
    /// Creation timestamp, RFC 3339.
    pub created_at: String,
}

impl From<MatchRecord> for MatchSummary {
    fn from(value: MatchRecord) -> Self {
        Self {
            id: value.id,
            sport: value.sport,
            home_team: value.home_team,
            away_team: value.away_team,
            status: value.status,
            start_time: format_timestamp(value.start_time),
            end_time: format_timestamp(value.end_time),
            home_score: value.home_score,
            away_score: value.away_score,
            created_at: format_timestamp(value.created_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_payload() -> serde_json::Value {
        serde_json::json!({
            "sport": "football",
            "homeTeam": "Team A",
            "awayTeam": "Team B",
            "startTime": "2026-03-01T12:00:00Z",
            "endTime": "2026-03-01T14:00:00Z",
        })
    }

    fn parse(value: serde_json::Value) -> CreateMatchRequest {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn accepts_valid_match_data() {
        assert!(parse(valid_payload()).validate().is_ok());
    }

    #[test]
    fn accepts_scores_as_numbers_or_numeric_strings() {
        let mut payload = valid_payload();
        payload["homeScore"] = serde_json::json!(2);
        payload["awayScore"] = serde_json::json!("1");

        let request = parse(payload);
        assert_eq!(request.home_score, Some(2));
        assert_eq!(request.away_score, Some(1));
        assert!(request.validate().is_ok());
    }

    #[test]
    fn rejects_empty_sport() {
        let mut payload = valid_payload();
        payload["sport"] = serde_json::json!("");
        assert!(parse(payload).validate().is_err());
    }

    #[test]
    fn rejects_invalid_start_instant() {
        let mut payload = valid_payload();
        payload["startTime"] = serde_json::json!("not-a-date");
        assert!(parse(payload).validate().is_err());
    }

    #[test]
    fn rejects_window_ending_before_it_starts() {
        let mut payload = valid_payload();
        payload["startTime"] = serde_json::json!("2026-03-01T14:00:00Z");
        payload["endTime"] = serde_json::json!("2026-03-01T12:00:00Z");
        assert!(parse(payload).validate().is_err());
    }

    #[test]
    fn rejects_zero_length_window() {
        let mut payload = valid_payload();
        payload["endTime"] = payload["startTime"].clone();
        assert!(parse(payload).validate().is_err());
    }

    #[test]
    fn rejects_negative_scores() {
        let mut payload = valid_payload();
        payload["homeScore"] = serde_json::json!(-1);
        assert!(parse(payload).validate().is_err());
    }

    #[test]
    fn update_requires_at_least_one_field() {
        let empty: UpdateMatchRequest = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(empty.validate().is_err());

        let named: UpdateMatchRequest =
            serde_json::from_value(serde_json::json!({"sport": "rugby"})).unwrap();
        assert!(named.validate().is_ok());
    }
}
