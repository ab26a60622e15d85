//! Request types for the Shift & Schedule Engine API.
//!
//! This module defines the JSON bodies and query strings accepted by the
//! endpoints, plus the identity extracted from gateway headers.

use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{Actor, GeoLocation, RecurringTemplate, Role};

use super::response::{ApiError, ApiErrorResponse};

/// Header carrying the authenticated worker id.
pub const WORKER_ID_HEADER: &str = "x-worker-id";
/// Header carrying the worker's organization id.
pub const ORG_ID_HEADER: &str = "x-org-id";
/// Header carrying the worker's role.
pub const ROLE_HEADER: &str = "x-role";

/// The caller identity, resolved by an upstream gateway and passed in
/// headers.
#[derive(Debug, Clone)]
pub struct Identity(pub Actor);

#[axum::async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiErrorResponse;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| {
            parts
                .headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| ApiErrorResponse::unauthorized(format!("missing header: {}", name)))
        };

        let worker_id = header(WORKER_ID_HEADER)?;
        let org_id = header(ORG_ID_HEADER)?;
        let role: Role = header(ROLE_HEADER)?
            .parse()
            .map_err(|e: String| ApiErrorResponse::unauthorized(e))?;

        Ok(Identity(Actor::new(worker_id, org_id, role)))
    }
}

/// Body of the clock endpoints. The body may be omitted entirely.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClockBody {
    /// Where the worker clocked.
    #[serde(default)]
    pub location: Option<GeoLocation>,
}

/// Body of `POST /shifts/manual`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualShiftBody {
    /// The worker the shift is recorded for.
    #[serde(alias = "user_id")]
    pub worker_id: String,
    /// Shift start.
    pub start_time: DateTime<Utc>,
    /// Shift end.
    pub end_time: DateTime<Utc>,
}

/// Body of `PUT /shifts/:id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditShiftBody {
    /// New start.
    pub start_time: DateTime<Utc>,
    /// New end. Omitted keeps the current end.
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
}

/// Body of `POST /schedules`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateScheduleBody {
    /// The worker the schedule is for.
    #[serde(alias = "user_id")]
    pub worker_id: String,
    /// Planned start.
    pub start_time: DateTime<Utc>,
    /// Planned end.
    pub end_time: DateTime<Utc>,
    /// Free-form notes.
    #[serde(default)]
    pub notes: Option<String>,
}

/// Body of `POST /schedules/generate`: an inclusive range of local dates.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateBody {
    /// First day.
    pub start: NaiveDate,
    /// Last day.
    pub end: NaiveDate,
}

/// Body of `PUT /workers/:id/template`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemplateBody {
    /// The new template; `null` clears it.
    #[serde(alias = "recurringSchedule")]
    pub recurring_template: Option<RecurringTemplate>,
}

/// Optional `?start=YYYY-MM-DD&end=YYYY-MM-DD` query.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RangeQuery {
    /// First day.
    #[serde(default)]
    pub start: Option<NaiveDate>,
    /// Last day.
    #[serde(default)]
    pub end: Option<NaiveDate>,
}

impl RangeQuery {
    /// Both bounds, neither, or an error when only one was given.
    pub fn range(&self) -> Result<Option<(NaiveDate, NaiveDate)>, ApiError> {
        match (self.start, self.end) {
            (Some(start), Some(end)) => Ok(Some((start, end))),
            (None, None) => Ok(None),
            _ => Err(ApiError::validation_error(
                "start and end must be given together",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_shift_accepts_user_id_alias() {
        let json = r#"{
            "user_id": "w_001",
            "start_time": "2026-01-19T09:00:00Z",
            "end_time": "2026-01-19T17:00:00Z"
        }"#;
        let body: ManualShiftBody = serde_json::from_str(json).unwrap();
        assert_eq!(body.worker_id, "w_001");
    }

    #[test]
    fn test_clock_body_location_is_optional() {
        let body: ClockBody = serde_json::from_str("{}").unwrap();
        assert!(body.location.is_none());

        let body: ClockBody =
            serde_json::from_str(r#"{"location": {"lat": -33.86, "lng": 151.2}}"#).unwrap();
        assert_eq!(body.location.unwrap().lng, 151.2);
    }

    #[test]
    fn test_template_body_null_clears() {
        let body: TemplateBody = serde_json::from_str(r#"{"recurring_template": null}"#).unwrap();
        assert!(body.recurring_template.is_none());
    }

    #[test]
    fn test_range_requires_both_bounds() {
        let query = RangeQuery {
            start: NaiveDate::from_ymd_opt(2026, 1, 19),
            end: None,
        };
        assert!(query.range().is_err());
        assert_eq!(RangeQuery::default().range().unwrap(), None);
    }
}
