//! HTTP request handlers for the Shift & Schedule Engine API.
//!
//! Handlers resolve the caller from gateway headers, run the engine call
//! on the blocking pool and map engine errors to JSON error bodies.

use axum::{
    Json, Router,
    body::Bytes,
    extract::{
        Path, Query, State,
        rejection::{JsonRejection, QueryRejection},
    },
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post, put},
};
use chrono::{NaiveDate, Utc};
use serde::de::DeserializeOwned;
use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::Engine;
use crate::error::{EngineError, EngineResult};
use crate::models::Actor;

use super::request::{
    ClockBody, CreateScheduleBody, EditShiftBody, GenerateBody, Identity, ManualShiftBody,
    RangeQuery, TemplateBody,
};
use super::response::{ApiError, ApiErrorResponse, ClockResponse, HealthResponse};
use super::state::AppState;

/// Creates the API router with all endpoints.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/shifts", get(history_handler))
        .route("/shifts/current", get(current_shift_handler))
        .route("/shifts/toggle", post(toggle_handler))
        .route("/shifts/clock-in", post(clock_in_handler))
        .route("/shifts/clock-out", post(clock_out_handler))
        .route("/shifts/all", get(organization_shifts_handler))
        .route("/shifts/manual", post(manual_shift_handler))
        .route("/shifts/:id", put(edit_shift_handler))
        .route("/shifts/:id/entries", get(time_entries_handler))
        .route(
            "/schedules",
            get(list_schedules_handler).post(create_schedule_handler),
        )
        .route("/schedules/generate", post(generate_schedules_handler))
        .route("/schedules/:id", delete(delete_schedule_handler))
        .route("/workers/:id/template", put(set_template_handler))
        .route("/reports/payroll", get(payroll_csv_handler))
        .route("/reports/payroll/summary", get(payroll_summary_handler))
        .route("/reports/calendar.ics", get(calendar_handler))
        .with_state(state)
}

/// Runs an engine call on the blocking pool; the stores may block on I/O.
async fn run<T, F>(state: &AppState, call: F) -> Result<T, ApiErrorResponse>
where
    T: Send + 'static,
    F: FnOnce(&Engine) -> EngineResult<T> + Send + 'static,
{
    let engine = state.shared_engine();
    tokio::task::spawn_blocking(move || call(&engine))
        .await
        .map_err(|e| EngineError::persistence(format!("engine task failed: {}", e)))?
        .map_err(Into::into)
}

/// Logs the outcome of a request and renders it.
fn respond<R: IntoResponse>(
    correlation_id: Uuid,
    operation: &str,
    result: Result<R, ApiErrorResponse>,
) -> Response {
    match result {
        Ok(body) => {
            info!(correlation_id = %correlation_id, operation, "Request completed");
            body.into_response()
        }
        Err(err) => {
            warn!(
                correlation_id = %correlation_id,
                operation,
                status = err.status.as_u16(),
                code = %err.error.code,
                error = %err.error.message,
                "Request failed"
            );
            err.into_response()
        }
    }
}

fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiErrorResponse> {
    payload.map(|Json(body)| body).map_err(|rejection| {
        let error = match rejection {
            JsonRejection::JsonDataError(err) => {
                let body_text = err.body_text();
                if body_text.contains("missing field") {
                    ApiError::validation_error(body_text)
                } else {
                    ApiError::malformed_json(body_text)
                }
            }
            JsonRejection::JsonSyntaxError(err) => {
                ApiError::malformed_json(format!("Invalid JSON syntax: {}", err))
            }
            JsonRejection::MissingJsonContentType(_) => {
                ApiError::new("MISSING_CONTENT_TYPE", "Content-Type must be application/json")
            }
            _ => ApiError::malformed_json("Failed to parse request body"),
        };
        ApiErrorResponse::bad_request(error)
    })
}

fn optional_json_body<T: DeserializeOwned + Default>(bytes: &Bytes) -> Result<T, ApiErrorResponse> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    serde_json::from_slice(bytes).map_err(|e| {
        ApiErrorResponse::bad_request(ApiError::malformed_json(format!(
            "Invalid JSON body: {}",
            e
        )))
    })
}

fn range(
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> Result<Option<(NaiveDate, NaiveDate)>, ApiErrorResponse> {
    let Query(query) = query.map_err(|rejection| {
        ApiErrorResponse::bad_request(ApiError::validation_error(rejection.body_text()))
    })?;
    query.range().map_err(ApiErrorResponse::bad_request)
}

/// Handler for GET /health.
async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

/// Handler for GET /shifts/current: the caller's open shift or `null`.
async fn current_shift_handler(
    State(state): State<AppState>,
    Identity(actor): Identity,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let result = run(&state, move |engine| engine.clock.current_shift(&actor)).await;
    respond(correlation_id, "current_shift", result.map(Json))
}

#[derive(Clone, Copy)]
enum ClockAction {
    Toggle,
    In,
    Out,
}

impl ClockAction {
    fn name(self) -> &'static str {
        match self {
            ClockAction::Toggle => "toggle",
            ClockAction::In => "clock_in",
            ClockAction::Out => "clock_out",
        }
    }
}

async fn clock(state: AppState, actor: Actor, body: Bytes, action: ClockAction) -> Response {
    let correlation_id = Uuid::new_v4();
    info!(
        correlation_id = %correlation_id,
        worker_id = %actor.worker_id,
        action = action.name(),
        "Processing clock request"
    );

    let result = match optional_json_body::<ClockBody>(&body) {
        Ok(body) => {
            run(&state, move |engine| {
                let at = Utc::now();
                match action {
                    ClockAction::Toggle => engine.clock.toggle(&actor, at, body.location),
                    ClockAction::In => engine.clock.clock_in(&actor, at, body.location),
                    ClockAction::Out => engine.clock.clock_out(&actor, at, body.location),
                }
            })
            .await
        }
        Err(err) => Err(err),
    };
    respond(
        correlation_id,
        action.name(),
        result.map(|t| Json(ClockResponse::new(t))),
    )
}

/// Handler for POST /shifts/toggle. The body (`{"location": ...}`) is optional.
async fn toggle_handler(
    State(state): State<AppState>,
    Identity(actor): Identity,
    body: Bytes,
) -> Response {
    clock(state, actor, body, ClockAction::Toggle).await
}

/// Handler for POST /shifts/clock-in.
async fn clock_in_handler(
    State(state): State<AppState>,
    Identity(actor): Identity,
    body: Bytes,
) -> Response {
    clock(state, actor, body, ClockAction::In).await
}

/// Handler for POST /shifts/clock-out.
async fn clock_out_handler(
    State(state): State<AppState>,
    Identity(actor): Identity,
    body: Bytes,
) -> Response {
    clock(state, actor, body, ClockAction::Out).await
}

/// Handler for GET /shifts: the caller's recent shifts.
async fn history_handler(State(state): State<AppState>, Identity(actor): Identity) -> Response {
    let correlation_id = Uuid::new_v4();
    let result = run(&state, move |engine| engine.clock.history(&actor)).await;
    respond(correlation_id, "history", result.map(Json))
}

/// Handler for GET /shifts/all (manager).
async fn organization_shifts_handler(
    State(state): State<AppState>,
    Identity(actor): Identity,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let result = match range(query) {
        Ok(range) => {
            run(&state, move |engine| {
                engine.clock.organization_shifts(&actor, range)
            })
            .await
        }
        Err(err) => Err(err),
    };
    respond(correlation_id, "organization_shifts", result.map(Json))
}

/// Handler for GET /shifts/:id/entries.
async fn time_entries_handler(
    State(state): State<AppState>,
    Identity(actor): Identity,
    Path(shift_id): Path<String>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let result = run(&state, move |engine| {
        engine.clock.time_entries(&actor, &shift_id)
    })
    .await;
    respond(correlation_id, "time_entries", result.map(Json))
}

/// Handler for POST /shifts/manual (manager).
async fn manual_shift_handler(
    State(state): State<AppState>,
    Identity(actor): Identity,
    payload: Result<Json<ManualShiftBody>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let result = match json_body(payload) {
        Ok(body) => {
            run(&state, move |engine| {
                engine.clock.create_manual_shift(
                    &actor,
                    &body.worker_id,
                    body.start_time,
                    body.end_time,
                )
            })
            .await
        }
        Err(err) => Err(err),
    };
    respond(
        correlation_id,
        "manual_shift",
        result.map(|shift| (StatusCode::CREATED, Json(shift))),
    )
}

/// Handler for PUT /shifts/:id (manager).
async fn edit_shift_handler(
    State(state): State<AppState>,
    Identity(actor): Identity,
    Path(shift_id): Path<String>,
    payload: Result<Json<EditShiftBody>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let result = match json_body(payload) {
        Ok(body) => {
            run(&state, move |engine| {
                engine
                    .clock
                    .edit_shift(&actor, &shift_id, body.start_time, body.end_time)
            })
            .await
        }
        Err(err) => Err(err),
    };
    respond(correlation_id, "edit_shift", result.map(Json))
}

/// Handler for GET /schedules.
async fn list_schedules_handler(
    State(state): State<AppState>,
    Identity(actor): Identity,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let result = match range(query) {
        Ok(range) => run(&state, move |engine| engine.schedules.list(&actor, range)).await,
        Err(err) => Err(err),
    };
    respond(correlation_id, "list_schedules", result.map(Json))
}

/// Handler for POST /schedules (manager).
async fn create_schedule_handler(
    State(state): State<AppState>,
    Identity(actor): Identity,
    payload: Result<Json<CreateScheduleBody>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let result = match json_body(payload) {
        Ok(body) => {
            run(&state, move |engine| {
                engine.schedules.create(
                    &actor,
                    &body.worker_id,
                    body.start_time,
                    body.end_time,
                    body.notes,
                )
            })
            .await
        }
        Err(err) => Err(err),
    };
    respond(
        correlation_id,
        "create_schedule",
        result.map(|schedule| (StatusCode::CREATED, Json(schedule))),
    )
}

/// Handler for POST /schedules/generate (manager).
async fn generate_schedules_handler(
    State(state): State<AppState>,
    Identity(actor): Identity,
    payload: Result<Json<GenerateBody>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let result = match json_body(payload) {
        Ok(body) => {
            run(&state, move |engine| {
                engine.schedules.generate(&actor, body.start, body.end)
            })
            .await
        }
        Err(err) => Err(err),
    };
    respond(
        correlation_id,
        "generate_schedules",
        result.map(|report| (StatusCode::CREATED, Json(report))),
    )
}

/// Handler for DELETE /schedules/:id (manager).
async fn delete_schedule_handler(
    State(state): State<AppState>,
    Identity(actor): Identity,
    Path(schedule_id): Path<String>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let result = run(&state, move |engine| {
        engine.schedules.delete(&actor, &schedule_id)
    })
    .await;
    respond(
        correlation_id,
        "delete_schedule",
        result.map(|()| StatusCode::NO_CONTENT),
    )
}

/// Handler for PUT /workers/:id/template (manager).
async fn set_template_handler(
    State(state): State<AppState>,
    Identity(actor): Identity,
    Path(worker_id): Path<String>,
    payload: Result<Json<TemplateBody>, JsonRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let result = match json_body(payload) {
        Ok(body) => {
            run(&state, move |engine| {
                engine
                    .schedules
                    .set_template(&actor, &worker_id, body.recurring_template)
            })
            .await
        }
        Err(err) => Err(err),
    };
    respond(correlation_id, "set_template", result.map(Json))
}

/// Handler for GET /reports/payroll (manager): a CSV attachment.
async fn payroll_csv_handler(
    State(state): State<AppState>,
    Identity(actor): Identity,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let result = match range(query) {
        Ok(range) => run(&state, move |engine| engine.reports.payroll_csv(&actor, range)).await,
        Err(err) => Err(err),
    };
    respond(
        correlation_id,
        "payroll_csv",
        result.map(|csv| {
            (
                [
                    (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
                    (
                        header::CONTENT_DISPOSITION,
                        "attachment; filename=\"payroll_report.csv\"",
                    ),
                ],
                csv,
            )
        }),
    )
}

/// Handler for GET /reports/payroll/summary (manager): totals per worker.
async fn payroll_summary_handler(
    State(state): State<AppState>,
    Identity(actor): Identity,
    query: Result<Query<RangeQuery>, QueryRejection>,
) -> Response {
    let correlation_id = Uuid::new_v4();
    let result = match range(query) {
        Ok(range) => {
            run(&state, move |engine| {
                engine.reports.payroll_summary(&actor, range)
            })
            .await
        }
        Err(err) => Err(err),
    };
    respond(correlation_id, "payroll_summary", result.map(Json))
}

/// Handler for GET /reports/calendar.ics (manager).
async fn calendar_handler(State(state): State<AppState>, Identity(actor): Identity) -> Response {
    let correlation_id = Uuid::new_v4();
    let result = run(&state, move |engine| engine.reports.calendar_ics(&actor)).await;
    respond(
        correlation_id,
        "calendar",
        result.map(|ics| {
            (
                [
                    (header::CONTENT_TYPE, "text/calendar; charset=utf-8"),
                    (
                        header::CONTENT_DISPOSITION,
                        "attachment; filename=\"schedule.ics\"",
                    ),
                ],
                ics,
            )
        }),
    )
}
