//! HTTP API module for the Shift & Schedule Engine.
//!
//! This module exposes the engine over REST. The caller's identity is
//! taken from the `X-Worker-Id`, `X-Org-Id` and `X-Role` headers set by an
//! authenticating gateway.

mod handlers;
mod request;
mod response;
mod state;

pub use handlers::create_router;
pub use request::{
    ClockBody, CreateScheduleBody, EditShiftBody, GenerateBody, Identity, ManualShiftBody,
    ORG_ID_HEADER, ROLE_HEADER, RangeQuery, TemplateBody, WORKER_ID_HEADER,
};
pub use response::{ApiError, ApiErrorResponse, ClockResponse, HealthResponse};
pub use state::AppState;
