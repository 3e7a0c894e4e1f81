//! Routes for attendee registration.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::{Json, Router, routing::post};
use passin_core::decision::AdmissionDecision;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use passin_registration::application::command_handlers;
use passin_registration::domain::commands;

use crate::error::ApiError;
use crate::state::AppState;

/// Request body for POST /events/{event_id}/attendees.
#[derive(Debug, Deserialize)]
pub struct RegisterAttendeeRequest {
    /// Attendee display name, at least four characters.
    pub name: String,
    /// Attendee email address.
    pub email: String,
}

/// Response body returned after a registration is accepted.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterAttendeeResponse {
    /// Store-assigned attendee id.
    pub attendee_id: i64,
}

/// POST /events/{event_id}/attendees
#[instrument(skip(state, request), fields(event_id = %event_id))]
async fn register_for_event(
    State(state): State<AppState>,
    Path(event_id): Path<Uuid>,
    Json(request): Json<RegisterAttendeeRequest>,
) -> Result<(StatusCode, Json<RegisterAttendeeResponse>), ApiError> {
    let command = commands::RegisterAttendee {
        correlation_id: Uuid::new_v4(),
        event_id: event_id.to_string(),
        name: request.name,
        email: request.email,
    };

    info!(correlation_id = %command.correlation_id, "handling register_attendee command");

    command
        .validate()
        .map_err(|err| ApiError::Invalid(err.to_string()))?;

    let decision = command_handlers::admit(
        &command,
        state.clock.as_ref(),
        &*state.attendee_store,
        &state.admission_policy,
    )
    .await?;

    match decision {
        AdmissionDecision::Accepted { attendee_id } => Ok((
            StatusCode::CREATED,
            Json(RegisterAttendeeResponse { attendee_id }),
        )),
        AdmissionDecision::Rejected(reason) => Err(ApiError::Rejected(reason)),
    }
}

/// Returns the router for attendee registration.
pub fn router() -> Router<AppState> {
    Router::new().route("/events/{event_id}/attendees", post(register_for_event))
}
