use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use infra::models::{EventRow, Membership};
use serde::Serialize;
use uuid::Uuid;

use super::ApiJson;
use crate::auth::{AdminUser, CurrentUser};
use crate::error::AppError;
use crate::services::enrollment::{CreateEventInput, ParticipantSummary};
use crate::state::AppState;

#[derive(Serialize)]
pub struct CreateEventResponse {
    pub message: &'static str,
    pub event: EventRow,
}

/// A participant list, or a placeholder sentence when it is empty.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ParticipantList {
    Participants(Vec<ParticipantSummary>),
    Empty(&'static str),
}

impl ParticipantList {
    fn or_placeholder(list: Vec<ParticipantSummary>, placeholder: &'static str) -> Self {
        if list.is_empty() {
            ParticipantList::Empty(placeholder)
        } else {
            ParticipantList::Participants(list)
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantsResponse {
    pub title: String,
    pub confirmed_participants: ParticipantList,
    pub waitlist_participants: ParticipantList,
}

#[derive(Serialize)]
pub struct JoinResponse {
    pub message: &'static str,
    pub status: &'static str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelResponse {
    pub message: &'static str,
    pub promoted: bool,
    pub promoted_user: Option<ParticipantSummary>,
}

/// Unparseable ids cannot name an event, so they are reported like unknown ones.
fn parse_event_id(raw: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound("Event not found".to_string()))
}

/// POST /event/create-event (admin only)
pub async fn create_event(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    ApiJson(input): ApiJson<CreateEventInput>,
) -> Result<impl IntoResponse, AppError> {
    let event = state.enrollment().create_event(input).await?;
    tracing::debug!(admin_id = %admin.id, event_id = %event.id, "Admin created event");

    Ok((
        StatusCode::CREATED,
        Json(CreateEventResponse {
            message: "Event created successfully",
            event,
        }),
    ))
}

/// GET /event/participants/{event_id}
pub async fn participants(
    State(state): State<AppState>,
    Path(event_id): Path<String>,
) -> Result<Json<ParticipantsResponse>, AppError> {
    let event_id = parse_event_id(&event_id)?;
    let details = state.enrollment().event_details(event_id).await?;

    Ok(Json(ParticipantsResponse {
        title: details.title,
        confirmed_participants: ParticipantList::or_placeholder(
            details.confirmed,
            "No confirmed participants",
        ),
        waitlist_participants: ParticipantList::or_placeholder(
            details.waitlisted,
            "No waitlist participants",
        ),
    }))
}

/// POST /event/join/{event_id}
pub async fn join(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(event_id): Path<String>,
) -> Result<Json<JoinResponse>, AppError> {
    let event_id = parse_event_id(&event_id)?;
    let membership = state.enrollment().join(event_id, user.id).await?;

    let message = match membership {
        Membership::Confirmed => "User added to event confirmed list",
        Membership::Waitlisted => "User added to event waitlist",
    };

    Ok(Json(JoinResponse {
        message,
        status: membership.as_str(),
    }))
}

/// POST /event/cancel-participant/{event_id}
pub async fn cancel_participation(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(event_id): Path<String>,
) -> Result<Json<CancelResponse>, AppError> {
    let event_id = parse_event_id(&event_id)?;
    let outcome = state.enrollment().cancel(event_id, user.id).await?;

    Ok(Json(CancelResponse {
        message: "Participation cancelled and waitlist updated",
        promoted: outcome.promoted.is_some(),
        promoted_user: outcome.promoted,
    }))
}
