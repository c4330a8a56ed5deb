//! Enrollment manager: join, cancel with waitlist promotion, event creation
//! and participant listing.
//!
//! Join and cancel run inside a [`infra::StoreTx`] that holds the event lock,
//! so concurrent requests against one event are serialized and the capacity
//! check can never be raced. The event's lists and every affected user's
//! reference lists are committed together or not at all.

use std::sync::Arc;

use chrono::{DateTime, NaiveDate};
use infra::models::{EventRow, Membership, UserRow};
use infra::repos::CreateEventData;
use infra::{Store, StoreError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

use super::roster;

#[derive(Debug, Error)]
pub enum EnrollmentError {
    #[error("event not found")]
    EventNotFound,

    #[error("user not found")]
    UserNotFound,

    #[error("user has already joined the event")]
    AlreadyJoined,

    #[error("user is not a confirmed participant")]
    NotConfirmed,

    #[error("{0}")]
    InvalidInput(String),

    #[error("an event with the same title, date and location already exists")]
    Conflict,

    #[error(transparent)]
    Persistence(#[from] StoreError),
}

/// Public view of a participant.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantSummary {
    pub id: Uuid,
    pub full_name: String,
    pub email: String,
}

impl From<UserRow> for ParticipantSummary {
    fn from(user: UserRow) -> Self {
        Self {
            id: user.id,
            full_name: user.full_name,
            email: user.email,
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventDetails {
    pub title: String,
    pub confirmed: Vec<ParticipantSummary>,
    pub waitlisted: Vec<ParticipantSummary>,
}

#[derive(Debug, Clone)]
pub struct CancelOutcome {
    pub promoted: Option<ParticipantSummary>,
}

/// Raw event fields as submitted by a client. Everything is optional so that
/// missing fields surface as `InvalidInput` rather than a decode failure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateEventInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub location: Option<String>,
    pub max_participants: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Validate)]
struct NewEvent {
    #[validate(length(max = 200, message = "title must be at most 200 characters"))]
    title: String,
    #[validate(length(max = 5000, message = "description must be at most 5000 characters"))]
    description: String,
    date: NaiveDate,
    #[validate(length(max = 32, message = "time must be at most 32 characters"))]
    time: String,
    #[validate(length(max = 200, message = "location must be at most 200 characters"))]
    location: String,
    #[validate(range(min = 1, message = "maxParticipants must be a positive number."))]
    max_participants: i32,
}

const MISSING_FIELDS: &str =
    "All fields (title, description, date, time, location, maxParticipants) are required.";

fn present(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Accepts a bare `YYYY-MM-DD` or a full RFC 3339 timestamp.
fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

impl TryFrom<CreateEventInput> for NewEvent {
    type Error = EnrollmentError;

    fn try_from(input: CreateEventInput) -> Result<Self, Self::Error> {
        let missing = || EnrollmentError::InvalidInput(MISSING_FIELDS.to_string());

        let title = present(input.title).ok_or_else(missing)?;
        let description = present(input.description).ok_or_else(missing)?;
        let raw_date = present(input.date).ok_or_else(missing)?;
        let time = present(input.time).ok_or_else(missing)?;
        let location = present(input.location).ok_or_else(missing)?;
        let max_participants = input
            .max_participants
            .filter(|v| !v.is_null())
            .ok_or_else(missing)?;

        let date = parse_date(&raw_date).ok_or_else(|| {
            EnrollmentError::InvalidInput(
                "date must be a calendar date (YYYY-MM-DD) or an RFC 3339 timestamp.".to_string(),
            )
        })?;

        // Only JSON integers are accepted; "5" or 2.5 are rejected
        let max_participants = max_participants
            .as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .ok_or_else(|| {
                EnrollmentError::InvalidInput(
                    "maxParticipants must be a positive number.".to_string(),
                )
            })?;

        let event = NewEvent {
            title,
            description,
            date,
            time,
            location,
            max_participants,
        };
        event
            .validate()
            .map_err(|e| EnrollmentError::InvalidInput(e.to_string()))?;
        Ok(event)
    }
}

#[derive(Clone)]
pub struct EnrollmentManager {
    store: Arc<dyn Store>,
}

impl EnrollmentManager {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Join an event: confirmed while capacity remains, waitlisted otherwise.
    pub async fn join(&self, event_id: Uuid, user_id: Uuid) -> Result<Membership, EnrollmentError> {
        let mut tx = self.store.begin().await?;

        let mut event = tx
            .lock_event(event_id)
            .await?
            .ok_or(EnrollmentError::EventNotFound)?;
        tx.get_user(user_id)
            .await?
            .ok_or(EnrollmentError::UserNotFound)?;

        let membership = roster::admit(&mut event, user_id)?;

        tx.save_event_roster(&event).await?;
        tx.link_event(user_id, event_id, membership).await?;
        tx.commit().await?;

        info!(
            %event_id,
            %user_id,
            membership = membership.as_str(),
            confirmed = event.confirmed_participants.len(),
            waitlisted = event.waitlist_participants.len(),
            "Participant joined event"
        );

        Ok(membership)
    }

    /// Cancel a confirmed participation and promote the earliest waitlisted
    /// user into the freed slot.
    pub async fn cancel(
        &self,
        event_id: Uuid,
        user_id: Uuid,
    ) -> Result<CancelOutcome, EnrollmentError> {
        let mut tx = self.store.begin().await?;

        let mut event = tx
            .lock_event(event_id)
            .await?
            .ok_or(EnrollmentError::EventNotFound)?;
        tx.get_user(user_id)
            .await?
            .ok_or(EnrollmentError::UserNotFound)?;

        let promoted_id = roster::release(&mut event, user_id)?;

        // Both user rows are locked up front in id order; a cancel elsewhere may
        // be editing the same two users the other way round.
        let mut affected = vec![user_id];
        affected.extend(promoted_id);
        affected.sort();
        tx.lock_users(&affected).await?;

        tx.save_event_roster(&event).await?;
        tx.unlink_event(user_id, event_id, Membership::Confirmed)
            .await?;

        let mut promoted = None;
        if let Some(promoted_id) = promoted_id {
            tx.unlink_event(promoted_id, event_id, Membership::Waitlisted)
                .await?;
            tx.link_event(promoted_id, event_id, Membership::Confirmed)
                .await?;
            promoted = tx.get_user(promoted_id).await?.map(ParticipantSummary::from);
        }

        tx.commit().await?;

        match promoted_id {
            Some(promoted_user_id) => info!(
                %event_id,
                %user_id,
                %promoted_user_id,
                "Participation cancelled, waitlisted participant promoted"
            ),
            None => info!(%event_id, %user_id, "Participation cancelled"),
        }

        Ok(CancelOutcome { promoted })
    }

    /// Title plus resolved participant summaries, in list order.
    pub async fn event_details(&self, event_id: Uuid) -> Result<EventDetails, EnrollmentError> {
        let event = self
            .store
            .get_event(event_id)
            .await?
            .ok_or(EnrollmentError::EventNotFound)?;

        let confirmed = self.store.get_users(&event.confirmed_participants).await?;
        let waitlisted = self.store.get_users(&event.waitlist_participants).await?;

        Ok(EventDetails {
            title: event.title,
            confirmed: confirmed.into_iter().map(ParticipantSummary::from).collect(),
            waitlisted: waitlisted.into_iter().map(ParticipantSummary::from).collect(),
        })
    }

    /// Validate and create an event with empty participant lists.
    pub async fn create_event(&self, input: CreateEventInput) -> Result<EventRow, EnrollmentError> {
        let new_event = NewEvent::try_from(input)?;

        if self
            .store
            .find_event_by_key(&new_event.title, new_event.date, &new_event.location)
            .await?
            .is_some()
        {
            return Err(EnrollmentError::Conflict);
        }

        let data = CreateEventData {
            title: new_event.title,
            description: new_event.description,
            date: new_event.date,
            time: new_event.time,
            location: new_event.location,
            max_participants: new_event.max_participants,
        };

        let event = match self.store.insert_event(data).await {
            Ok(event) => event,
            Err(StoreError::Duplicate(_)) => return Err(EnrollmentError::Conflict),
            Err(e) => return Err(e.into()),
        };

        info!(event_id = %event.id, title = %event.title, capacity = event.max_participants, "Event created");
        Ok(event)
    }
}
