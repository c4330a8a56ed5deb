//! Membership transitions on a single event's participant lists.
//!
//! These functions only touch the in-memory [`EventRow`]; the caller mirrors
//! the result onto the user side and persists both inside one transaction.

use infra::models::{EventRow, Membership};
use uuid::Uuid;

use super::enrollment::EnrollmentError;

/// Where `user_id` currently sits on the event, if anywhere.
pub fn membership_of(event: &EventRow, user_id: Uuid) -> Option<Membership> {
    if event.confirmed_participants.contains(&user_id) {
        Some(Membership::Confirmed)
    } else if event.waitlist_participants.contains(&user_id) {
        Some(Membership::Waitlisted)
    } else {
        None
    }
}

/// Place a new participant: confirmed while capacity remains, otherwise at the
/// tail of the waitlist.
pub fn admit(event: &mut EventRow, user_id: Uuid) -> Result<Membership, EnrollmentError> {
    if membership_of(event, user_id).is_some() {
        return Err(EnrollmentError::AlreadyJoined);
    }

    if event.is_full() {
        event.waitlist_participants.push(user_id);
        Ok(Membership::Waitlisted)
    } else {
        event.confirmed_participants.push(user_id);
        Ok(Membership::Confirmed)
    }
}

/// Remove a confirmed participant and promote the head of the waitlist into
/// the freed slot. Returns the promoted user, if any.
///
/// Waitlisted users cannot leave through this path; the event is left
/// untouched when `user_id` is not confirmed.
pub fn release(event: &mut EventRow, user_id: Uuid) -> Result<Option<Uuid>, EnrollmentError> {
    let position = event
        .confirmed_participants
        .iter()
        .position(|id| *id == user_id)
        .ok_or(EnrollmentError::NotConfirmed)?;
    event.confirmed_participants.remove(position);

    if event.waitlist_participants.is_empty() || event.is_full() {
        return Ok(None);
    }

    let promoted = event.waitlist_participants.remove(0);
    event.confirmed_participants.push(promoted);
    Ok(Some(promoted))
}
