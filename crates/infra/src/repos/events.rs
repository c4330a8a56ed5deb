use chrono::NaiveDate;
use sqlx::{PgExecutor, Result};
use uuid::Uuid;

use crate::models::EventRow;

#[derive(Debug, Clone)]
pub struct CreateEventData {
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub time: String,
    pub location: String,
    pub max_participants: i32,
}

pub async fn create<'e>(executor: impl PgExecutor<'e>, data: CreateEventData) -> Result<EventRow> {
    let row = sqlx::query_as::<_, EventRow>(
        r#"
        INSERT INTO events (title, description, date, time, location, max_participants)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, title, description, date, time, location, max_participants, confirmed_participants, waitlist_participants, created_at, updated_at
        "#,
    )
    .bind(&data.title)
    .bind(&data.description)
    .bind(data.date)
    .bind(&data.time)
    .bind(&data.location)
    .bind(data.max_participants)
    .fetch_one(executor)
    .await?;

    Ok(row)
}

pub async fn get_by_id<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> Result<Option<EventRow>> {
    let row = sqlx::query_as::<_, EventRow>(
        "SELECT id, title, description, date, time, location, max_participants, confirmed_participants, waitlist_participants, created_at, updated_at FROM events WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(row)
}

/// Lock the event row for the rest of the enclosing transaction.
pub async fn get_for_update<'e>(
    executor: impl PgExecutor<'e>,
    id: Uuid,
) -> Result<Option<EventRow>> {
    let row = sqlx::query_as::<_, EventRow>(
        "SELECT id, title, description, date, time, location, max_participants, confirmed_participants, waitlist_participants, created_at, updated_at FROM events WHERE id = $1 FOR UPDATE",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(row)
}

pub async fn find_by_key<'e>(
    executor: impl PgExecutor<'e>,
    title: &str,
    date: NaiveDate,
    location: &str,
) -> Result<Option<EventRow>> {
    let row = sqlx::query_as::<_, EventRow>(
        r#"
        SELECT id, title, description, date, time, location, max_participants, confirmed_participants, waitlist_participants, created_at, updated_at
        FROM events
        WHERE title = $1 AND date = $2 AND location = $3
        "#,
    )
    .bind(title)
    .bind(date)
    .bind(location)
    .fetch_optional(executor)
    .await?;

    Ok(row)
}

/// Overwrite both participant lists. Callers must hold the row lock.
pub async fn update_roster<'e>(executor: impl PgExecutor<'e>, event: &EventRow) -> Result<()> {
    sqlx::query(
        "UPDATE events SET confirmed_participants = $2, waitlist_participants = $3, updated_at = NOW() WHERE id = $1",
    )
    .bind(event.id)
    .bind(&event.confirmed_participants)
    .bind(&event.waitlist_participants)
    .execute(executor)
    .await?;
    Ok(())
}
