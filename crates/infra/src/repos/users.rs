use sqlx::{PgExecutor, Result};
use uuid::Uuid;

use crate::models::{Membership, Role, UserRow};

#[derive(Debug, Clone)]
pub struct CreateUserData {
    pub full_name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

fn events_column(membership: Membership) -> &'static str {
    match membership {
        Membership::Confirmed => "confirmed_events",
        Membership::Waitlisted => "waitlist_events",
    }
}

pub async fn create<'e>(executor: impl PgExecutor<'e>, data: CreateUserData) -> Result<UserRow> {
    let row = sqlx::query_as::<_, UserRow>(
        r#"
        INSERT INTO users (full_name, email, password_hash, role)
        VALUES ($1, $2, $3, $4)
        RETURNING id, full_name, email, password_hash, role, confirmed_events, waitlist_events, created_at, updated_at
        "#,
    )
    .bind(&data.full_name)
    .bind(&data.email)
    .bind(&data.password_hash)
    .bind(data.role)
    .fetch_one(executor)
    .await?;

    Ok(row)
}

pub async fn get_by_id<'e>(executor: impl PgExecutor<'e>, id: Uuid) -> Result<Option<UserRow>> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, full_name, email, password_hash, role, confirmed_events, waitlist_events, created_at, updated_at FROM users WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(row)
}

pub async fn get_by_email<'e>(
    executor: impl PgExecutor<'e>,
    email: &str,
) -> Result<Option<UserRow>> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, full_name, email, password_hash, role, confirmed_events, waitlist_events, created_at, updated_at FROM users WHERE lower(email) = lower($1)",
    )
    .bind(email)
    .fetch_optional(executor)
    .await?;

    Ok(row)
}

/// Rows come back in the order of `ids`; ids without a row are skipped.
pub async fn list_by_ids<'e>(executor: impl PgExecutor<'e>, ids: &[Uuid]) -> Result<Vec<UserRow>> {
    if ids.is_empty() {
        return Ok(Vec::new());
    }

    let rows = sqlx::query_as::<_, UserRow>(
        r#"
        SELECT u.id, u.full_name, u.email, u.password_hash, u.role, u.confirmed_events, u.waitlist_events, u.created_at, u.updated_at
        FROM unnest($1::uuid[]) WITH ORDINALITY AS wanted(id, ord)
        JOIN users u ON u.id = wanted.id
        ORDER BY wanted.ord
        "#,
    )
    .bind(ids)
    .fetch_all(executor)
    .await?;

    Ok(rows)
}

/// Row-lock `ids` in id order for the rest of the enclosing transaction.
pub async fn lock_for_update<'e>(executor: impl PgExecutor<'e>, ids: &[Uuid]) -> Result<()> {
    if ids.is_empty() {
        return Ok(());
    }

    sqlx::query("SELECT id FROM users WHERE id = ANY($1) ORDER BY id FOR UPDATE")
        .bind(ids)
        .fetch_all(executor)
        .await?;
    Ok(())
}

/// Append `event_id` to one of the user's event lists unless already present.
///
/// A single statement, so concurrent edits to the same user from transactions
/// holding different event locks never overwrite each other.
pub async fn link_event<'e>(
    executor: impl PgExecutor<'e>,
    user_id: Uuid,
    event_id: Uuid,
    membership: Membership,
) -> Result<()> {
    let column = events_column(membership);
    let sql = format!(
        "UPDATE users SET {column} = array_append({column}, $2), updated_at = NOW() WHERE id = $1 AND NOT ($2 = ANY({column}))"
    );
    sqlx::query(&sql)
        .bind(user_id)
        .bind(event_id)
        .execute(executor)
        .await?;
    Ok(())
}

pub async fn unlink_event<'e>(
    executor: impl PgExecutor<'e>,
    user_id: Uuid,
    event_id: Uuid,
    membership: Membership,
) -> Result<()> {
    let column = events_column(membership);
    let sql = format!(
        "UPDATE users SET {column} = array_remove({column}, $2), updated_at = NOW() WHERE id = $1"
    );
    sqlx::query(&sql)
        .bind(user_id)
        .bind(event_id)
        .execute(executor)
        .await?;
    Ok(())
}
