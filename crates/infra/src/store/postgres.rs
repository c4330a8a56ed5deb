use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{Store, StoreError, StoreResult, StoreTx};
use crate::models::{EventRow, Membership, UserRow};
use crate::repos::{events, users, CreateEventData, CreateUserData};

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    pub fn pool(&self) -> &PgPool {
        &self.db
    }
}

fn map_unique(e: sqlx::Error, what: &'static str) -> StoreError {
    match e.as_database_error() {
        Some(db_err) if db_err.is_unique_violation() => {
            tracing::debug!(constraint = ?db_err.constraint(), "Unique violation on {what}");
            StoreError::Duplicate(what)
        }
        _ => StoreError::Db(e),
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        let _one: i32 = sqlx::query_scalar("SELECT 1").fetch_one(&self.db).await?;
        Ok(())
    }

    async fn insert_user(&self, data: CreateUserData) -> StoreResult<UserRow> {
        users::create(&self.db, data)
            .await
            .map_err(|e| map_unique(e, "email"))
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<UserRow>> {
        Ok(users::get_by_id(&self.db, id).await?)
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<UserRow>> {
        Ok(users::get_by_email(&self.db, email).await?)
    }

    async fn get_users(&self, ids: &[Uuid]) -> StoreResult<Vec<UserRow>> {
        Ok(users::list_by_ids(&self.db, ids).await?)
    }

    async fn insert_event(&self, data: CreateEventData) -> StoreResult<EventRow> {
        events::create(&self.db, data)
            .await
            .map_err(|e| map_unique(e, "event"))
    }

    async fn get_event(&self, id: Uuid) -> StoreResult<Option<EventRow>> {
        Ok(events::get_by_id(&self.db, id).await?)
    }

    async fn find_event_by_key(
        &self,
        title: &str,
        date: NaiveDate,
        location: &str,
    ) -> StoreResult<Option<EventRow>> {
        Ok(events::find_by_key(&self.db, title, date, location).await?)
    }

    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
        let tx = self.db.begin().await?;
        Ok(Box::new(PgTx { tx }))
    }
}

/// Postgres transaction; sqlx rolls it back when dropped uncommitted.
struct PgTx {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl StoreTx for PgTx {
    async fn lock_event(&mut self, id: Uuid) -> StoreResult<Option<EventRow>> {
        Ok(events::get_for_update(&mut *self.tx, id).await?)
    }

    async fn lock_users(&mut self, ids: &[Uuid]) -> StoreResult<()> {
        Ok(users::lock_for_update(&mut *self.tx, ids).await?)
    }

    async fn get_user(&mut self, id: Uuid) -> StoreResult<Option<UserRow>> {
        Ok(users::get_by_id(&mut *self.tx, id).await?)
    }

    async fn save_event_roster(&mut self, event: &EventRow) -> StoreResult<()> {
        Ok(events::update_roster(&mut *self.tx, event).await?)
    }

    async fn link_event(
        &mut self,
        user_id: Uuid,
        event_id: Uuid,
        membership: Membership,
    ) -> StoreResult<()> {
        Ok(users::link_event(&mut *self.tx, user_id, event_id, membership).await?)
    }

    async fn unlink_event(
        &mut self,
        user_id: Uuid,
        event_id: Uuid,
        membership: Membership,
    ) -> StoreResult<()> {
        Ok(users::unlink_event(&mut *self.tx, user_id, event_id, membership).await?)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
