//! Persistence seam consumed by the api crate.
//!
//! [`Store`] covers plain reads and inserts. Membership changes go through a
//! [`StoreTx`], which locks the event it touches and applies every staged
//! write on [`StoreTx::commit`] or none of them.

mod memory;
mod postgres;

use async_trait::async_trait;
use chrono::NaiveDate;
use thiserror::Error;
use uuid::Uuid;

use crate::models::{EventRow, Membership, UserRow};
use crate::repos::{CreateEventData, CreateUserData};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Db(#[source] sqlx::Error),

    #[error("duplicate {0}")]
    Duplicate(&'static str),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(e: sqlx::Error) -> Self {
        StoreError::Db(e)
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Cheap round-trip used by the health check.
    async fn ping(&self) -> StoreResult<()>;

    /// Fails with [`StoreError::Duplicate`] when the email is taken.
    async fn insert_user(&self, data: CreateUserData) -> StoreResult<UserRow>;

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<UserRow>>;

    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<UserRow>>;

    /// Resolve users in the order of `ids`, skipping unknown ids.
    async fn get_users(&self, ids: &[Uuid]) -> StoreResult<Vec<UserRow>>;

    /// Fails with [`StoreError::Duplicate`] when (title, date, location) is taken.
    async fn insert_event(&self, data: CreateEventData) -> StoreResult<EventRow>;

    async fn get_event(&self, id: Uuid) -> StoreResult<Option<EventRow>>;

    async fn find_event_by_key(
        &self,
        title: &str,
        date: NaiveDate,
        location: &str,
    ) -> StoreResult<Option<EventRow>>;

    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>>;
}

/// A unit of work over one event and the users referencing it.
///
/// Dropping the handle without calling [`StoreTx::commit`] discards every
/// staged write and releases the event lock.
#[async_trait]
pub trait StoreTx: Send {
    /// Read the event and hold its lock until commit or drop.
    async fn lock_event(&mut self, id: Uuid) -> StoreResult<Option<EventRow>>;

    /// Lock the given user rows, in id order, until commit or drop. Editing a
    /// user also locks its row, so take these before editing more than one
    /// user or two transactions can wait on each other.
    async fn lock_users(&mut self, ids: &[Uuid]) -> StoreResult<()>;

    async fn get_user(&mut self, id: Uuid) -> StoreResult<Option<UserRow>>;

    /// Persist both participant lists of a locked event.
    async fn save_event_roster(&mut self, event: &EventRow) -> StoreResult<()>;

    async fn link_event(
        &mut self,
        user_id: Uuid,
        event_id: Uuid,
        membership: Membership,
    ) -> StoreResult<()>;

    async fn unlink_event(
        &mut self,
        user_id: Uuid,
        event_id: Uuid,
        membership: Membership,
    ) -> StoreResult<()>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;
}
