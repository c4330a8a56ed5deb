use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use parking_lot::Mutex;
use tokio::sync::OwnedMutexGuard;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult, StoreTx};
use crate::models::{EventRow, Membership, UserRow};
use crate::repos::{CreateEventData, CreateUserData};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, UserRow>,
    events: HashMap<Uuid, EventRow>,
}

type RowLock = tokio::sync::Mutex<()>;

#[derive(Default)]
struct Inner {
    tables: Mutex<Tables>,
    event_locks: Mutex<HashMap<Uuid, Arc<RowLock>>>,
    user_locks: Mutex<HashMap<Uuid, Arc<RowLock>>>,
    failing_commits: AtomicUsize,
}

/// In-process store with the same locking and atomicity contract as
/// [`super::PgStore`]: one lock per event row and per user row, held until
/// the transaction ends. Backs the test suites.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make the next `n` transaction commits fail without applying anything.
    pub fn fail_next_commits(&self, n: usize) {
        self.inner.failing_commits.store(n, Ordering::SeqCst);
    }

    /// Lock handle for an existing event; unknown ids get none.
    fn event_lock(&self, id: Uuid) -> Option<Arc<RowLock>> {
        if !self.inner.tables.lock().events.contains_key(&id) {
            return None;
        }
        Some(self.inner.event_locks.lock().entry(id).or_default().clone())
    }

    fn user_lock(&self, id: Uuid) -> Option<Arc<RowLock>> {
        if !self.inner.tables.lock().users.contains_key(&id) {
            return None;
        }
        Some(self.inner.user_locks.lock().entry(id).or_default().clone())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn insert_user(&self, data: CreateUserData) -> StoreResult<UserRow> {
        let mut tables = self.inner.tables.lock();
        if tables
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&data.email))
        {
            return Err(StoreError::Duplicate("email"));
        }

        let now = Utc::now();
        let row = UserRow {
            id: Uuid::new_v4(),
            full_name: data.full_name,
            email: data.email,
            password_hash: data.password_hash,
            role: data.role,
            confirmed_events: Vec::new(),
            waitlist_events: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(row.id, row.clone());
        Ok(row)
    }

    async fn get_user(&self, id: Uuid) -> StoreResult<Option<UserRow>> {
        Ok(self.inner.tables.lock().users.get(&id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<UserRow>> {
        Ok(self
            .inner
            .tables
            .lock()
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn get_users(&self, ids: &[Uuid]) -> StoreResult<Vec<UserRow>> {
        let tables = self.inner.tables.lock();
        Ok(ids
            .iter()
            .filter_map(|id| tables.users.get(id).cloned())
            .collect())
    }

    async fn insert_event(&self, data: CreateEventData) -> StoreResult<EventRow> {
        let mut tables = self.inner.tables.lock();
        if tables.events.values().any(|e| {
            e.title == data.title && e.date == data.date && e.location == data.location
        }) {
            return Err(StoreError::Duplicate("event"));
        }

        let now = Utc::now();
        let row = EventRow {
            id: Uuid::new_v4(),
            title: data.title,
            description: data.description,
            date: data.date,
            time: data.time,
            location: data.location,
            max_participants: data.max_participants,
            confirmed_participants: Vec::new(),
            waitlist_participants: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        tables.events.insert(row.id, row.clone());
        Ok(row)
    }

    async fn get_event(&self, id: Uuid) -> StoreResult<Option<EventRow>> {
        Ok(self.inner.tables.lock().events.get(&id).cloned())
    }

    async fn find_event_by_key(
        &self,
        title: &str,
        date: NaiveDate,
        location: &str,
    ) -> StoreResult<Option<EventRow>> {
        Ok(self
            .inner
            .tables
            .lock()
            .events
            .values()
            .find(|e| e.title == title && e.date == date && e.location == location)
            .cloned())
    }

    async fn begin(&self) -> StoreResult<Box<dyn StoreTx>> {
        Ok(Box::new(MemoryTx {
            store: self.clone(),
            event_guards: HashMap::new(),
            user_guards: HashMap::new(),
            rosters: HashMap::new(),
            edits: Vec::new(),
        }))
    }
}

#[derive(Debug, Clone, Copy)]
enum UserEdit {
    Link(Uuid, Uuid, Membership),
    Unlink(Uuid, Uuid, Membership),
}

impl UserEdit {
    fn user_id(&self) -> Uuid {
        match *self {
            UserEdit::Link(user_id, ..) | UserEdit::Unlink(user_id, ..) => user_id,
        }
    }

    fn apply(&self, user: &mut UserRow) {
        match *self {
            UserEdit::Link(_, event_id, membership) => {
                let list = events_of(user, membership);
                if !list.contains(&event_id) {
                    list.push(event_id);
                }
            }
            UserEdit::Unlink(_, event_id, membership) => {
                events_of(user, membership).retain(|id| *id != event_id);
            }
        }
    }
}

fn events_of(user: &mut UserRow, membership: Membership) -> &mut Vec<Uuid> {
    match membership {
        Membership::Confirmed => &mut user.confirmed_events,
        Membership::Waitlisted => &mut user.waitlist_events,
    }
}

struct MemoryTx {
    store: MemoryStore,
    event_guards: HashMap<Uuid, OwnedMutexGuard<()>>,
    user_guards: HashMap<Uuid, OwnedMutexGuard<()>>,
    rosters: HashMap<Uuid, EventRow>,
    edits: Vec<UserEdit>,
}

impl MemoryTx {
    /// Hold a user's row lock until the transaction ends, as an UPDATE on the
    /// row would in Postgres. Waits while another transaction holds it.
    async fn lock_user(&mut self, id: Uuid) {
        if self.user_guards.contains_key(&id) {
            return;
        }
        if let Some(lock) = self.store.user_lock(id) {
            self.user_guards.insert(id, lock.lock_owned().await);
        }
    }
}

#[async_trait]
impl StoreTx for MemoryTx {
    async fn lock_event(&mut self, id: Uuid) -> StoreResult<Option<EventRow>> {
        if let Some(staged) = self.rosters.get(&id) {
            return Ok(Some(staged.clone()));
        }
        if !self.event_guards.contains_key(&id) {
            let Some(lock) = self.store.event_lock(id) else {
                return Ok(None);
            };
            self.event_guards.insert(id, lock.lock_owned().await);
        }
        Ok(self.store.inner.tables.lock().events.get(&id).cloned())
    }

    async fn lock_users(&mut self, ids: &[Uuid]) -> StoreResult<()> {
        let mut ordered = ids.to_vec();
        ordered.sort();
        ordered.dedup();
        for id in ordered {
            self.lock_user(id).await;
        }
        Ok(())
    }

    async fn get_user(&mut self, id: Uuid) -> StoreResult<Option<UserRow>> {
        let committed = self.store.inner.tables.lock().users.get(&id).cloned();
        Ok(committed.map(|mut user| {
            for edit in self.edits.iter().filter(|e| e.user_id() == id) {
                edit.apply(&mut user);
            }
            user
        }))
    }

    async fn save_event_roster(&mut self, event: &EventRow) -> StoreResult<()> {
        if !self.event_guards.contains_key(&event.id) {
            return Err(StoreError::Unavailable(format!(
                "event {} saved without holding its lock",
                event.id
            )));
        }
        self.rosters.insert(event.id, event.clone());
        Ok(())
    }

    async fn link_event(
        &mut self,
        user_id: Uuid,
        event_id: Uuid,
        membership: Membership,
    ) -> StoreResult<()> {
        self.lock_user(user_id).await;
        self.edits
            .push(UserEdit::Link(user_id, event_id, membership));
        Ok(())
    }

    async fn unlink_event(
        &mut self,
        user_id: Uuid,
        event_id: Uuid,
        membership: Membership,
    ) -> StoreResult<()> {
        self.lock_user(user_id).await;
        self.edits
            .push(UserEdit::Unlink(user_id, event_id, membership));
        Ok(())
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let injected = self
            .store
            .inner
            .failing_commits
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if injected {
            tracing::warn!(events = self.rosters.len(), "Injected commit failure");
            return Err(StoreError::Unavailable("injected commit failure".into()));
        }

        let now = Utc::now();
        let mut tables = self.store.inner.tables.lock();

        let mut touched_users = HashSet::new();
        for edit in &self.edits {
            if let Some(user) = tables.users.get_mut(&edit.user_id()) {
                edit.apply(user);
                touched_users.insert(user.id);
            }
        }
        for id in touched_users {
            if let Some(user) = tables.users.get_mut(&id) {
                user.updated_at = now;
            }
        }

        for (id, staged) in &self.rosters {
            if let Some(event) = tables.events.get_mut(id) {
                event.confirmed_participants = staged.confirmed_participants.clone();
                event.waitlist_participants = staged.waitlist_participants.clone();
                event.updated_at = now;
            }
        }

        Ok(())
    }
}
