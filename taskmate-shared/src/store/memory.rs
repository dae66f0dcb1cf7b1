/// In-process entity store
///
/// Tables live behind one async mutex. A transaction holds the lock for its
/// whole lifetime and works on a private copy of the tables, which replaces
/// the shared copy only on commit. Transactions are therefore serialized,
/// and an abandoned transaction leaves no trace.
///
/// The same referential rules as the SQL schema are enforced: parents must
/// exist when a child is written, and a row cannot be removed while anything
/// still references it.
///
/// # Fault injection
///
/// [`MemoryStore::fail_once`] arms a [`FailPoint`]; the next transaction
/// that reaches it gets [`StoreError::Injected`] and the point disarms.
///
/// # Example
///
/// ```
/// use taskmate_shared::store::memory::MemoryStore;
/// use taskmate_shared::store::{EntityStore, FailPoint};
///
/// # async fn example() -> Result<(), taskmate_shared::store::StoreError> {
/// let store = MemoryStore::new();
/// store.fail_once(FailPoint::Commit).await;
///
/// let mut tx = store.begin().await?;
/// assert!(tx.commit().await.is_err());
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{EntityStore, FailPoint, StoreError, StoreTransaction};
use crate::models::attachment::Attachment;
use crate::models::recurrence::Recurrence;
use crate::models::subtask::Subtask;
use crate::models::task::Task;
use crate::models::user::{Credential, User};
use crate::models::DependentKind;

#[derive(Debug, Clone, Default)]
struct Tables {
    users: BTreeMap<Uuid, User>,
    credentials: BTreeMap<Uuid, Credential>,
    tasks: BTreeMap<Uuid, Task>,
    subtasks: BTreeMap<Uuid, Subtask>,
    recurrences: BTreeMap<Uuid, Recurrence>,
    attachments: BTreeMap<Uuid, Attachment>,
}

impl Tables {
    fn dependents_of(&self, kind: DependentKind, task_id: Uuid) -> Vec<Uuid> {
        match kind {
            DependentKind::Subtask => self
                .subtasks
                .values()
                .filter(|s| s.task_id == task_id)
                .map(|s| s.id)
                .collect(),
            DependentKind::Recurrence => self
                .recurrences
                .values()
                .filter(|r| r.task_id == task_id)
                .map(|r| r.id)
                .collect(),
            DependentKind::Attachment => self
                .attachments
                .values()
                .filter(|a| a.task_id == task_id)
                .map(|a| a.id)
                .collect(),
        }
    }

    fn remove_dependent(&mut self, kind: DependentKind, id: Uuid) -> bool {
        match kind {
            DependentKind::Subtask => self.subtasks.remove(&id).is_some(),
            DependentKind::Recurrence => self.recurrences.remove(&id).is_some(),
            DependentKind::Attachment => self.attachments.remove(&id).is_some(),
        }
    }

    fn login_taken(&self, user: &User) -> bool {
        self.users.values().any(|other| {
            other.id != user.id
                && (other.username.to_lowercase() == user.username.to_lowercase()
                    || other.email.to_lowercase() == user.email.to_lowercase())
        })
    }

    fn require_user(&self, id: Uuid) -> Result<(), StoreError> {
        if self.users.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::Constraint(format!("user {} does not exist", id)))
        }
    }

    fn require_task(&self, id: Uuid) -> Result<(), StoreError> {
        if self.tasks.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::Constraint(format!("task {} does not exist", id)))
        }
    }
}

/// Row counts of every table, for assertions in tests
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RowCounts {
    pub users: usize,
    pub credentials: usize,
    pub tasks: usize,
    pub subtasks: usize,
    pub recurrences: usize,
    pub attachments: usize,
}

#[derive(Debug, Default)]
struct State {
    tables: Tables,
    armed: HashSet<FailPoint>,
}

/// Store keeping every table in memory
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<State>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next operation reaching `point` fail
    pub async fn fail_once(&self, point: FailPoint) {
        self.state.lock().await.armed.insert(point);
    }

    /// Committed row counts
    pub async fn row_counts(&self) -> RowCounts {
        let state = self.state.lock().await;
        let tables = &state.tables;

        RowCounts {
            users: tables.users.len(),
            credentials: tables.credentials.len(),
            tasks: tables.tasks.len(),
            subtasks: tables.subtasks.len(),
            recurrences: tables.recurrences.len(),
            attachments: tables.attachments.len(),
        }
    }
}

#[async_trait]
impl EntityStore for MemoryStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.tables.clone();

        Ok(Box::new(MemoryTransaction {
            guard,
            working: Some(working),
        }))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Open in-memory transaction
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<State>,
    working: Option<Tables>,
}

impl MemoryTransaction {
    fn tables(&mut self) -> Result<&mut Tables, StoreError> {
        self.working.as_mut().ok_or(StoreError::Finished)
    }

    fn trip(&mut self, point: FailPoint) -> Result<(), StoreError> {
        if self.guard.armed.remove(&point) {
            tracing::debug!(%point, "Injected store failure");
            return Err(StoreError::Injected(point));
        }
        Ok(())
    }
}

fn sorted<T, K: Ord>(mut rows: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T> {
    rows.sort_by_key(|row| key(row));
    rows
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn find_user(&mut self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.tables()?.users.get(&id).cloned())
    }

    async fn find_user_by_username(
        &mut self,
        username: &str,
    ) -> Result<Option<User>, StoreError> {
        let username = username.to_lowercase();
        Ok(self
            .tables()?
            .users
            .values()
            .find(|u| u.username.to_lowercase() == username)
            .cloned())
    }

    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError> {
        let email = email.to_lowercase();
        Ok(self
            .tables()?
            .users
            .values()
            .find(|u| u.email.to_lowercase() == email)
            .cloned())
    }

    async fn insert_user(&mut self, user: &User) -> Result<(), StoreError> {
        let tables = self.tables()?;
        if tables.users.contains_key(&user.id) || tables.login_taken(user) {
            return Err(StoreError::Conflict("duplicate user".to_string()));
        }
        tables.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn save_user(&mut self, user: &User) -> Result<bool, StoreError> {
        let tables = self.tables()?;
        if !tables.users.contains_key(&user.id) {
            return Ok(false);
        }
        if tables.login_taken(user) {
            return Err(StoreError::Conflict("duplicate user".to_string()));
        }
        tables.users.insert(user.id, user.clone());
        Ok(true)
    }

    async fn remove_user(&mut self, id: Uuid) -> Result<bool, StoreError> {
        self.trip(FailPoint::RemoveUser)?;
        let tables = self.tables()?;

        if tables.credentials.contains_key(&id) || tables.tasks.values().any(|t| t.user_id == id) {
            return Err(StoreError::Constraint(format!(
                "user {} is still referenced",
                id
            )));
        }
        Ok(tables.users.remove(&id).is_some())
    }

    async fn find_credential(&mut self, user_id: Uuid) -> Result<Option<Credential>, StoreError> {
        Ok(self.tables()?.credentials.get(&user_id).cloned())
    }

    async fn upsert_credential(&mut self, credential: &Credential) -> Result<(), StoreError> {
        let tables = self.tables()?;
        tables.require_user(credential.user_id)?;
        tables
            .credentials
            .insert(credential.user_id, credential.clone());
        Ok(())
    }

    async fn remove_credential(&mut self, user_id: Uuid) -> Result<bool, StoreError> {
        self.trip(FailPoint::RemoveCredential)?;
        Ok(self.tables()?.credentials.remove(&user_id).is_some())
    }

    async fn find_task(&mut self, id: Uuid) -> Result<Option<Task>, StoreError> {
        Ok(self.tables()?.tasks.get(&id).cloned())
    }

    async fn list_tasks_by_user(&mut self, user_id: Uuid) -> Result<Vec<Task>, StoreError> {
        let rows = self
            .tables()?
            .tasks
            .values()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        Ok(sorted(rows, |t: &Task| (t.date_created, t.id)))
    }

    async fn insert_task(&mut self, task: &Task) -> Result<(), StoreError> {
        let tables = self.tables()?;
        tables.require_user(task.user_id)?;
        tables.tasks.insert(task.id, task.clone());
        Ok(())
    }

    async fn save_task(&mut self, task: &Task) -> Result<bool, StoreError> {
        match self.tables()?.tasks.get_mut(&task.id) {
            Some(stored) => {
                let user_id = stored.user_id;
                *stored = task.clone();
                stored.user_id = user_id;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn touch_task(&mut self, id: Uuid, at: DateTime<Utc>) -> Result<bool, StoreError> {
        match self.tables()?.tasks.get_mut(&id) {
            Some(stored) => {
                stored.date_modified = at;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove_task(&mut self, id: Uuid) -> Result<bool, StoreError> {
        self.trip(FailPoint::RemoveTask)?;
        let tables = self.tables()?;

        let referenced = DependentKind::CASCADE_ORDER
            .iter()
            .any(|kind| !tables.dependents_of(*kind, id).is_empty());
        if referenced {
            return Err(StoreError::Constraint(format!(
                "task {} is still referenced",
                id
            )));
        }
        Ok(tables.tasks.remove(&id).is_some())
    }

    async fn find_subtask(&mut self, id: Uuid) -> Result<Option<Subtask>, StoreError> {
        Ok(self.tables()?.subtasks.get(&id).cloned())
    }

    async fn list_subtasks_by_task(&mut self, task_id: Uuid) -> Result<Vec<Subtask>, StoreError> {
        let rows = self
            .tables()?
            .subtasks
            .values()
            .filter(|s| s.task_id == task_id)
            .cloned()
            .collect();
        Ok(sorted(rows, |s: &Subtask| (s.date_created, s.id)))
    }

    async fn insert_subtask(&mut self, subtask: &Subtask) -> Result<(), StoreError> {
        let tables = self.tables()?;
        tables.require_task(subtask.task_id)?;
        tables.subtasks.insert(subtask.id, subtask.clone());
        Ok(())
    }

    async fn save_subtask(&mut self, subtask: &Subtask) -> Result<bool, StoreError> {
        match self.tables()?.subtasks.get_mut(&subtask.id) {
            Some(stored) => {
                let task_id = stored.task_id;
                *stored = subtask.clone();
                stored.task_id = task_id;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn find_recurrence(&mut self, id: Uuid) -> Result<Option<Recurrence>, StoreError> {
        Ok(self.tables()?.recurrences.get(&id).cloned())
    }

    async fn find_recurrence_by_task(
        &mut self,
        task_id: Uuid,
    ) -> Result<Option<Recurrence>, StoreError> {
        Ok(self
            .tables()?
            .recurrences
            .values()
            .find(|r| r.task_id == task_id)
            .cloned())
    }

    async fn upsert_recurrence(&mut self, recurrence: &Recurrence) -> Result<(), StoreError> {
        let tables = self.tables()?;
        tables.require_task(recurrence.task_id)?;

        let clash = tables
            .recurrences
            .values()
            .any(|r| r.task_id == recurrence.task_id && r.id != recurrence.id);
        if clash {
            return Err(StoreError::Constraint(format!(
                "task {} already has a recurrence",
                recurrence.task_id
            )));
        }

        match tables.recurrences.get_mut(&recurrence.id) {
            Some(stored) => {
                stored.frequency = recurrence.frequency;
                stored.repeat_interval = recurrence.repeat_interval;
                stored.ends_at = recurrence.ends_at;
            }
            None => {
                tables.recurrences.insert(recurrence.id, recurrence.clone());
            }
        }
        Ok(())
    }

    async fn find_attachment(&mut self, id: Uuid) -> Result<Option<Attachment>, StoreError> {
        Ok(self.tables()?.attachments.get(&id).cloned())
    }

    async fn list_attachments_by_task(
        &mut self,
        task_id: Uuid,
    ) -> Result<Vec<Attachment>, StoreError> {
        let rows = self
            .tables()?
            .attachments
            .values()
            .filter(|a| a.task_id == task_id)
            .cloned()
            .collect();
        Ok(sorted(rows, |a: &Attachment| (a.date_created, a.id)))
    }

    async fn insert_attachment(&mut self, attachment: &Attachment) -> Result<(), StoreError> {
        let tables = self.tables()?;
        tables.require_task(attachment.task_id)?;
        tables.attachments.insert(attachment.id, attachment.clone());
        Ok(())
    }

    async fn remove_dependent(
        &mut self,
        kind: DependentKind,
        id: Uuid,
    ) -> Result<bool, StoreError> {
        Ok(self.tables()?.remove_dependent(kind, id))
    }

    async fn remove_dependents_of(
        &mut self,
        kind: DependentKind,
        task_id: Uuid,
    ) -> Result<u64, StoreError> {
        self.trip(FailPoint::RemoveDependents(kind))?;
        let tables = self.tables()?;

        let ids = tables.dependents_of(kind, task_id);
        for id in &ids {
            tables.remove_dependent(kind, *id);
        }
        Ok(ids.len() as u64)
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        if self.working.is_none() {
            return Err(StoreError::Finished);
        }
        if let Err(err) = self.trip(FailPoint::Commit) {
            self.working = None;
            return Err(err);
        }

        if let Some(tables) = self.working.take() {
            self.guard.tables = tables;
        }
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        self.working.take().ok_or(StoreError::Finished)?;
        Ok(())
    }
}
