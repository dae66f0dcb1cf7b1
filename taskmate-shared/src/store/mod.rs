/// Entity store abstraction
///
/// All reads and writes of the core go through a [`StoreTransaction`]
/// obtained from an [`EntityStore`]. Nothing a transaction stages is visible
/// to anyone else until [`StoreTransaction::commit`] succeeds; dropping or
/// rolling back a transaction discards everything it staged.
///
/// # Implementations
///
/// - [`postgres::PgStore`]: PostgreSQL via sqlx, one database transaction
///   per store transaction
/// - [`memory::MemoryStore`]: in-process tables with the same referential
///   rules as the SQL schema, plus injectable one-shot failures
///
/// # Example
///
/// ```no_run
/// use taskmate_shared::store::{EntityStore, StoreError};
/// use uuid::Uuid;
///
/// # async fn example(store: &dyn EntityStore, task_id: Uuid) -> Result<(), StoreError> {
/// let mut tx = store.begin().await?;
/// let subtasks = tx.list_subtasks_by_task(task_id).await?;
/// tx.commit().await?;
/// # let _ = subtasks;
/// # Ok(())
/// # }
/// ```

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use uuid::Uuid;

use crate::models::attachment::Attachment;
use crate::models::recurrence::Recurrence;
use crate::models::subtask::Subtask;
use crate::models::task::Task;
use crate::models::user::{Credential, User};
use crate::models::DependentKind;

pub mod memory;
pub mod postgres;

/// Error type for store operations
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A write would break a referential rule
    #[error("Constraint violation: {0}")]
    Constraint(String),

    /// A write would duplicate a unique username or email
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Failure armed through [`memory::MemoryStore::fail_once`]
    #[error("Injected failure at {0}")]
    Injected(FailPoint),

    /// The transaction was already committed or rolled back
    #[error("Transaction already finished")]
    Finished,
}

/// Points at which a store can be told to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailPoint {
    /// Bulk removal of one dependent kind for a task
    RemoveDependents(DependentKind),
    RemoveTask,
    RemoveCredential,
    RemoveUser,
    Commit,
}

impl fmt::Display for FailPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailPoint::RemoveDependents(kind) => write!(f, "remove {} rows", kind),
            FailPoint::RemoveTask => f.write_str("remove task"),
            FailPoint::RemoveCredential => f.write_str("remove credential"),
            FailPoint::RemoveUser => f.write_str("remove user"),
            FailPoint::Commit => f.write_str("commit"),
        }
    }
}

/// Source of transactions
#[async_trait]
pub trait EntityStore: Send + Sync {
    /// Opens a new transaction
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError>;

    /// Checks that the backing storage is reachable
    async fn health_check(&self) -> Result<(), StoreError>;
}

/// Unit of work against the store
///
/// `find_*` return `None` for absent rows. `save_*` and `remove_*` report
/// whether a row was affected; affecting nothing is not an error.
#[async_trait]
pub trait StoreTransaction: Send {
    // Users

    async fn find_user(&mut self, id: Uuid) -> Result<Option<User>, StoreError>;

    /// Looks a user up by username, ignoring case
    async fn find_user_by_username(
        &mut self,
        username: &str,
    ) -> Result<Option<User>, StoreError>;

    /// Looks a user up by email, ignoring case
    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError>;

    async fn insert_user(&mut self, user: &User) -> Result<(), StoreError>;

    async fn save_user(&mut self, user: &User) -> Result<bool, StoreError>;

    async fn remove_user(&mut self, id: Uuid) -> Result<bool, StoreError>;

    // Credentials

    async fn find_credential(&mut self, user_id: Uuid) -> Result<Option<Credential>, StoreError>;

    async fn upsert_credential(&mut self, credential: &Credential) -> Result<(), StoreError>;

    async fn remove_credential(&mut self, user_id: Uuid) -> Result<bool, StoreError>;

    // Tasks

    async fn find_task(&mut self, id: Uuid) -> Result<Option<Task>, StoreError>;

    async fn list_tasks_by_user(&mut self, user_id: Uuid) -> Result<Vec<Task>, StoreError>;

    async fn insert_task(&mut self, task: &Task) -> Result<(), StoreError>;

    async fn save_task(&mut self, task: &Task) -> Result<bool, StoreError>;

    /// Advances a task's `date_modified` without touching anything else
    async fn touch_task(&mut self, id: Uuid, at: DateTime<Utc>) -> Result<bool, StoreError>;

    async fn remove_task(&mut self, id: Uuid) -> Result<bool, StoreError>;

    // Subtasks

    async fn find_subtask(&mut self, id: Uuid) -> Result<Option<Subtask>, StoreError>;

    async fn list_subtasks_by_task(&mut self, task_id: Uuid) -> Result<Vec<Subtask>, StoreError>;

    async fn insert_subtask(&mut self, subtask: &Subtask) -> Result<(), StoreError>;

    async fn save_subtask(&mut self, subtask: &Subtask) -> Result<bool, StoreError>;

    // Recurrences

    async fn find_recurrence(&mut self, id: Uuid) -> Result<Option<Recurrence>, StoreError>;

    async fn find_recurrence_by_task(
        &mut self,
        task_id: Uuid,
    ) -> Result<Option<Recurrence>, StoreError>;

    async fn upsert_recurrence(&mut self, recurrence: &Recurrence) -> Result<(), StoreError>;

    // Attachments

    async fn find_attachment(&mut self, id: Uuid) -> Result<Option<Attachment>, StoreError>;

    async fn list_attachments_by_task(
        &mut self,
        task_id: Uuid,
    ) -> Result<Vec<Attachment>, StoreError>;

    async fn insert_attachment(&mut self, attachment: &Attachment) -> Result<(), StoreError>;

    // Dependents

    /// Removes one dependent record by id
    async fn remove_dependent(&mut self, kind: DependentKind, id: Uuid)
        -> Result<bool, StoreError>;

    /// Removes every dependent record of `kind` under a task, returning the count
    async fn remove_dependents_of(
        &mut self,
        kind: DependentKind,
        task_id: Uuid,
    ) -> Result<u64, StoreError>;

    // Lifecycle

    /// Makes every staged change durable at once
    async fn commit(&mut self) -> Result<(), StoreError>;

    /// Discards every staged change
    async fn rollback(&mut self) -> Result<(), StoreError>;
}
