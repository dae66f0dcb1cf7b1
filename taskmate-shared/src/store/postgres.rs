/// PostgreSQL entity store
///
/// Each [`StoreTransaction`] wraps one sqlx transaction. Row-level queries
/// live on the models; this module only routes them through the open
/// transaction. Foreign keys are declared without `ON DELETE CASCADE`, so
/// the schema itself rejects any removal order that would orphan a row.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{EntityStore, StoreError, StoreTransaction};
use crate::db::pool::health_check;
use crate::models::attachment::Attachment;
use crate::models::recurrence::Recurrence;
use crate::models::subtask::Subtask;
use crate::models::task::Task;
use crate::models::user::{Credential, User};
use crate::models::DependentKind;

/// Store backed by a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl EntityStore for PgStore {
    async fn begin(&self) -> Result<Box<dyn StoreTransaction>, StoreError> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgTransaction { tx: Some(tx) }))
    }

    async fn health_check(&self) -> Result<(), StoreError> {
        health_check(&self.pool).await?;
        Ok(())
    }
}

/// Unique index violations (SQLSTATE 23505) become [`StoreError::Conflict`]
fn unique_violation_as_conflict(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db_err) if db_err.is_unique_violation() => {
            StoreError::Conflict(db_err.message().to_string())
        }
        _ => StoreError::Database(err),
    }
}

/// Open PostgreSQL transaction
///
/// Dropping it without committing rolls the database transaction back.
pub struct PgTransaction {
    tx: Option<Transaction<'static, Postgres>>,
}

impl PgTransaction {
    fn conn(&mut self) -> Result<&mut PgConnection, StoreError> {
        self.tx.as_deref_mut().ok_or(StoreError::Finished)
    }
}

#[async_trait]
impl StoreTransaction for PgTransaction {
    async fn find_user(&mut self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_id(self.conn()?, id).await?)
    }

    async fn find_user_by_username(
        &mut self,
        username: &str,
    ) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_username(self.conn()?, username).await?)
    }

    async fn find_user_by_email(&mut self, email: &str) -> Result<Option<User>, StoreError> {
        Ok(User::find_by_email(self.conn()?, email).await?)
    }

    async fn insert_user(&mut self, user: &User) -> Result<(), StoreError> {
        User::insert(self.conn()?, user)
            .await
            .map_err(unique_violation_as_conflict)
    }

    async fn save_user(&mut self, user: &User) -> Result<bool, StoreError> {
        User::save(self.conn()?, user)
            .await
            .map_err(unique_violation_as_conflict)
    }

    async fn remove_user(&mut self, id: Uuid) -> Result<bool, StoreError> {
        Ok(User::delete(self.conn()?, id).await?)
    }

    async fn find_credential(&mut self, user_id: Uuid) -> Result<Option<Credential>, StoreError> {
        Ok(Credential::find(self.conn()?, user_id).await?)
    }

    async fn upsert_credential(&mut self, credential: &Credential) -> Result<(), StoreError> {
        Ok(Credential::upsert(self.conn()?, credential).await?)
    }

    async fn remove_credential(&mut self, user_id: Uuid) -> Result<bool, StoreError> {
        Ok(Credential::delete(self.conn()?, user_id).await?)
    }

    async fn find_task(&mut self, id: Uuid) -> Result<Option<Task>, StoreError> {
        Ok(Task::find_by_id(self.conn()?, id).await?)
    }

    async fn list_tasks_by_user(&mut self, user_id: Uuid) -> Result<Vec<Task>, StoreError> {
        Ok(Task::list_by_user(self.conn()?, user_id).await?)
    }

    async fn insert_task(&mut self, task: &Task) -> Result<(), StoreError> {
        Ok(Task::insert(self.conn()?, task).await?)
    }

    async fn save_task(&mut self, task: &Task) -> Result<bool, StoreError> {
        Ok(Task::save(self.conn()?, task).await?)
    }

    async fn touch_task(&mut self, id: Uuid, at: DateTime<Utc>) -> Result<bool, StoreError> {
        Ok(Task::touch(self.conn()?, id, at).await?)
    }

    async fn remove_task(&mut self, id: Uuid) -> Result<bool, StoreError> {
        Ok(Task::delete(self.conn()?, id).await?)
    }

    async fn find_subtask(&mut self, id: Uuid) -> Result<Option<Subtask>, StoreError> {
        Ok(Subtask::find_by_id(self.conn()?, id).await?)
    }

    async fn list_subtasks_by_task(&mut self, task_id: Uuid) -> Result<Vec<Subtask>, StoreError> {
        Ok(Subtask::list_by_task(self.conn()?, task_id).await?)
    }

    async fn insert_subtask(&mut self, subtask: &Subtask) -> Result<(), StoreError> {
        Ok(Subtask::insert(self.conn()?, subtask).await?)
    }

    async fn save_subtask(&mut self, subtask: &Subtask) -> Result<bool, StoreError> {
        Ok(Subtask::save(self.conn()?, subtask).await?)
    }

    async fn find_recurrence(&mut self, id: Uuid) -> Result<Option<Recurrence>, StoreError> {
        Ok(Recurrence::find_by_id(self.conn()?, id).await?)
    }

    async fn find_recurrence_by_task(
        &mut self,
        task_id: Uuid,
    ) -> Result<Option<Recurrence>, StoreError> {
        Ok(Recurrence::find_by_task(self.conn()?, task_id).await?)
    }

    async fn upsert_recurrence(&mut self, recurrence: &Recurrence) -> Result<(), StoreError> {
        Ok(Recurrence::upsert(self.conn()?, recurrence).await?)
    }

    async fn find_attachment(&mut self, id: Uuid) -> Result<Option<Attachment>, StoreError> {
        Ok(Attachment::find_by_id(self.conn()?, id).await?)
    }

    async fn list_attachments_by_task(
        &mut self,
        task_id: Uuid,
    ) -> Result<Vec<Attachment>, StoreError> {
        Ok(Attachment::list_by_task(self.conn()?, task_id).await?)
    }

    async fn insert_attachment(&mut self, attachment: &Attachment) -> Result<(), StoreError> {
        Ok(Attachment::insert(self.conn()?, attachment).await?)
    }

    async fn remove_dependent(
        &mut self,
        kind: DependentKind,
        id: Uuid,
    ) -> Result<bool, StoreError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", kind.table());
        let result = sqlx::query(&sql).bind(id).execute(self.conn()?).await?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_dependents_of(
        &mut self,
        kind: DependentKind,
        task_id: Uuid,
    ) -> Result<u64, StoreError> {
        let sql = format!("DELETE FROM {} WHERE task_id = $1", kind.table());
        let result = sqlx::query(&sql).bind(task_id).execute(self.conn()?).await?;

        Ok(result.rows_affected())
    }

    async fn commit(&mut self) -> Result<(), StoreError> {
        let tx = self.tx.take().ok_or(StoreError::Finished)?;
        tx.commit().await?;
        Ok(())
    }

    async fn rollback(&mut self) -> Result<(), StoreError> {
        let tx = self.tx.take().ok_or(StoreError::Finished)?;
        tx.rollback().await?;
        Ok(())
    }
}
