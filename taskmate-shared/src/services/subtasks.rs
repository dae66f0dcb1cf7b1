/// Subtask operations
///
/// All of them clear the subtask (or, on create, the target task) through
/// the parent task's owner, and advance the parent's `date_modified` when
/// they change anything.

use chrono::Utc;
use uuid::Uuid;

use super::{finish, validate};
use crate::auth::ownership::{authorize_subtask, authorize_task, require_principal};
use crate::auth::principal::Principal;
use crate::error::{ServiceError, ServiceResult};
use crate::models::subtask::{CreateSubtask, Subtask, UpdateSubtask};
use crate::models::{DependentKind, EntityKind};
use crate::store::{EntityStore, StoreTransaction};

pub async fn get_subtask(
    store: &dyn EntityStore,
    principal: Option<Principal>,
    subtask_id: Uuid,
) -> ServiceResult<Subtask> {
    let principal = require_principal(principal)?;
    let mut tx = store.begin().await?;
    let outcome = authorize_subtask(tx.as_mut(), &principal, subtask_id)
        .await
        .map(|ready| ready.entity);
    finish(tx, outcome).await
}

/// Lists the subtasks of a task, oldest first
pub async fn list_subtasks(
    store: &dyn EntityStore,
    principal: Option<Principal>,
    task_id: Uuid,
) -> ServiceResult<Vec<Subtask>> {
    let principal = require_principal(principal)?;
    let mut tx = store.begin().await?;
    let outcome = list_subtasks_in(tx.as_mut(), &principal, task_id).await;
    finish(tx, outcome).await
}

async fn list_subtasks_in(
    tx: &mut dyn StoreTransaction,
    principal: &Principal,
    task_id: Uuid,
) -> ServiceResult<Vec<Subtask>> {
    authorize_task(tx, principal, task_id).await?;
    Ok(tx.list_subtasks_by_task(task_id).await?)
}

/// Creates a subtask under a task the principal owns
///
/// The new subtask is always active; a completion flag in the input is
/// ignored.
pub async fn create_subtask(
    store: &dyn EntityStore,
    principal: Option<Principal>,
    data: CreateSubtask,
) -> ServiceResult<Subtask> {
    let principal = require_principal(principal)?;
    let mut tx = store.begin().await?;
    let outcome = create_subtask_in(tx.as_mut(), &principal, data).await;
    finish(tx, outcome).await
}

async fn create_subtask_in(
    tx: &mut dyn StoreTransaction,
    principal: &Principal,
    data: CreateSubtask,
) -> ServiceResult<Subtask> {
    authorize_task(tx, principal, data.task_id).await?;
    validate(&data)?;

    let subtask = Subtask::new(data);
    tx.insert_subtask(&subtask).await?;
    tx.touch_task(subtask.task_id, Utc::now()).await?;

    tracing::info!(task_id = %subtask.task_id, subtask_id = %subtask.id, "Subtask created");
    Ok(subtask)
}

/// Replaces every mutable field of a subtask, keeping its parent
pub async fn update_subtask(
    store: &dyn EntityStore,
    principal: Option<Principal>,
    subtask_id: Uuid,
    data: UpdateSubtask,
) -> ServiceResult<Subtask> {
    let principal = require_principal(principal)?;
    let mut tx = store.begin().await?;
    let outcome = update_subtask_in(tx.as_mut(), &principal, subtask_id, data).await;
    finish(tx, outcome).await
}

async fn update_subtask_in(
    tx: &mut dyn StoreTransaction,
    principal: &Principal,
    subtask_id: Uuid,
    data: UpdateSubtask,
) -> ServiceResult<Subtask> {
    let mut subtask = authorize_subtask(tx, principal, subtask_id).await?.entity;
    validate(&data)?;

    subtask.replace(data);
    save(tx, &subtask).await?;

    Ok(subtask)
}

/// Marks a subtask completed
pub async fn complete_subtask(
    store: &dyn EntityStore,
    principal: Option<Principal>,
    subtask_id: Uuid,
) -> ServiceResult<Subtask> {
    set_completed(store, principal, subtask_id, true).await
}

/// Marks a subtask active again
pub async fn reopen_subtask(
    store: &dyn EntityStore,
    principal: Option<Principal>,
    subtask_id: Uuid,
) -> ServiceResult<Subtask> {
    set_completed(store, principal, subtask_id, false).await
}

async fn set_completed(
    store: &dyn EntityStore,
    principal: Option<Principal>,
    subtask_id: Uuid,
    completed: bool,
) -> ServiceResult<Subtask> {
    let principal = require_principal(principal)?;
    let mut tx = store.begin().await?;
    let outcome = set_completed_in(tx.as_mut(), &principal, subtask_id, completed).await;
    finish(tx, outcome).await
}

async fn set_completed_in(
    tx: &mut dyn StoreTransaction,
    principal: &Principal,
    subtask_id: Uuid,
    completed: bool,
) -> ServiceResult<Subtask> {
    let mut subtask = authorize_subtask(tx, principal, subtask_id).await?.entity;

    subtask.is_completed = completed;
    save(tx, &subtask).await?;

    tracing::debug!(subtask_id = %subtask_id, completed, "Subtask completion changed");
    Ok(subtask)
}

/// Deletes a single subtask, returning what was removed
pub async fn delete_subtask(
    store: &dyn EntityStore,
    principal: Option<Principal>,
    subtask_id: Uuid,
) -> ServiceResult<Subtask> {
    let principal = require_principal(principal)?;
    let mut tx = store.begin().await?;
    let outcome = delete_subtask_in(tx.as_mut(), &principal, subtask_id).await;
    finish(tx, outcome).await
}

async fn delete_subtask_in(
    tx: &mut dyn StoreTransaction,
    principal: &Principal,
    subtask_id: Uuid,
) -> ServiceResult<Subtask> {
    let subtask = authorize_subtask(tx, principal, subtask_id).await?.entity;

    if !tx.remove_dependent(DependentKind::Subtask, subtask_id).await? {
        return Err(ServiceError::not_found(EntityKind::Subtask, subtask_id));
    }
    tx.touch_task(subtask.task_id, Utc::now()).await?;

    tracing::info!(task_id = %subtask.task_id, subtask_id = %subtask_id, "Subtask deleted");
    Ok(subtask)
}

async fn save(tx: &mut dyn StoreTransaction, subtask: &Subtask) -> ServiceResult<()> {
    if !tx.save_subtask(subtask).await? {
        return Err(ServiceError::not_found(EntityKind::Subtask, subtask.id));
    }
    tx.touch_task(subtask.task_id, Utc::now()).await?;
    Ok(())
}
