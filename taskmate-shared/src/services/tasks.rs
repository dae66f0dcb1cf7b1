/// Task operations
///
/// Tasks are always created for the calling principal; there is no way to
/// create or move a task into someone else's account.

use chrono::Utc;
use uuid::Uuid;

use super::{finish, validate};
use crate::auth::ownership::{authorize_task, require_principal};
use crate::auth::principal::Principal;
use crate::cascade::{cascade_task, CascadeReport};
use crate::error::{ServiceError, ServiceResult};
use crate::models::task::{CreateTask, Task, UpdateTask};
use crate::models::EntityKind;
use crate::store::{EntityStore, StoreTransaction};

/// Lists the principal's tasks, oldest first
pub async fn list_tasks(
    store: &dyn EntityStore,
    principal: Option<Principal>,
) -> ServiceResult<Vec<Task>> {
    let principal = require_principal(principal)?;
    let mut tx = store.begin().await?;
    let outcome = tx
        .list_tasks_by_user(principal.user_id)
        .await
        .map_err(ServiceError::from);
    finish(tx, outcome).await
}

pub async fn get_task(
    store: &dyn EntityStore,
    principal: Option<Principal>,
    task_id: Uuid,
) -> ServiceResult<Task> {
    let principal = require_principal(principal)?;
    let mut tx = store.begin().await?;
    let outcome = authorize_task(tx.as_mut(), &principal, task_id)
        .await
        .map(|ready| ready.entity);
    finish(tx, outcome).await
}

pub async fn create_task(
    store: &dyn EntityStore,
    principal: Option<Principal>,
    data: CreateTask,
) -> ServiceResult<Task> {
    let principal = require_principal(principal)?;
    let mut tx = store.begin().await?;
    let outcome = create_task_in(tx.as_mut(), &principal, data).await;
    finish(tx, outcome).await
}

async fn create_task_in(
    tx: &mut dyn StoreTransaction,
    principal: &Principal,
    data: CreateTask,
) -> ServiceResult<Task> {
    // The token may outlive its account
    if tx.find_user(principal.user_id).await?.is_none() {
        return Err(ServiceError::not_found(EntityKind::User, principal.user_id));
    }

    validate(&data)?;

    let task = Task::new(principal.user_id, data);
    tx.insert_task(&task).await?;

    tracing::info!(user_id = %principal.user_id, task_id = %task.id, "Task created");
    Ok(task)
}

/// Replaces every mutable field of a task
pub async fn update_task(
    store: &dyn EntityStore,
    principal: Option<Principal>,
    task_id: Uuid,
    data: UpdateTask,
) -> ServiceResult<Task> {
    let principal = require_principal(principal)?;
    let mut tx = store.begin().await?;
    let outcome = update_task_in(tx.as_mut(), &principal, task_id, data).await;
    finish(tx, outcome).await
}

async fn update_task_in(
    tx: &mut dyn StoreTransaction,
    principal: &Principal,
    task_id: Uuid,
    data: UpdateTask,
) -> ServiceResult<Task> {
    let mut task = authorize_task(tx, principal, task_id).await?.entity;
    validate(&data)?;

    task.replace(data, Utc::now());
    if !tx.save_task(&task).await? {
        return Err(ServiceError::not_found(EntityKind::Task, task_id));
    }

    Ok(task)
}

/// Deletes a task and everything hanging off it
///
/// A second delete of the same id is `NotFound`.
pub async fn delete_task(
    store: &dyn EntityStore,
    principal: Option<Principal>,
    task_id: Uuid,
) -> ServiceResult<CascadeReport> {
    let principal = require_principal(principal)?;
    let mut tx = store.begin().await?;
    let outcome = delete_task_in(tx.as_mut(), &principal, task_id).await;
    let report = finish(tx, outcome).await?;

    tracing::info!(
        user_id = %principal.user_id,
        task_id = %task_id,
        subtasks = report.subtasks,
        recurrences = report.recurrences,
        attachments = report.attachments,
        "Task deleted"
    );
    Ok(report)
}

async fn delete_task_in(
    tx: &mut dyn StoreTransaction,
    principal: &Principal,
    task_id: Uuid,
) -> ServiceResult<CascadeReport> {
    authorize_task(tx, principal, task_id).await?;
    Ok(cascade_task(tx, task_id).await?)
}
