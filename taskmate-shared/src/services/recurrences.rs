/// Recurrence operations
///
/// A task has zero or one recurrence. Setting a rule on a task that already
/// has one rewrites that rule in place.

use chrono::Utc;
use uuid::Uuid;

use super::{finish, validate};
use crate::auth::ownership::{authorize_recurrence, authorize_task, require_principal};
use crate::auth::principal::Principal;
use crate::error::{ServiceError, ServiceResult};
use crate::models::recurrence::{Recurrence, SetRecurrence};
use crate::models::{DependentKind, EntityKind};
use crate::store::{EntityStore, StoreTransaction};

/// Returns the recurrence of a task; `NotFound` if it has none
pub async fn get_recurrence(
    store: &dyn EntityStore,
    principal: Option<Principal>,
    task_id: Uuid,
) -> ServiceResult<Recurrence> {
    let principal = require_principal(principal)?;
    let mut tx = store.begin().await?;
    let outcome = get_recurrence_in(tx.as_mut(), &principal, task_id).await;
    finish(tx, outcome).await
}

async fn get_recurrence_in(
    tx: &mut dyn StoreTransaction,
    principal: &Principal,
    task_id: Uuid,
) -> ServiceResult<Recurrence> {
    authorize_task(tx, principal, task_id).await?;

    tx.find_recurrence_by_task(task_id)
        .await?
        .ok_or_else(|| ServiceError::not_found(EntityKind::Recurrence, task_id))
}

/// Creates or replaces the recurrence of a task
pub async fn set_recurrence(
    store: &dyn EntityStore,
    principal: Option<Principal>,
    task_id: Uuid,
    data: SetRecurrence,
) -> ServiceResult<Recurrence> {
    let principal = require_principal(principal)?;
    let mut tx = store.begin().await?;
    let outcome = set_recurrence_in(tx.as_mut(), &principal, task_id, data).await;
    finish(tx, outcome).await
}

async fn set_recurrence_in(
    tx: &mut dyn StoreTransaction,
    principal: &Principal,
    task_id: Uuid,
    data: SetRecurrence,
) -> ServiceResult<Recurrence> {
    authorize_task(tx, principal, task_id).await?;
    validate(&data)?;

    let recurrence = match tx.find_recurrence_by_task(task_id).await? {
        Some(mut existing) => {
            existing.replace(data);
            existing
        }
        None => Recurrence::new(task_id, data),
    };

    tx.upsert_recurrence(&recurrence).await?;
    tx.touch_task(task_id, Utc::now()).await?;

    tracing::info!(task_id = %task_id, recurrence_id = %recurrence.id, "Recurrence set");
    Ok(recurrence)
}

/// Removes a recurrence, returning what was removed
pub async fn delete_recurrence(
    store: &dyn EntityStore,
    principal: Option<Principal>,
    recurrence_id: Uuid,
) -> ServiceResult<Recurrence> {
    let principal = require_principal(principal)?;
    let mut tx = store.begin().await?;
    let outcome = delete_recurrence_in(tx.as_mut(), &principal, recurrence_id).await;
    finish(tx, outcome).await
}

async fn delete_recurrence_in(
    tx: &mut dyn StoreTransaction,
    principal: &Principal,
    recurrence_id: Uuid,
) -> ServiceResult<Recurrence> {
    let recurrence = authorize_recurrence(tx, principal, recurrence_id).await?.entity;

    if !tx
        .remove_dependent(DependentKind::Recurrence, recurrence_id)
        .await?
    {
        return Err(ServiceError::not_found(EntityKind::Recurrence, recurrence_id));
    }
    tx.touch_task(recurrence.task_id, Utc::now()).await?;

    Ok(recurrence)
}
