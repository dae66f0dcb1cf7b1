/// Ownership checks
///
/// Every record is owned by exactly one user: tasks directly through
/// `user_id`, everything else through the task it hangs off. Each operation
/// resolves its target through one of the loaders below before touching it:
///
/// 1. **Principal**: no principal means [`ServiceError::Unauthenticated`]
/// 2. **Existence**: target (or, for dependents, its parent task) missing
///    means [`ServiceError::NotFound`]
/// 3. **Ownership**: the owning task's `user_id` differs from the principal
///    means [`ServiceError::Forbidden`]
///
/// Checks always read through the caller's transaction and nothing is
/// cached, so a record deleted a moment ago is reported as not found.
///
/// # Example
///
/// ```no_run
/// use taskmate_shared::auth::ownership::{authorize_subtask, require_principal};
/// use taskmate_shared::auth::principal::Principal;
/// use taskmate_shared::error::ServiceResult;
/// use taskmate_shared::store::StoreTransaction;
/// use uuid::Uuid;
///
/// async fn rename(
///     tx: &mut dyn StoreTransaction,
///     principal: Option<Principal>,
///     subtask_id: Uuid,
/// ) -> ServiceResult<()> {
///     let principal = require_principal(principal)?;
///     let ready = authorize_subtask(tx, &principal, subtask_id).await?;
///     println!("{} may edit {}", ready.principal.user_id, ready.entity.name);
///     Ok(())
/// }
/// ```

use uuid::Uuid;

use super::principal::Principal;
use crate::error::{ServiceError, ServiceResult};
use crate::models::attachment::Attachment;
use crate::models::recurrence::Recurrence;
use crate::models::subtask::Subtask;
use crate::models::task::Task;
use crate::models::{EntityKind, TaskScoped};
use crate::store::StoreTransaction;

/// An entity the principal has been cleared to operate on
#[derive(Debug, Clone)]
pub struct Ready<T> {
    pub principal: Principal,

    pub entity: T,

    /// The owning task; the entity itself when `T` is [`Task`]
    pub task_id: Uuid,
}

/// Fails with `Unauthenticated` when no principal was resolved
pub fn require_principal(principal: Option<Principal>) -> ServiceResult<Principal> {
    principal.ok_or(ServiceError::Unauthenticated)
}

/// Checks that `task` belongs to the principal
///
/// `entity` and `id` name the record actually requested, which is the task
/// itself or one of its dependents.
pub fn require_ownership(
    principal: &Principal,
    task: &Task,
    entity: EntityKind,
    id: Uuid,
) -> ServiceResult<()> {
    if principal.owns(task.user_id) {
        return Ok(());
    }

    tracing::warn!(
        user_id = %principal.user_id,
        entity = %entity,
        entity_id = %id,
        "Ownership check failed"
    );
    Err(ServiceError::Forbidden { entity, id })
}

/// Loads a task the principal owns
pub async fn authorize_task(
    tx: &mut dyn StoreTransaction,
    principal: &Principal,
    task_id: Uuid,
) -> ServiceResult<Ready<Task>> {
    let task = tx
        .find_task(task_id)
        .await?
        .ok_or_else(|| ServiceError::not_found(EntityKind::Task, task_id))?;

    require_ownership(principal, &task, EntityKind::Task, task_id)?;

    Ok(Ready {
        principal: *principal,
        entity: task,
        task_id,
    })
}

/// Clears an already loaded dependent through its parent task
async fn authorize_scoped<T: TaskScoped>(
    tx: &mut dyn StoreTransaction,
    principal: &Principal,
    id: Uuid,
    found: Option<T>,
) -> ServiceResult<Ready<T>> {
    let kind = T::KIND.entity();
    let entity = found.ok_or_else(|| ServiceError::not_found(kind, id))?;
    let task_id = entity.task_id();

    let task = tx
        .find_task(task_id)
        .await?
        .ok_or_else(|| ServiceError::not_found(kind, id))?;

    require_ownership(principal, &task, kind, entity.id())?;

    Ok(Ready {
        principal: *principal,
        entity,
        task_id,
    })
}

/// Loads a subtask whose parent task the principal owns
pub async fn authorize_subtask(
    tx: &mut dyn StoreTransaction,
    principal: &Principal,
    id: Uuid,
) -> ServiceResult<Ready<Subtask>> {
    let found = tx.find_subtask(id).await?;
    authorize_scoped(tx, principal, id, found).await
}

/// Loads a recurrence whose parent task the principal owns
pub async fn authorize_recurrence(
    tx: &mut dyn StoreTransaction,
    principal: &Principal,
    id: Uuid,
) -> ServiceResult<Ready<Recurrence>> {
    let found = tx.find_recurrence(id).await?;
    authorize_scoped(tx, principal, id, found).await
}

/// Loads an attachment whose parent task the principal owns
pub async fn authorize_attachment(
    tx: &mut dyn StoreTransaction,
    principal: &Principal,
    id: Uuid,
) -> ServiceResult<Ready<Attachment>> {
    let found = tx.find_attachment(id).await?;
    authorize_scoped(tx, principal, id, found).await
}
