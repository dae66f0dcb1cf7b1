/// Attachment operations
///
/// Attachments are immutable once created: they can be listed, read and
/// deleted, never edited.

use chrono::Utc;
use uuid::Uuid;

use super::{finish, validate};
use crate::auth::ownership::{authorize_attachment, authorize_task, require_principal};
use crate::auth::principal::Principal;
use crate::error::{ServiceError, ServiceResult};
use crate::models::attachment::{Attachment, CreateAttachment};
use crate::models::{DependentKind, EntityKind};
use crate::store::{EntityStore, StoreTransaction};

pub async fn list_attachments(
    store: &dyn EntityStore,
    principal: Option<Principal>,
    task_id: Uuid,
) -> ServiceResult<Vec<Attachment>> {
    let principal = require_principal(principal)?;
    let mut tx = store.begin().await?;
    let outcome = list_attachments_in(tx.as_mut(), &principal, task_id).await;
    finish(tx, outcome).await
}

async fn list_attachments_in(
    tx: &mut dyn StoreTransaction,
    principal: &Principal,
    task_id: Uuid,
) -> ServiceResult<Vec<Attachment>> {
    authorize_task(tx, principal, task_id).await?;
    Ok(tx.list_attachments_by_task(task_id).await?)
}

pub async fn get_attachment(
    store: &dyn EntityStore,
    principal: Option<Principal>,
    attachment_id: Uuid,
) -> ServiceResult<Attachment> {
    let principal = require_principal(principal)?;
    let mut tx = store.begin().await?;
    let outcome = authorize_attachment(tx.as_mut(), &principal, attachment_id)
        .await
        .map(|ready| ready.entity);
    finish(tx, outcome).await
}

pub async fn create_attachment(
    store: &dyn EntityStore,
    principal: Option<Principal>,
    task_id: Uuid,
    data: CreateAttachment,
) -> ServiceResult<Attachment> {
    let principal = require_principal(principal)?;
    let mut tx = store.begin().await?;
    let outcome = create_attachment_in(tx.as_mut(), &principal, task_id, data).await;
    finish(tx, outcome).await
}

async fn create_attachment_in(
    tx: &mut dyn StoreTransaction,
    principal: &Principal,
    task_id: Uuid,
    data: CreateAttachment,
) -> ServiceResult<Attachment> {
    authorize_task(tx, principal, task_id).await?;
    validate(&data)?;

    let attachment = Attachment::new(task_id, data);
    tx.insert_attachment(&attachment).await?;
    tx.touch_task(task_id, Utc::now()).await?;

    tracing::info!(task_id = %task_id, attachment_id = %attachment.id, "Attachment added");
    Ok(attachment)
}

/// Deletes an attachment record, returning what was removed
pub async fn delete_attachment(
    store: &dyn EntityStore,
    principal: Option<Principal>,
    attachment_id: Uuid,
) -> ServiceResult<Attachment> {
    let principal = require_principal(principal)?;
    let mut tx = store.begin().await?;
    let outcome = delete_attachment_in(tx.as_mut(), &principal, attachment_id).await;
    finish(tx, outcome).await
}

async fn delete_attachment_in(
    tx: &mut dyn StoreTransaction,
    principal: &Principal,
    attachment_id: Uuid,
) -> ServiceResult<Attachment> {
    let attachment = authorize_attachment(tx, principal, attachment_id).await?.entity;

    if !tx
        .remove_dependent(DependentKind::Attachment, attachment_id)
        .await?
    {
        return Err(ServiceError::not_found(EntityKind::Attachment, attachment_id));
    }
    tx.touch_task(attachment.task_id, Utc::now()).await?;

    Ok(attachment)
}
