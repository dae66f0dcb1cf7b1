/// Cascade deletion engine
///
/// Removes a task or a whole account together with everything that only
/// exists in relation to it. Removal always runs children first:
///
/// ```text
/// user:  for each task ─▶ task cascade ─▶ credential ─▶ user row
/// task:  subtasks ─▶ recurrence ─▶ attachments ─▶ task row
/// ```
///
/// The engine only stages removals on the transaction it is handed. The
/// caller commits once everything (including its own checks) succeeded, so
/// a failure at any step leaves every record in place.
///
/// Each step removes "whatever is left" rather than a precomputed list, so
/// re-running a cascade after a failed attempt converges on the same end
/// state and never trips over rows that are already gone.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::credentials::CredentialService;
use crate::error::ServiceResult;
use crate::models::DependentKind;
use crate::store::{StoreError, StoreTransaction};

/// Number of rows removed per kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CascadeReport {
    pub users: u64,
    pub credentials: u64,
    pub tasks: u64,
    pub subtasks: u64,
    pub recurrences: u64,
    pub attachments: u64,
}

impl CascadeReport {
    fn record(&mut self, kind: DependentKind, removed: u64) {
        match kind {
            DependentKind::Subtask => self.subtasks += removed,
            DependentKind::Recurrence => self.recurrences += removed,
            DependentKind::Attachment => self.attachments += removed,
        }
    }

    fn merge(&mut self, other: CascadeReport) {
        self.users += other.users;
        self.credentials += other.credentials;
        self.tasks += other.tasks;
        self.subtasks += other.subtasks;
        self.recurrences += other.recurrences;
        self.attachments += other.attachments;
    }

    /// Total rows removed
    pub fn total(&self) -> u64 {
        self.users + self.credentials + self.tasks + self.subtasks + self.recurrences + self.attachments
    }
}

/// Stages removal of a task and all of its dependents
pub async fn cascade_task(
    tx: &mut dyn StoreTransaction,
    task_id: Uuid,
) -> Result<CascadeReport, StoreError> {
    let mut report = CascadeReport::default();

    for kind in DependentKind::CASCADE_ORDER {
        let removed = tx.remove_dependents_of(kind, task_id).await?;
        report.record(kind, removed);
    }

    if tx.remove_task(task_id).await? {
        report.tasks += 1;
    }

    tracing::debug!(
        task_id = %task_id,
        subtasks = report.subtasks,
        recurrences = report.recurrences,
        attachments = report.attachments,
        "Task cascade staged"
    );

    Ok(report)
}

/// Stages removal of a user, every task they own, and their credential
///
/// All tasks are cascaded on the same transaction; the credential goes only
/// after the last task, and the user row last of all.
pub async fn cascade_user(
    tx: &mut dyn StoreTransaction,
    credentials: &dyn CredentialService,
    user_id: Uuid,
) -> ServiceResult<CascadeReport> {
    let mut report = CascadeReport::default();

    let tasks = tx.list_tasks_by_user(user_id).await?;
    for task in &tasks {
        report.merge(cascade_task(tx, task.id).await?);
    }

    if credentials.delete_credential(tx, user_id).await? {
        report.credentials += 1;
    }

    if tx.remove_user(user_id).await? {
        report.users += 1;
    }

    tracing::debug!(
        user_id = %user_id,
        tasks = report.tasks,
        "User cascade staged"
    );

    Ok(report)
}
