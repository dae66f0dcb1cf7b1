/// Cascade deletion tests
///
/// Deleting a task or an account must remove every dependent row or none
/// at all, and must be safe to retry.

mod common;

use common::*;
use taskmate_shared::error::OutcomeKind;
use taskmate_shared::models::DependentKind;
use taskmate_shared::services::{account, attachments, recurrences, subtasks, tasks};
use taskmate_shared::store::memory::{MemoryStore, RowCounts};
use taskmate_shared::store::FailPoint;

#[tokio::test]
async fn test_delete_task_removes_all_dependents() {
    let store = MemoryStore::new();
    let alice = seed_user(&store, "alice").await;
    let task = seed_full_task(&store, alice, "Groceries").await;
    let subtask = seed_subtask(&store, alice, task.id, "third").await;

    let report = tasks::delete_task(&store, Some(alice), task.id)
        .await
        .unwrap();
    assert_eq!(report.tasks, 1);
    assert_eq!(report.subtasks, 3);
    assert_eq!(report.recurrences, 1);
    assert_eq!(report.attachments, 1);

    let counts = store.row_counts().await;
    assert_eq!(counts.tasks, 0);
    assert_eq!(counts.subtasks, 0);
    assert_eq!(counts.recurrences, 0);
    assert_eq!(counts.attachments, 0);

    let err = subtasks::get_subtask(&store, Some(alice), subtask.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), OutcomeKind::NotFound);
}

#[tokio::test]
async fn test_delete_task_leaves_other_tasks_alone() {
    let store = MemoryStore::new();
    let alice = seed_user(&store, "alice").await;
    let doomed = seed_full_task(&store, alice, "Groceries").await;
    let kept = seed_full_task(&store, alice, "Laundry").await;

    tasks::delete_task(&store, Some(alice), doomed.id)
        .await
        .unwrap();

    assert_eq!(
        subtasks::list_subtasks(&store, Some(alice), kept.id)
            .await
            .unwrap()
            .len(),
        2
    );
    assert!(recurrences::get_recurrence(&store, Some(alice), kept.id)
        .await
        .is_ok());
    assert_eq!(
        attachments::list_attachments(&store, Some(alice), kept.id)
            .await
            .unwrap()
            .len(),
        1
    );
}

#[tokio::test]
async fn test_delete_task_twice_is_not_found() {
    let store = MemoryStore::new();
    let alice = seed_user(&store, "alice").await;
    let task = seed_full_task(&store, alice, "Groceries").await;

    tasks::delete_task(&store, Some(alice), task.id)
        .await
        .unwrap();

    let err = tasks::delete_task(&store, Some(alice), task.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), OutcomeKind::NotFound);
}

#[tokio::test]
async fn test_failed_task_cascade_rolls_back_and_retries_cleanly() {
    let store = MemoryStore::new();
    let alice = seed_user(&store, "alice").await;
    let task = seed_full_task(&store, alice, "Groceries").await;
    let before = store.row_counts().await;

    store
        .fail_once(FailPoint::RemoveDependents(DependentKind::Attachment))
        .await;

    let err = tasks::delete_task(&store, Some(alice), task.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), OutcomeKind::PersistenceFailed);
    assert_eq!(store.row_counts().await, before);

    let report = tasks::delete_task(&store, Some(alice), task.id)
        .await
        .unwrap();
    assert_eq!(report.subtasks, 2);
    assert_eq!(store.row_counts().await.tasks, 0);
}

#[tokio::test]
async fn test_failed_commit_keeps_everything() {
    let store = MemoryStore::new();
    let alice = seed_user(&store, "alice").await;
    let task = seed_full_task(&store, alice, "Groceries").await;
    let before = store.row_counts().await;

    store.fail_once(FailPoint::Commit).await;

    let err = tasks::delete_task(&store, Some(alice), task.id)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), OutcomeKind::PersistenceFailed);
    assert_eq!(store.row_counts().await, before);
}

#[tokio::test]
async fn test_delete_account_removes_everything_it_owns() {
    let store = MemoryStore::new();
    let credentials = credentials();
    let alice = seed_user(&store, "alice").await;
    let bob = seed_user(&store, "bob").await;

    seed_full_task(&store, alice, "Groceries").await;
    seed_full_task(&store, alice, "Laundry").await;
    let bobs = seed_full_task(&store, bob, "Taxes").await;

    let report = account::delete_account(&store, &credentials, Some(alice))
        .await
        .unwrap();
    assert_eq!(report.users, 1);
    assert_eq!(report.credentials, 1);
    assert_eq!(report.tasks, 2);
    assert_eq!(report.subtasks, 4);
    assert_eq!(report.recurrences, 2);
    assert_eq!(report.attachments, 2);

    assert_eq!(
        store.row_counts().await,
        RowCounts {
            users: 1,
            credentials: 1,
            tasks: 1,
            subtasks: 2,
            recurrences: 1,
            attachments: 1,
        }
    );
    assert!(tasks::get_task(&store, Some(bob), bobs.id).await.is_ok());

    let err = account::get_account(&store, Some(alice)).await.unwrap_err();
    assert_eq!(err.kind(), OutcomeKind::NotFound);
}

#[tokio::test]
async fn test_failed_credential_removal_rolls_back_account_deletion() {
    let store = MemoryStore::new();
    let credentials = credentials();
    let alice = seed_user(&store, "alice").await;
    seed_full_task(&store, alice, "Groceries").await;
    seed_full_task(&store, alice, "Laundry").await;
    let before = store.row_counts().await;

    store.fail_once(FailPoint::RemoveCredential).await;

    let err = account::delete_account(&store, &credentials, Some(alice))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), OutcomeKind::PersistenceFailed);
    assert_eq!(store.row_counts().await, before);

    account::delete_account(&store, &credentials, Some(alice))
        .await
        .unwrap();
    assert_eq!(store.row_counts().await, RowCounts::default());
}

#[tokio::test]
async fn test_failure_on_user_row_rolls_back_every_task() {
    let store = MemoryStore::new();
    let credentials = credentials();
    let alice = seed_user(&store, "alice").await;
    seed_full_task(&store, alice, "Groceries").await;
    seed_full_task(&store, alice, "Laundry").await;
    let before = store.row_counts().await;

    // Every task cascade and the credential removal succeed first
    store.fail_once(FailPoint::RemoveUser).await;

    let err = account::delete_account(&store, &credentials, Some(alice))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), OutcomeKind::PersistenceFailed);
    assert_eq!(store.row_counts().await, before);
}

#[tokio::test]
async fn test_delete_account_requires_principal() {
    let store = MemoryStore::new();
    let credentials = credentials();

    let err = account::delete_account(&store, &credentials, None)
        .await
        .unwrap_err();
    assert_eq!(err.kind(), OutcomeKind::Unauthenticated);
}
