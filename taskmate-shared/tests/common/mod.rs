//! Shared fixtures for the service tests
//!
//! Everything runs against the in-memory store; users are inserted directly
//! unless a test needs a real password.

#![allow(dead_code)]

use chrono::Duration;
use taskmate_shared::auth::credentials::JwtCredentialService;
use taskmate_shared::auth::principal::Principal;
use taskmate_shared::models::attachment::{Attachment, CreateAttachment};
use taskmate_shared::models::recurrence::{Frequency, Recurrence, SetRecurrence};
use taskmate_shared::models::subtask::{CreateSubtask, Subtask};
use taskmate_shared::models::task::{CreateTask, Task};
use taskmate_shared::models::user::{CreateUser, Credential, User};
use taskmate_shared::services::{attachments, recurrences, subtasks, tasks};
use taskmate_shared::store::memory::MemoryStore;
use taskmate_shared::store::EntityStore;

pub const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

pub fn credentials() -> JwtCredentialService {
    JwtCredentialService::new(SECRET, Duration::hours(1))
}

pub fn create_user(username: &str) -> CreateUser {
    CreateUser {
        first_name: Some("John".to_string()),
        last_name: Some("Doe".to_string()),
        username: username.to_string(),
        email: format!("{}@x.com", username),
        phone_number: None,
    }
}

/// Inserts a user with a placeholder credential row
pub async fn seed_user(store: &MemoryStore, username: &str) -> Principal {
    let user = User::new(create_user(username));

    let mut tx = store.begin().await.unwrap();
    tx.insert_user(&user).await.unwrap();
    tx.upsert_credential(&Credential {
        user_id: user.id,
        password_hash: "not-a-real-hash".to_string(),
        updated_at: chrono::Utc::now(),
    })
    .await
    .unwrap();
    tx.commit().await.unwrap();

    Principal::new(user.id)
}

pub async fn seed_task(store: &MemoryStore, owner: Principal, title: &str) -> Task {
    tasks::create_task(
        store,
        Some(owner),
        CreateTask {
            title: title.to_string(),
            description: None,
            due_date: None,
        },
    )
    .await
    .unwrap()
}

pub async fn seed_subtask(store: &MemoryStore, owner: Principal, task_id: uuid::Uuid, name: &str) -> Subtask {
    subtasks::create_subtask(
        store,
        Some(owner),
        CreateSubtask {
            task_id,
            name: name.to_string(),
            description: None,
            due_date: None,
            is_completed: None,
        },
    )
    .await
    .unwrap()
}

pub async fn seed_recurrence(store: &MemoryStore, owner: Principal, task_id: uuid::Uuid) -> Recurrence {
    recurrences::set_recurrence(
        store,
        Some(owner),
        task_id,
        SetRecurrence {
            frequency: Frequency::Daily,
            repeat_interval: 1,
            ends_at: None,
        },
    )
    .await
    .unwrap()
}

pub async fn seed_attachment(store: &MemoryStore, owner: Principal, task_id: uuid::Uuid) -> Attachment {
    attachments::create_attachment(
        store,
        Some(owner),
        task_id,
        CreateAttachment {
            file_name: "receipt.pdf".to_string(),
            url: "https://files.example.com/receipt.pdf".to_string(),
            content_type: Some("application/pdf".to_string()),
            size_bytes: 2048,
        },
    )
    .await
    .unwrap()
}

/// A task with two subtasks, a recurrence and an attachment
pub async fn seed_full_task(store: &MemoryStore, owner: Principal, title: &str) -> Task {
    let task = seed_task(store, owner, title).await;
    seed_subtask(store, owner, task.id, "first").await;
    seed_subtask(store, owner, task.id, "second").await;
    seed_recurrence(store, owner, task.id).await;
    seed_attachment(store, owner, task.id).await;
    task
}
