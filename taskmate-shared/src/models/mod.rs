/// Database models for TaskMate
///
/// Every record hangs off a user, directly or through a task:
///
/// ```text
/// User ─┬─ Credential (1:1)
///       └─ Task (1:n) ─┬─ Subtask    (1:n)
///                      ├─ Recurrence (0..1)
///                      └─ Attachment (1:n)
/// ```
///
/// # Models
///
/// - `user`: Account identity attributes
/// - `task`: Top-level tasks, owned by exactly one user
/// - `subtask`: Checklist items of a task
/// - `recurrence`: Repeat rule of a task
/// - `attachment`: Files linked to a task
///
/// Each model exposes its PostgreSQL queries as associated functions taking a
/// `&mut PgConnection`, so callers decide the transaction they run in.

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod attachment;
pub mod recurrence;
pub mod subtask;
pub mod task;
pub mod user;

/// Kind of entity referenced by an outcome or a log line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    User,
    Task,
    Subtask,
    Recurrence,
    Attachment,
}

impl EntityKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Task => "task",
            EntityKind::Subtask => "subtask",
            EntityKind::Recurrence => "recurrence",
            EntityKind::Attachment => "attachment",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Records that exist only in relation to a parent task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependentKind {
    Subtask,
    Recurrence,
    Attachment,
}

impl DependentKind {
    /// Removal order used by the cascade
    pub const CASCADE_ORDER: [DependentKind; 3] = [
        DependentKind::Subtask,
        DependentKind::Recurrence,
        DependentKind::Attachment,
    ];

    pub fn entity(&self) -> EntityKind {
        match self {
            DependentKind::Subtask => EntityKind::Subtask,
            DependentKind::Recurrence => EntityKind::Recurrence,
            DependentKind::Attachment => EntityKind::Attachment,
        }
    }

    /// Backing table name
    pub fn table(&self) -> &'static str {
        match self {
            DependentKind::Subtask => "subtasks",
            DependentKind::Recurrence => "recurrences",
            DependentKind::Attachment => "attachments",
        }
    }
}

impl fmt::Display for DependentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.entity().fmt(f)
    }
}

/// Implemented by records whose ownership is inherited from a parent task
pub trait TaskScoped {
    const KIND: DependentKind;

    fn id(&self) -> uuid::Uuid;

    fn task_id(&self) -> uuid::Uuid;
}

/// Treats `None` and whitespace-only strings alike as "not supplied"
pub(crate) fn supplied(value: &Option<String>) -> Option<&str> {
    value
        .as_deref()
        .filter(|v| !v.trim().is_empty())
}
