/// Subtask model and database operations
///
/// Subtasks follow a two-state machine:
///
/// ```text
/// active ──complete──▶ completed
///   ▲                      │
///   └────in-complete───────┘
/// ```
///
/// Creation always yields `active`, whatever the caller sent.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE subtasks (
///     id UUID PRIMARY KEY,
///     task_id UUID NOT NULL REFERENCES tasks(id),
///     name VARCHAR(200) NOT NULL,
///     description TEXT,
///     due_date TIMESTAMPTZ,
///     is_completed BOOLEAN NOT NULL DEFAULT FALSE,
///     date_created TIMESTAMPTZ NOT NULL
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;
use validator::Validate;

use super::{DependentKind, TaskScoped};

/// Subtask model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Subtask {
    pub id: Uuid,

    /// Parent task (immutable)
    pub task_id: Uuid,

    pub name: String,

    pub description: Option<String>,

    pub due_date: Option<DateTime<Utc>>,

    pub is_completed: bool,

    pub date_created: DateTime<Utc>,
}

/// Input for creating a subtask
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateSubtask {
    pub task_id: Uuid,

    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,

    #[validate(length(max = 4000, message = "Description must be at most 4000 characters"))]
    pub description: Option<String>,

    pub due_date: Option<DateTime<Utc>>,

    /// Accepted for compatibility and ignored: new subtasks start active
    #[serde(default)]
    pub is_completed: Option<bool>,
}

/// Full replacement of a subtask's mutable fields
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateSubtask {
    #[validate(length(min = 1, max = 200, message = "Name must be 1-200 characters"))]
    pub name: String,

    #[validate(length(max = 4000, message = "Description must be at most 4000 characters"))]
    pub description: Option<String>,

    pub due_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub is_completed: bool,
}

const SUBTASK_COLUMNS: &str = "id, task_id, name, description, due_date, is_completed, date_created";

impl TaskScoped for Subtask {
    const KIND: DependentKind = DependentKind::Subtask;

    fn id(&self) -> Uuid {
        self.id
    }

    fn task_id(&self) -> Uuid {
        self.task_id
    }
}

impl Subtask {
    pub fn new(data: CreateSubtask) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_id: data.task_id,
            name: data.name,
            description: data.description,
            due_date: data.due_date,
            is_completed: false,
            date_created: Utc::now(),
        }
    }

    /// Replaces all mutable fields; `id` and `task_id` are left untouched
    pub fn replace(&mut self, data: UpdateSubtask) {
        self.name = data.name;
        self.description = data.description;
        self.due_date = data.due_date;
        self.is_completed = data.is_completed;
    }

    pub async fn insert(conn: &mut PgConnection, subtask: &Subtask) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO subtasks (id, task_id, name, description, due_date, is_completed,
                                  date_created)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(subtask.id)
        .bind(subtask.task_id)
        .bind(&subtask.name)
        .bind(&subtask.description)
        .bind(subtask.due_date)
        .bind(subtask.is_completed)
        .bind(subtask.date_created)
        .execute(conn)
        .await?;

        Ok(())
    }

    pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Subtask>(&format!(
            "SELECT {} FROM subtasks WHERE id = $1",
            SUBTASK_COLUMNS
        ))
        .bind(id)
        .fetch_optional(conn)
        .await
    }

    pub async fn list_by_task(
        conn: &mut PgConnection,
        task_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Subtask>(&format!(
            "SELECT {} FROM subtasks WHERE task_id = $1 ORDER BY date_created, id",
            SUBTASK_COLUMNS
        ))
        .bind(task_id)
        .fetch_all(conn)
        .await
    }

    pub async fn save(conn: &mut PgConnection, subtask: &Subtask) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE subtasks
            SET name = $2, description = $3, due_date = $4, is_completed = $5
            WHERE id = $1
            "#,
        )
        .bind(subtask.id)
        .bind(&subtask.name)
        .bind(&subtask.description)
        .bind(subtask.due_date)
        .bind(subtask.is_completed)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
