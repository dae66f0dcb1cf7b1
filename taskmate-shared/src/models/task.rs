/// Task model and database operations
///
/// A task belongs to exactly one user. `user_id` is fixed at creation and
/// never rewritten by any update path; ownership of subtasks, recurrences and
/// attachments is derived from it.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY,
///     user_id UUID NOT NULL REFERENCES users(id),
///     title VARCHAR(200) NOT NULL,
///     description TEXT,
///     due_date TIMESTAMPTZ,
///     is_completed BOOLEAN NOT NULL DEFAULT FALSE,
///     date_created TIMESTAMPTZ NOT NULL,
///     date_modified TIMESTAMPTZ NOT NULL
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;
use validator::Validate;

/// Task model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    /// Unique task ID
    pub id: Uuid,

    /// Owning user (immutable)
    pub user_id: Uuid,

    pub title: String,

    pub description: Option<String>,

    pub due_date: Option<DateTime<Utc>>,

    pub is_completed: bool,

    pub date_created: DateTime<Utc>,

    /// Advanced on every mutation of the task or one of its dependents
    pub date_modified: DateTime<Utc>,
}

/// Input for creating a task
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateTask {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(max = 4000, message = "Description must be at most 4000 characters"))]
    pub description: Option<String>,

    pub due_date: Option<DateTime<Utc>>,
}

/// Full replacement of a task's mutable fields
///
/// Omitted optional fields are cleared, not kept.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateTask {
    #[validate(length(min = 1, max = 200, message = "Title must be 1-200 characters"))]
    pub title: String,

    #[validate(length(max = 4000, message = "Description must be at most 4000 characters"))]
    pub description: Option<String>,

    pub due_date: Option<DateTime<Utc>>,

    #[serde(default)]
    pub is_completed: bool,
}

const TASK_COLUMNS: &str =
    "id, user_id, title, description, due_date, is_completed, date_created, date_modified";

impl Task {
    /// Builds a new, not yet persisted task owned by `user_id`
    pub fn new(user_id: Uuid, data: CreateTask) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            title: data.title,
            description: data.description,
            due_date: data.due_date,
            is_completed: false,
            date_created: now,
            date_modified: now,
        }
    }

    /// Replaces all mutable fields; `id` and `user_id` are left untouched
    pub fn replace(&mut self, data: UpdateTask, now: DateTime<Utc>) {
        self.title = data.title;
        self.description = data.description;
        self.due_date = data.due_date;
        self.is_completed = data.is_completed;
        self.date_modified = now;
    }

    pub async fn insert(conn: &mut PgConnection, task: &Task) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO tasks (id, user_id, title, description, due_date, is_completed,
                               date_created, date_modified)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(task.id)
        .bind(task.user_id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.due_date)
        .bind(task.is_completed)
        .bind(task.date_created)
        .bind(task.date_modified)
        .execute(conn)
        .await?;

        Ok(())
    }

    pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!("SELECT {} FROM tasks WHERE id = $1", TASK_COLUMNS))
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Lists a user's tasks, oldest first
    pub async fn list_by_user(
        conn: &mut PgConnection,
        user_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(&format!(
            "SELECT {} FROM tasks WHERE user_id = $1 ORDER BY date_created, id",
            TASK_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(conn)
        .await
    }

    /// Writes the mutable fields back; `user_id` is deliberately not in the SET list
    pub async fn save(conn: &mut PgConnection, task: &Task) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE tasks
            SET title = $2, description = $3, due_date = $4, is_completed = $5,
                date_modified = $6
            WHERE id = $1
            "#,
        )
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.due_date)
        .bind(task.is_completed)
        .bind(task.date_modified)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Advances `date_modified` after a dependent record changed
    pub async fn touch(
        conn: &mut PgConnection,
        id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("UPDATE tasks SET date_modified = $2 WHERE id = $1")
            .bind(id)
            .bind(at)
            .execute(conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(conn: &mut PgConnection, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_task_starts_incomplete() {
        let owner = Uuid::new_v4();
        let task = Task::new(
            owner,
            CreateTask {
                title: "Groceries".to_string(),
                description: None,
                due_date: None,
            },
        );

        assert_eq!(task.user_id, owner);
        assert!(!task.is_completed);
        assert_eq!(task.date_created, task.date_modified);
    }

    #[test]
    fn test_replace_is_full_replace() {
        let owner = Uuid::new_v4();
        let mut task = Task::new(
            owner,
            CreateTask {
                title: "Groceries".to_string(),
                description: Some("milk".to_string()),
                due_date: Some(Utc::now()),
            },
        );
        let id = task.id;
        let now = Utc::now();

        task.replace(
            UpdateTask {
                title: "Shopping".to_string(),
                description: None,
                due_date: None,
                is_completed: true,
            },
            now,
        );

        assert_eq!(task.id, id);
        assert_eq!(task.user_id, owner);
        assert_eq!(task.title, "Shopping");
        assert!(task.description.is_none());
        assert!(task.due_date.is_none());
        assert!(task.is_completed);
        assert_eq!(task.date_modified, now);
    }

    #[test]
    fn test_create_task_validation() {
        let data = CreateTask {
            title: String::new(),
            description: None,
            due_date: None,
        };
        assert!(data.validate().is_err());
    }
}
