/// Attachment model and database operations
///
/// Attachments reference files stored elsewhere; only metadata and a URL are
/// kept here.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE attachments (
///     id UUID PRIMARY KEY,
///     task_id UUID NOT NULL REFERENCES tasks(id),
///     file_name VARCHAR(255) NOT NULL,
///     url VARCHAR(2048) NOT NULL,
///     content_type VARCHAR(255),
///     size_bytes BIGINT NOT NULL DEFAULT 0,
///     date_created TIMESTAMPTZ NOT NULL
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;
use validator::Validate;

use super::{DependentKind, TaskScoped};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Attachment {
    pub id: Uuid,

    /// Parent task (immutable)
    pub task_id: Uuid,

    pub file_name: String,

    pub url: String,

    pub content_type: Option<String>,

    pub size_bytes: i64,

    pub date_created: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateAttachment {
    #[validate(length(min = 1, max = 255, message = "File name must be 1-255 characters"))]
    pub file_name: String,

    #[validate(url(message = "Invalid URL"), length(max = 2048))]
    pub url: String,

    #[validate(length(max = 255))]
    pub content_type: Option<String>,

    #[validate(range(min = 0, message = "Size must not be negative"))]
    #[serde(default)]
    pub size_bytes: i64,
}

const ATTACHMENT_COLUMNS: &str =
    "id, task_id, file_name, url, content_type, size_bytes, date_created";

impl TaskScoped for Attachment {
    const KIND: DependentKind = DependentKind::Attachment;

    fn id(&self) -> Uuid {
        self.id
    }

    fn task_id(&self) -> Uuid {
        self.task_id
    }
}

impl Attachment {
    pub fn new(task_id: Uuid, data: CreateAttachment) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_id,
            file_name: data.file_name,
            url: data.url,
            content_type: data.content_type,
            size_bytes: data.size_bytes,
            date_created: Utc::now(),
        }
    }

    pub async fn insert(conn: &mut PgConnection, attachment: &Attachment) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO attachments (id, task_id, file_name, url, content_type, size_bytes,
                                     date_created)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(attachment.id)
        .bind(attachment.task_id)
        .bind(&attachment.file_name)
        .bind(&attachment.url)
        .bind(&attachment.content_type)
        .bind(attachment.size_bytes)
        .bind(attachment.date_created)
        .execute(conn)
        .await?;

        Ok(())
    }

    pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Attachment>(&format!(
            "SELECT {} FROM attachments WHERE id = $1",
            ATTACHMENT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(conn)
        .await
    }

    pub async fn list_by_task(
        conn: &mut PgConnection,
        task_id: Uuid,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Attachment>(&format!(
            "SELECT {} FROM attachments WHERE task_id = $1 ORDER BY date_created, id",
            ATTACHMENT_COLUMNS
        ))
        .bind(task_id)
        .fetch_all(conn)
        .await
    }
}
