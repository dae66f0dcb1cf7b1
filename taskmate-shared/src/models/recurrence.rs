/// Recurrence model and database operations
///
/// A task repeats according to at most one recurrence rule. Setting a rule on
/// a task that already has one replaces it in place (same row id).
///
/// # Schema
///
/// ```sql
/// CREATE TYPE recurrence_frequency AS ENUM ('daily', 'weekly', 'monthly', 'yearly');
///
/// CREATE TABLE recurrences (
///     id UUID PRIMARY KEY,
///     task_id UUID NOT NULL UNIQUE REFERENCES tasks(id),
///     frequency recurrence_frequency NOT NULL,
///     repeat_interval INTEGER NOT NULL CHECK (repeat_interval >= 1),
///     ends_at TIMESTAMPTZ,
///     date_created TIMESTAMPTZ NOT NULL
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;
use validator::Validate;

use super::{DependentKind, TaskScoped};

/// How often a task repeats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "recurrence_frequency", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

/// Recurrence model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Recurrence {
    pub id: Uuid,

    /// Parent task (immutable, unique)
    pub task_id: Uuid,

    pub frequency: Frequency,

    /// Repeat every `repeat_interval` units of `frequency`
    pub repeat_interval: i32,

    /// Last date an occurrence may fall on (None = forever)
    pub ends_at: Option<DateTime<Utc>>,

    pub date_created: DateTime<Utc>,
}

/// Input for setting a task's recurrence
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SetRecurrence {
    pub frequency: Frequency,

    #[validate(range(min = 1, max = 365, message = "Interval must be between 1 and 365"))]
    #[serde(default = "default_interval")]
    pub repeat_interval: i32,

    pub ends_at: Option<DateTime<Utc>>,
}

fn default_interval() -> i32 {
    1
}

const RECURRENCE_COLUMNS: &str = "id, task_id, frequency, repeat_interval, ends_at, date_created";

impl TaskScoped for Recurrence {
    const KIND: DependentKind = DependentKind::Recurrence;

    fn id(&self) -> Uuid {
        self.id
    }

    fn task_id(&self) -> Uuid {
        self.task_id
    }
}

impl Recurrence {
    pub fn new(task_id: Uuid, data: SetRecurrence) -> Self {
        Self {
            id: Uuid::new_v4(),
            task_id,
            frequency: data.frequency,
            repeat_interval: data.repeat_interval,
            ends_at: data.ends_at,
            date_created: Utc::now(),
        }
    }

    /// Replaces the rule, keeping identity and parent
    pub fn replace(&mut self, data: SetRecurrence) {
        self.frequency = data.frequency;
        self.repeat_interval = data.repeat_interval;
        self.ends_at = data.ends_at;
    }

    pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Recurrence>(&format!(
            "SELECT {} FROM recurrences WHERE id = $1",
            RECURRENCE_COLUMNS
        ))
        .bind(id)
        .fetch_optional(conn)
        .await
    }

    pub async fn find_by_task(
        conn: &mut PgConnection,
        task_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Recurrence>(&format!(
            "SELECT {} FROM recurrences WHERE task_id = $1",
            RECURRENCE_COLUMNS
        ))
        .bind(task_id)
        .fetch_optional(conn)
        .await
    }

    /// Inserts the rule, or rewrites the existing row with the same id
    pub async fn upsert(conn: &mut PgConnection, recurrence: &Recurrence) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO recurrences (id, task_id, frequency, repeat_interval, ends_at, date_created)
            VALUES ($1, $2, $3, $4, $5, $6)
            ON CONFLICT (id)
            DO UPDATE SET frequency = EXCLUDED.frequency, repeat_interval = EXCLUDED.repeat_interval,
                          ends_at = EXCLUDED.ends_at
            "#,
        )
        .bind(recurrence.id)
        .bind(recurrence.task_id)
        .bind(recurrence.frequency)
        .bind(recurrence.repeat_interval)
        .bind(recurrence.ends_at)
        .bind(recurrence.date_created)
        .execute(conn)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_defaults_to_one() {
        let data: SetRecurrence = serde_json::from_value(serde_json::json!({
            "frequency": "weekly"
        }))
        .unwrap();

        assert_eq!(data.frequency, Frequency::Weekly);
        assert_eq!(data.repeat_interval, 1);
        assert!(data.validate().is_ok());
    }

    #[test]
    fn test_interval_must_be_positive() {
        let data = SetRecurrence {
            frequency: Frequency::Daily,
            repeat_interval: 0,
            ends_at: None,
        };
        assert!(data.validate().is_err());
    }

    #[test]
    fn test_replace_keeps_identity() {
        let task_id = Uuid::new_v4();
        let mut recurrence = Recurrence::new(
            task_id,
            SetRecurrence {
                frequency: Frequency::Daily,
                repeat_interval: 1,
                ends_at: None,
            },
        );
        let id = recurrence.id;

        recurrence.replace(SetRecurrence {
            frequency: Frequency::Monthly,
            repeat_interval: 2,
            ends_at: None,
        });

        assert_eq!(recurrence.id, id);
        assert_eq!(recurrence.task_id, task_id);
        assert_eq!(recurrence.frequency, Frequency::Monthly);
        assert_eq!(recurrence.repeat_interval, 2);
    }
}
