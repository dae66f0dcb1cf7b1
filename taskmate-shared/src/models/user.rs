/// User model and database operations
///
/// Users own tasks. The password hash is kept out of this record, in the
/// `credentials` table managed by the credential service, so that profile
/// reads and edits never touch secret material.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY,
///     first_name VARCHAR(100),
///     last_name VARCHAR(100),
///     username VARCHAR(100) NOT NULL, -- unique on lower(username)
///     email VARCHAR(255) NOT NULL, -- unique on lower(email)
///     phone_number VARCHAR(32),
///     date_created TIMESTAMPTZ NOT NULL,
///     date_modified TIMESTAMPTZ
/// );
///
/// CREATE TABLE credentials (
///     user_id UUID PRIMARY KEY REFERENCES users(id),
///     password_hash VARCHAR(255) NOT NULL,
///     updated_at TIMESTAMPTZ NOT NULL
/// );
/// ```

use std::borrow::Cow;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgConnection;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use super::supplied;

/// User model representing an account
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    /// Unique user ID (UUID v4)
    pub id: Uuid,

    pub first_name: Option<String>,

    pub last_name: Option<String>,

    /// Login name, unique across all users ignoring case; never contains `@`
    pub username: String,

    /// Email address, unique across all users ignoring case
    pub email: String,

    pub phone_number: Option<String>,

    /// When the account was created
    pub date_created: DateTime<Utc>,

    /// When the account was last edited (None if never)
    pub date_modified: Option<DateTime<Utc>>,
}

/// Input for creating a new user
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateUser {
    #[validate(length(max = 100, message = "First name must be at most 100 characters"))]
    pub first_name: Option<String>,

    #[validate(length(max = 100, message = "Last name must be at most 100 characters"))]
    pub last_name: Option<String>,

    #[validate(
        length(min = 3, max = 100, message = "Username must be 3-100 characters"),
        custom(function = "validate_username")
    )]
    pub username: String,

    #[validate(email(message = "Invalid email format"))]
    pub email: String,

    #[validate(length(max = 32, message = "Phone number must be at most 32 characters"))]
    pub phone_number: Option<String>,
}

/// Usernames may not contain `@`, which is what tells an email login apart
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    if username.contains('@') {
        let mut error = ValidationError::new("username");
        error.message = Some(Cow::from("Username must not contain '@'"));
        return Err(error);
    }
    Ok(())
}

/// Partial account edit
///
/// A field is applied only when it is present and non-blank; everything else
/// keeps its previous value.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct EditUser {
    #[validate(length(max = 100, message = "First name must be at most 100 characters"))]
    pub first_name: Option<String>,

    #[validate(length(max = 100, message = "Last name must be at most 100 characters"))]
    pub last_name: Option<String>,

    #[validate(
        length(min = 3, max = 100, message = "Username must be 3-100 characters"),
        custom(function = "validate_username")
    )]
    pub username: Option<String>,

    #[validate(email(message = "Invalid email format"))]
    pub email: Option<String>,

    #[validate(length(max = 32, message = "Phone number must be at most 32 characters"))]
    pub phone_number: Option<String>,
}

impl EditUser {
    /// Drops blank fields, so they are neither validated nor applied
    pub fn without_blanks(self) -> Self {
        fn keep(value: Option<String>) -> Option<String> {
            value.filter(|v| !v.trim().is_empty())
        }

        Self {
            first_name: keep(self.first_name),
            last_name: keep(self.last_name),
            username: keep(self.username),
            email: keep(self.email),
            phone_number: keep(self.phone_number),
        }
    }
}

const USER_COLUMNS: &str =
    "id, first_name, last_name, username, email, phone_number, date_created, date_modified";

impl User {
    /// Builds a new, not yet persisted user
    pub fn new(data: CreateUser) -> Self {
        Self {
            id: Uuid::new_v4(),
            first_name: data.first_name,
            last_name: data.last_name,
            username: data.username,
            email: data.email,
            phone_number: data.phone_number,
            date_created: Utc::now(),
            date_modified: None,
        }
    }

    /// Applies a partial edit and stamps `date_modified`
    pub fn apply_edit(&mut self, edit: &EditUser, now: DateTime<Utc>) {
        if let Some(first_name) = supplied(&edit.first_name) {
            self.first_name = Some(first_name.to_string());
        }
        if let Some(last_name) = supplied(&edit.last_name) {
            self.last_name = Some(last_name.to_string());
        }
        if let Some(username) = supplied(&edit.username) {
            self.username = username.to_string();
        }
        if let Some(email) = supplied(&edit.email) {
            self.email = email.to_string();
        }
        if let Some(phone_number) = supplied(&edit.phone_number) {
            self.phone_number = Some(phone_number.to_string());
        }
        self.date_modified = Some(now);
    }

    /// Inserts a user row
    ///
    /// # Errors
    ///
    /// Fails on a duplicate username or email (unique constraint violation)
    pub async fn insert(conn: &mut PgConnection, user: &User) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO users (id, first_name, last_name, username, email, phone_number,
                               date_created, date_modified)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.phone_number)
        .bind(user.date_created)
        .bind(user.date_modified)
        .execute(conn)
        .await?;

        Ok(())
    }

    /// Finds a user by ID
    pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS))
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Finds a user by username, ignoring case
    pub async fn find_by_username(
        conn: &mut PgConnection,
        username: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE lower(username) = lower($1)",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(conn)
        .await
    }

    /// Finds a user by email, ignoring case
    pub async fn find_by_email(
        conn: &mut PgConnection,
        email: &str,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE lower(email) = lower($1)",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(conn)
        .await
    }

    /// Writes every mutable field of `user` back to its row
    ///
    /// Returns false if the row no longer exists
    pub async fn save(conn: &mut PgConnection, user: &User) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET first_name = $2, last_name = $3, username = $4, email = $5,
                phone_number = $6, date_modified = $7
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.first_name)
        .bind(&user.last_name)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.phone_number)
        .bind(user.date_modified)
        .execute(conn)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes a user row
    ///
    /// Fails with a foreign key violation while tasks or a credential still
    /// reference the user; use the cascade engine instead of calling this
    /// directly.
    pub async fn delete(conn: &mut PgConnection, id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Stored password hash of a user
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Credential {
    pub user_id: Uuid,

    /// Argon2id PHC string
    pub password_hash: String,

    pub updated_at: DateTime<Utc>,
}

impl Credential {
    pub async fn find(conn: &mut PgConnection, user_id: Uuid) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Credential>(
            "SELECT user_id, password_hash, updated_at FROM credentials WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(conn)
        .await
    }

    /// Inserts or replaces the credential of a user
    pub async fn upsert(conn: &mut PgConnection, credential: &Credential) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO credentials (user_id, password_hash, updated_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (user_id)
            DO UPDATE SET password_hash = EXCLUDED.password_hash, updated_at = EXCLUDED.updated_at
            "#,
        )
        .bind(credential.user_id)
        .bind(&credential.password_hash)
        .bind(credential.updated_at)
        .execute(conn)
        .await?;

        Ok(())
    }

    pub async fn delete(conn: &mut PgConnection, user_id: Uuid) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM credentials WHERE user_id = $1")
            .bind(user_id)
            .execute(conn)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
