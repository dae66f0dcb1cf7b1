/// API route handlers, one module per resource
///
/// Handlers only translate HTTP into service calls; ownership, validation
/// and cascades live in `taskmate_shared::services`.
///
/// - `health`: Health check
/// - `auth`: Register, login
/// - `account`: The caller's own account
/// - `tasks`, `subtasks`, `recurrences`, `attachments`: Task data

pub mod account;
pub mod attachments;
pub mod auth;
pub mod health;
pub mod recurrences;
pub mod subtasks;
pub mod tasks;
