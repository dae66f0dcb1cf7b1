/// Mutation handlers
///
/// One function per operation. Each takes the store, the principal resolved
/// by the transport (or `None`), and the operation's input, and returns a
/// tagged outcome. Every call runs in exactly one store transaction:
///
/// 1. resolve the principal (`Unauthenticated` before any I/O)
/// 2. open a transaction
/// 3. load and clear the target through [`crate::auth::ownership`]
/// 4. validate input and apply the mutation
/// 5. commit on success, roll back on any failure
///
/// # Modules
///
/// - [`account`]: registration, login, profile, password change, account deletion
/// - [`tasks`]: task CRUD and task cascade
/// - [`subtasks`]: subtask CRUD and completion toggles
/// - [`recurrences`]: per-task recurrence rule
/// - [`attachments`]: task attachments

use validator::Validate;

use crate::error::{ServiceError, ServiceResult};
use crate::store::StoreTransaction;

pub mod account;
pub mod attachments;
pub mod recurrences;
pub mod subtasks;
pub mod tasks;

/// Ends a transaction according to the outcome of the work done on it
///
/// Success commits; a failed commit turns into `PersistenceFailed`. Any
/// failure rolls back and is passed through unchanged.
pub(crate) async fn finish<T>(
    mut tx: Box<dyn StoreTransaction>,
    outcome: ServiceResult<T>,
) -> ServiceResult<T> {
    match outcome {
        Ok(value) => {
            if let Err(err) = tx.commit().await {
                tracing::error!(error = %err, "Commit failed, changes discarded");
                return Err(err.into());
            }
            Ok(value)
        }
        Err(err) => {
            match tx.rollback().await {
                Ok(()) => tracing::warn!(outcome = ?err.kind(), "Transaction rolled back"),
                Err(rollback_err) => {
                    tracing::error!(error = %rollback_err, "Rollback failed")
                }
            }
            Err(err)
        }
    }
}

/// Runs `validator` rules, flattening failures into `ValidationFailed`
pub(crate) fn validate<T: Validate>(input: &T) -> ServiceResult<()> {
    input.validate().map_err(ServiceError::from_validation)
}
