/// Tagged outcomes of every core operation
///
/// Each operation returns exactly one of: success, or one of the failure
/// kinds below. The transport layer maps kinds to status codes; tests match
/// on [`ServiceError::kind`].
///
/// | Kind                | Meaning                                         |
/// |---------------------|-------------------------------------------------|
/// | `Unauthenticated`   | no principal could be resolved                  |
/// | `NotFound`          | target entity or its parent task is absent      |
/// | `Forbidden`         | target exists but belongs to another principal  |
/// | `ValidationFailed`  | malformed input or field combination            |
/// | `PersistenceFailed` | transaction or commit failed, nothing persisted |

use uuid::Uuid;

use crate::auth::credentials::CredentialError;
use crate::models::EntityKind;
use crate::store::StoreError;

/// Service result type alias
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failure outcome of a core operation
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("{entity} {id} not found")]
    NotFound { entity: EntityKind, id: Uuid },

    #[error("Not authorized to access {entity} {id}")]
    Forbidden { entity: EntityKind, id: Uuid },

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Persistence failed: {0}")]
    PersistenceFailed(String),
}

/// Discriminant of [`ServiceError`], independent of messages and ids
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeKind {
    Unauthenticated,
    NotFound,
    Forbidden,
    ValidationFailed,
    PersistenceFailed,
}

impl ServiceError {
    pub fn kind(&self) -> OutcomeKind {
        match self {
            ServiceError::Unauthenticated => OutcomeKind::Unauthenticated,
            ServiceError::NotFound { .. } => OutcomeKind::NotFound,
            ServiceError::Forbidden { .. } => OutcomeKind::Forbidden,
            ServiceError::ValidationFailed(_) => OutcomeKind::ValidationFailed,
            ServiceError::PersistenceFailed(_) => OutcomeKind::PersistenceFailed,
        }
    }

    pub fn not_found(entity: EntityKind, id: Uuid) -> Self {
        ServiceError::NotFound { entity, id }
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        ServiceError::ValidationFailed(reason.into())
    }

    /// Flattens `validator` output into one human readable reason
    ///
    /// Nested structs and lists are walked too, their fields prefixed with
    /// the path that leads to them (`user.email`, `items[0].name`).
    pub fn from_validation(errors: validator::ValidationErrors) -> Self {
        let mut reasons = Vec::new();
        collect_reasons(&errors, "", &mut reasons);
        reasons.sort();

        ServiceError::ValidationFailed(reasons.join("; "))
    }
}

fn collect_reasons(errors: &validator::ValidationErrors, prefix: &str, out: &mut Vec<String>) {
    use validator::ValidationErrorsKind;

    for (field, kind) in errors.errors() {
        let path = if prefix.is_empty() {
            field.to_string()
        } else {
            format!("{}.{}", prefix, field)
        };

        match kind {
            ValidationErrorsKind::Field(errors) => {
                out.extend(errors.iter().map(|error| {
                    let message = error
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| error.code.to_string());
                    format!("{}: {}", path, message)
                }));
            }
            ValidationErrorsKind::Struct(nested) => collect_reasons(nested, &path, out),
            ValidationErrorsKind::List(items) => {
                for (index, nested) in items {
                    collect_reasons(nested, &format!("{}[{}]", path, index), out);
                }
            }
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(_) => {
                ServiceError::ValidationFailed("Username or email is already taken".to_string())
            }
            other => ServiceError::PersistenceFailed(other.to_string()),
        }
    }
}

impl From<CredentialError> for ServiceError {
    fn from(err: CredentialError) -> Self {
        match err {
            CredentialError::MissingCredentials | CredentialError::InvalidToken(_) => {
                ServiceError::Unauthenticated
            }
            CredentialError::InvalidResetToken(reason) => ServiceError::ValidationFailed(reason),
            CredentialError::Store(err) => ServiceError::PersistenceFailed(err.to_string()),
            other => ServiceError::PersistenceFailed(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind() {
        assert_eq!(ServiceError::Unauthenticated.kind(), OutcomeKind::Unauthenticated);
        assert_eq!(
            ServiceError::not_found(EntityKind::Task, Uuid::new_v4()).kind(),
            OutcomeKind::NotFound
        );
        assert_eq!(
            ServiceError::Forbidden {
                entity: EntityKind::Subtask,
                id: Uuid::new_v4()
            }
            .kind(),
            OutcomeKind::Forbidden
        );
        assert_eq!(ServiceError::validation("x").kind(), OutcomeKind::ValidationFailed);
    }

    #[test]
    fn test_display() {
        let id = Uuid::nil();
        assert_eq!(
            ServiceError::not_found(EntityKind::Subtask, id).to_string(),
            format!("subtask {} not found", id)
        );
        assert_eq!(
            ServiceError::validation("Passwords do not match").to_string(),
            "Validation failed: Passwords do not match"
        );
    }

    #[test]
    fn test_store_errors_become_persistence_failures() {
        let err: ServiceError = StoreError::Finished.into();
        assert_eq!(err.kind(), OutcomeKind::PersistenceFailed);

        let err: ServiceError = StoreError::Constraint("task does not exist".to_string()).into();
        assert_eq!(err.kind(), OutcomeKind::PersistenceFailed);
    }

    #[test]
    fn test_store_conflicts_become_validation_failures() {
        let err: ServiceError = StoreError::Conflict("duplicate user".to_string()).into();
        assert_eq!(err.kind(), OutcomeKind::ValidationFailed);
        assert!(err.to_string().contains("already taken"));
    }

    #[test]
    fn test_from_validation_reports_nested_fields() {
        use validator::Validate;

        #[derive(Validate)]
        struct Inner {
            #[validate(email(message = "Invalid email format"))]
            email: String,
        }

        #[derive(Validate)]
        struct Outer {
            #[validate(length(min = 1, message = "Name is required"))]
            name: String,
            #[validate(nested)]
            inner: Inner,
        }

        let outer = Outer {
            name: String::new(),
            inner: Inner {
                email: "not-an-email".to_string(),
            },
        };

        let err = ServiceError::from_validation(outer.validate().unwrap_err());
        assert_eq!(
            err.to_string(),
            "Validation failed: inner.email: Invalid email format; name: Name is required"
        );
    }

    #[test]
    fn test_credential_errors() {
        let err: ServiceError = CredentialError::MissingCredentials.into();
        assert_eq!(err.kind(), OutcomeKind::Unauthenticated);

        let err: ServiceError = CredentialError::InvalidToken("expired".to_string()).into();
        assert_eq!(err.kind(), OutcomeKind::Unauthenticated);
    }
}
