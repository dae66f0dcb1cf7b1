/// Authenticated caller identity
///
/// A [`Principal`] is produced only by a credential service after a bearer
/// token checks out. Operations receive `Option<Principal>`; `None` means the
/// request carried no credentials.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The user on whose behalf a request runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal {
    pub user_id: Uuid,
}

impl Principal {
    pub fn new(user_id: Uuid) -> Self {
        Self { user_id }
    }

    /// True if the principal is the given owner
    pub fn owns(&self, owner_id: Uuid) -> bool {
        self.user_id == owner_id
    }
}

/// Extracts the token from an `Authorization: Bearer <token>` header value
///
/// The scheme is matched case-insensitively. Returns `None` for any other
/// scheme or an empty token.
pub fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }

    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bearer_token() {
        assert_eq!(bearer_token("Bearer abc.def"), Some("abc.def"));
        assert_eq!(bearer_token("bearer abc"), Some("abc"));
        assert_eq!(bearer_token("Basic dXNlcjpwYXNz"), None);
        assert_eq!(bearer_token("Bearer "), None);
        assert_eq!(bearer_token("Bearer"), None);
    }

    #[test]
    fn test_owns() {
        let user_id = Uuid::new_v4();
        let principal = Principal::new(user_id);
        assert!(principal.owns(user_id));
        assert!(!principal.owns(Uuid::new_v4()));
    }
}
