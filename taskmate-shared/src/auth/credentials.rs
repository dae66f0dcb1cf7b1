/// Credential service
///
/// Owns everything secret about an account: password hashes, access tokens
/// and password reset tokens. The rest of the core only sees a
/// [`Principal`] and yes/no answers.
///
/// Every method that touches stored credentials runs inside the caller's
/// [`StoreTransaction`], so credential changes commit or roll back together
/// with the operation that caused them.
///
/// # Example
///
/// ```no_run
/// use chrono::Duration;
/// use taskmate_shared::auth::credentials::{CredentialService, JwtCredentialService};
///
/// let service = JwtCredentialService::new("a-secret-of-at-least-thirty-two-bytes", Duration::hours(24));
/// let principal = service.authenticate(Some("Bearer eyJ...")).unwrap();
/// println!("request from {}", principal.user_id);
/// ```

use async_trait::async_trait;
use chrono::{Duration, Utc};
use uuid::Uuid;

use super::jwt::{
    create_token, validate_access_token, validate_reset_token, Claims, JwtError, TokenType,
};
use super::password::{hash_password, verify_password, PasswordError};
use super::principal::{bearer_token, Principal};
use crate::models::user::Credential;
use crate::store::{StoreError, StoreTransaction};

/// Error type for credential operations
#[derive(Debug, thiserror::Error)]
pub enum CredentialError {
    /// No Authorization header, or not a bearer token
    #[error("Missing credentials")]
    MissingCredentials,

    /// Access token failed validation
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    /// Reset token failed validation
    #[error("Invalid reset token: {0}")]
    InvalidResetToken(String),

    #[error(transparent)]
    Password(#[from] PasswordError),

    #[error(transparent)]
    Jwt(#[from] JwtError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Authentication and credential management
#[async_trait]
pub trait CredentialService: Send + Sync {
    /// Resolves the value of an `Authorization` header to a principal
    fn authenticate(&self, authorization: Option<&str>) -> Result<Principal, CredentialError>;

    /// Issues an access token for a user
    fn issue_access_token(&self, user_id: Uuid) -> Result<String, CredentialError>;

    /// Issues a short-lived token authorizing one password reset
    fn issue_reset_token(&self, user_id: Uuid) -> Result<String, CredentialError>;

    /// Stores the initial password of a new user
    async fn create_credential(
        &self,
        tx: &mut dyn StoreTransaction,
        user_id: Uuid,
        password: &str,
    ) -> Result<(), CredentialError>;

    /// Checks a password against the stored hash
    ///
    /// A user without a stored credential never verifies.
    async fn verify_password(
        &self,
        tx: &mut dyn StoreTransaction,
        user_id: Uuid,
        password: &str,
    ) -> Result<bool, CredentialError>;

    /// Replaces the stored password, given a valid reset token for the user
    async fn reset_password(
        &self,
        tx: &mut dyn StoreTransaction,
        user_id: Uuid,
        reset_token: &str,
        new_password: &str,
    ) -> Result<(), CredentialError>;

    /// Removes the stored credential, reporting whether one existed
    async fn delete_credential(
        &self,
        tx: &mut dyn StoreTransaction,
        user_id: Uuid,
    ) -> Result<bool, CredentialError>;
}

/// Credential service signing HS256 tokens and hashing with Argon2id
#[derive(Clone)]
pub struct JwtCredentialService {
    secret: String,
    access_ttl: Duration,
}

impl JwtCredentialService {
    pub fn new(secret: impl Into<String>, access_ttl: Duration) -> Self {
        Self {
            secret: secret.into(),
            access_ttl,
        }
    }

    async fn store_password(
        &self,
        tx: &mut dyn StoreTransaction,
        user_id: Uuid,
        password: &str,
    ) -> Result<(), CredentialError> {
        let password_hash = hash_blocking(password.to_string()).await?;

        tx.upsert_credential(&Credential {
            user_id,
            password_hash,
            updated_at: Utc::now(),
        })
        .await?;

        Ok(())
    }
}

impl std::fmt::Debug for JwtCredentialService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtCredentialService")
            .field("secret", &"<redacted>")
            .field("access_ttl", &self.access_ttl)
            .finish()
    }
}

/// Runs Argon2id hashing on the blocking pool
async fn hash_blocking(password: String) -> Result<String, CredentialError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| PasswordError::HashError(e.to_string()))?
        .map_err(CredentialError::from)
}

async fn verify_blocking(password: String, hash: String) -> Result<bool, CredentialError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| PasswordError::VerifyError(e.to_string()))?
        .map_err(CredentialError::from)
}

#[async_trait]
impl CredentialService for JwtCredentialService {
    fn authenticate(&self, authorization: Option<&str>) -> Result<Principal, CredentialError> {
        let token = authorization
            .and_then(bearer_token)
            .ok_or(CredentialError::MissingCredentials)?;

        let claims = validate_access_token(token, &self.secret)
            .map_err(|e| CredentialError::InvalidToken(e.to_string()))?;

        Ok(Principal::new(claims.sub))
    }

    fn issue_access_token(&self, user_id: Uuid) -> Result<String, CredentialError> {
        let claims = Claims::with_expiration(user_id, TokenType::Access, self.access_ttl);
        Ok(create_token(&claims, &self.secret)?)
    }

    fn issue_reset_token(&self, user_id: Uuid) -> Result<String, CredentialError> {
        let claims = Claims::new(user_id, TokenType::PasswordReset);
        Ok(create_token(&claims, &self.secret)?)
    }

    async fn create_credential(
        &self,
        tx: &mut dyn StoreTransaction,
        user_id: Uuid,
        password: &str,
    ) -> Result<(), CredentialError> {
        self.store_password(tx, user_id, password).await
    }

    async fn verify_password(
        &self,
        tx: &mut dyn StoreTransaction,
        user_id: Uuid,
        password: &str,
    ) -> Result<bool, CredentialError> {
        match tx.find_credential(user_id).await? {
            Some(credential) => {
                verify_blocking(password.to_string(), credential.password_hash).await
            }
            None => Ok(false),
        }
    }

    async fn reset_password(
        &self,
        tx: &mut dyn StoreTransaction,
        user_id: Uuid,
        reset_token: &str,
        new_password: &str,
    ) -> Result<(), CredentialError> {
        validate_reset_token(reset_token, &self.secret, user_id)
            .map_err(|e| CredentialError::InvalidResetToken(e.to_string()))?;

        self.store_password(tx, user_id, new_password).await?;

        tracing::info!(user_id = %user_id, "Password reset");
        Ok(())
    }

    async fn delete_credential(
        &self,
        tx: &mut dyn StoreTransaction,
        user_id: Uuid,
    ) -> Result<bool, CredentialError> {
        Ok(tx.remove_credential(user_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::{CreateUser, User};
    use crate::store::memory::MemoryStore;
    use crate::store::EntityStore;

    const SECRET: &str = "test-secret-key-at-least-32-bytes-long";

    fn service() -> JwtCredentialService {
        JwtCredentialService::new(SECRET, Duration::hours(1))
    }

    async fn seed_user(store: &MemoryStore) -> Uuid {
        let user = User::new(CreateUser {
            first_name: None,
            last_name: None,
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            phone_number: None,
        });
        let mut tx = store.begin().await.unwrap();
        tx.insert_user(&user).await.unwrap();
        tx.commit().await.unwrap();
        user.id
    }

    #[test]
    fn test_authenticate_round_trip() {
        let service = service();
        let user_id = Uuid::new_v4();
        let token = service.issue_access_token(user_id).unwrap();

        let principal = service
            .authenticate(Some(&format!("Bearer {}", token)))
            .unwrap();
        assert_eq!(principal.user_id, user_id);
    }

    #[test]
    fn test_authenticate_without_header() {
        assert!(matches!(
            service().authenticate(None),
            Err(CredentialError::MissingCredentials)
        ));
        assert!(matches!(
            service().authenticate(Some("Basic abc")),
            Err(CredentialError::MissingCredentials)
        ));
    }

    #[test]
    fn test_authenticate_rejects_reset_token() {
        let service = service();
        let token = service.issue_reset_token(Uuid::new_v4()).unwrap();

        assert!(matches!(
            service.authenticate(Some(&format!("Bearer {}", token))),
            Err(CredentialError::InvalidToken(_))
        ));
    }

    #[test]
    fn test_authenticate_rejects_foreign_signature() {
        let other = JwtCredentialService::new("another-secret-key-at-least-32-bytes", Duration::hours(1));
        let token = other.issue_access_token(Uuid::new_v4()).unwrap();

        assert!(matches!(
            service().authenticate(Some(&format!("Bearer {}", token))),
            Err(CredentialError::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn test_password_lifecycle() {
        let store = MemoryStore::new();
        let user_id = seed_user(&store).await;
        let service = service();

        let mut tx = store.begin().await.unwrap();
        service
            .create_credential(tx.as_mut(), user_id, "Password123")
            .await
            .unwrap();
        assert!(service
            .verify_password(tx.as_mut(), user_id, "Password123")
            .await
            .unwrap());
        assert!(!service
            .verify_password(tx.as_mut(), user_id, "Wrong123")
            .await
            .unwrap());

        let token = service.issue_reset_token(user_id).unwrap();
        service
            .reset_password(tx.as_mut(), user_id, &token, "NewPass456")
            .await
            .unwrap();
        assert!(service
            .verify_password(tx.as_mut(), user_id, "NewPass456")
            .await
            .unwrap());

        assert!(service.delete_credential(tx.as_mut(), user_id).await.unwrap());
        assert!(!service
            .verify_password(tx.as_mut(), user_id, "NewPass456")
            .await
            .unwrap());
    }

    #[tokio::test]
    async fn test_reset_requires_token_for_same_user() {
        let store = MemoryStore::new();
        let user_id = seed_user(&store).await;
        let service = service();

        let mut tx = store.begin().await.unwrap();
        service
            .create_credential(tx.as_mut(), user_id, "Password123")
            .await
            .unwrap();

        let foreign = service.issue_reset_token(Uuid::new_v4()).unwrap();
        let result = service
            .reset_password(tx.as_mut(), user_id, &foreign, "NewPass456")
            .await;
        assert!(matches!(result, Err(CredentialError::InvalidResetToken(_))));

        let access = service.issue_access_token(user_id).unwrap();
        let result = service
            .reset_password(tx.as_mut(), user_id, &access, "NewPass456")
            .await;
        assert!(matches!(result, Err(CredentialError::InvalidResetToken(_))));

        assert!(service
            .verify_password(tx.as_mut(), user_id, "Password123")
            .await
            .unwrap());
    }
}
