/// Authentication and authorization
///
/// # Modules
///
/// - [`password`]: Argon2id password hashing and strength rules
/// - [`jwt`]: JWT access and password reset tokens
/// - [`principal`]: The authenticated caller and bearer header parsing
/// - [`credentials`]: Credential service combining the above with storage
/// - [`ownership`]: Per-record ownership checks
///
/// # Security Features
///
/// - **Password Hashing**: Argon2id with 64 MB memory, 3 iterations
/// - **JWT Tokens**: HS256 signing, typed claims so reset tokens never
///   authenticate a request
/// - **Ownership**: Every read and write is gated on the owning task's user
///
/// # Example
///
/// ```no_run
/// use taskmate_shared::auth::password::{hash_password, verify_password};
/// use taskmate_shared::auth::jwt::{create_token, Claims, TokenType};
/// use uuid::Uuid;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let hash = hash_password("Password123")?;
/// assert!(verify_password("Password123", &hash)?);
///
/// let claims = Claims::new(Uuid::new_v4(), TokenType::Access);
/// let token = create_token(&claims, "secret-key")?;
/// # let _ = token;
/// # Ok(())
/// # }
/// ```

pub mod credentials;
pub mod jwt;
pub mod ownership;
pub mod password;
pub mod principal;
