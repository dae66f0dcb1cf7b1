/// Account operations
///
/// Registration and login are the only operations that run without a
/// principal. Everything else acts on the principal's own account.
///
/// # Password change
///
/// Driven by which of the three password fields the caller supplied
/// (blank counts as not supplied):
///
/// | old | new | outcome                                                  |
/// |-----|-----|----------------------------------------------------------|
/// | -   | -   | nothing to change, `date_modified` still advances        |
/// | -   | yes | `ValidationFailed`: old password required                |
/// | yes | any | old must verify and differ from new                      |
/// | any | yes | new must equal confirmation and pass the strength rules  |
/// | yes | yes | credential replaced through a one-shot reset token       |

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use super::{finish, validate};
use crate::auth::credentials::CredentialService;
use crate::auth::ownership::require_principal;
use crate::auth::password::validate_password_strength;
use crate::auth::principal::Principal;
use crate::cascade::{cascade_user, CascadeReport};
use crate::error::{ServiceError, ServiceResult};
use crate::models::supplied;
use crate::models::user::{CreateUser, EditUser, User};
use crate::models::EntityKind;
use crate::store::{EntityStore, StoreTransaction};

/// Input for registering an account
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Registration {
    #[serde(flatten)]
    #[validate(nested)]
    pub user: CreateUser,

    pub password: String,
}

/// Username or email plus password
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct Login {
    #[validate(length(min = 1, message = "Login is required"))]
    pub login: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

/// Password change request
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChangePassword {
    pub old_password: Option<String>,
    pub new_password: Option<String>,
    pub confirm_new_password: Option<String>,
}

/// An authenticated account and its access token
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub user: User,
    pub access_token: String,
}

/// Creates a user and its credential in one transaction
pub async fn register(
    store: &dyn EntityStore,
    credentials: &dyn CredentialService,
    data: Registration,
) -> ServiceResult<Session> {
    validate(&data)?;
    validate_password_strength(&data.password).map_err(ServiceError::validation)?;

    let mut tx = store.begin().await?;
    let outcome = register_in(tx.as_mut(), credentials, data).await;
    let user = finish(tx, outcome).await?;

    tracing::info!(user_id = %user.id, username = %user.username, "User registered");

    let access_token = credentials.issue_access_token(user.id)?;
    Ok(Session { user, access_token })
}

async fn register_in(
    tx: &mut dyn StoreTransaction,
    credentials: &dyn CredentialService,
    data: Registration,
) -> ServiceResult<User> {
    ensure_login_free(tx, None, &data.user.username, &data.user.email).await?;

    let user = User::new(data.user);
    tx.insert_user(&user).await?;
    credentials
        .create_credential(tx, user.id, &data.password)
        .await?;

    Ok(user)
}

/// Fails when another user already holds the username or email
async fn ensure_login_free(
    tx: &mut dyn StoreTransaction,
    current: Option<Uuid>,
    username: &str,
    email: &str,
) -> ServiceResult<()> {
    let taken = |found: Option<User>| found.map_or(false, |u| Some(u.id) != current);

    if taken(tx.find_user_by_username(username).await?) {
        return Err(ServiceError::validation("Username is already taken"));
    }
    if taken(tx.find_user_by_email(email).await?) {
        return Err(ServiceError::validation("Email is already registered"));
    }

    Ok(())
}

/// Exchanges a username or email and password for an access token
///
/// Unknown logins and wrong passwords are indistinguishable.
pub async fn login(
    store: &dyn EntityStore,
    credentials: &dyn CredentialService,
    data: Login,
) -> ServiceResult<Session> {
    validate(&data)?;

    let mut tx = store.begin().await?;
    let outcome = login_in(tx.as_mut(), credentials, &data).await;
    let user = finish(tx, outcome).await?;

    tracing::info!(user_id = %user.id, "User logged in");

    let access_token = credentials.issue_access_token(user.id)?;
    Ok(Session { user, access_token })
}

async fn login_in(
    tx: &mut dyn StoreTransaction,
    credentials: &dyn CredentialService,
    data: &Login,
) -> ServiceResult<User> {
    // Usernames never contain '@', so the login names exactly one lookup
    let found = if data.login.contains('@') {
        tx.find_user_by_email(&data.login).await?
    } else {
        tx.find_user_by_username(&data.login).await?
    };
    let user = match found {
        Some(user) => user,
        None => return Err(ServiceError::Unauthenticated),
    };

    if !credentials
        .verify_password(tx, user.id, &data.password)
        .await?
    {
        tracing::warn!(user_id = %user.id, "Login with wrong password");
        return Err(ServiceError::Unauthenticated);
    }

    Ok(user)
}

/// The principal's own profile
pub async fn get_account(
    store: &dyn EntityStore,
    principal: Option<Principal>,
) -> ServiceResult<User> {
    let principal = require_principal(principal)?;
    let mut tx = store.begin().await?;
    let outcome = load_user(tx.as_mut(), &principal).await;
    finish(tx, outcome).await
}

async fn load_user(tx: &mut dyn StoreTransaction, principal: &Principal) -> ServiceResult<User> {
    tx.find_user(principal.user_id)
        .await?
        .ok_or_else(|| ServiceError::not_found(EntityKind::User, principal.user_id))
}

/// Updates the supplied, non-blank profile fields
pub async fn edit_account(
    store: &dyn EntityStore,
    principal: Option<Principal>,
    edit: EditUser,
) -> ServiceResult<User> {
    let principal = require_principal(principal)?;
    let mut tx = store.begin().await?;
    let outcome = edit_account_in(tx.as_mut(), &principal, edit.without_blanks()).await;
    finish(tx, outcome).await
}

async fn edit_account_in(
    tx: &mut dyn StoreTransaction,
    principal: &Principal,
    edit: EditUser,
) -> ServiceResult<User> {
    let mut user = load_user(tx, principal).await?;
    validate(&edit)?;

    let username = edit.username.as_deref().unwrap_or(&user.username).to_string();
    let email = edit.email.as_deref().unwrap_or(&user.email).to_string();
    if username != user.username || email != user.email {
        ensure_login_free(tx, Some(user.id), &username, &email).await?;
    }

    user.apply_edit(&edit, Utc::now());
    if !tx.save_user(&user).await? {
        return Err(ServiceError::not_found(EntityKind::User, user.id));
    }

    tracing::info!(user_id = %user.id, "Account edited");
    Ok(user)
}

/// Changes the principal's password
pub async fn change_password(
    store: &dyn EntityStore,
    credentials: &dyn CredentialService,
    principal: Option<Principal>,
    request: ChangePassword,
) -> ServiceResult<User> {
    let principal = require_principal(principal)?;
    let mut tx = store.begin().await?;
    let outcome = change_password_in(tx.as_mut(), credentials, &principal, &request).await;
    finish(tx, outcome).await
}

async fn change_password_in(
    tx: &mut dyn StoreTransaction,
    credentials: &dyn CredentialService,
    principal: &Principal,
    request: &ChangePassword,
) -> ServiceResult<User> {
    let mut user = load_user(tx, principal).await?;

    let old = supplied(&request.old_password);
    let new = supplied(&request.new_password);

    if new.is_some() && old.is_none() {
        return Err(ServiceError::validation(
            "Old password is required to set a new password",
        ));
    }

    if let Some(old) = old {
        if !credentials.verify_password(tx, user.id, old).await? {
            return Err(ServiceError::validation("Old password is incorrect"));
        }
        if new == Some(old) {
            return Err(ServiceError::validation(
                "New password must differ from the old password",
            ));
        }
    }

    if let Some(new) = new {
        if request.confirm_new_password.as_deref() != Some(new) {
            return Err(ServiceError::validation("Passwords do not match"));
        }
        validate_password_strength(new).map_err(ServiceError::validation)?;
    }

    if let (Some(_), Some(new)) = (old, new) {
        let reset_token = credentials.issue_reset_token(user.id)?;
        credentials
            .reset_password(tx, user.id, &reset_token, new)
            .await?;
    }

    user.date_modified = Some(Utc::now());
    if !tx.save_user(&user).await? {
        return Err(ServiceError::not_found(EntityKind::User, user.id));
    }

    Ok(user)
}

/// Deletes the principal's account and everything it owns
pub async fn delete_account(
    store: &dyn EntityStore,
    credentials: &dyn CredentialService,
    principal: Option<Principal>,
) -> ServiceResult<CascadeReport> {
    let principal = require_principal(principal)?;
    let mut tx = store.begin().await?;
    let outcome = delete_account_in(tx.as_mut(), credentials, &principal).await;
    let report = finish(tx, outcome).await?;

    tracing::info!(
        user_id = %principal.user_id,
        tasks = report.tasks,
        subtasks = report.subtasks,
        recurrences = report.recurrences,
        attachments = report.attachments,
        "Account deleted"
    );
    Ok(report)
}

async fn delete_account_in(
    tx: &mut dyn StoreTransaction,
    credentials: &dyn CredentialService,
    principal: &Principal,
) -> ServiceResult<CascadeReport> {
    load_user(tx, principal).await?;
    cascade_user(tx, credentials, principal.user_id).await
}
