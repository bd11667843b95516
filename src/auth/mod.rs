/// Account management:
/// 1. register
/// 2. login / logout
/// 3. cookie sessions
// region:    --- Imports
use crate::database::DatabaseManager;
use crate::listing::model::User;
use crate::query::handlers as query;
use chrono::Utc;
use serde::Deserialize;
use std::fmt;
use tracing::{info, warn};
use uuid::Uuid;
// endregion: --- Imports

pub mod session;

// region:    --- Errors

/// Rejections carry the message shown on the re-rendered form; the other
/// variants become a 500 at the handler boundary.
#[derive(Debug)]
pub enum AuthError {
    Rejected(String),
    Database(sqlx::Error),
    Hash(bcrypt::BcryptError),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthError::Rejected(msg) => write!(f, "{}", msg),
            AuthError::Database(e) => write!(f, "database error: {}", e),
            AuthError::Hash(e) => write!(f, "hash error: {}", e),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<sqlx::Error> for AuthError {
    fn from(e: sqlx::Error) -> Self {
        AuthError::Database(e)
    }
}

impl From<bcrypt::BcryptError> for AuthError {
    fn from(e: bcrypt::BcryptError) -> Self {
        AuthError::Hash(e)
    }
}

// endregion: --- Errors

// region:    --- Commands

/// Registration form payload
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterCommand {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirmation: String,
}

/// Login form payload
#[derive(Debug, Clone, Deserialize)]
pub struct LoginCommand {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// 1. Creates an account. The password is stored as a bcrypt hash; a
/// username collision surfaces as a form message, not a raw error.
pub async fn handle_register(
    db_manager: &DatabaseManager,
    cmd: RegisterCommand,
) -> Result<User, AuthError> {
    info!("{:<12} --> register username: {}", "Auth", cmd.username);

    let username = cmd.username.trim().to_string();
    if username.is_empty() || cmd.password.is_empty() {
        return Err(AuthError::Rejected(
            "all fields must be completed.".to_string(),
        ));
    }
    if cmd.password != cmd.confirmation {
        return Err(AuthError::Rejected("Passwords must match.".to_string()));
    }

    let password_hash = bcrypt::hash(&cmd.password, bcrypt::DEFAULT_COST)?;
    let email = cmd.email.trim().to_string();

    let result = db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, User>(
                    "INSERT INTO users (username, email, password_hash, created_at)
                     VALUES ($1, $2, $3, $4)
                     RETURNING id, username, email, password_hash, created_at",
                )
                .bind(&username)
                .bind(&email)
                .bind(&password_hash)
                .bind(Utc::now())
                .fetch_one(&mut **tx)
                .await
            })
        })
        .await;

    match result {
        Ok(user) => Ok(user),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            warn!("{:<12} --> duplicate username at registration", "Auth");
            Err(AuthError::Rejected("Username already taken.".to_string()))
        }
        Err(e) => Err(AuthError::Database(e)),
    }
}

/// 2. Verifies credentials. Unknown username and wrong password produce
/// the same message.
pub async fn handle_login(
    db_manager: &DatabaseManager,
    cmd: LoginCommand,
) -> Result<User, AuthError> {
    info!("{:<12} --> login username: {}", "Auth", cmd.username);

    let user = query::get_user_by_username(db_manager, cmd.username.trim()).await?;
    if let Some(user) = user {
        if bcrypt::verify(&cmd.password, &user.password_hash)? {
            return Ok(user);
        }
    }
    warn!("{:<12} --> failed login for: {}", "Auth", cmd.username);
    Err(AuthError::Rejected(
        "Invalid username and/or password.".to_string(),
    ))
}

/// 3a. Opens a session and returns its token.
pub async fn create_session(
    db_manager: &DatabaseManager,
    user_id: i64,
) -> Result<String, sqlx::Error> {
    let token = Uuid::new_v4().to_string();
    let stored = token.clone();
    let result: Result<(), sqlx::Error> = db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query("INSERT INTO sessions (token, user_id, created_at) VALUES ($1, $2, $3)")
                    .bind(&stored)
                    .bind(user_id)
                    .bind(Utc::now())
                    .execute(&mut **tx)
                    .await
                    .map(|_| ())
            })
        })
        .await;
    result?;
    Ok(token)
}

/// 3b. Discards a session. Unknown tokens are ignored.
pub async fn delete_session(
    db_manager: &DatabaseManager,
    token: &str,
) -> Result<(), sqlx::Error> {
    let token = token.to_string();
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query("DELETE FROM sessions WHERE token = $1")
                    .bind(&token)
                    .execute(&mut **tx)
                    .await
                    .map(|_| ())
            })
        })
        .await
}

// endregion: --- Commands
