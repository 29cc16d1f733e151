//! User account and login session models.

use serde::{Deserialize, Serialize};
use sqlx::{FromRow, SqlitePool};

use super::common::now_timestamp;
use crate::crypto::{hash_token, verify_password};

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserAccount {
    pub id: i64,
    pub email: String,
    pub phone: String,
    pub name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub bank_name: String,
    pub account_no: String,
    pub billing_address: String,
    pub created_at: String,
}

/// Account as exposed to clients (no credential material)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub phone: String,
    pub bank_name: String,
    pub account_no: String,
    pub billing_address: String,
}

impl From<UserAccount> for UserResponse {
    fn from(user: UserAccount) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            phone: user.phone,
            bank_name: user.bank_name,
            account_no: user.account_no,
            billing_address: user.billing_address,
        }
    }
}

/// Validated signup data ready to be stored
#[derive(Debug, Clone)]
pub struct NewUserAccount {
    pub email: String,
    pub phone: String,
    pub name: String,
    pub password_hash: String,
    pub bank_name: String,
    pub account_no: String,
    pub billing_address: String,
}

impl UserAccount {
    pub async fn find_by_id(db: &SqlitePool, id: i64) -> Result<Option<UserAccount>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM userDetails WHERE id = ?")
            .bind(id)
            .fetch_optional(db)
            .await
    }

    pub async fn find_by_email(
        db: &SqlitePool,
        email: &str,
    ) -> Result<Option<UserAccount>, sqlx::Error> {
        sqlx::query_as("SELECT * FROM userDetails WHERE email = ?")
            .bind(email)
            .fetch_optional(db)
            .await
    }

    /// Look up an account by email and check the password against its hash
    pub async fn find_by_credentials(
        db: &SqlitePool,
        email: &str,
        password: &str,
    ) -> Result<Option<UserAccount>, sqlx::Error> {
        let user = Self::find_by_email(db, email).await?;
        Ok(user.filter(|u| verify_password(password, &u.password_hash)))
    }

    /// Insert a new account. Returns `None` if the email is already registered.
    pub async fn insert(
        db: &SqlitePool,
        account: &NewUserAccount,
    ) -> Result<Option<UserAccount>, sqlx::Error> {
        let result = sqlx::query(
            r#"
            INSERT INTO userDetails (email, phone, name, password_hash, bank_name, account_no, billing_address, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&account.email)
        .bind(&account.phone)
        .bind(&account.name)
        .bind(&account.password_hash)
        .bind(&account.bank_name)
        .bind(&account.account_no)
        .bind(&account.billing_address)
        .bind(now_timestamp())
        .execute(db)
        .await;

        match result {
            Ok(done) => Self::find_by_id(db, done.last_insert_rowid()).await,
            Err(e) if crate::db::is_unique_violation(&e, "userDetails", "email") => Ok(None),
            Err(e) => Err(e),
        }
    }
}

/// Server-side record of a logged-in browser or API client
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LoginSession {
    pub id: String,
    pub user_id: i64,
    pub token_hash: String,
    pub expires_at: String,
    pub created_at: String,
}

impl LoginSession {
    /// Store a session for `token`, valid for `ttl_hours`
    pub async fn create(
        db: &SqlitePool,
        user_id: i64,
        token: &str,
        ttl_hours: i64,
    ) -> Result<LoginSession, sqlx::Error> {
        let expires_at = chrono::TimeDelta::try_hours(ttl_hours)
            .and_then(|ttl| chrono::Utc::now().checked_add_signed(ttl))
            .ok_or_else(|| {
                sqlx::Error::Configuration(
                    format!("session lifetime of {} hours is out of range", ttl_hours).into(),
                )
            })?
            .to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        let session = LoginSession {
            id: uuid::Uuid::new_v4().to_string(),
            user_id,
            token_hash: hash_token(token),
            expires_at,
            created_at: now_timestamp(),
        };

        sqlx::query(
            "INSERT INTO loginSessions (id, user_id, token_hash, expires_at, created_at) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&session.id)
        .bind(session.user_id)
        .bind(&session.token_hash)
        .bind(&session.expires_at)
        .bind(&session.created_at)
        .execute(db)
        .await?;

        Ok(session)
    }

    /// Resolve an unexpired token to its account
    pub async fn find_user_by_token(
        db: &SqlitePool,
        token: &str,
    ) -> Result<Option<UserAccount>, sqlx::Error> {
        sqlx::query_as(
            r#"
            SELECT u.* FROM userDetails u
            JOIN loginSessions s ON s.user_id = u.id
            WHERE s.token_hash = ? AND s.expires_at > ?
            "#,
        )
        .bind(hash_token(token))
        .bind(now_timestamp())
        .fetch_optional(db)
        .await
    }

    /// Delete the session for `token`. Returns whether one existed.
    pub async fn revoke(db: &SqlitePool, token: &str) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM loginSessions WHERE token_hash = ?")
            .bind(hash_token(token))
            .execute(db)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn purge_expired(db: &SqlitePool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM loginSessions WHERE expires_at <= ?")
            .bind(now_timestamp())
            .execute(db)
            .await?;
        Ok(result.rows_affected())
    }
}
