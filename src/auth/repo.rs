use std::collections::HashMap;

use axum::async_trait;
use sqlx::PgPool;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::auth::repo_types::{NewUser, User};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("email already registered")]
    Conflict,
    #[error("user not found")]
    NotFound,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Persistence for user records. Emails are expected lower-cased by callers.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError>;
    /// Fails with `Conflict` if the email is taken.
    async fn create(&self, new: NewUser) -> Result<User, StoreError>;
    /// Persists mutable fields and returns the stored record.
    async fn save(&self, user: &User) -> Result<User, StoreError>;
    /// Returns false when no record matched.
    async fn delete_by_id(&self, id: Uuid) -> Result<bool, StoreError>;
}

const USER_COLUMNS: &str =
    "id, name, email, password_hash, role, photo, bio, is_verified, created_at, updated_at";

pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE lower(email) = lower($1)"
        ))
        .bind(email)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }

    async fn create(&self, new: NewUser) -> Result<User, StoreError> {
        let row = new.into_user(OffsetDateTime::now_utc());
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users ({USER_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(row.id)
        .bind(&row.name)
        .bind(&row.email)
        .bind(&row.password_hash)
        .bind(row.role)
        .bind(&row.photo)
        .bind(&row.bio)
        .bind(row.is_verified)
        .bind(row.created_at)
        .bind(row.updated_at)
        .fetch_one(&self.db)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => StoreError::Conflict,
            other => StoreError::Database(other),
        })?;
        Ok(user)
    }

    async fn save(&self, user: &User) -> Result<User, StoreError> {
        let saved = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET name = $2, password_hash = $3, role = $4, photo = $5, bio = $6,
                is_verified = $7, updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(user.id)
        .bind(&user.name)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(&user.photo)
        .bind(&user.bio)
        .bind(user.is_verified)
        .fetch_optional(&self.db)
        .await?;
        saved.ok_or(StoreError::NotFound)
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

/// In-process store used when no database is configured, and in tests.
#[derive(Default)]
pub struct MemoryUserStore {
    users: RwLock<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, StoreError> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn create(&self, new: NewUser) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&new.email))
            || users.contains_key(&new.id)
        {
            return Err(StoreError::Conflict);
        }
        let user = new.into_user(OffsetDateTime::now_utc());
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn save(&self, user: &User) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        let stored = users.get_mut(&user.id).ok_or(StoreError::NotFound)?;
        stored.name = user.name.clone();
        stored.password_hash = user.password_hash.clone();
        stored.role = user.role;
        stored.photo = user.photo.clone();
        stored.bio = user.bio.clone();
        stored.is_verified = user.is_verified;
        stored.updated_at = OffsetDateTime::now_utc();
        Ok(stored.clone())
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<bool, StoreError> {
        Ok(self.users.write().await.remove(&id).is_some())
    }
}
