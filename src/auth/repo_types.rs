use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

pub const DEFAULT_BIO: &str = "I am a new user.";

/// Authorization tier of an account.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

/// User record in the credential store.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct User {
    pub id: Uuid,                   // unique user ID
    pub name: String,               // display name
    pub email: String,              // lower-cased login key
    #[serde(skip_serializing)]
    pub password_hash: String,      // Argon2 hash, not exposed in JSON
    pub role: Role,
    pub photo: String,
    pub bio: String,
    pub is_verified: bool,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// Fields needed to insert a user. The id is chosen by the caller.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

impl NewUser {
    pub fn into_user(self, now: OffsetDateTime) -> User {
        User {
            id: self.id,
            name: self.name,
            email: self.email,
            password_hash: self.password_hash,
            role: self.role,
            photo: String::new(),
            bio: DEFAULT_BIO.to_string(),
            is_verified: false,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Self-service profile changes. Role, email and password are not reachable here.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub bio: Option<String>,
    pub photo: Option<String>,
}

impl ProfilePatch {
    /// Absent and empty fields keep the current value; any other string,
    /// whitespace included, replaces it.
    pub fn apply(self, user: &mut User) {
        fn set(target: &mut String, value: Option<String>) {
            if let Some(v) = value.filter(|v| !v.is_empty()) {
                *target = v;
            }
        }
        set(&mut user.name, self.name);
        set(&mut user.bio, self.bio);
        set(&mut user.photo, self.photo);
    }
}
