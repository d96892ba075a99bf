use lazy_static::lazy_static;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth::repo_types::{Role, User};
use crate::error::AppError;

pub const MIN_PASSWORD_LEN: usize = 6;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

pub(crate) fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn required(field: Option<String>) -> Result<String, AppError> {
    field
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| AppError::BadRequest("All fields are required".into()))
}

/// Request body for user registration. Missing fields are reported as 400.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// A registration that passed input validation.
#[derive(Debug)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    pub fn validate(self) -> Result<Registration, AppError> {
        let name = required(self.name)?.trim().to_string();
        let email = normalize_email(&required(self.email)?);
        let password = required(self.password)?;

        if password.chars().count() < MIN_PASSWORD_LEN {
            return Err(AppError::BadRequest(
                "Password must be at least 6 characters".into(),
            ));
        }
        if !is_valid_email(&email) {
            return Err(AppError::BadRequest("Invalid email".into()));
        }
        Ok(Registration {
            name,
            email,
            password,
        })
    }
}

/// Request body for login.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl LoginRequest {
    pub fn validate(self) -> Result<Credentials, AppError> {
        Ok(Credentials {
            email: normalize_email(&required(self.email)?),
            password: required(self.password)?,
        })
    }
}

/// Public part of the user returned to the client.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub photo: String,
    pub bio: String,
    pub is_verified: bool,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            photo: user.photo,
            bio: user.bio,
            is_verified: user.is_verified,
        }
    }
}

/// Response returned after login or register.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    #[serde(flatten)]
    pub user: PublicUser,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(name: &str, email: &str, password: &str) -> RegisterRequest {
        RegisterRequest {
            name: Some(name.into()),
            email: Some(email.into()),
            password: Some(password.into()),
        }
    }

    #[test]
    fn registration_normalizes_email() {
        let reg = register(" Rona ", " Rona@X.com ", "secret1").validate().unwrap();
        assert_eq!(reg.name, "Rona");
        assert_eq!(reg.email, "rona@x.com");
    }

    #[test]
    fn registration_requires_every_field() {
        let err = RegisterRequest {
            name: Some("Rona".into()),
            email: None,
            password: Some("secret1".into()),
        }
        .validate()
        .unwrap_err();
        assert_eq!(err.to_string(), "All fields are required");

        let err = register("  ", "rona@x.com", "secret1").validate().unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn registration_rejects_short_password() {
        let err = register("Rona", "rona@x.com", "12345").validate().unwrap_err();
        assert_eq!(err.to_string(), "Password must be at least 6 characters");
        assert!(register("Rona", "rona@x.com", "123456").validate().is_ok());
    }

    #[test]
    fn registration_rejects_malformed_email() {
        let err = register("Rona", "not-an-email", "secret1").validate().unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn login_requires_both_fields() {
        let err = LoginRequest {
            email: Some("rona@x.com".into()),
            password: None,
        }
        .validate()
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(_)));
    }

    #[test]
    fn auth_response_flattens_profile_in_camel_case() {
        let response = AuthResponse {
            user: PublicUser {
                id: Uuid::new_v4(),
                name: "Rona".into(),
                email: "rona@x.com".into(),
                role: Role::User,
                photo: String::new(),
                bio: "bio".into(),
                is_verified: false,
            },
            token: "t".into(),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["email"], "rona@x.com");
        assert_eq!(json["role"], "user");
        assert_eq!(json["isVerified"], false);
        assert_eq!(json["token"], "t");
        assert!(json.get("password_hash").is_none());
        assert!(json.get("passwordHash").is_none());
    }
}
