use axum::{extract::FromRef, http::HeaderMap};
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    auth::{
        dto::{normalize_email, Credentials, Registration},
        jwt::JwtKeys,
        password::{hash_password_blocking, verify_password_blocking},
        repo_types::{NewUser, ProfilePatch, Role, User},
        session,
    },
    config::AdminSeed,
    error::AppError,
    state::AppState,
};

/// Creates the account, mints its token and builds the session cookie. Token
/// and cookie are produced before the insert so a failure in either leaves
/// nothing persisted.
pub async fn register(
    state: &AppState,
    reg: Registration,
) -> Result<(User, String, HeaderMap), AppError> {
    if state.store.find_by_email(&reg.email).await?.is_some() {
        warn!(email = %reg.email, "email already registered");
        return Err(AppError::Conflict("User already exists".into()));
    }

    let password_hash = hash_password_blocking(state.config.password.clone(), reg.password).await?;

    let id = Uuid::new_v4();
    let token = JwtKeys::from_ref(state).sign(id)?;
    let mut headers = HeaderMap::new();
    session::attach(&mut headers, &state.config, &token)?;

    let user = state
        .store
        .create(NewUser {
            id,
            name: reg.name,
            email: reg.email,
            password_hash,
            role: Role::User,
        })
        .await?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok((user, token, headers))
}

pub async fn login(state: &AppState, creds: Credentials) -> Result<(User, String), AppError> {
    let Some(user) = state.store.find_by_email(&creds.email).await? else {
        warn!(email = %creds.email, "login unknown email");
        return Err(AppError::NotFound("User not found, sign up!".into()));
    };

    if !verify_password_blocking(creds.password, user.password_hash.clone()).await? {
        warn!(user_id = %user.id, "login invalid password");
        return Err(AppError::BadRequest("Invalid credentials".into()));
    }

    let token = JwtKeys::from_ref(state).sign(user.id)?;
    info!(user_id = %user.id, "user logged in");
    Ok((user, token))
}

pub async fn update_profile(
    state: &AppState,
    mut user: User,
    patch: ProfilePatch,
) -> Result<User, AppError> {
    patch.apply(&mut user);
    let saved = state.store.save(&user).await?;
    info!(user_id = %saved.id, "profile updated");
    Ok(saved)
}

/// Whether the request carries a token that still verifies. The user record
/// is not consulted.
pub fn is_logged_in(state: &AppState, token: Option<&str>) -> bool {
    token
        .map(|t| JwtKeys::from_ref(state).verify(t).is_ok())
        .unwrap_or(false)
}

/// Makes sure the configured admin account exists with the admin role.
pub async fn seed_admin(state: &AppState, seed: &AdminSeed) -> anyhow::Result<User> {
    let email = normalize_email(&seed.email);
    if let Some(mut user) = state.store.find_by_email(&email).await? {
        if user.role == Role::Admin {
            return Ok(user);
        }
        user.role = Role::Admin;
        let user = state.store.save(&user).await?;
        info!(user_id = %user.id, "existing user promoted to admin");
        return Ok(user);
    }

    let password_hash =
        hash_password_blocking(state.config.password.clone(), seed.password.clone()).await?;
    let user = state
        .store
        .create(NewUser {
            id: Uuid::new_v4(),
            name: seed.name.clone(),
            email,
            password_hash,
            role: Role::Admin,
        })
        .await?;
    info!(user_id = %user.id, "admin account created");
    Ok(user)
}
