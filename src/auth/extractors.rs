use axum::{async_trait, extract::FromRef, extract::FromRequestParts, http::request::Parts};
use tracing::warn;

use super::{
    jwt::JwtKeys,
    repo_types::{Role, User},
    session,
};
use crate::{error::AppError, state::AppState};

/// Requires a valid session and resolves it to a stored user.
pub struct AuthUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session::extract(&parts.headers, &state.config)
            .ok_or_else(|| AppError::Unauthorized("Not authorized, please login!".into()))?;

        let claims = JwtKeys::from_ref(state).verify(&token).map_err(|e| {
            warn!(error = %e, "rejected session token");
            AppError::Unauthorized("Not authorized, token failed!".into())
        })?;

        let user = state.store.find_by_id(claims.sub).await?.ok_or_else(|| {
            warn!(user_id = %claims.sub, "session for unknown user");
            AppError::Unauthorized("Not authorized, please login!".into())
        })?;

        Ok(AuthUser(user))
    }
}

/// `AuthUser` that must also hold the admin role.
pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthUser(user) = AuthUser::from_request_parts(parts, state).await?;
        if user.role != Role::Admin {
            warn!(user_id = %user.id, "admin route denied");
            return Err(AppError::Forbidden("Only admins can do this!".into()));
        }
        Ok(AdminUser(user))
    }
}
