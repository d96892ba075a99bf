use axum::{
    extract::{rejection::PathRejection, Path, State},
    routing::delete,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::{extractors::AdminUser, MessageResponse},
    error::{ApiResult, AppError},
    state::AppState,
};

pub fn admin_routes() -> Router<AppState> {
    Router::new().route("/admin/users/:id", delete(delete_user))
}

/// Admins may delete any account, their own included.
#[instrument(skip_all)]
pub async fn delete_user(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Json<MessageResponse>> {
    let Path(id) = id?;
    if !state.store.delete_by_id(id).await? {
        return Err(AppError::NotFound("User not found".into()));
    }
    info!(admin_id = %admin.id, user_id = %id, "user deleted");
    Ok(Json(MessageResponse::new("User deleted successfully")))
}
