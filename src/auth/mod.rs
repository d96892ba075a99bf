use crate::state::AppState;
use axum::Router;

mod claims;
mod dto;
pub(crate) mod extractors;
pub mod handlers;
pub(crate) mod jwt;
mod password;
pub mod repo;
pub mod repo_types;
pub mod services;
pub(crate) mod session;

pub use dto::MessageResponse;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::auth_routes())
        .merge(handlers::user_routes())
}
