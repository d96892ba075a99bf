use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{AuthResponse, LoginRequest, MessageResponse, PublicUser, RegisterRequest},
        extractors::AuthUser,
        repo_types::ProfilePatch,
        services, session,
    },
    error::ApiResult,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/logout", get(logout))
        .route("/login-status", get(login_status))
}

pub fn user_routes() -> Router<AppState> {
    Router::new().route("/user", get(get_user).patch(update_user))
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, HeaderMap, Json<AuthResponse>)> {
    let Json(payload) = payload?;
    let registration = payload.validate()?;

    let (user, token, headers) = services::register(&state, registration).await?;

    Ok((
        StatusCode::CREATED,
        headers,
        Json(AuthResponse {
            user: user.into(),
            token,
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<(HeaderMap, Json<AuthResponse>)> {
    let Json(payload) = payload?;
    let credentials = payload.validate()?;

    let (user, token) = services::login(&state, credentials).await?;

    let mut headers = HeaderMap::new();
    session::attach(&mut headers, &state.config, &token)?;
    Ok((
        headers,
        Json(AuthResponse {
            user: user.into(),
            token,
        }),
    ))
}

/// Clears the cookie only; a copied token stays valid until it expires.
#[instrument(skip(state))]
pub async fn logout(
    State(state): State<AppState>,
) -> ApiResult<(HeaderMap, Json<MessageResponse>)> {
    let mut headers = HeaderMap::new();
    session::clear(&mut headers, &state.config)?;
    Ok((headers, Json(MessageResponse::new("User logged out"))))
}

#[instrument(skip(state, headers))]
pub async fn login_status(State(state): State<AppState>, headers: HeaderMap) -> Json<bool> {
    let token = session::extract(&headers, &state.config);
    Json(services::is_logged_in(&state, token.as_deref()))
}

#[instrument(skip_all)]
pub async fn get_user(AuthUser(user): AuthUser) -> Json<PublicUser> {
    Json(user.into())
}

#[instrument(skip_all)]
pub async fn update_user(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    payload: Result<Json<ProfilePatch>, JsonRejection>,
) -> ApiResult<Json<PublicUser>> {
    let Json(patch) = payload?;
    let updated = services::update_profile(&state, user, patch).await?;
    Ok(Json(updated.into()))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request},
        Router,
    };
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::{app::build_app, state::AppState};

    use super::*;

    async fn call(app: &Router, req: Request<Body>) -> (StatusCode, HeaderMap, Value) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if body.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body).unwrap()
        };
        (status, headers, json)
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_with_cookie(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().method("GET").uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::COOKIE, format!("token={token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    async fn register_rona(app: &Router) -> (Value, String) {
        let (status, headers, body) = call(
            app,
            post_json(
                "/api/v1/register",
                json!({"name": "Rona", "email": "rona@x.com", "password": "secret1"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert!(headers.get(header::SET_COOKIE).is_some());
        let token = body["token"].as_str().unwrap().to_string();
        (body, token)
    }

    #[tokio::test]
    async fn register_returns_public_profile_and_cookie() {
        let state = AppState::fake();
        let app = build_app(state.clone());
        let (body, token) = register_rona(&app).await;

        assert_eq!(body["name"], "Rona");
        assert_eq!(body["email"], "rona@x.com");
        assert_eq!(body["role"], "user");
        assert_eq!(body["isVerified"], false);
        assert!(body.get("passwordHash").is_none());
        assert!(body.get("password_hash").is_none());
        assert!(!token.is_empty());
        assert!(state.store.find_by_email("rona@x.com").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn register_with_short_password_persists_nothing() {
        let state = AppState::fake();
        let app = build_app(state.clone());
        let (status, _, body) = call(
            &app,
            post_json(
                "/api/v1/register",
                json!({"name": "Rona", "email": "rona@x.com", "password": "12345"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Password must be at least 6 characters");
        assert!(state.store.find_by_email("rona@x.com").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn register_with_missing_field_is_bad_request() {
        let app = build_app(AppState::fake());
        let (status, _, body) = call(
            &app,
            post_json("/api/v1/register", json!({"email": "rona@x.com", "password": "secret1"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "All fields are required");
    }

    #[tokio::test]
    async fn malformed_json_is_bad_request() {
        let app = build_app(AppState::fake());
        let req = Request::builder()
            .method("POST")
            .uri("/api/v1/login")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, _, body) = call(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["message"].is_string());
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let app = build_app(AppState::fake());
        register_rona(&app).await;
        let (status, _, body) = call(
            &app,
            post_json(
                "/api/v1/register",
                json!({"name": "Other", "email": "RONA@x.com", "password": "secret2"}),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["message"], "User already exists");
    }

    #[tokio::test]
    async fn login_roundtrip_and_failures() {
        let app = build_app(AppState::fake());
        let (registered, _) = register_rona(&app).await;

        let (status, headers, body) = call(
            &app,
            post_json("/api/v1/login", json!({"email": "rona@x.com", "password": "secret1"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], registered["id"]);
        let cookie = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.contains("HttpOnly"));

        let (status, _, body) = call(
            &app,
            post_json("/api/v1/login", json!({"email": "rona@x.com", "password": "wrong"})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid credentials");

        let (status, _, _) = call(
            &app,
            post_json("/api/v1/login", json!({"email": "ghost@x.com", "password": "secret1"})),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn logout_clears_cookie_but_token_stays_valid() {
        let app = build_app(AppState::fake());
        let (_, token) = register_rona(&app).await;

        let (status, headers, body) = call(&app, get_with_cookie("/api/v1/logout", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "User logged out");
        let cleared = headers.get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cleared.contains("Max-Age=0"));

        let (status, _, body) = call(&app, get_with_cookie("/api/v1/login-status", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::Bool(false));

        // no server-side revocation
        let (_, _, body) = call(&app, get_with_cookie("/api/v1/login-status", Some(&token))).await;
        assert_eq!(body, Value::Bool(true));
    }

    #[tokio::test]
    async fn login_status_with_bad_token_is_false() {
        let app = build_app(AppState::fake());
        let (status, _, body) =
            call(&app, get_with_cookie("/api/v1/login-status", Some("forged.token.value"))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::Bool(false));
    }

    #[tokio::test]
    async fn profile_requires_session() {
        let app = build_app(AppState::fake());
        let (status, _, body) = call(&app, get_with_cookie("/api/v1/user", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Not authorized, please login!");

        let (status, _, _) = call(&app, get_with_cookie("/api/v1/user", Some("nope"))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn update_profile_changes_only_allowed_fields() {
        let app = build_app(AppState::fake());
        let (registered, token) = register_rona(&app).await;

        let req = Request::builder()
            .method("PATCH")
            .uri("/api/v1/user")
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::COOKIE, format!("token={token}"))
            .body(Body::from(
                json!({"bio": "new bio", "role": "admin", "email": "evil@x.com"}).to_string(),
            ))
            .unwrap();
        let (status, _, body) = call(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["bio"], "new bio");
        assert_eq!(body["name"], "Rona");
        assert_eq!(body["email"], "rona@x.com");
        assert_eq!(body["role"], "user");

        let (status, _, body) = call(&app, get_with_cookie("/api/v1/user", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["id"], registered["id"]);
        assert_eq!(body["bio"], "new bio");
    }

    #[tokio::test]
    async fn bearer_header_is_accepted() {
        let app = build_app(AppState::fake());
        let (_, token) = register_rona(&app).await;
        let req = Request::builder()
            .method("GET")
            .uri("/api/v1/user")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .body(Body::empty())
            .unwrap();
        let (status, _, body) = call(&app, req).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["email"], "rona@x.com");
    }
}
