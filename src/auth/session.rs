//! Session transport: the signed token travels in an http-only cookie.

use anyhow::Context;
use axum::http::{
    header::{AUTHORIZATION, COOKIE, SET_COOKIE},
    HeaderMap, HeaderValue,
};
use cookie::{time::Duration, Cookie, SameSite};

use crate::config::AppConfig;

fn base_cookie(config: &AppConfig, value: String) -> Cookie<'static> {
    Cookie::build((config.session.cookie_name.clone(), value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Strict)
        .secure(config.session.secure)
        .build()
}

/// Appends a `Set-Cookie` carrying `token` for the token's lifetime.
pub fn attach(headers: &mut HeaderMap, config: &AppConfig, token: &str) -> anyhow::Result<()> {
    let mut cookie = base_cookie(config, token.to_owned());
    cookie.set_max_age(Duration::days(config.jwt.ttl_days));
    let value = HeaderValue::from_str(&cookie.to_string()).context("build session cookie")?;
    headers.append(SET_COOKIE, value);
    Ok(())
}

/// Appends a `Set-Cookie` that expires the session cookie immediately.
pub fn clear(headers: &mut HeaderMap, config: &AppConfig) -> anyhow::Result<()> {
    let mut cookie = base_cookie(config, String::new());
    cookie.make_removal();
    let value = HeaderValue::from_str(&cookie.to_string()).context("build removal cookie")?;
    headers.append(SET_COOKIE, value);
    Ok(())
}

/// Reads the session token from the cookie, falling back to a bearer header.
/// Absence is not an error; callers decide whether a session is required.
pub fn extract(headers: &HeaderMap, config: &AppConfig) -> Option<String> {
    extract_from_cookie(headers, &config.session.cookie_name).or_else(|| extract_bearer(headers))
}

fn extract_from_cookie(headers: &HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| Cookie::parse(pair.trim()).ok())
        .find(|c| c.name() == name && !c.value().is_empty())
        .map(|c| c.value().to_string())
}

fn extract_bearer(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?.trim();
    let token = value
        .strip_prefix("Bearer ")
        .or_else(|| value.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}
