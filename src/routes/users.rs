use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use axum_extra::extract::cookie::{Cookie, SameSite};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use serde_json::json;

use crate::auth::password::{hash_password, verify_password};
use crate::error::{ApiError, ApiResult};
use crate::helpers::json_response;
use crate::middleware::auth_guard::extract_token;
use crate::models::user::{create_user, find_user_by_email};
use crate::AppState;

#[derive(Deserialize)]
pub struct Credentials {
    email: Option<String>,
    password: Option<String>,
}

impl Credentials {
    fn require(self) -> ApiResult<(String, String)> {
        match (self.email, self.password) {
            (Some(email), Some(password)) if !email.is_empty() && !password.is_empty() => {
                Ok((email, password))
            }
            _ => Err(ApiError::Validation(
                "Email and password are required.".to_string(),
            )),
        }
    }
}

#[axum::debug_handler]
pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<Credentials>,
) -> ApiResult<Response> {
    let (email, password) = body.require()?;

    if find_user_by_email(&state.db, &email).await?.is_some() {
        return Err(ApiError::Conflict("User already exists.".to_string()));
    }

    let hashed = hash_password(&password).map_err(anyhow::Error::from)?;
    create_user(&state.db, &email, &hashed).await?;

    tracing::info!("Registered user {}", email);
    Ok(json_response!(StatusCode::CREATED, {
        "success": true,
        "message": "User created."
    }))
}

#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(body): Json<Credentials>,
) -> ApiResult<Response> {
    let (email, password) = body.require()?;

    let user = find_user_by_email(&state.db, &email)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found.".to_string()))?;

    let matches = verify_password(&password, &user.hash).map_err(anyhow::Error::from)?;
    if !matches {
        return Err(ApiError::Unauthenticated("Invalid credentials.".to_string()));
    }

    let token = state.tokens.issue(&user.id, &user.email)?;

    let cookie = Cookie::build(("token", token.clone()))
        .path("/")
        .max_age(time::Duration::minutes(state.tokens.ttl_mins()))
        .http_only(true)
        .secure(true)
        .same_site(SameSite::None)
        .build();

    let response = json_response!(StatusCode::OK, {
        "success": true,
        "message": "Login successful",
        "token": token
    });

    Ok((jar.add(cookie), response).into_response())
}

/// Revokes the presented token and clears the cookie. Sits behind the auth
/// guard, so a token is known to be present and valid.
#[axum::debug_handler]
pub async fn logout(
    State(state): State<AppState>,
    jar: CookieJar,
    headers: HeaderMap,
) -> ApiResult<Response> {
    if let Some(token) = extract_token(&jar, &headers) {
        state.tokens.revoke(&token);
    }

    let response = json_response!(StatusCode::OK, {
        "success": true,
        "message": "Logged out."
    });

    let cleared = jar.remove(Cookie::build(("token", "")).path("/"));
    Ok((cleared, response).into_response())
}
