use axum::extract::{Request, State};
use axum::http::HeaderMap;
use axum::middleware::Next;
use axum::response::Response;
use axum_extra::extract::CookieJar;

use crate::error::ApiError;
use crate::types::CurrentUser;
use crate::AppState;

/// Pull the session token out of the `token` cookie, falling back to an
/// `Authorization: Bearer` header.
pub fn extract_token(jar: &CookieJar, headers: &HeaderMap) -> Option<String> {
    if let Some(cookie) = jar.get("token") {
        return Some(cookie.value().to_string());
    }

    headers
        .get("authorization")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|token| token.to_string())
}

/// Runs in front of every protected route. On success the decoded identity
/// is attached to the request as a [`CurrentUser`] extension; on failure the
/// handler never runs.
pub async fn guard(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(&jar, request.headers());

    tracing::debug!("Token: {:?}", token);

    let claims = state.tokens.validate(token.as_deref())?;

    request.extensions_mut().insert(CurrentUser {
        id: claims.sub,
        email: claims.email,
    });

    Ok(next.run(request).await)
}
