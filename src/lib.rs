pub mod auth;
pub mod error;
pub(crate) mod helpers;
pub mod middleware;
pub mod models;
pub mod omdb;
pub mod poster_cache;
pub mod routes;
pub mod types;

use std::sync::Arc;

use axum::extract::FromRef;
use axum::http::StatusCode;
use axum::middleware::from_fn_with_state;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Extension, Json, Router};
use reqwest::Client;
use serde_json::json;

use crate::auth::token::TokenService;
use crate::helpers::json_response;
use crate::middleware::auth_guard::guard;
use crate::poster_cache::PosterCache;
use crate::types::CurrentUser;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::Pool<sqlx::MySql>,
    pub reqwest: Client,
    pub tokens: TokenService,
    pub posters: Arc<PosterCache>,
}

impl FromRef<AppState> for sqlx::Pool<sqlx::MySql> {
    fn from_ref(state: &AppState) -> Self {
        state.db.clone()
    }
}

impl FromRef<AppState> for Client {
    fn from_ref(state: &AppState) -> Self {
        state.reqwest.clone()
    }
}

impl FromRef<AppState> for TokenService {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}

/// Build the application router. Routes registered before the guard layer
/// require a valid token; everything after it is public.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/secure", get(secure))
        .route("/posters/:imdb_id", get(routes::posters::get_poster))
        .route("/posters/add/:imdb_id", post(routes::posters::add_poster))
        .route("/users/logout", post(routes::users::logout))
        .route_layer(from_fn_with_state(state.clone(), guard))
        .route("/status", get(status))
        .route("/movies/search/:title", get(routes::movies::search))
        .route("/movies/data/:imdb_id", get(routes::movies::detail))
        .route("/users/register", post(routes::users::register))
        .route("/users/login", post(routes::users::login))
        .with_state(state)
}

/// Example protected probe: echoes the identity the guard attached.
async fn secure(Extension(user): Extension<CurrentUser>) -> impl IntoResponse {
    json_response!(StatusCode::OK, {
        "success": true,
        "message": "This is a secure endpoint!",
        "user": user
    })
}

async fn status() -> impl IntoResponse {
    json_response!(StatusCode::OK, {
        "success": true,
        "message": "API is up and running!"
    })
}
