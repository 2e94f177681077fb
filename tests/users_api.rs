//! Registration/login route tests against a real database.
//!
//! These need a reachable MySQL with the `users` table, so they no-op unless
//! `DATABASE_URL` is set (mirroring how the rest of the suite avoids any
//! live dependency).

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use rand::{rngs::StdRng, RngCore, SeedableRng};
use sqlx::mysql::MySqlPoolOptions;
use tower::util::ServiceExt;

use marquee_api::auth::token::TokenService;
use marquee_api::omdb::OmdbClient;
use marquee_api::poster_cache::PosterCache;
use marquee_api::{router, AppState};

async fn db_app() -> Option<(Router, AppState, tempfile::TempDir)> {
    let url = std::env::var("DATABASE_URL").ok()?;
    let db = MySqlPoolOptions::new()
        .max_connections(2)
        .connect(&url)
        .await
        .ok()?;

    let tmp = tempfile::tempdir().unwrap();
    let reqwest = reqwest::Client::new();
    let omdb = OmdbClient::new(
        reqwest.clone(),
        "http://127.0.0.1:9".to_string(),
        "test-key".to_string(),
    );
    let posters = PosterCache::new(tmp.path().to_path_buf(), omdb).unwrap();

    let state = AppState {
        db,
        reqwest,
        tokens: TokenService::new("integration-test-secret", 60),
        posters: Arc::new(posters),
    };

    Some((router(state.clone()), state, tmp))
}

fn unique_email() -> String {
    let mut bytes = [0u8; 8];
    StdRng::from_entropy().fill_bytes(&mut bytes);
    format!("user-{}@example.com", hex::encode(bytes))
}

fn post_json(path: &str, body: serde_json::Value) -> Request<Body> {
    Request::post(path)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn registering_the_same_email_twice_conflicts() {
    let Some((app, _, _tmp)) = db_app().await else {
        eprintln!("DATABASE_URL not set, skipping");
        return;
    };
    let email = unique_email();
    let body = serde_json::json!({"email": email, "password": "hunter2-long"});

    let response = app
        .clone()
        .oneshot(post_json("/users/register", body.clone()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app.oneshot(post_json("/users/register", body)).await.unwrap();
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn login_with_wrong_password_is_401() {
    let Some((app, _, _tmp)) = db_app().await else {
        eprintln!("DATABASE_URL not set, skipping");
        return;
    };
    let email = unique_email();

    let response = app
        .clone()
        .oneshot(post_json(
            "/users/register",
            serde_json::json!({"email": email, "password": "right-password"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(post_json(
            "/users/login",
            serde_json::json!({"email": email, "password": "wrong-password"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn login_returns_a_token_the_gate_accepts() {
    let Some((app, state, _tmp)) = db_app().await else {
        eprintln!("DATABASE_URL not set, skipping");
        return;
    };
    let email = unique_email();

    let response = app
        .clone()
        .oneshot(post_json(
            "/users/register",
            serde_json::json!({"email": email, "password": "hunter2-long"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .clone()
        .oneshot(post_json(
            "/users/login",
            serde_json::json!({"email": email, "password": "hunter2-long"}),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let token = body["token"].as_str().expect("login must return a token");

    assert!(state.tokens.validate(Some(token)).is_ok());

    let response = app
        .oneshot(
            Request::get("/secure")
                .header(header::AUTHORIZATION, format!("Bearer {}", token))
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}
