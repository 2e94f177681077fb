use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use axum::http::{HeaderValue, Method};
use dotenvy::dotenv;
use reqwest::Client;
use sqlx::mysql::MySqlPoolOptions;
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};

use marquee_api::auth::token::TokenService;
use marquee_api::omdb::{self, OmdbClient};
use marquee_api::poster_cache::PosterCache;
use marquee_api::{router, AppState};

#[tokio::main]
async fn main() {
    dotenv().ok();
    tracing_subscriber::fmt::init();

    tracing::info!("Starting server...");

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_credentials(true)
        .allow_headers(AllowHeaders::mirror_request())
        .allow_origin(AllowOrigin::exact(HeaderValue::from_static(
            "http://localhost:3000",
        )));

    let db_url = std::env::var("DATABASE_URL").expect("DATABASE_URL not set");
    let jwt_secret = std::env::var("JWT_SECRET").expect("JWT_SECRET not set");
    let omdb_api_key = std::env::var("OMDB_API_KEY").expect("OMDB_API_KEY not set");
    let poster_dir =
        PathBuf::from(std::env::var("POSTER_DIR").unwrap_or("res/posters".to_string()));
    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3000);

    let db_pool = MySqlPoolOptions::new()
        .max_connections(5)
        .connect(&db_url)
        .await
        .expect("Failed to connect to database");

    let reqwest = Client::new();
    let omdb_client = OmdbClient::new(
        reqwest.clone(),
        omdb::DEFAULT_API_URL.to_string(),
        omdb_api_key,
    );
    let posters = PosterCache::new(poster_dir, omdb_client)
        .expect("Failed to create poster cache directory");

    let state = AppState {
        db: db_pool,
        reqwest,
        tokens: TokenService::new(&jwt_secret, TokenService::ttl_from_env()),
        posters: Arc::new(posters),
    };

    let app = router(state).layer(cors);

    let address = SocketAddr::from(([127, 0, 0, 1], port));
    let listener = tokio::net::TcpListener::bind(address).await.unwrap();
    tracing::info!("listening on {}", address);
    axum::serve(listener, app.into_make_service())
        .await
        .unwrap();
}
