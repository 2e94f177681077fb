/// Build a `(StatusCode, Json)` response from a status and a JSON literal.
///
/// Callers need `axum::Json`, `axum::response::IntoResponse` and
/// `serde_json::json` in scope.
macro_rules! json_response {
    ($status:expr , $json:tt) => {
        ($status, Json(json!($json))).into_response()
    };
}

pub(crate) use json_response;
