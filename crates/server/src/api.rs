//! REST endpoints served next to the WebSocket upgrade.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;

use crate::registry::ConnectionRegistry;

#[derive(Debug, Serialize)]
pub(crate) struct HelloResponse {
    message: String,
    method: &'static str,
}

#[derive(Debug, Serialize)]
pub(crate) struct ConnectionsResponse {
    connections: usize,
}

/// `GET /api/hello`
pub(crate) async fn hello_get() -> Json<HelloResponse> {
    Json(HelloResponse {
        message: "Hello, world!".into(),
        method: "GET",
    })
}

/// `PUT /api/hello`
pub(crate) async fn hello_put() -> Json<HelloResponse> {
    Json(HelloResponse {
        message: "Hello, world!".into(),
        method: "PUT",
    })
}

/// `GET /api/hello/{name}`
pub(crate) async fn hello_name(Path(name): Path<String>) -> Json<HelloResponse> {
    Json(HelloResponse {
        message: format!("Hello, {name}!"),
        method: "GET",
    })
}

/// `GET /api/connections`
pub(crate) async fn connections(
    State(registry): State<Arc<ConnectionRegistry>>,
) -> Json<ConnectionsResponse> {
    Json(ConnectionsResponse {
        connections: registry.count(),
    })
}

pub(crate) async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({ "error": "not found" })),
    )
}
