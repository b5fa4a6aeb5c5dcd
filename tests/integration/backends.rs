//! Stand-in backends served by axum on ephemeral loopback ports.

use axum::{http::StatusCode, routing::get, Json, Router};
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// Serve `router` on 127.0.0.1 and return its base URL.
pub async fn spawn(router: Router) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://{}", addr)
}

/// Base URL of a port nothing listens on.
pub async fn closed_port() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

fn health(service: &'static str) -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "service": service,
        "timestamp": "2024-01-01T00:00:00.000Z"
    }))
}

/// Healthy Node-flavored service with three items.
pub fn node_service() -> Router {
    Router::new()
        .route("/api/health", get(|| async { health("node-service") }))
        .route(
            "/api/node/hello",
            get(|| async {
                Json(json!({"message": "Hello from Node.js service!", "version": "1.0.0"}))
            }),
        )
        .route(
            "/api/node/data",
            get(|| async {
                Json(json!({
                    "data": [
                        {"id": 1, "name": "Item 1", "type": "node"},
                        {"id": 2, "name": "Item 2", "type": "node"},
                        {"id": 3, "name": "Item 3", "type": "node"}
                    ]
                }))
            }),
        )
}

/// Healthy Go-flavored service with two items carrying extra fields.
pub fn go_service() -> Router {
    Router::new()
        .route("/api/health", get(|| async { health("go-service") }))
        .route(
            "/api/go/hello",
            get(|| async {
                Json(json!({"message": "Hello from Go service!", "version": "1.0.0"}))
            }),
        )
        .route(
            "/api/go/data",
            get(|| async {
                Json(json!({
                    "data": [
                        {
                            "id": 1,
                            "name": "Go Item 1",
                            "type": "go",
                            "description": "first",
                            "created_at": "2024-01-01T00:00:00Z"
                        },
                        {
                            "id": 2,
                            "name": "Go Item 2",
                            "type": "go",
                            "created_at": "2024-01-02T00:00:00Z"
                        }
                    ]
                }))
            }),
        )
}

/// Go-flavored service with an empty table (`data: null`).
pub fn empty_go_service() -> Router {
    Router::new()
        .route("/api/health", get(|| async { health("go-service") }))
        .route("/api/go/data", get(|| async { Json(json!({"data": null})) }))
}

/// Service whose database is down: plain-text health, JSON 500 listing.
pub fn broken_go_service() -> Router {
    Router::new()
        .route(
            "/api/health",
            get(|| async { (StatusCode::BAD_GATEWAY, "Bad Gateway") }),
        )
        .route(
            "/api/go/data",
            get(|| async {
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({"error": "Failed to fetch data from database"})),
                )
            }),
        )
}

/// Service that answers its listing with HTML.
pub fn html_node_service() -> Router {
    Router::new()
        .route("/api/health", get(|| async { health("node-service") }))
        .route(
            "/api/node/data",
            get(|| async { "<html><body>maintenance</body></html>" }),
        )
}
