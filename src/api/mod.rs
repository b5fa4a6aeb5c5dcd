//! HTTP API exposing the aggregate state and refresh actions.

pub mod handlers;
pub mod routes;

pub use handlers::AppState;
pub use routes::create_router;
