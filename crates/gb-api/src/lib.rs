//! # gb-api
//!
//! The web routing and orchestration layer for the guestbook.

pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;

use axum::routing::get;
use axum::Router;
use tower_http::services::ServeDir;

pub use error::ApiError;
pub use handlers::AppState;

/// Builds the guestbook router.
///
/// | Route              | Handler                      |
/// |--------------------|------------------------------|
/// | `GET /`            | form                         |
/// | `POST /`           | save entry, redirect         |
/// | `GET /confirmation`| thank-you page               |
/// | `GET /images/*`    | files from `images_dir`      |
pub fn router(state: AppState) -> Router {
    let images = ServeDir::new(&state.images_dir);

    let routes = Router::new()
        .route("/", get(handlers::home).post(handlers::submit))
        .route("/confirmation", get(handlers::confirmation))
        .nest_service("/images", images)
        .with_state(state);

    middleware::standard_middleware(routes)
}
