//! Route modules. [`api_routes`] is mounted under `/api` by the router;
//! health and the observer socket live at root level.

pub mod health;
pub mod jobs;

use axum::Router;

use crate::state::AppState;

/// Build the `/api` route tree.
pub fn api_routes() -> Router<AppState> {
    jobs::router()
}
