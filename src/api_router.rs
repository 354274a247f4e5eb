//! Combines the module routers into one API surface.

use axum::Router;
use std::sync::Arc;

use crate::shared::state::AppState;

pub fn configure_api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .merge(crate::goals::configure_okr_routes())
        .merge(crate::goals::actions::configure_action_routes())
}
