use axum::{
    Router,
    routing::{get, post},
};
use std::sync::Arc;

use crate::presentation::http::handlers::AdminHandler;

pub fn admin_routes(admin_handler: Arc<AdminHandler>) -> Router {
    Router::new()
        .route(
            "/admin/contexts/{id}/ingest",
            post(AdminHandler::ingest_context),
        )
        .route("/admin/contexts/{id}/faq", post(AdminHandler::append_faq_entry))
        .route("/admin/contexts/reindex", post(AdminHandler::reindex_contexts))
        .route("/admin/topics/contexts", post(AdminHandler::assign_contexts))
        .route(
            "/admin/topics/system-prompt",
            post(AdminHandler::update_system_prompt),
        )
        .route("/admin/usage", get(AdminHandler::usage))
        .with_state(admin_handler)
}
