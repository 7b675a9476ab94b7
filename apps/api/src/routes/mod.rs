pub mod health;

use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};

use crate::activity::handlers as activity;
use crate::guard;
use crate::ledger::handlers as ledger;
use crate::letter::handlers as letter;
use crate::settings::handlers as settings;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        // Letters
        .route("/api/v1/letters", post(letter::handle_create_letter))
        // Ledger
        .route("/api/v1/applications", get(ledger::handle_list_applications))
        .route(
            "/api/v1/applications/notes",
            patch(ledger::handle_update_notes),
        )
        // Activity logs
        .route("/api/v1/logs", get(activity::handle_get_logs))
        // Settings
        .route(
            "/api/v1/settings",
            get(settings::handle_get_settings).put(settings::handle_save_settings),
        )
        .route(
            "/api/v1/settings/check",
            get(settings::handle_check_settings),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            guard::enforce_protected_fields,
        ));

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/security", get(guard::handle_security_report))
        .merge(api)
        .with_state(state)
}
