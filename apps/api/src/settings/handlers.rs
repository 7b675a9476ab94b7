use axum::{extract::State, Json};
use serde::Serialize;

use crate::errors::AppError;
use crate::settings::validation::check_setup;
use crate::settings::Settings;
use crate::state::AppState;

#[derive(Serialize)]
pub struct SettingsResponse {
    pub settings: Settings,
    /// False while the built-in defaults are in use.
    pub has_override: bool,
}

#[derive(Serialize)]
pub struct SetupCheckResponse {
    pub ready: bool,
    pub problems: Vec<String>,
}

/// GET /api/v1/settings
pub async fn handle_get_settings(
    State(state): State<AppState>,
) -> Result<Json<SettingsResponse>, AppError> {
    let settings = state.settings.load().await?;
    Ok(Json(SettingsResponse {
        settings: settings.redacted(),
        has_override: state.settings.has_override().await,
    }))
}

/// PUT /api/v1/settings
///
/// Replaces the override file. Identity fields and an empty password are taken
/// from the current settings.
pub async fn handle_save_settings(
    State(state): State<AppState>,
    Json(submitted): Json<Settings>,
) -> Result<Json<SettingsResponse>, AppError> {
    let current = state.settings.load().await?;
    let merged = current.merge_submission(submitted);
    state.settings.save(&merged).await?;

    Ok(Json(SettingsResponse {
        settings: merged.redacted(),
        has_override: true,
    }))
}

/// GET /api/v1/settings/check
pub async fn handle_check_settings(
    State(state): State<AppState>,
) -> Result<Json<SetupCheckResponse>, AppError> {
    let (settings, paths) = state.current_settings().await?;
    let problems = check_setup(&settings, &paths);
    Ok(Json(SetupCheckResponse {
        ready: problems.is_empty(),
        problems,
    }))
}
