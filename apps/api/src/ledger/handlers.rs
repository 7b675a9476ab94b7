use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::errors::AppError;
use crate::ledger::{run_blocking, LedgerRow, LedgerStats, LedgerStore, NotesUpdate};
use crate::state::AppState;

#[derive(Serialize)]
pub struct ApplicationsResponse {
    pub rows: Vec<LedgerRow>,
    pub stats: LedgerStats,
}

#[derive(Deserialize)]
pub struct NotesRequest {
    pub company: String,
    #[serde(default)]
    pub notes: String,
}

#[derive(Serialize)]
pub struct NotesResponse {
    pub updated: bool,
}

/// GET /api/v1/applications
pub async fn handle_list_applications(
    State(state): State<AppState>,
) -> Result<Json<ApplicationsResponse>, AppError> {
    let (_, paths) = state.current_settings().await?;
    let ledger = LedgerStore::new(paths.ledger);

    let rows = run_blocking(move || ledger.load_all()).await?;
    let stats = LedgerStats::from_rows(&rows);
    Ok(Json(ApplicationsResponse { rows, stats }))
}

/// PATCH /api/v1/applications/notes
pub async fn handle_update_notes(
    State(state): State<AppState>,
    Json(req): Json<NotesRequest>,
) -> Result<Json<NotesResponse>, AppError> {
    let company = req.company.trim().to_string();
    if company.is_empty() {
        return Err(AppError::Validation("Company name is required".to_string()));
    }

    let (_, paths) = state.current_settings().await?;
    let ledger = LedgerStore::new(paths.ledger);

    let key = company.clone();
    let outcome = run_blocking(move || ledger.find_and_update_notes(&key, req.notes.trim())).await?;
    let updated = outcome == NotesUpdate::Updated;
    info!("Notes update for {company}: updated={updated}");

    Ok(Json(NotesResponse { updated }))
}
