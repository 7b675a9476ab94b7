use axum::{extract::State, http::StatusCode, Json};

use crate::errors::AppError;
use crate::letter::pipeline::{LetterOutcome, LetterPipeline, Submission};
use crate::state::AppState;

/// POST /api/v1/letters
pub async fn handle_create_letter(
    State(state): State<AppState>,
    Json(req): Json<Submission>,
) -> Result<(StatusCode, Json<LetterOutcome>), AppError> {
    let (settings, paths) = state.current_settings().await?;

    let pipeline = LetterPipeline {
        settings: &settings,
        paths: &paths,
        renderer: state.renderer.as_ref(),
        converter: state.converter.as_ref(),
        mailer: state.mailer.as_ref(),
        intermediate_lock: &state.intermediate_lock,
    };
    let outcome = pipeline.generate_and_send(&req).await?;

    Ok((StatusCode::CREATED, Json(outcome)))
}
