use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;

use crate::activity::reader::{query_logs, LogFilter, LogPage, LogQuery, DEFAULT_PAGE_SIZE};
use crate::errors::AppError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LogsParams {
    #[serde(rename = "type", default)]
    pub log_type: LogFilter,
    pub limit: Option<usize>,
    pub search: Option<String>,
    pub page: Option<usize>,
}

impl From<LogsParams> for LogQuery {
    fn from(params: LogsParams) -> Self {
        LogQuery {
            filter: params.log_type,
            limit: params.limit.unwrap_or(DEFAULT_PAGE_SIZE),
            search: params.search,
            page: params.page.unwrap_or(1),
        }
    }
}

/// GET /api/v1/logs
pub async fn handle_get_logs(
    State(state): State<AppState>,
    Query(params): Query<LogsParams>,
) -> Result<Json<LogPage>, AppError> {
    let (_, paths) = state.current_settings().await?;
    let query = LogQuery::from(params);

    let page = tokio::task::spawn_blocking(move || query_logs(&paths.logs_dir, &query))
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .map_err(|e| AppError::Storage(format!("Failed to read activity logs: {e}")))?;

    Ok(Json(page))
}
