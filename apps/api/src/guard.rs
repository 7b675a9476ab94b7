//! Protected identity fields.
//!
//! `app.name`, `app.version` and `app.author` must keep their shipped values. Every
//! `/api` request re-checks them against the current settings; a mismatch is logged
//! to `copyright_violations.log` and answered with a 403 page.

use std::collections::BTreeMap;
use std::path::Path;

use axum::{
    body::Body,
    extract::State,
    http::{HeaderMap, Request, StatusCode},
    middleware::Next,
    response::{Html, IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{error, warn};

use crate::activity::{timestamp_now, ActivityLog, VIOLATIONS_LOG};
use crate::errors::AppError;
use crate::settings::{AppIdentity, Settings};
use crate::state::AppState;

pub const PROTECTED_FIELDS: [(&str, &str); 3] = [
    ("app.name", "FINDint"),
    ("app.version", "1.0.0"),
    ("app.author", "CHAFIK EL HIRACH"),
];

/// One message per protected field whose value differs from the shipped one.
pub fn check_protected(settings: &Settings) -> Vec<String> {
    PROTECTED_FIELDS
        .iter()
        .filter_map(|(path, expected)| {
            let actual = settings.get_str(path, "");
            (actual != *expected)
                .then(|| format!("{path} altered: expected '{expected}', found '{actual}'"))
        })
        .collect()
}

fn header_or_unknown<'a>(headers: &'a HeaderMap, name: &str) -> &'a str {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .unwrap_or("unknown")
}

fn violation_block(violations: &[String], headers: &HeaderMap) -> String {
    let mut block = format!(
        "=== COPYRIGHT VIOLATION DETECTED ===\nDate: {}\nViolations:\n",
        timestamp_now()
    );
    for violation in violations {
        block.push_str(&format!("  - {violation}\n"));
    }
    block.push_str(&format!(
        "Client: {}\nUser-Agent: {}\n====================================\n\n",
        header_or_unknown(headers, "x-forwarded-for"),
        header_or_unknown(headers, "user-agent")
    ));
    block
}

const ACCESS_DENIED_PAGE: &str = r#"<!DOCTYPE html>
<html lang="fr">
<head>
<meta charset="utf-8">
<title>Accès refusé</title>
<style>
body { font-family: Arial, sans-serif; background: #f8d7da; color: #721c24; padding: 50px; text-align: center; }
.box { background: #fff; border: 2px solid #f5c6cb; border-radius: 10px; padding: 30px; max-width: 600px; margin: 0 auto; }
</style>
</head>
<body>
<div class="box">
<h1>Accès refusé</h1>
<p>Les informations de copyright de cette application ont été modifiées.</p>
<p>FINDint 1.0.0 © CHAFIK EL HIRACH</p>
<p>Restaurez la configuration d'origine pour continuer.</p>
</div>
</body>
</html>
"#;

/// Middleware guarding the API routes.
pub async fn enforce_protected_fields(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let (settings, paths) = match state.current_settings().await {
        Ok(current) => current,
        Err(e) => return e.into_response(),
    };

    let violations = check_protected(&settings);
    if violations.is_empty() {
        return next.run(request).await;
    }

    error!(
        "Protected fields altered, refusing {} {}: {violations:?}",
        request.method(),
        request.uri().path()
    );
    let block = violation_block(&violations, request.headers());
    if let Err(e) = ActivityLog::new(&paths.logs_dir)
        .append_raw(VIOLATIONS_LOG, &block)
        .await
    {
        warn!("Could not record protected-field violation: {e}");
    }

    (StatusCode::FORBIDDEN, Html(ACCESS_DENIED_PAGE)).into_response()
}

#[derive(Debug, Serialize)]
pub struct SecurityReport {
    pub timestamp: String,
    pub secure: bool,
    pub errors: Vec<String>,
    pub protected_settings: BTreeMap<&'static str, &'static str>,
    pub override_exists: bool,
    pub app: AppIdentity,
}

#[cfg(unix)]
async fn writable_by_others(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    tokio::fs::metadata(path)
        .await
        .map(|m| m.permissions().mode() & 0o022 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
async fn writable_by_others(_path: &Path) -> bool {
    false
}

/// GET /api/v1/security
pub async fn handle_security_report(
    State(state): State<AppState>,
) -> Result<Json<SecurityReport>, AppError> {
    let settings = state.settings.load().await?;
    let override_exists = state.settings.has_override().await;

    let mut errors = check_protected(&settings);
    if override_exists && writable_by_others(state.settings.path()).await {
        errors.push(format!(
            "Settings file {} is writable by group or others",
            state.settings.path().display()
        ));
    }

    Ok(Json(SecurityReport {
        timestamp: timestamp_now(),
        secure: errors.is_empty(),
        errors,
        protected_settings: PROTECTED_FIELDS.into_iter().collect(),
        override_exists,
        app: settings.app,
    }))
}
