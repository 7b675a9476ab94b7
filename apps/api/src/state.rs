use std::sync::Arc;

use tokio::sync::Mutex;

use crate::config::Config;
use crate::errors::AppError;
use crate::letter::convert::PdfConverter;
use crate::letter::mailer::Mailer;
use crate::letter::render::TemplateRenderer;
use crate::settings::{ResolvedPaths, Settings, SettingsStore};

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub settings: SettingsStore,
    /// DOCX templating. Default: DocxRenderer.
    pub renderer: Arc<dyn TemplateRenderer>,
    /// DOCX → PDF. Default: ScriptConverter (shells out to the configured script).
    pub converter: Arc<dyn PdfConverter>,
    /// Outgoing mail. Default: SmtpMailer.
    pub mailer: Arc<dyn Mailer>,
    /// The intermediate document path is fixed, so only one render→convert runs at a time.
    pub intermediate_lock: Arc<Mutex<()>>,
}

impl AppState {
    /// Settings for this request plus their paths resolved against the base directory.
    pub async fn current_settings(&self) -> Result<(Settings, ResolvedPaths), AppError> {
        let settings = self.settings.load().await?;
        let paths = settings.resolve_paths(&self.config.base_dir);
        Ok((settings, paths))
    }
}
