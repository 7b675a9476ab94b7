//! Activity logs: the user-facing, line-oriented record of what the pipeline did.
//!
//! Distinct from process tracing: these files live in the configured logs folder and
//! are what the log viewer reads back. Each line starts with a local timestamp.

pub mod handlers;
pub mod reader;

use std::path::PathBuf;

use tokio::io::AsyncWriteExt;
use tracing::warn;

pub const SENT_LOG: &str = "pdf_email_sent.log";
pub const ERROR_LOG: &str = "pdf_email_error.log";
pub const VIOLATIONS_LOG: &str = "copyright_violations.log";

pub fn timestamp_now() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

#[derive(Debug, Clone)]
pub struct ActivityLog {
    dir: PathBuf,
}

impl ActivityLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub async fn sent(&self, message: &str) {
        self.write_line(SENT_LOG, message).await;
    }

    pub async fn error(&self, message: &str) {
        self.write_line(ERROR_LOG, message).await;
    }

    /// Appends `text` verbatim to `file_name`, creating the folder if needed.
    pub async fn append_raw(&self, file_name: &str, text: &str) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.dir).await?;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.dir.join(file_name))
            .await?;
        file.write_all(text.as_bytes()).await?;
        file.flush().await
    }

    /// Never fails the caller: a lost activity line is only worth a warning.
    async fn write_line(&self, file_name: &str, message: &str) {
        let flat = message.replace("\r\n", " | ").replace(['\n', '\r'], " | ");
        let line = format!("{} {flat}\n", timestamp_now());
        if let Err(e) = self.append_raw(file_name, &line).await {
            warn!(
                "Could not write activity log {}: {e}",
                self.dir.join(file_name).display()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_lines_are_timestamped_and_flattened() {
        let dir = tempfile::tempdir().unwrap();
        let log = ActivityLog::new(dir.path().join("log"));
        log.sent("Email sent successfully").await;
        log.error("Conversion output:\nline one\nline two").await;

        let sent = std::fs::read_to_string(dir.path().join("log").join(SENT_LOG)).unwrap();
        let error = std::fs::read_to_string(dir.path().join("log").join(ERROR_LOG)).unwrap();
        assert_eq!(sent.lines().count(), 1);
        assert!(sent.trim_end().ends_with(" Email sent successfully"));
        assert_eq!(error.lines().count(), 1);
        assert!(error.contains("Conversion output: | line one | line two"));

        let (timestamp, _, _) = reader::parse_line(sent.trim_end());
        assert_eq!(timestamp.len(), 19);
    }
}
