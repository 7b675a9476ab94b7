//! DOCX → PDF conversion, delegated to an external shell script.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use tokio::process::Command;
use tracing::debug;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Conversion script not found: {0}")]
    ScriptMissing(PathBuf),

    #[error("Failed to run conversion script: {0}")]
    Spawn(#[from] std::io::Error),
}

pub struct ConversionJob<'a> {
    pub script: &'a Path,
    pub source: &'a Path,
    pub destination: &'a Path,
}

/// What the external process reported. Whether the conversion actually
/// succeeded is decided by the caller, which also checks the destination file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionOutput {
    /// `None` when the process was killed by a signal.
    pub exit_code: Option<i32>,
    /// stdout followed by stderr.
    pub output: String,
}

/// Diagnostic surfaced to the user when conversion fails.
#[derive(Debug, Clone, Serialize)]
pub struct ConversionReport {
    pub exit_code: Option<i32>,
    pub output: String,
    pub expected_pdf: String,
    pub pdf_exists: bool,
    pub intermediate_exists: bool,
    pub letters_folder_exists: bool,
}

#[async_trait]
pub trait PdfConverter: Send + Sync {
    async fn convert(&self, job: ConversionJob<'_>) -> Result<ConversionOutput, ConvertError>;
}

/// Runs `bash <script> <source> <destination>` and waits for it, without timeout.
pub struct ScriptConverter;

#[async_trait]
impl PdfConverter for ScriptConverter {
    async fn convert(&self, job: ConversionJob<'_>) -> Result<ConversionOutput, ConvertError> {
        if !tokio::fs::try_exists(job.script).await.unwrap_or(false) {
            return Err(ConvertError::ScriptMissing(job.script.to_path_buf()));
        }

        let source = tokio::fs::canonicalize(job.source)
            .await
            .unwrap_or_else(|_| job.source.to_path_buf());

        debug!(
            "Running bash {} {} {}",
            job.script.display(),
            source.display(),
            job.destination.display()
        );
        let output = Command::new("bash")
            .arg(job.script)
            .arg(&source)
            .arg(job.destination)
            .output()
            .await?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        Ok(ConversionOutput {
            exit_code: output.status.code(),
            output: combined.trim_end().to_string(),
        })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    async fn run(script_body: &str) -> (tempfile::TempDir, Result<ConversionOutput, ConvertError>) {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("docx2pdf.sh");
        std::fs::write(&script, script_body).unwrap();
        let source = dir.path().join("temp.docx");
        std::fs::write(&source, b"docx").unwrap();
        let destination = dir.path().join("out.pdf");

        let result = ScriptConverter
            .convert(ConversionJob {
                script: &script,
                source: &source,
                destination: &destination,
            })
            .await;
        (dir, result)
    }

    #[tokio::test]
    async fn test_script_success_captures_output() {
        let (dir, result) = run("echo converting \"$(basename \"$1\")\"\ncp \"$1\" \"$2\"\n").await;
        let output = result.unwrap();
        assert_eq!(output.exit_code, Some(0));
        assert_eq!(output.output, "converting temp.docx");
        assert!(dir.path().join("out.pdf").exists());
    }

    #[tokio::test]
    async fn test_script_failure_reports_exit_code_and_stderr() {
        let (dir, result) = run("echo partial\necho 'soffice: not found' >&2\nexit 3\n").await;
        let output = result.unwrap();
        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.output, "partial\nsoffice: not found");
        assert!(!dir.path().join("out.pdf").exists());
    }

    #[tokio::test]
    async fn test_missing_script() {
        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("absent.sh");
        let err = ScriptConverter
            .convert(ConversionJob {
                script: &script,
                source: &dir.path().join("temp.docx"),
                destination: &dir.path().join("out.pdf"),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::ScriptMissing(p) if p == script));
    }
}
