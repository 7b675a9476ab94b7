//! One submission → rendered letter → PDF → email → ledger row.
//!
//! Render and convert run under the intermediate-document lock; once the PDF exists
//! the remaining steps never undo it. An email failure degrades to a warning and the
//! ledger row records `Non`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use bytes::Bytes;
use chrono::{Datelike, Local, NaiveDate};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use super::convert::{ConversionJob, ConversionOutput, ConversionReport, ConvertError, PdfConverter};
use super::email::{self, EmailAttachment};
use super::mailer::Mailer;
use super::render::TemplateRenderer;
use crate::activity::ActivityLog;
use crate::ledger::{run_blocking, ApplicationRecord, LedgerStore};
use crate::settings::{ResolvedPaths, Settings};

#[derive(Debug, Error)]
pub enum LetterError {
    #[error("{0}")]
    Validation(String),

    #[error("Template file does not exist: {}", .0.display())]
    TemplateMissing(PathBuf),

    #[error("Conversion script not found: {}", .0.display())]
    ConverterMissing(PathBuf),

    #[error("{0}")]
    RenderFailed(String),

    #[error("PDF conversion failed (exit code {:?})", .0.exit_code)]
    ConversionFailed(Box<ConversionReport>),

    #[error("{0}")]
    Storage(String),
}

/// Form fields for one application. All are trimmed before use.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Submission {
    pub company: String,
    pub address: String,
    #[serde(rename = "email")]
    pub contact_email: String,
    /// Empty means today, in French long form.
    #[serde(rename = "date", default)]
    pub document_date: String,
}

impl Submission {
    fn normalized(&self, today: NaiveDate) -> Result<Submission, LetterError> {
        let contact_email = self.contact_email.trim().to_string();
        if !email::is_valid_email(&contact_email) {
            return Err(LetterError::Validation(format!(
                "Invalid email address: {contact_email}"
            )));
        }

        let company = self.company.trim().to_string();
        if company.is_empty() {
            return Err(LetterError::Validation("Company name is required".to_string()));
        }
        let address = self.address.trim().to_string();
        if address.is_empty() {
            return Err(LetterError::Validation("Company address is required".to_string()));
        }

        let document_date = match self.document_date.trim() {
            "" => french_long_date(today),
            date => date.to_string(),
        };

        Ok(Submission {
            company,
            address,
            contact_email,
            document_date,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LetterOutcome {
    pub pdf_filename: String,
    pub email_sent: bool,
    /// Set when the letter was generated but the email was not delivered.
    pub warning: Option<String>,
}

const FRENCH_MONTHS: [&str; 12] = [
    "janvier",
    "février",
    "mars",
    "avril",
    "mai",
    "juin",
    "juillet",
    "août",
    "septembre",
    "octobre",
    "novembre",
    "décembre",
];

/// `5 janvier 2024`
pub fn french_long_date(date: NaiveDate) -> String {
    format!(
        "{} {} {}",
        date.day(),
        FRENCH_MONTHS[date.month0() as usize],
        date.year()
    )
}

/// Space, `/` and `\` become `_`.
pub fn sanitize_company_name(company: &str) -> String {
    company.replace([' ', '/', '\\'], "_")
}

pub struct LetterPipeline<'a> {
    pub settings: &'a Settings,
    pub paths: &'a ResolvedPaths,
    pub renderer: &'a dyn TemplateRenderer,
    pub converter: &'a dyn PdfConverter,
    pub mailer: &'a dyn Mailer,
    pub intermediate_lock: &'a Mutex<()>,
}

impl LetterPipeline<'_> {
    pub async fn generate_and_send(
        &self,
        submission: &Submission,
    ) -> Result<LetterOutcome, LetterError> {
        let run_id = Uuid::new_v4();
        self.run(submission)
            .instrument(info_span!("letter", %run_id))
            .await
    }

    async fn run(&self, submission: &Submission) -> Result<LetterOutcome, LetterError> {
        let submission = submission.normalized(Local::now().date_naive())?;
        let activity = ActivityLog::new(&self.paths.logs_dir);

        if !exists(&self.paths.template).await {
            return Err(LetterError::TemplateMissing(self.paths.template.clone()));
        }

        let pdf_filename = format!("{}.pdf", sanitize_company_name(&submission.company));
        let pdf_path = self.paths.letters_dir.join(&pdf_filename);

        {
            let _intermediate = self.intermediate_lock.lock().await;
            self.render(&submission).await?;
            self.convert(&submission, &pdf_path, &activity).await?;

            if let Err(e) = tokio::fs::remove_file(&self.paths.intermediate).await {
                warn!(
                    "Could not remove intermediate document {}: {e}",
                    self.paths.intermediate.display()
                );
            }
        }
        info!("PDF generated: {}", pdf_path.display());
        activity
            .sent(&format!("PDF generated successfully: {pdf_filename}"))
            .await;

        let warning = self.send_email(&submission, &pdf_path, &activity).await;
        let email_sent = warning.is_none();

        let record = ApplicationRecord {
            created_at: Local::now().naive_local(),
            company: submission.company.clone(),
            address: submission.address.clone(),
            contact_email: submission.contact_email.clone(),
            document_date: submission.document_date.clone(),
            pdf_filename: pdf_filename.clone(),
            email_sent,
            notes: String::new(),
        };
        let ledger = LedgerStore::new(&self.paths.ledger);
        run_blocking(move || ledger.append(&record))
            .await
            .map_err(|e| {
                error!("Failed to record application: {e}");
                LetterError::Storage(e.to_string())
            })?;

        Ok(LetterOutcome {
            pdf_filename,
            email_sent,
            warning,
        })
    }

    async fn render(&self, submission: &Submission) -> Result<(), LetterError> {
        let values = BTreeMap::from([
            ("entreprise".to_string(), submission.company.clone()),
            ("adresse".to_string(), submission.address.clone()),
            ("email".to_string(), submission.contact_email.clone()),
            ("date".to_string(), submission.document_date.clone()),
        ]);

        let intermediate = &self.paths.intermediate;
        if let Err(e) = self
            .renderer
            .render(&self.paths.template, &values, intermediate)
            .await
        {
            return Err(LetterError::RenderFailed(format!(
                "Failed to create {}: {e}",
                intermediate.display()
            )));
        }
        if !exists(intermediate).await {
            return Err(LetterError::RenderFailed(format!(
                "Temporary document {} was not created",
                intermediate.display()
            )));
        }
        Ok(())
    }

    async fn convert(
        &self,
        submission: &Submission,
        pdf_path: &Path,
        activity: &ActivityLog,
    ) -> Result<(), LetterError> {
        tokio::fs::create_dir_all(&self.paths.letters_dir)
            .await
            .map_err(|e| {
                LetterError::Storage(format!(
                    "Failed to create {}: {e}",
                    self.paths.letters_dir.display()
                ))
            })?;
        // A leftover PDF from an earlier run must not count as this run's output.
        if let Err(e) = tokio::fs::remove_file(pdf_path).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                return Err(LetterError::Storage(format!(
                    "Failed to replace {}: {e}",
                    pdf_path.display()
                )));
            }
        }

        let job = ConversionJob {
            script: &self.paths.conversion_script,
            source: &self.paths.intermediate,
            destination: pdf_path,
        };
        let output = match self.converter.convert(job).await {
            Ok(output) => output,
            Err(ConvertError::ScriptMissing(script)) => {
                activity
                    .error(&format!("Conversion script not found: {}", script.display()))
                    .await;
                return Err(LetterError::ConverterMissing(script));
            }
            Err(ConvertError::Spawn(e)) => ConversionOutput {
                exit_code: None,
                output: e.to_string(),
            },
        };

        let pdf_exists = exists(pdf_path).await;
        if pdf_exists && output.exit_code == Some(0) {
            return Ok(());
        }

        let report = ConversionReport {
            exit_code: output.exit_code,
            output: output.output,
            expected_pdf: pdf_path.display().to_string(),
            pdf_exists,
            intermediate_exists: exists(&self.paths.intermediate).await,
            letters_folder_exists: exists(&self.paths.letters_dir).await,
        };
        error!(
            "PDF conversion failed for {}: exit code {:?}",
            submission.company, report.exit_code
        );
        activity
            .error(&format!(
                "PDF conversion failed for {}: exit code {}, expected {}, pdf exists: {}, temporary document exists: {}, output: {}",
                submission.company,
                report
                    .exit_code
                    .map_or_else(|| "none".to_string(), |c| c.to_string()),
                report.expected_pdf,
                report.pdf_exists,
                report.intermediate_exists,
                report.output
            ))
            .await;
        Err(LetterError::ConversionFailed(Box::new(report)))
    }

    /// Returns the warning to show when delivery failed.
    async fn send_email(
        &self,
        submission: &Submission,
        pdf_path: &Path,
        activity: &ActivityLog,
    ) -> Option<String> {
        let mut message = email::compose(
            self.settings,
            &submission.contact_email,
            &submission.company,
        );

        if let Some(cv) = &self.paths.cv {
            match tokio::fs::read(cv).await {
                Ok(content) => message.attachments.push(EmailAttachment {
                    filename: email::cv_attachment_name(&email::sender_display_name(
                        self.settings,
                    )),
                    content: Bytes::from(content),
                    content_type: "application/pdf",
                }),
                Err(e) => {
                    activity
                        .error(&format!("CV not attached, cannot read {}: {e}", cv.display()))
                        .await
                }
            }
        }
        match tokio::fs::read(pdf_path).await {
            Ok(content) => message.attachments.push(EmailAttachment {
                filename: email::letter_attachment_name(&submission.company),
                content: Bytes::from(content),
                content_type: "application/pdf",
            }),
            Err(e) => {
                activity
                    .error(&format!(
                        "Letter not attached, cannot read {}: {e}",
                        pdf_path.display()
                    ))
                    .await
            }
        }

        match self.mailer.send(&self.settings.email.smtp, &message).await {
            Ok(()) => {
                activity
                    .sent(&format!(
                        "Email sent successfully to {} for {}",
                        submission.contact_email, submission.company
                    ))
                    .await;
                None
            }
            Err(e) => {
                warn!("Email to {} failed: {e}", submission.contact_email);
                activity
                    .error(&format!(
                        "Error sending email to {} for {}: {e}",
                        submission.contact_email, submission.company
                    ))
                    .await;
                Some(format!("Letter generated but the email could not be sent: {e}"))
            }
        }
    }
}

async fn exists(path: &Path) -> bool {
    tokio::fs::try_exists(path).await.unwrap_or(false)
}
