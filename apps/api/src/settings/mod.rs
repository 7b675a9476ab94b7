//! Settings tree: the user-editable configuration (SMTP, sender identity, file paths).
//!
//! Loaded from the local override file on every request when it exists, otherwise the
//! built-in defaults. The resolved value is passed explicitly to every component that
//! needs it; nothing looks settings up ambiently.

pub mod handlers;
pub mod validation;

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Failed to read settings file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Invalid settings file {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("Failed to serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Failed to write settings file {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

// ────────────────────────────────────────────────────────────────────────────
// Settings tree
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub email: EmailSettings,
    pub candidate: CandidateSettings,
    pub files: FileSettings,
    pub app: AppIdentity,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmailSettings {
    /// Empty disables the blind copy.
    pub bcc_email: String,
    pub subject: String,
    pub body_template: String,
    pub smtp: SmtpSettings,
    pub from: SenderSettings,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Encryption {
    /// Implicit TLS (SMTPS, usually port 465).
    Ssl,
    /// STARTTLS upgrade.
    #[serde(alias = "starttls")]
    Tls,
    None,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SmtpSettings {
    pub host: String,
    pub port: u16,
    pub encryption: Encryption,
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SenderSettings {
    pub email: String,
    pub name: String,
    pub signature_image: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CandidateSettings {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub portfolio_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSettings {
    pub template_path: String,
    /// Empty means no CV is attached.
    pub cv_path: String,
    pub letters_folder: String,
    pub logs_folder: String,
    pub ledger_file: String,
    pub conversion_script: String,
    pub intermediate_path: String,
}

/// Application identity. These fields are protected: see [`crate::guard`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppIdentity {
    pub name: String,
    pub version: String,
    pub author: String,
}

pub const DEFAULT_BODY_TEMPLATE: &str = "Bonjour Madame, Monsieur,<br><br>\n\
Je vous adresse en pièce jointe ma lettre de motivation personnalisée ainsi que mon CV dans le cadre d'une candidature à un stage au sein de {entreprise}.<br><br>\n\
Je suis à votre entière disposition pour un entretien afin d'échanger plus en détail sur mes motivations, mes compétences et la manière dont je pourrais contribuer à vos projets.<br><br>\n\
Je vous remercie sincèrement pour l'attention portée à ma candidature et espère pouvoir prochainement collaborer avec votre équipe.<br><br>\n\
Bien cordialement,";

impl Default for EmailSettings {
    fn default() -> Self {
        Self {
            bcc_email: "votre-email@votre-domaine.com".to_string(),
            subject: "Candidature pour un stage – [Votre Formation] ([Période])".to_string(),
            body_template: DEFAULT_BODY_TEMPLATE.to_string(),
            smtp: SmtpSettings::default(),
            from: SenderSettings::default(),
        }
    }
}

impl Default for SmtpSettings {
    fn default() -> Self {
        Self {
            host: "smtp.votre-fournisseur.com".to_string(),
            port: 465,
            encryption: Encryption::Ssl,
            username: "votre-email@votre-domaine.com".to_string(),
            password: String::new(),
        }
    }
}

impl Default for SenderSettings {
    fn default() -> Self {
        Self {
            email: "votre-email@votre-domaine.com".to_string(),
            name: "Votre Nom Prénom".to_string(),
            signature_image: "https://votre-domaine.com/signature.jpg".to_string(),
        }
    }
}

impl Default for CandidateSettings {
    fn default() -> Self {
        Self {
            name: "Votre Nom Prénom".to_string(),
            email: "votre-email@votre-domaine.com".to_string(),
            phone: String::new(),
            portfolio_url: "https://votre-portfolio.com/".to_string(),
        }
    }
}

impl Default for FileSettings {
    fn default() -> Self {
        Self {
            template_path: "modele-lettre.docx".to_string(),
            cv_path: "CV_Votre_Nom_2025.pdf".to_string(),
            letters_folder: "lettre/".to_string(),
            logs_folder: "log/".to_string(),
            ledger_file: "candidatures.csv".to_string(),
            conversion_script: "docx2pdf.sh".to_string(),
            intermediate_path: "temp.docx".to_string(),
        }
    }
}

impl Default for AppIdentity {
    fn default() -> Self {
        Self {
            name: "FINDint".to_string(),
            version: "1.0.0".to_string(),
            author: "CHAFIK EL HIRACH".to_string(),
        }
    }
}

/// Dynamic tags expanded in every string read through [`Settings::get_str`],
/// with the text used when the backing value is blank.
const DYNAMIC_TAGS: &[(&str, &str)] = &[
    ("{candidat_nom}", "Votre Nom"),
    ("{candidat_email}", "votre-email@example.com"),
    ("{candidat_portfolio_url}", "https://votre-portfolio.com"),
    ("{candidat_signature_image}", "https://votre-site.com/signature.jpg"),
];

impl Settings {
    /// Looks up a dotted path (`email.smtp.host`) in the serialized tree.
    pub fn lookup(&self, path: &str) -> Option<toml::Value> {
        let mut value = toml::Value::try_from(self).ok()?;
        for key in path.split('.') {
            value = match value {
                toml::Value::Table(mut table) => table.remove(key)?,
                _ => return None,
            };
        }
        Some(value)
    }

    /// String view of a dotted path, `default` when absent. Strings go through
    /// dynamic-tag expansion; other scalars are rendered as TOML.
    pub fn get_str(&self, path: &str, default: &str) -> String {
        match self.lookup(path) {
            Some(toml::Value::String(s)) => self.expand_tags(&s),
            Some(other) => other.to_string(),
            None => default.to_string(),
        }
    }

    /// Replaces the `{candidat_*}` tags. `{entreprise}` is left alone: it is
    /// per-submission and handled by the email composer.
    pub fn expand_tags(&self, value: &str) -> String {
        let mut out = value.to_string();
        for (tag, fallback) in DYNAMIC_TAGS {
            if !out.contains(tag) {
                continue;
            }
            let configured = match *tag {
                "{candidat_nom}" => &self.candidate.name,
                "{candidat_email}" => &self.candidate.email,
                "{candidat_portfolio_url}" => &self.candidate.portfolio_url,
                _ => &self.email.from.signature_image,
            };
            let replacement = if configured.trim().is_empty() {
                fallback
            } else {
                configured.as_str()
            };
            out = out.replace(tag, replacement);
        }
        out
    }

    /// Builds the tree to persist from a user submission.
    ///
    /// Protected identity fields always come from `self`; an empty password keeps
    /// the current one; the CV path is normalised to `<name>.pdf`.
    pub fn merge_submission(&self, mut submitted: Settings) -> Settings {
        submitted.app = self.app.clone();
        if submitted.email.smtp.password.is_empty() {
            submitted.email.smtp.password = self.email.smtp.password.clone();
        }
        submitted.files.cv_path = normalize_cv_path(&submitted.files.cv_path);
        submitted
    }

    /// Copy safe to return to a client.
    pub fn redacted(&self) -> Settings {
        let mut copy = self.clone();
        copy.email.smtp.password.clear();
        copy
    }

    pub fn resolve_paths(&self, base_dir: &Path) -> ResolvedPaths {
        let files = &self.files;
        let resolve = |p: &str| base_dir.join(p.trim_end_matches(['/', '\\']));
        ResolvedPaths {
            template: resolve(&files.template_path),
            cv: (!files.cv_path.trim().is_empty())
                .then(|| resolve(files.cv_path.trim_start_matches(['/', '\\']))),
            letters_dir: resolve(&files.letters_folder),
            logs_dir: resolve(&files.logs_folder),
            ledger: resolve(&files.ledger_file),
            conversion_script: resolve(&files.conversion_script),
            intermediate: resolve(&files.intermediate_path),
        }
    }
}

/// Settings file paths resolved against the process base directory.
#[derive(Debug, Clone)]
pub struct ResolvedPaths {
    pub template: PathBuf,
    pub cv: Option<PathBuf>,
    pub letters_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub ledger: PathBuf,
    pub conversion_script: PathBuf,
    pub intermediate: PathBuf,
}

fn normalize_cv_path(input: &str) -> String {
    static PDF_SUFFIX: OnceLock<Regex> = OnceLock::new();
    let suffix = PDF_SUFFIX.get_or_init(|| Regex::new(r"(?i)\.?pdf$").expect("valid regex"));

    let collapsed = input.split_whitespace().collect::<Vec<_>>().join(" ");
    let stem = suffix.replace(&collapsed, "");
    if stem.is_empty() {
        String::new()
    } else {
        format!("{stem}.pdf")
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Store
// ────────────────────────────────────────────────────────────────────────────

/// Reads and replaces the local override file.
#[derive(Debug, Clone)]
pub struct SettingsStore {
    path: PathBuf,
}

impl SettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn has_override(&self) -> bool {
        tokio::fs::try_exists(&self.path).await.unwrap_or(false)
    }

    /// The override file when present, otherwise the built-in defaults.
    pub async fn load(&self) -> Result<Settings, SettingsError> {
        let raw = match tokio::fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No settings override at {}; using defaults", self.path.display());
                return Ok(Settings::default());
            }
            Err(source) => {
                return Err(SettingsError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        toml::from_str(&raw).map_err(|source| SettingsError::Parse {
            path: self.path.clone(),
            source,
        })
    }

    /// Replaces the override file wholesale.
    pub async fn save(&self, settings: &Settings) -> Result<(), SettingsError> {
        let body = toml::to_string_pretty(settings)?;
        let content = format!(
            "# Local settings. Contains SMTP credentials: keep out of version control.\n# Generated {}\n\n{body}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
        );

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| SettingsError::Write {
                    path: self.path.clone(),
                    source,
                })?;
        }
        tokio::fs::write(&self.path, content)
            .await
            .map_err(|source| SettingsError::Write {
                path: self.path.clone(),
                source,
            })?;

        info!("Settings saved to {}", self.path.display());
        Ok(())
    }
}
