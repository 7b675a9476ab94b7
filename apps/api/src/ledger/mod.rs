//! Application ledger: the flat, semicolon-delimited record of every generated letter.
//!
//! One row per letter, header first, every field quoted. Rows are appended by the
//! letter pipeline and only ever mutated by the notes update. Columns are located by
//! header name; the canonical order below is only used when writing a fresh file or
//! when a header is missing a column.
//!
//! Every mutation holds an exclusive `fs2` lock on `<ledger>.lock`, and the notes
//! update replaces the file through a rename, so concurrent requests cannot lose
//! each other's writes.

pub mod handlers;

use std::collections::{BTreeMap, HashSet};
use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;
use fs2::FileExt;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

/// Column order of a freshly created ledger.
pub const COLUMNS: [&str; 8] = [
    "Date_creation",
    "Entreprise",
    "Adresse",
    "Email",
    "Date_document",
    "Fichier_PDF",
    "Email_Envoye",
    "Notes",
];

const CREATED_COLUMN: &str = "Date_creation";
const COMPANY_COLUMN: &str = "Entreprise";
const EMAIL_SENT_COLUMN: &str = "Email_Envoye";
const NOTES_COLUMN: &str = "Notes";

/// Rows shorter than this are ignored when loading.
const MIN_FIELDS: usize = 6;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("Ledger I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Ledger CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Ledger task failed: {0}")]
    Task(String),
}

// ────────────────────────────────────────────────────────────────────────────
// Records
// ────────────────────────────────────────────────────────────────────────────

/// A row as written by the letter pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicationRecord {
    pub created_at: NaiveDateTime,
    pub company: String,
    pub address: String,
    pub contact_email: String,
    pub document_date: String,
    pub pdf_filename: String,
    pub email_sent: bool,
    pub notes: String,
}

impl ApplicationRecord {
    /// Fields in [`COLUMNS`] order.
    fn fields(&self) -> [String; 8] {
        [
            self.created_at.format(TIMESTAMP_FORMAT).to_string(),
            self.company.clone(),
            self.address.clone(),
            self.contact_email.clone(),
            self.document_date.clone(),
            self.pdf_filename.clone(),
            email_sent_flag(self.email_sent).to_string(),
            self.notes.clone(),
        ]
    }
}

pub fn email_sent_flag(sent: bool) -> &'static str {
    if sent {
        "Oui"
    } else {
        "Non"
    }
}

/// A row as read back: header name → quote-stripped value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct LedgerRow(BTreeMap<String, String>);

impl LedgerRow {
    pub fn get(&self, column: &str) -> Option<&str> {
        self.0.get(column).map(String::as_str)
    }

    pub fn company(&self) -> &str {
        self.get(COMPANY_COLUMN).unwrap_or_default()
    }

    pub fn created_at(&self) -> &str {
        self.get(CREATED_COLUMN).unwrap_or_default()
    }

    pub fn email_sent(&self) -> bool {
        self.get(EMAIL_SENT_COLUMN) == Some("Oui")
    }

    #[cfg(test)]
    pub fn notes(&self) -> &str {
        self.get(NOTES_COLUMN).unwrap_or_default()
    }
}

/// Outcome of [`LedgerStore::find_and_update_notes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotesUpdate {
    Updated,
    NoMatch,
}

/// Summary figures shown above the ledger.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerStats {
    pub letters: usize,
    pub companies: usize,
    pub emails_sent: usize,
    /// Creation date of the last row, `dd/mm/YYYY` when parseable.
    pub last_application: Option<String>,
}

impl LedgerStats {
    pub fn from_rows(rows: &[LedgerRow]) -> Self {
        let companies: HashSet<&str> = rows.iter().map(LedgerRow::company).collect();
        let last_application = rows.last().map(|row| {
            let raw = row.created_at();
            NaiveDateTime::parse_from_str(raw, TIMESTAMP_FORMAT)
                .map(|dt| dt.format("%d/%m/%Y").to_string())
                .unwrap_or_else(|_| raw.to_string())
        });

        Self {
            letters: rows.len(),
            companies: companies.len(),
            emails_sent: rows.iter().filter(|r| r.email_sent()).count(),
            last_application,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Store
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct LedgerStore {
    path: PathBuf,
}

impl LedgerStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[cfg(test)]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one record, creating the file (with header) and its parent
    /// directory when absent.
    pub fn append(&self, record: &ApplicationRecord) -> Result<(), LedgerError> {
        if let Some(parent) = non_empty_parent(&self.path) {
            fs::create_dir_all(parent)?;
        }
        let _lock = self.lock_exclusive()?;

        let mut file = OpenOptions::new()
            .read(true)
            .append(true)
            .create(true)
            .open(&self.path)?;

        let len = file.metadata()?.len();
        if len > 0 && !ends_with_newline(&mut file)? {
            file.write_all(b"\n")?;
        }

        let mut writer = writer_builder().from_writer(&mut file);
        if len == 0 {
            writer.write_record(COLUMNS)?;
        }
        writer.write_record(record.fields().iter().map(|f| single_line(f)))?;
        writer.flush()?;

        info!(
            "Ledger: appended {} ({})",
            record.company,
            email_sent_flag(record.email_sent)
        );
        Ok(())
    }

    /// Rewrites the Notes field of the first row whose company equals `company`
    /// (trimmed, case-sensitive). Every other byte of the file is preserved; the
    /// file is left untouched when nothing matches.
    pub fn find_and_update_notes(
        &self,
        company: &str,
        notes: &str,
    ) -> Result<NotesUpdate, LedgerError> {
        if !self.path.exists() {
            return Ok(NotesUpdate::NoMatch);
        }
        let _lock = self.lock_exclusive()?;

        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(NotesUpdate::NoMatch),
            Err(e) => return Err(e.into()),
        };

        let mut lines: Vec<String> = content.split('\n').map(str::to_string).collect();
        if content.ends_with('\n') {
            lines.pop();
        }

        let Some(header) = lines.first().and_then(|l| parse_line(l)) else {
            return Ok(NotesUpdate::NoMatch);
        };
        let company_idx = column_index(&header, COMPANY_COLUMN);
        let notes_idx = column_index(&header, NOTES_COLUMN);
        let key = company.trim();
        let cleaned_notes = single_line(&notes.replace('"', ""));

        let mut matched = false;
        for line in lines.iter_mut().skip(1) {
            let Some(mut fields) = parse_line(line) else {
                continue;
            };
            if fields.get(company_idx).map(|f| f.trim()) != Some(key) {
                continue;
            }

            if fields.len() <= notes_idx {
                fields.resize(notes_idx + 1, String::new());
            }
            fields[notes_idx] = cleaned_notes.clone();

            let carriage_return = if line.ends_with('\r') { "\r" } else { "" };
            *line = format!("{}{carriage_return}", format_line(&fields)?);
            matched = true;
            break;
        }

        if !matched {
            debug!("Ledger: no row for company {key:?}; notes not updated");
            return Ok(NotesUpdate::NoMatch);
        }

        let mut rewritten = lines.join("\n");
        if content.ends_with('\n') {
            rewritten.push('\n');
        }
        self.replace_contents(rewritten.as_bytes())?;

        info!("Ledger: notes updated for {key}");
        Ok(NotesUpdate::Updated)
    }

    /// All rows with at least six fields, in file order. A missing file is an
    /// empty ledger.
    pub fn load_all(&self) -> Result<Vec<LedgerRow>, LedgerError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let _lock = self.lock_shared()?;

        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut reader = csv::ReaderBuilder::new()
            .delimiter(b';')
            .has_headers(true)
            .flexible(true)
            .from_reader(file);
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut rows = Vec::new();
        for (i, result) in reader.records().enumerate() {
            let record = match result {
                Ok(record) => record,
                Err(e) => {
                    debug!("Ledger: skipping unreadable row {}: {e}", i + 1);
                    continue;
                }
            };
            if record.len() < MIN_FIELDS {
                continue;
            }

            let mut fields: BTreeMap<String, String> = headers
                .iter()
                .zip(record.iter())
                .map(|(h, v)| (h.clone(), v.trim_matches('"').to_string()))
                .collect();
            fields
                .entry(EMAIL_SENT_COLUMN.to_string())
                .or_insert_with(|| email_sent_flag(false).to_string());
            fields.entry(NOTES_COLUMN.to_string()).or_default();
            rows.push(LedgerRow(fields));
        }

        Ok(rows)
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    fn open_lock_file(&self) -> Result<File, LedgerError> {
        Ok(OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(self.lock_path())?)
    }

    /// Held until the returned file is dropped.
    fn lock_exclusive(&self) -> Result<File, LedgerError> {
        let file = self.open_lock_file()?;
        FileExt::lock_exclusive(&file)?;
        Ok(file)
    }

    fn lock_shared(&self) -> Result<File, LedgerError> {
        let file = self.open_lock_file()?;
        FileExt::lock_shared(&file)?;
        Ok(file)
    }

    fn replace_contents(&self, bytes: &[u8]) -> Result<(), LedgerError> {
        let dir = non_empty_parent(&self.path).unwrap_or_else(|| Path::new("."));
        let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
        tmp.write_all(bytes)?;
        tmp.flush()?;
        if let Ok(meta) = fs::metadata(&self.path) {
            tmp.as_file().set_permissions(meta.permissions())?;
        }
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }
}

/// Runs a ledger operation on the blocking pool; file locks block the thread.
pub async fn run_blocking<T, F>(op: F) -> Result<T, LedgerError>
where
    F: FnOnce() -> Result<T, LedgerError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(op)
        .await
        .map_err(|e| LedgerError::Task(e.to_string()))?
}

fn writer_builder() -> csv::WriterBuilder {
    let mut builder = csv::WriterBuilder::new();
    builder
        .delimiter(b';')
        .quote_style(csv::QuoteStyle::Always)
        .terminator(csv::Terminator::Any(b'\n'));
    builder
}

fn parse_line(line: &str) -> Option<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(b';')
        .has_headers(false)
        .flexible(true)
        .from_reader(line.trim_end_matches('\r').as_bytes());
    let record = reader.records().next()?.ok()?;
    Some(record.iter().map(str::to_string).collect())
}

fn format_line(fields: &[String]) -> Result<String, LedgerError> {
    let mut writer = writer_builder().from_writer(Vec::new());
    writer.write_record(fields)?;
    let bytes = writer
        .into_inner()
        .map_err(|e| LedgerError::Io(e.into_error()))?;
    let line = String::from_utf8_lossy(&bytes);
    Ok(line.trim_end_matches('\n').to_string())
}

/// Header position of `name`, or its canonical position when the header lacks it.
fn column_index(header: &[String], name: &str) -> usize {
    header
        .iter()
        .position(|h| h.trim() == name)
        .or_else(|| COLUMNS.iter().position(|c| *c == name))
        .unwrap_or(header.len())
}

/// One record per line: embedded line breaks become spaces.
fn single_line(value: &str) -> String {
    value.replace(['\r', '\n'], " ")
}

fn ends_with_newline(file: &mut File) -> std::io::Result<bool> {
    file.seek(SeekFrom::End(-1))?;
    let mut last = [0u8; 1];
    file.read_exact(&mut last)?;
    Ok(last[0] == b'\n')
}

fn non_empty_parent(path: &Path) -> Option<&Path> {
    path.parent().filter(|p| !p.as_os_str().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn record(company: &str, email_sent: bool) -> ApplicationRecord {
        ApplicationRecord {
            created_at: NaiveDate::from_ymd_opt(2024, 1, 5)
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
            company: company.to_string(),
            address: "1 Rue de Paris, 75000 Paris".to_string(),
            contact_email: "rh@example.com".to_string(),
            document_date: "5 janvier 2024".to_string(),
            pdf_filename: format!("{}.pdf", company.replace(' ', "_")),
            email_sent,
            notes: String::new(),
        }
    }

    fn store_in(dir: &tempfile::TempDir) -> LedgerStore {
        LedgerStore::new(dir.path().join("data").join("candidatures.csv"))
    }

    #[test]
    fn test_append_creates_file_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.append(&record("Acme", true)).unwrap();

        let content = fs::read_to_string(store.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "\"Date_creation\";\"Entreprise\";\"Adresse\";\"Email\";\"Date_document\";\"Fichier_PDF\";\"Email_Envoye\";\"Notes\""
        );
        assert_eq!(
            lines[1],
            "\"2024-01-05 10:00:00\";\"Acme\";\"1 Rue de Paris, 75000 Paris\";\"rh@example.com\";\"5 janvier 2024\";\"Acme.pdf\";\"Oui\";\"\""
        );
    }

    #[test]
    fn test_append_writes_header_once() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.append(&record("Acme", true)).unwrap();
        store.append(&record("Globex", false)).unwrap();

        let content = fs::read_to_string(store.path()).unwrap();
        assert_eq!(content.matches("Date_creation").count(), 1);
        assert_eq!(content.lines().count(), 3);
    }

    #[test]
    fn test_load_all_preserves_append_order() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        for name in ["Acme", "Globex", "Initech", "Acme"] {
            store.append(&record(name, name != "Globex")).unwrap();
        }

        let rows = store.load_all().unwrap();
        let companies: Vec<&str> = rows.iter().map(LedgerRow::company).collect();
        assert_eq!(companies, vec!["Acme", "Globex", "Initech", "Acme"]);
        assert_eq!(rows[0].get("Adresse"), Some("1 Rue de Paris, 75000 Paris"));
        assert_eq!(rows[0].get("Date_creation"), Some("2024-01-05 10:00:00"));
        assert!(rows[0].email_sent());
        assert!(!rows[1].email_sent());
        assert_eq!(rows[1].get("Email_Envoye"), Some("Non"));
    }

    #[test]
    fn test_fields_with_quotes_and_semicolons_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let mut rec = record("Dupont; Fils", true);
        rec.address = "Bâtiment \"B\"; 2e étage".to_string();
        store.append(&rec).unwrap();

        let rows = store.load_all().unwrap();
        assert_eq!(rows[0].company(), "Dupont; Fils");
        assert_eq!(rows[0].get("Adresse"), Some("Bâtiment \"B\"; 2e étage"));
    }

    #[test]
    fn test_load_all_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(store_in(&dir).load_all().unwrap().is_empty());
    }

    #[test]
    fn test_load_all_skips_short_rows_and_defaults_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("legacy.csv");
        fs::write(
            &path,
            "Date_creation;Entreprise;Adresse;Email;Date_document;Fichier_PDF\n\
             \"2024-01-01 09:00:00\";\"Acme\";\"addr\";\"a@acme.test\";\"1 janvier 2024\";\"Acme.pdf\"\n\
             \"broken\";\"row\"\n",
        )
        .unwrap();

        let rows = LedgerStore::new(&path).load_all().unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get("Email_Envoye"), Some("Non"));
        assert_eq!(rows[0].notes(), "");
    }

    #[test]
    fn test_update_notes_touches_only_matching_row() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.append(&record("Globex", true)).unwrap();
        store.append(&record("Acme", true)).unwrap();
        store.append(&record("Initech", false)).unwrap();
        let before = fs::read_to_string(store.path()).unwrap();

        let outcome = store.find_and_update_notes("Acme", "called back").unwrap();
        assert_eq!(outcome, NotesUpdate::Updated);

        let after = fs::read_to_string(store.path()).unwrap();
        let before_lines: Vec<&str> = before.lines().collect();
        let after_lines: Vec<&str> = after.lines().collect();
        assert_eq!(before_lines.len(), after_lines.len());
        for i in [0, 1, 3] {
            assert_eq!(before_lines[i], after_lines[i]);
        }
        assert_eq!(
            after_lines[2],
            before_lines[2].replace(";\"\"", ";\"called back\"")
        );
        assert!(after.ends_with('\n'));

        let rows = store.load_all().unwrap();
        assert_eq!(rows[1].notes(), "called back");
        assert!(rows[1].email_sent());
        assert_eq!(rows[1].get("Fichier_PDF"), Some("Acme.pdf"));
    }

    #[test]
    fn test_update_notes_first_duplicate_only() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.append(&record("Acme", true)).unwrap();
        store.append(&record("Acme", false)).unwrap();

        store.find_and_update_notes("Acme", "first").unwrap();
        let rows = store.load_all().unwrap();
        assert_eq!(rows[0].notes(), "first");
        assert_eq!(rows[1].notes(), "");
    }

    #[test]
    fn test_update_notes_no_match_leaves_file_identical() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.append(&record("Acme", true)).unwrap();
        let before = fs::read(store.path()).unwrap();

        let outcome = store.find_and_update_notes("acme", "case differs").unwrap();
        assert_eq!(outcome, NotesUpdate::NoMatch);
        assert_eq!(fs::read(store.path()).unwrap(), before);
    }

    #[cfg(unix)]
    #[test]
    fn test_update_notes_keeps_file_mode() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.append(&record("Acme", true)).unwrap();
        fs::set_permissions(store.path(), fs::Permissions::from_mode(0o644)).unwrap();

        let outcome = store.find_and_update_notes("Acme", "x").unwrap();
        assert_eq!(outcome, NotesUpdate::Updated);
        let mode = fs::metadata(store.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, 0o644);
    }

    #[test]
    fn test_update_notes_missing_file_is_no_match() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        assert_eq!(
            store.find_and_update_notes("Acme", "x").unwrap(),
            NotesUpdate::NoMatch
        );
        assert!(!store.path().exists());
    }

    #[test]
    fn test_update_notes_trims_key_and_strips_quotes() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.append(&record("Acme", true)).unwrap();

        store
            .find_and_update_notes("  Acme ", "said \"maybe\"\nnext week")
            .unwrap();
        assert_eq!(store.load_all().unwrap()[0].notes(), "said maybe next week");
    }

    #[test]
    fn test_update_notes_pads_short_row() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.csv");
        fs::write(
            &path,
            "\"Date_creation\";\"Entreprise\";\"Adresse\";\"Email\";\"Date_document\";\"Fichier_PDF\";\"Email_Envoye\";\"Notes\"\n\
             \"2024-01-01 09:00:00\";\"Acme\";\"addr\";\"a@acme.test\";\"1 janvier 2024\";\"Acme.pdf\"",
        )
        .unwrap();

        let store = LedgerStore::new(&path);
        assert_eq!(
            store.find_and_update_notes("Acme", "padded").unwrap(),
            NotesUpdate::Updated
        );
        let content = fs::read_to_string(&path).unwrap();
        assert!(!content.ends_with('\n'));
        assert!(content.ends_with(";\"\";\"padded\""));
    }

    #[test]
    fn test_update_notes_follows_header_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reordered.csv");
        fs::write(
            &path,
            "\"Notes\";\"Entreprise\";\"Date_creation\";\"Adresse\";\"Email\";\"Date_document\";\"Fichier_PDF\";\"Email_Envoye\"\n\
             \"\";\"Acme\";\"2024-01-01 09:00:00\";\"addr\";\"a@acme.test\";\"1 janvier 2024\";\"Acme.pdf\";\"Oui\"\n",
        )
        .unwrap();

        let store = LedgerStore::new(&path);
        store.find_and_update_notes("Acme", "by name").unwrap();
        let rows = store.load_all().unwrap();
        assert_eq!(rows[0].notes(), "by name");
        assert_eq!(rows[0].get("Email_Envoye"), Some("Oui"));
    }

    #[test]
    fn test_append_after_file_without_trailing_newline() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.append(&record("Acme", true)).unwrap();
        let trimmed = fs::read_to_string(store.path()).unwrap();
        fs::write(store.path(), trimmed.trim_end()).unwrap();

        store.append(&record("Globex", true)).unwrap();
        let companies: Vec<String> = store
            .load_all()
            .unwrap()
            .iter()
            .map(|r| r.company().to_string())
            .collect();
        assert_eq!(companies, vec!["Acme", "Globex"]);
    }

    #[test]
    fn test_concurrent_note_updates_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let names: Vec<String> = (0..8).map(|i| format!("Company {i}")).collect();
        for name in &names {
            store.append(&record(name, true)).unwrap();
        }

        let handles: Vec<_> = names
            .iter()
            .cloned()
            .map(|name| {
                let store = store.clone();
                std::thread::spawn(move || {
                    store
                        .find_and_update_notes(&name, &format!("note for {name}"))
                        .unwrap()
                })
            })
            .collect();
        for handle in handles {
            assert_eq!(handle.join().unwrap(), NotesUpdate::Updated);
        }

        for row in store.load_all().unwrap() {
            assert_eq!(row.notes(), format!("note for {}", row.company()));
        }
    }

    #[test]
    fn test_stats() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        store.append(&record("Acme", true)).unwrap();
        store.append(&record("Acme", false)).unwrap();
        store.append(&record("Globex", true)).unwrap();

        let stats = LedgerStats::from_rows(&store.load_all().unwrap());
        assert_eq!(
            stats,
            LedgerStats {
                letters: 3,
                companies: 2,
                emails_sent: 2,
                last_application: Some("05/01/2024".to_string()),
            }
        );
        assert_eq!(LedgerStats::from_rows(&[]).last_application, None);
    }
}
