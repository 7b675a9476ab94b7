//! DOCX templating: fills `${name}` placeholders in a Word template.
//!
//! A DOCX file is a zip archive; the text lives in `word/document.xml` plus the
//! header/footer parts. Every `word/*.xml` part gets its placeholders replaced with
//! XML-escaped values; all other entries are copied through unchanged.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::{Captures, Regex};
use thiserror::Error;
use tracing::debug;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid DOCX archive: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Render task failed: {0}")]
    Task(String),
}

/// Renders a template with named values into `destination`.
#[async_trait]
pub trait TemplateRenderer: Send + Sync {
    async fn render(
        &self,
        template: &Path,
        values: &BTreeMap<String, String>,
        destination: &Path,
    ) -> Result<(), RenderError>;
}

/// Default renderer for Word templates.
pub struct DocxRenderer;

#[async_trait]
impl TemplateRenderer for DocxRenderer {
    async fn render(
        &self,
        template: &Path,
        values: &BTreeMap<String, String>,
        destination: &Path,
    ) -> Result<(), RenderError> {
        let template: PathBuf = template.to_path_buf();
        let destination: PathBuf = destination.to_path_buf();
        let values = values.clone();
        tokio::task::spawn_blocking(move || render_docx(&template, &values, &destination))
            .await
            .map_err(|e| RenderError::Task(e.to_string()))?
    }
}

pub fn render_docx(
    template: &Path,
    values: &BTreeMap<String, String>,
    destination: &Path,
) -> Result<(), RenderError> {
    let mut archive = ZipArchive::new(File::open(template)?)?;
    let mut writer = ZipWriter::new(File::create(destination)?);

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let name = entry.name().to_string();
        let method = match entry.compression() {
            CompressionMethod::Stored => CompressionMethod::Stored,
            _ => CompressionMethod::Deflated,
        };
        let options = FileOptions::default().compression_method(method);

        if entry.is_dir() {
            writer.add_directory(name, options)?;
            continue;
        }

        let mut bytes = Vec::with_capacity(entry.size() as usize);
        entry.read_to_end(&mut bytes)?;

        if is_text_part(&name) {
            if let Ok(xml) = String::from_utf8(bytes.clone()) {
                bytes = fill_placeholders(&xml, values).into_bytes();
                debug!("Filled placeholders in {name}");
            }
        }

        writer.start_file(name, options)?;
        writer.write_all(&bytes)?;
    }

    writer.finish()?;
    Ok(())
}

fn is_text_part(name: &str) -> bool {
    name.starts_with("word/") && name.ends_with(".xml")
}

/// Word often splits `${name}` across formatting runs; the markup between the
/// `$` and the closing brace is dropped so the placeholder becomes contiguous.
/// Only run-level `w:` tags may sit between the `$` and the `{`, never a paragraph
/// boundary.
fn join_split_placeholders(xml: &str) -> String {
    static BROKEN: OnceLock<Regex> = OnceLock::new();
    static TAG: OnceLock<Regex> = OnceLock::new();
    let broken = BROKEN
        .get_or_init(|| Regex::new(r"\$(?:</?w:(?:[^p>/\s][^>]*|p[^>\s/][^>]*)>)*\{[^}$]*\}").expect("valid placeholder regex"));
    let tag = TAG.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));

    broken
        .replace_all(xml, |caps: &Captures| tag.replace_all(&caps[0], "").into_owned())
        .into_owned()
}

pub fn fill_placeholders(xml: &str, values: &BTreeMap<String, String>) -> String {
    let mut out = join_split_placeholders(xml);
    for (key, value) in values {
        out = out.replace(&format!("${{{key}}}"), &xml_escape(value));
    }
    out
}

fn xml_escape(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values() -> BTreeMap<String, String> {
        BTreeMap::from([
            ("entreprise".to_string(), "Dupont & Fils".to_string()),
            ("date".to_string(), "5 janvier 2024".to_string()),
        ])
    }

    fn write_template(path: &Path, document_xml: &str) {
        let mut writer = ZipWriter::new(File::create(path).unwrap());
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        writer.start_file("[Content_Types].xml", options).unwrap();
        writer.write_all(b"<Types/>").unwrap();
        writer.add_directory("word/", options).unwrap();
        writer.start_file("word/document.xml", options).unwrap();
        writer.write_all(document_xml.as_bytes()).unwrap();
        writer.finish().unwrap();
    }

    fn read_entry(path: &Path, name: &str) -> String {
        let mut archive = ZipArchive::new(File::open(path).unwrap()).unwrap();
        let mut entry = archive.by_name(name).unwrap();
        let mut out = String::new();
        entry.read_to_string(&mut out).unwrap();
        out
    }

    #[test]
    fn test_fill_placeholders_escapes_values() {
        let out = fill_placeholders("<w:t>${entreprise}, le ${date}</w:t>", &values());
        assert_eq!(out, "<w:t>Dupont &amp; Fils, le 5 janvier 2024</w:t>");
    }

    #[test]
    fn test_unknown_placeholders_are_left_alone() {
        let out = fill_placeholders("<w:t>${inconnu}</w:t>", &values());
        assert_eq!(out, "<w:t>${inconnu}</w:t>");
    }

    #[test]
    fn test_split_placeholder_is_joined() {
        let xml = "<w:t>$</w:t></w:r><w:r><w:t>{entre</w:t></w:r><w:r><w:t>prise}</w:t>";
        let out = fill_placeholders(xml, &values());
        assert!(out.contains("Dupont &amp; Fils"), "{out}");
        assert!(!out.contains("${"));
    }

    #[test]
    fn test_literal_dollar_does_not_swallow_markup() {
        let xml = "<w:p><w:r><w:t>5$</w:t></w:r></w:p><w:p><w:r><w:t>{x}</w:t></w:r></w:p>";
        assert_eq!(fill_placeholders(xml, &values()), xml);

        let xml = "<w:t>Prix 5$ net</w:t></w:r><w:r><w:t>${date}</w:t>";
        assert_eq!(
            fill_placeholders(xml, &values()),
            "<w:t>Prix 5$ net</w:t></w:r><w:r><w:t>5 janvier 2024</w:t>"
        );
    }

    #[test]
    fn test_render_docx_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("modele.docx");
        let output = dir.path().join("temp.docx");
        write_template(&template, "<w:document><w:t>Chez ${entreprise}</w:t></w:document>");

        render_docx(&template, &values(), &output).unwrap();

        assert_eq!(
            read_entry(&output, "word/document.xml"),
            "<w:document><w:t>Chez Dupont &amp; Fils</w:t></w:document>"
        );
        assert_eq!(read_entry(&output, "[Content_Types].xml"), "<Types/>");
    }

    #[test]
    fn test_render_rejects_non_docx() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("modele.docx");
        std::fs::write(&template, b"not a zip").unwrap();
        let err = render_docx(&template, &values(), &dir.path().join("out.docx")).unwrap_err();
        assert!(matches!(err, RenderError::Zip(_)));
    }
}
