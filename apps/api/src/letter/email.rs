//! Email composition: subject/body placeholders, the HTML signature, the plain-text
//! alternative and attachment naming. Pure functions; sending lives in `mailer`.

use std::sync::OnceLock;

use bytes::Bytes;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::settings::{Settings, DEFAULT_BODY_TEMPLATE};

pub fn is_valid_email(value: &str) -> bool {
    value.trim().parse::<lettre::Address>().is_ok()
}

#[derive(Debug, Clone, PartialEq)]
pub struct EmailAttachment {
    pub filename: String,
    pub content: Bytes,
    pub content_type: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingEmail {
    pub from_email: String,
    pub from_name: String,
    pub to: String,
    pub bcc: Option<String>,
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
    pub attachments: Vec<EmailAttachment>,
}

fn first_non_blank(candidates: &[&str], fallback: &str) -> String {
    candidates
        .iter()
        .map(|s| s.trim())
        .find(|s| !s.is_empty())
        .unwrap_or(fallback)
        .to_string()
}

/// Candidate name, else sender name.
pub fn sender_display_name(settings: &Settings) -> String {
    first_non_blank(
        &[settings.candidate.name.as_str(), settings.email.from.name.as_str()],
        "Nom non configuré",
    )
}

fn placeholder_values(settings: &Settings, company: &str) -> [(&'static str, String); 6] {
    [
        ("{entreprise}", company.to_string()),
        ("{nom_expediteur}", sender_display_name(settings)),
        (
            "{email_expediteur}",
            first_non_blank(
                &[settings.candidate.email.as_str(), settings.email.from.email.as_str()],
                "Email non configuré",
            ),
        ),
        (
            "{portfolio_url}",
            first_non_blank(&[settings.candidate.portfolio_url.as_str()], "Portfolio non configuré"),
        ),
        ("{telephone}", settings.candidate.phone.trim().to_string()),
        ("{signature_image}", settings.email.from.signature_image.clone()),
    ]
}

fn apply_placeholders(text: &str, values: &[(&'static str, String)]) -> String {
    values
        .iter()
        .fold(text.to_string(), |acc, (tag, value)| acc.replace(tag, value))
}

fn signature_block(with_phone: bool) -> String {
    let phone_line = if with_phone {
        "\n                <p style=\"margin: 0; font-size: 14px; color: #666;\">Téléphone: {telephone}</p>"
    } else {
        ""
    };
    format!(
        r#"
<table style="font-family: Arial, sans-serif; font-size: 14px; color: #333; line-height: 1.6;">
    <tbody>
        <tr>
            <td style="padding: 0; vertical-align: top;">
                <div>
                    <img style="width: 80px; height: auto; border-radius: 50%; margin-right: 10px;" alt="Profil" src="{{signature_image}}"><br>
                </div>
            </td>
            <td style="padding: 0; vertical-align: top;">
                <p style="margin: 0; font-weight: bold; font-size: 16px; color: #1a73e8;">{{nom_expediteur}}<br></p>
                <p style="margin: 0; font-size: 14px; color: #666;">Email: {{email_expediteur}}</p>{phone_line}
                <p style="margin: 0; font-size: 14px; color: #666;">Mon Portfolio : {{portfolio_url}} <br></p>
                <div><hr style="border: 0; border-top: 1px solid #ccc;"><br></div>
            </td>
        </tr>
    </tbody>
</table>
<div><br></div>"#
    )
}

/// Removes a previously embedded signature table and the trailing breaks before it.
fn strip_signature(template: &str) -> String {
    static SIGNATURE: OnceLock<Regex> = OnceLock::new();
    let signature = SIGNATURE.get_or_init(|| {
        Regex::new(
            r#"(?s)<table[^>]*style="font-family: Arial, sans-serif[^"]*"[^>]*>.*?</table>\s*<div><br></div>"#,
        )
        .expect("valid signature regex")
    });

    let body = signature.replace_all(template, "");
    let mut rest: &str = &body;
    loop {
        let trimmed = rest.trim_end();
        match ["<br>", "<br/>", "<br />"]
            .iter()
            .find_map(|br| trimmed.strip_suffix(br))
        {
            Some(shorter) => rest = shorter,
            None => return trimmed.to_string(),
        }
    }
}

/// Ensures the body ends with exactly one signature block.
pub fn with_signature(template: &str, with_phone: bool) -> String {
    if template.trim().is_empty() {
        return format!("{DEFAULT_BODY_TEMPLATE}<br><br>{}", signature_block(with_phone));
    }
    if template.contains("{signature_image}") && template.contains("{nom_expediteur}") {
        return template.to_string();
    }
    format!(
        "{}<br><br>{}",
        strip_signature(template),
        signature_block(with_phone)
    )
}

pub fn html_to_text(html: &str) -> String {
    static TAG: OnceLock<Regex> = OnceLock::new();
    let tag = TAG.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid tag regex"));
    let with_breaks = html
        .replace("<br />", "\n")
        .replace("<br/>", "\n")
        .replace("<br>", "\n");
    tag.replace_all(&with_breaks, "").into_owned()
}

/// `CV_<NAME>.pdf`: ASCII-folded, non-alphanumeric runs collapsed to `_`, uppercased.
pub fn cv_attachment_name(full_name: &str) -> String {
    static NON_ALNUM: OnceLock<Regex> = OnceLock::new();
    let non_alnum = NON_ALNUM.get_or_init(|| Regex::new(r"[^a-zA-Z0-9]+").expect("valid regex"));

    let folded: String = full_name.trim().nfkd().filter(char::is_ascii).collect();
    let normalized = non_alnum
        .replace_all(&folded, "_")
        .trim_matches('_')
        .to_uppercase();
    if normalized.is_empty() {
        "CV_CANDIDAT.pdf".to_string()
    } else {
        format!("CV_{normalized}.pdf")
    }
}

pub fn letter_attachment_name(company: &str) -> String {
    format!("Lettre_de_motivation_{company}.pdf")
}

/// Builds the message for one application, without attachments.
pub fn compose(settings: &Settings, to: &str, company: &str) -> OutgoingEmail {
    let values = placeholder_values(settings, company);
    let with_phone = !settings.candidate.phone.trim().is_empty();

    let body_template = with_signature(&settings.expand_tags(&settings.email.body_template), with_phone);
    let html_body = apply_placeholders(&body_template, &values);
    let text_body = html_to_text(&html_body);
    let subject = apply_placeholders(&settings.expand_tags(&settings.email.subject), &values);

    let bcc = settings.email.bcc_email.trim();
    OutgoingEmail {
        from_email: settings.email.from.email.trim().to_string(),
        from_name: settings.email.from.name.trim().to_string(),
        to: to.to_string(),
        bcc: (!bcc.is_empty()).then(|| bcc.to_string()),
        subject,
        html_body,
        text_body,
        attachments: Vec::new(),
    }
}
