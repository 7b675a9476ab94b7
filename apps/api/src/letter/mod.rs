// Letter pipeline: render the DOCX template, convert it to PDF, email it, record it.
// The three external effects sit behind traits (render, convert, mailer) carried in
// AppState, so the sequencing in `pipeline` is testable without LibreOffice or SMTP.

pub mod convert;
pub mod email;
pub mod handlers;
pub mod mailer;
pub mod pipeline;
pub mod render;
