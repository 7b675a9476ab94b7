use crate::letter::email::is_valid_email;
use crate::settings::{ResolvedPaths, Settings};

/// Lists setup problems that would make letter generation fail or degrade.
/// An empty list means the installation is ready.
pub fn check_setup(settings: &Settings, paths: &ResolvedPaths) -> Vec<String> {
    let mut problems = Vec::new();

    if !paths.template.is_file() {
        problems.push(format!(
            "Template file does not exist: {}",
            paths.template.display()
        ));
    }
    if let Some(cv) = &paths.cv {
        if !cv.is_file() {
            problems.push(format!("CV file does not exist: {}", cv.display()));
        }
    }

    for (name, dir) in [
        ("letters_folder", &paths.letters_dir),
        ("logs_folder", &paths.logs_dir),
    ] {
        if !dir.is_dir() {
            problems.push(format!("Folder {name} does not exist: {}", dir.display()));
        }
    }

    if !is_valid_email(&settings.email.from.email) {
        problems.push("Sender email address is not valid".to_string());
    }
    let bcc = settings.email.bcc_email.trim();
    if !bcc.is_empty() && !is_valid_email(bcc) {
        problems.push("BCC email address is not valid".to_string());
    }

    problems
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_directory_reports_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let settings = Settings::default();
        let problems = check_setup(&settings, &settings.resolve_paths(dir.path()));
        assert_eq!(problems.len(), 4, "{problems:?}");
        assert!(problems[0].starts_with("Template file does not exist"));
    }

    #[test]
    fn test_complete_setup_has_no_problems() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.files.cv_path = String::new();
        settings.email.bcc_email = String::new();
        let paths = settings.resolve_paths(dir.path());
        std::fs::write(&paths.template, b"docx").unwrap();
        std::fs::create_dir_all(&paths.letters_dir).unwrap();
        std::fs::create_dir_all(&paths.logs_dir).unwrap();

        assert!(check_setup(&settings, &paths).is_empty());
    }

    #[test]
    fn test_invalid_addresses_are_reported() {
        let dir = tempfile::tempdir().unwrap();
        let mut settings = Settings::default();
        settings.email.from.email = "nobody".to_string();
        settings.email.bcc_email = "also wrong".to_string();
        let problems = check_setup(&settings, &settings.resolve_paths(dir.path()));
        assert!(problems.iter().any(|p| p == "Sender email address is not valid"));
        assert!(problems.iter().any(|p| p == "BCC email address is not valid"));
    }
}
