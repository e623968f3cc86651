use anyhow::{Result, anyhow};
use std::path::Path;

#[derive(Debug, Clone)]
pub struct ValidationError {
    pub code: &'static str,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for ValidationError {}

/// Maximum length of a stored attachment filename
pub const MAX_FILENAME_LEN: usize = 255;

/// Reduce a client-supplied filename to a safe display name.
pub fn sanitize_filename(filename: &str) -> Result<String> {
    // Get only the filename component (remove any path)
    let name = Path::new(filename)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("");

    if name.is_empty() {
        return Err(anyhow!(ValidationError {
            code: "INVALID_FILENAME",
            message: "Filename cannot be empty".to_string(),
        }));
    }

    if filename.contains("..") || filename.contains('/') || filename.contains('\\') {
        tracing::warn!("Path traversal attempt detected: {}", filename);
    }

    let sanitized: String = name
        .chars()
        .map(|c| {
            if c.is_control()
                || matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | ';')
            {
                '_'
            } else {
                c
            }
        })
        .collect();

    let sanitized = sanitized.trim().trim_start_matches('.').to_string();
    if sanitized.is_empty() {
        return Err(anyhow!(ValidationError {
            code: "INVALID_FILENAME",
            message: "Filename has no usable characters".to_string(),
        }));
    }

    if sanitized.chars().count() > MAX_FILENAME_LEN {
        return Err(anyhow!(ValidationError {
            code: "FILENAME_TOO_LONG",
            message: format!("Filename exceeds {} characters", MAX_FILENAME_LEN),
        }));
    }

    Ok(sanitized)
}

/// Lower-cased extension including the leading dot, or empty.
pub fn extension_of(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{}", e.to_ascii_lowercase()))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_strips_path() {
        assert_eq!(sanitize_filename("../../etc/passwd").unwrap(), "passwd");
        assert_eq!(sanitize_filename("dir/report.pdf").unwrap(), "report.pdf");
    }

    #[test]
    fn test_sanitize_replaces_reserved() {
        assert_eq!(sanitize_filename("a:b*c?.txt").unwrap(), "a_b_c_.txt");
    }

    #[test]
    fn test_sanitize_rejects_empty() {
        assert!(sanitize_filename("").is_err());
        assert!(sanitize_filename("...").is_err());
    }

    #[test]
    fn test_extension_of() {
        assert_eq!(extension_of("Report.PDF"), ".pdf");
        assert_eq!(extension_of("noext"), "");
        assert_eq!(extension_of("weird.t$t"), "");
    }
}
