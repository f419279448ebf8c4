use std::path::Path;

/// Extension given to stored images when the client supplies none.
pub const DEFAULT_IMAGE_EXTENSION: &str = ".jpg";

/// Lowercase, keeping ASCII letters, digits, `-` and `_`. Anything else,
/// path separators and dots included, becomes `_`.
fn slug(value: &str) -> String {
    value
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '-' | '_' => c,
            'A'..='Z' => c.to_ascii_lowercase(),
            _ => '_',
        })
        .collect()
}

/// Storage key for a generated portrait: `{name}_{timestamp}.jpg`.
pub fn generated_image_key(avatar_name: &str, timestamp: i64) -> String {
    format!(
        "{}_{}{}",
        slug(avatar_name),
        timestamp,
        DEFAULT_IMAGE_EXTENSION
    )
}

/// Storage key for a client-supplied image: `{stem}_{timestamp}{ext}`.
///
/// Only the final path component of the client filename is used. The stem
/// defaults to `avatar` and the extension to `.jpg`.
pub fn uploaded_image_key(original_name: Option<&str>, timestamp: i64) -> String {
    let file_name = original_name
        .map(Path::new)
        .and_then(Path::file_name)
        .and_then(|name| name.to_str())
        .filter(|name| !name.is_empty())
        .unwrap_or("avatar");

    let path = Path::new(file_name);
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("avatar");
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| !e.is_empty() && e.chars().all(|c| c.is_ascii_alphanumeric()))
        .map(|e| format!(".{}", e))
        .unwrap_or_else(|| DEFAULT_IMAGE_EXTENSION.to_string());

    format!("{}_{}{}", slug(stem), timestamp, extension)
}

/// Seconds since the Unix epoch.
pub fn unix_timestamp() -> i64 {
    chrono::Utc::now().timestamp()
}
