// src/utils.rs

/// Replace every character outside `[A-Za-z0-9.-]` so the name is safe as a repository path segment
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// Unique stored name for an uploaded asset: `{millis}-{sanitized original}`
pub fn asset_file_name(timestamp_millis: i64, original: &str) -> String {
    let base = std::path::Path::new(original)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(original);
    format!("{}-{}", timestamp_millis, sanitize_file_name(base))
}

/// Trimmed owned copy of a form field
pub fn trimmed(value: &str) -> String {
    value.trim().to_string()
}

/// Trimmed optional field, `None` when blank
pub fn non_blank(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}
