/// Extension of reference list files written by the catalog reader.
pub const REFS_EXTENSION: &str = "refs";
/// Extension of downloaded descriptor files.
pub const DESCRIPTOR_EXTENSION: &str = "flatpakref";

/// `{category}.refs`, with the category made safe as a single path component.
pub fn list_filename(category: &str) -> String {
    format!("{}.{REFS_EXTENSION}", sanitize_component(category))
}

/// `{app_id}.flatpakref`.
pub fn descriptor_filename(app_id: &str) -> String {
    format!("{}.{DESCRIPTOR_EXTENSION}", sanitize_component(app_id))
}

/// Windows-safe single path component. Separators and reserved characters
/// become `_`, runs of `_` collapse, and reserved device names get a suffix.
pub fn sanitize_component(input: &str) -> String {
    let mut cleaned: String = input
        .chars()
        .map(|c| if is_forbidden(c) { '_' } else { c })
        .collect();
    cleaned = cleaned.trim_matches(&['_', ' ', '.'][..]).to_string();
    if cleaned.is_empty() {
        cleaned = "unnamed".to_string();
    }
    // Collapse multiple underscores
    let mut compacted = String::with_capacity(cleaned.len());
    let mut prev_underscore = false;
    for c in cleaned.chars() {
        if c == '_' {
            if !prev_underscore {
                compacted.push(c);
            }
            prev_underscore = true;
        } else {
            compacted.push(c);
            prev_underscore = false;
        }
    }
    if is_reserved_windows_name(&compacted) {
        compacted.push('_');
    }
    compacted
}

fn is_forbidden(c: char) -> bool {
    matches!(c,
        '\\' | '/' | ':' | '*' | '?' | '"' | '<' | '>' | '|' | '\0'..='\u{1F}'
    )
}

fn is_reserved_windows_name(name: &str) -> bool {
    const RESERVED: &[&str] = &[
        "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
        "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
    ];
    RESERVED.iter().any(|r| r.eq_ignore_ascii_case(name))
}
