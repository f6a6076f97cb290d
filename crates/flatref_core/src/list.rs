use crate::Reference;

/// Lines starting with this marker are ignored when reading a list.
pub const COMMENT_MARKER: char = '#';

/// Result of reading a reference list: the references in file order plus the
/// 1-based line numbers that did not have the reference shape.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedList {
    pub references: Vec<Reference>,
    pub malformed_lines: Vec<usize>,
}

/// Parses reference list text. Blank and comment lines are skipped, malformed
/// lines are recorded but never fail the parse.
pub fn parse_reference_list(text: &str) -> ParsedList {
    let mut parsed = ParsedList::default();
    for (idx, line) in text.lines().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with(COMMENT_MARKER) {
            continue;
        }
        match trimmed.parse::<Reference>() {
            Ok(reference) => parsed.references.push(reference),
            Err(_) => parsed.malformed_lines.push(idx + 1),
        }
    }
    parsed
}

/// Renders references one per line, each terminated by `\n`.
pub fn render_reference_list<'a>(references: impl IntoIterator<Item = &'a Reference>) -> String {
    let mut out = String::new();
    for reference in references {
        out.push_str(&reference.to_string());
        out.push('\n');
    }
    out
}
