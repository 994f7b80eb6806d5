use std::sync::OnceLock;

use regex::Regex;

/// A notes document split into its tag line and body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NotesDocument {
    pub tags: Vec<String>,
    pub body: String,
}

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"#([^\s#]+)").expect("static tag pattern"))
}

/// Splits `raw` into tags (read from the first line only) and the remaining body.
///
/// The first line is always treated as the tag line and dropped from the body,
/// whether or not it carries any `#tag` tokens.
pub fn parse_notes(raw: &str) -> NotesDocument {
    let (first, rest) = match raw.split_once('\n') {
        Some((first, rest)) => (first, rest),
        None => (raw, ""),
    };

    let tags = tag_pattern()
        .captures_iter(first)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .collect();

    NotesDocument {
        tags,
        body: rest.trim().to_string(),
    }
}
