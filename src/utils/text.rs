use std::sync::OnceLock;

use regex::Regex;

/// First `file:"..."` literal of a player setup script.
pub fn extract_file_property(script: &str) -> Option<&str> {
    static FILE_PROPERTY_RE: OnceLock<Regex> = OnceLock::new();
    FILE_PROPERTY_RE
        .get_or_init(|| Regex::new(r#"file:\s?['"](?<file>[^"']+)['"]"#).unwrap())
        .captures(script)
        .and_then(|m| Some(m.name("file")?.as_str()))
}

pub fn to_full_url(url: &str) -> String {
    if url.starts_with("//") {
        format!("https:{url}")
    } else {
        url.into()
    }
}

pub fn substring_between<'a>(text: &'a str, start: &str, end: &str) -> Option<&'a str> {
    let (_, rest) = text.split_once(start)?;
    let (inner, _) = rest.split_once(end)?;
    Some(inner)
}
