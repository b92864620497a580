use sha2::{Digest, Sha256};

const MAX_STEM_LEN: usize = 80;

/// Filesystem-safe file stem: forbidden characters and spaces become `_`,
/// underscore runs collapse, and Windows reserved names get a trailing `_`.
/// Stems longer than 80 characters are cut and suffixed with `-{short_hash}`
/// of the full stem, so distinct long names stay distinct.
pub fn sanitize_stem(input: &str) -> String {
    let mut stem = clean_stem(input);
    if let Some((idx, _)) = stem.char_indices().nth(MAX_STEM_LEN) {
        let hash = short_hash(&stem);
        stem.truncate(idx);
        stem.push('-');
        stem.push_str(&hash);
    }
    if is_reserved_windows_name(&stem) {
        stem.push('_');
    }
    stem
}

/// Character cleanup of [`sanitize_stem`] without length or reserved-name handling.
pub(crate) fn clean_stem(input: &str) -> String {
    let replaced: String = input
        .chars()
        .map(|c| if is_forbidden(c) || c.is_whitespace() { '_' } else { c })
        .collect();

    let mut compacted = String::with_capacity(replaced.len());
    let mut prev_underscore = false;
    for c in replaced.trim_matches(&['_', '.'][..]).chars() {
        if c == '_' && prev_underscore {
            continue;
        }
        prev_underscore = c == '_';
        compacted.push(c);
    }
    if compacted.is_empty() {
        compacted = "untitled".to_string();
    }
    compacted
}

/// Sanitize a whole `stem.ext` filename; the extension is lowercased.
pub fn sanitize_filename(input: &str) -> String {
    match input.trim().rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() && is_plain_extension(ext) => {
            format!("{}.{}", sanitize_stem(stem), ext.to_ascii_lowercase())
        }
        _ => sanitize_stem(input),
    }
}

pub(crate) fn is_plain_extension(ext: &str) -> bool {
    !ext.is_empty() && ext.len() <= 5 && ext.chars().all(|c| c.is_ascii_alphanumeric())
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

fn short_hash(input: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let digest = hasher.finalize();
    let mut hex = String::with_capacity(8);
    for byte in digest.iter().take(4) {
        use std::fmt::Write;
        let _ = write!(&mut hex, "{byte:02x}");
    }
    hex
}
