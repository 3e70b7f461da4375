//! File name sanitization.

use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Default maximum length of a sanitized name, in characters.
pub const DEFAULT_FILENAME_LIMIT: usize = 150;

/// Characters rejected by common file systems.
const INVALID_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Turn arbitrary text into a file-system-safe name.
///
/// Diacritics are stripped, whitespace becomes a single underscore, invalid
/// characters are dropped, underscore runs collapse and leading or trailing
/// underscores are trimmed. The part before the extension is then cut to
/// `limit` characters. Applying the function twice gives the same result as
/// applying it once.
pub fn sanitize_filename(name: &str, limit: usize) -> String {
    let mut cleaned = String::with_capacity(name.len());

    for c in name.nfkd().filter(|c| !is_combining_mark(*c)) {
        let c = if c.is_whitespace() { '_' } else { c };
        if INVALID_CHARS.contains(&c) || (c == '_' && cleaned.ends_with('_')) {
            continue;
        }
        cleaned.push(c);
    }

    let cleaned = cleaned.trim_matches('_');
    let (base, ext) = split_extension(cleaned);

    let truncated: String = base.chars().take(limit).collect();
    let base = truncated.trim_end_matches('_');

    // Without a real stem the extension would be re-read as part of the stem
    if base.chars().all(|c| c == '.') {
        return base.to_string();
    }
    format!("{}{}", base, ext)
}

/// Split at the last dot, unless everything before it is dots.
fn split_extension(name: &str) -> (&str, &str) {
    match name.rfind('.') {
        Some(dot) if name[..dot].chars().any(|c| c != '.') => name.split_at(dot),
        _ => (name, ""),
    }
}
