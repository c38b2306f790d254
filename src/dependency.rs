//! Input normalization for the dependency link and free-text fields.
//!
//! Nothing here fails: malformed input degrades to `None` ("absent").

/// Parse a submitted `requires_id`.
///
/// Accepts only a plain run of ASCII digits that fits in an `i64` and is not
/// the owning task's own id. Whether the target exists is checked against
/// the store by the caller.
pub fn parse_requirement(raw: Option<&str>, own_id: i64) -> Option<i64> {
    let raw = raw?.trim();
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    raw.parse::<i64>().ok().filter(|&id| id != own_id)
}

/// Normalize a label: trimmed, title-cased, empty becomes `None`.
pub fn normalize_label(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(title_case(trimmed))
    }
}

/// Optional free text: empty becomes `None`, otherwise stored as given.
pub fn normalize_text(raw: Option<&str>) -> Option<String> {
    raw.filter(|s| !s.trim().is_empty()).map(str::to_string)
}

/// Title-case each word: an alphabetic character is uppercased when the
/// preceding character is not alphabetic, lowercased otherwise.
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}
