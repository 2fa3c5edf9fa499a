/// Case-folds and trims a header or cell, dropping surrounding quote characters.
pub fn normalize_header(raw: &str) -> String {
    raw.trim()
        .trim_matches(|c| c == '"' || c == '\'')
        .trim()
        .to_lowercase()
}

/// Trims a raw cell and returns `None` when nothing is left.
pub fn clean_cell(raw: &str) -> Option<&str> {
    let trimmed = raw.trim().trim_matches('"').trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed)
    }
}

/// Parses a loosely formatted numeric cell.
///
/// Accepts currency symbols, thousands separators and surrounding whitespace
/// (`"$350,000"`, `" 2,800 "`). Returns `None` for empty, non-numeric or
/// non-finite input.
pub fn parse_number(raw: &str) -> Option<f64> {
    let cleaned: String = clean_cell(raw)?
        .chars()
        .filter(|c| !matches!(c, '$' | ',' | '_' | ' '))
        .collect();

    if cleaned.is_empty() {
        return None;
    }

    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Parses a numeric cell and keeps it only if strictly positive.
pub fn parse_positive(raw: &str) -> Option<f64> {
    parse_number(raw).filter(|v| *v > 0.0)
}

/// Rounds to the nearest whole currency unit, halves away from zero.
pub fn round_currency(value: f64) -> f64 {
    value.round()
}

/// Percentage of `part` relative to `whole`, or 0 when `whole` is not positive.
pub fn percent_of(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}
