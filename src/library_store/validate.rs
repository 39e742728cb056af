//! Input validation helpers for the library store.

use chrono::NaiveDate;
use tracing::warn;

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parse an optional date field from form-style input.
///
/// Empty input means "unknown" and is not an error. Malformed input pushes a
/// human-readable warning and is dropped; the surrounding add still succeeds
/// with the field left absent.
pub fn parse_optional_date(
    field: &str,
    raw: &str,
    warnings: &mut Vec<String>,
) -> Option<NaiveDate> {
    if raw.is_empty() {
        return None;
    }
    match NaiveDate::parse_from_str(raw, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(err) => {
            warnings.push(format!(
                "Could not parse {} '{}' ({}), the date was not added",
                field, raw, err
            ));
            None
        }
    }
}

/// True if `s` is exactly `len` ASCII digits.
pub fn is_digits_of_len(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| b.is_ascii_digit())
}

// Helper: Option<NaiveDate> to its TEXT column representation.
pub(crate) fn date_to_sql(date: &Option<NaiveDate>) -> Option<String> {
    date.map(|d| d.format(DATE_FORMAT).to_string())
}

// Helper: TEXT column value back to Option<NaiveDate>.
pub(crate) fn date_from_sql(value: Option<String>) -> Option<NaiveDate> {
    value.and_then(|raw| match NaiveDate::parse_from_str(&raw, DATE_FORMAT) {
        Ok(date) => Some(date),
        Err(err) => {
            warn!("Malformed date in library db: '{}': {}", raw, err);
            None
        }
    })
}
