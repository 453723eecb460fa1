use chrono::NaiveDate;
use flashwire_types::{EnrichError, EnrichResult};

/// Validate a wire-format date (`YYYY-MM-DD`).
///
/// Anything else — including `YYYYMMDD`, slashes, or out-of-range
/// components — is a validation error.
pub fn validate_wire_date(date: &str) -> EnrichResult<NaiveDate> {
    if date.len() != 10 {
        return Err(EnrichError::validation(format!(
            "invalid date '{date}': expected YYYY-MM-DD"
        )));
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d").map_err(|_| {
        EnrichError::validation(format!("invalid date '{date}': expected YYYY-MM-DD"))
    })
}

/// Derive the partition table name for a wire-format date:
/// `2025-07-02` → `feed_entries_20250702`.
pub fn table_name_for_date(date: &str) -> EnrichResult<String> {
    let parsed = validate_wire_date(date)?;
    Ok(format!("feed_entries_{}", parsed.format("%Y%m%d")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_wire_format() {
        assert!(validate_wire_date("2025-07-02").is_ok());
        assert_eq!(
            table_name_for_date("2025-07-02").unwrap(),
            "feed_entries_20250702"
        );
    }

    #[test]
    fn rejects_other_formats() {
        for bad in ["20250702", "2025/07/02", "07-02-2025", "2025-13-01", "2025-02-30", "", "yesterday"] {
            assert!(validate_wire_date(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn rejects_padded_strings() {
        assert!(validate_wire_date(" 2025-07-02").is_err());
        assert!(validate_wire_date("2025-07-02 ").is_err());
    }
}
