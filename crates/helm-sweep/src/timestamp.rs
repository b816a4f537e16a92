//! Normalizes Helm's last-deployed timestamps into epoch seconds.
//!
//! Helm emits RFC 3339 with nanosecond precision and either a `Z` suffix or
//! a numeric offset. Sub-second precision is truncated.

use chrono::DateTime;

use crate::error::SweepError;

/// Parse an ISO-8601 / RFC 3339 timestamp into UTC epoch seconds.
pub fn parse_timestamp(raw: &str) -> Result<i64, SweepError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.timestamp());
    }

    // Lenient path for near-RFC3339 forms: force a numeric offset, drop
    // fractional seconds and the offset colon, then parse with an explicit
    // format string.
    let normalized = normalize(raw);
    DateTime::parse_from_str(&normalized, "%Y-%m-%dT%H:%M:%S%z")
        .map(|dt| dt.timestamp())
        .map_err(|_| SweepError::Timestamp(raw.to_string()))
}

/// Rewrite `...T12:34:56.789Z` style inputs as `...T12:34:56+0000`.
fn normalize(raw: &str) -> String {
    let mut s = raw.trim().to_string();

    if let Some(stripped) = s.strip_suffix('Z').or_else(|| s.strip_suffix('z')) {
        s = format!("{stripped}+0000");
    }

    // Strip a fractional-seconds run introduced by '.' after the time part.
    if let Some(dot) = s.find('.') {
        let tail = &s[dot..];
        let frac_len = tail[1..].bytes().take_while(u8::is_ascii_digit).count();
        s = format!("{}{}", &s[..dot], &tail[1 + frac_len..]);
    }

    // "+00:00" -> "+0000"; the offset sign can only follow the time part,
    // so look after the 'T'.
    if let Some(t_pos) = s.find('T') {
        if let Some(off) = s[t_pos..].rfind(['+', '-']) {
            let off = t_pos + off;
            let (head, offset) = s.split_at(off);
            s = format!("{head}{}", offset.replace(':', ""));
        }
    }

    s
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPOCH_2025_01_31: i64 = 1_738_333_894; // 2025-01-31T14:31:34Z

    #[test]
    fn zulu_offset_and_fractional_forms_agree() {
        assert_eq!(parse_timestamp("2025-01-31T14:31:34Z").unwrap(), EPOCH_2025_01_31);
        assert_eq!(
            parse_timestamp("2025-01-31T14:31:34+00:00").unwrap(),
            EPOCH_2025_01_31
        );
        assert_eq!(
            parse_timestamp("2025-01-31T14:31:34.123456789Z").unwrap(),
            EPOCH_2025_01_31
        );
    }

    #[test]
    fn non_utc_offsets() {
        // 15:31:34+01:00 is the same instant as 14:31:34Z.
        assert_eq!(
            parse_timestamp("2025-01-31T15:31:34+01:00").unwrap(),
            EPOCH_2025_01_31
        );
        assert_eq!(
            parse_timestamp("2025-01-31T09:31:34-05:00").unwrap(),
            EPOCH_2025_01_31
        );
    }

    #[test]
    fn subsecond_precision_is_truncated() {
        assert_eq!(
            parse_timestamp("2025-01-31T14:31:34.999999999Z").unwrap(),
            EPOCH_2025_01_31
        );
    }

    #[test]
    fn helm_style_nanoseconds() {
        // As produced by `helm status -o json`.
        assert_eq!(
            parse_timestamp("2023-01-01T00:00:00.000000001Z").unwrap(),
            1_672_531_200
        );
    }

    #[test]
    fn garbage_is_an_error_carrying_the_input() {
        let err = parse_timestamp("not-a-date").unwrap_err();
        assert!(err.to_string().contains("not-a-date"));
        assert!(parse_timestamp("").is_err());
        assert!(parse_timestamp("2025-01-31").is_err());
    }

    #[test]
    fn normalize_rewrites_shell_hostile_forms() {
        assert_eq!(normalize("2025-01-31T14:31:34Z"), "2025-01-31T14:31:34+0000");
        assert_eq!(
            normalize("2025-01-31T14:31:34.123+00:00"),
            "2025-01-31T14:31:34+0000"
        );
    }
}
