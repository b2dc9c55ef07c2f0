use crate::domain::errors::{DomainError, DomainResult};

const NANOS_PER_SECOND: i128 = 1_000_000_000;
/// Durations are bounded by i64 nanoseconds, like Go's `time.Duration`.
const MAX_NANOS: i128 = i64::MAX as i128;

fn unit_nanos(unit: &str) -> Option<i128> {
    match unit {
        "ns" => Some(1),
        "us" | "µs" | "μs" => Some(1_000),
        "ms" => Some(1_000_000),
        "s" => Some(NANOS_PER_SECOND),
        "m" => Some(60 * NANOS_PER_SECOND),
        "h" => Some(3_600 * NANOS_PER_SECOND),
        _ => None,
    }
}

fn invalid(input: &str) -> DomainError {
    DomainError::validation(format!("invalid duration {input:?}"))
}

/// Parses a duration string such as `"1h30m"`, `"90s"` or `"1.5h"` into whole
/// seconds. Sub-second remainders are truncated toward zero.
pub fn parse_duration_seconds(input: &str) -> DomainResult<i64> {
    let nanos = parse_duration_nanos(input)?;
    i64::try_from(nanos / NANOS_PER_SECOND).map_err(|_| invalid(input))
}

/// Parses a duration string into whole milliseconds.
pub fn parse_duration_millis(input: &str) -> DomainResult<i64> {
    let nanos = parse_duration_nanos(input)?;
    i64::try_from(nanos / 1_000_000).map_err(|_| invalid(input))
}

fn parse_duration_nanos(input: &str) -> DomainResult<i128> {
    let mut rest = input.trim();
    if rest.is_empty() {
        return Err(invalid(input));
    }

    let mut negative = false;
    if let Some(stripped) = rest.strip_prefix('-') {
        negative = true;
        rest = stripped;
    } else if let Some(stripped) = rest.strip_prefix('+') {
        rest = stripped;
    }

    if rest == "0" {
        return Ok(0);
    }
    if rest.is_empty() {
        return Err(invalid(input));
    }

    let mut total: i128 = 0;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let (number, tail) = rest.split_at(number_len);
        if number.is_empty() || number == "." {
            return Err(invalid(input));
        }

        let unit_len = tail
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(tail.len());
        let (unit, tail) = tail.split_at(unit_len);
        let scale = unit_nanos(unit).ok_or_else(|| invalid(input))?;

        let (whole, fraction) = match number.split_once('.') {
            Some((whole, fraction)) => (whole, fraction),
            None => (number, ""),
        };
        if fraction.contains('.') {
            return Err(invalid(input));
        }

        let whole: i128 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid(input))?
        };
        total = total
            .checked_add(whole.checked_mul(scale).ok_or_else(|| invalid(input))?)
            .ok_or_else(|| invalid(input))?;

        if !fraction.is_empty() {
            // Ignore digits past nanosecond precision.
            let digits = &fraction[..fraction.len().min(18)];
            let value: i128 = digits.parse().map_err(|_| invalid(input))?;
            let divisor = 10_i128.pow(digits.len() as u32);
            total = total
                .checked_add(value * scale / divisor)
                .ok_or_else(|| invalid(input))?;
        }

        if total > MAX_NANOS + i128::from(negative) {
            return Err(invalid(input));
        }

        rest = tail;
    }

    Ok(if negative { -total } else { total })
}

/// Formats whole seconds as the shortest duration string, omitting zero
/// components: `3600 -> "1h"`, `5400 -> "1h30m"`, `0 -> "0s"`.
pub fn format_duration_seconds(seconds: i64) -> String {
    if seconds == 0 {
        return "0s".to_string();
    }

    let sign = if seconds < 0 { "-" } else { "" };
    let total = seconds.unsigned_abs();
    let hours = total / 3_600;
    let minutes = (total % 3_600) / 60;
    let secs = total % 60;

    let mut formatted = String::from(sign);
    if hours > 0 {
        formatted.push_str(&format!("{hours}h"));
    }
    if minutes > 0 {
        formatted.push_str(&format!("{minutes}m"));
    }
    if secs > 0 {
        formatted.push_str(&format!("{secs}s"));
    }
    formatted
}

/// Formats milliseconds; whole-second values use [`format_duration_seconds`].
pub fn format_duration_millis(millis: i64) -> String {
    if millis % 1_000 == 0 {
        format_duration_seconds(millis / 1_000)
    } else {
        let seconds = millis / 1_000;
        let rest = millis % 1_000;
        if seconds == 0 {
            format!("{rest}ms")
        } else {
            format!("{}{}ms", format_duration_seconds(seconds), rest.abs())
        }
    }
}

/// An empty string or `"0"` means "leave unset"; anything else is parsed.
pub fn optional_duration_seconds(input: &str) -> DomainResult<Option<i64>> {
    match input.trim() {
        "" | "0" => Ok(None),
        other => parse_duration_seconds(other).map(Some),
    }
}

/// Two duration strings are equivalent when they denote the same number of
/// seconds, so `"1h"` and `"60m"` produce no diff.
pub fn durations_equivalent(left: &str, right: &str) -> bool {
    if left == right {
        return true;
    }
    match (parse_duration_nanos(left), parse_duration_nanos(right)) {
        (Ok(a), Ok(b)) => a / NANOS_PER_SECOND == b / NANOS_PER_SECOND,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_compound_durations() {
        assert_eq!(parse_duration_seconds("1h").unwrap(), 3_600);
        assert_eq!(parse_duration_seconds("1h30m").unwrap(), 5_400);
        assert_eq!(parse_duration_seconds("1h0m0s").unwrap(), 3_600);
        assert_eq!(parse_duration_seconds("90s").unwrap(), 90);
        assert_eq!(parse_duration_seconds("1.5h").unwrap(), 5_400);
        assert_eq!(parse_duration_seconds("1500ms").unwrap(), 1);
        assert_eq!(parse_duration_seconds("0").unwrap(), 0);
        assert_eq!(parse_duration_seconds("-5m").unwrap(), -300);
    }

    #[test]
    fn rejects_malformed_durations() {
        for input in ["", "h", "1", "1x", "1h30", "1..5s", "-"] {
            assert!(
                parse_duration_seconds(input).is_err(),
                "{input:?} should not parse"
            );
        }
    }

    #[test]
    fn rejects_durations_beyond_i64_nanoseconds() {
        for input in ["18446744073709555216s", "2562048h", "9223372036855ms"] {
            assert!(
                parse_duration_seconds(input).is_err(),
                "{input:?} should not parse"
            );
        }
        assert!(parse_duration_millis("18446744073709551621ms").is_err());
        assert!(parse_duration_seconds("99999999999999999999999999999999999999999h").is_err());

        assert_eq!(parse_duration_seconds("2562047h").unwrap(), 9_223_369_200);
        assert_eq!(parse_duration_millis("9223372036854ms").unwrap(), 9_223_372_036_854);
        assert_eq!(parse_duration_seconds("-9223372036854775808ns").unwrap(), -9);
    }

    #[test]
    fn formats_without_zero_components() {
        assert_eq!(format_duration_seconds(0), "0s");
        assert_eq!(format_duration_seconds(45), "45s");
        assert_eq!(format_duration_seconds(90), "1m30s");
        assert_eq!(format_duration_seconds(3_600), "1h");
        assert_eq!(format_duration_seconds(36_000), "10h");
        assert_eq!(format_duration_seconds(3_601), "1h1s");
    }

    #[test]
    fn millisecond_formatting() {
        assert_eq!(format_duration_millis(5_000), "5s");
        assert_eq!(format_duration_millis(250), "250ms");
        assert_eq!(format_duration_millis(1_250), "1s250ms");
        assert_eq!(parse_duration_millis("1s250ms").unwrap(), 1_250);
    }

    #[test]
    fn zero_and_empty_are_suppressed() {
        assert_eq!(optional_duration_seconds("").unwrap(), None);
        assert_eq!(optional_duration_seconds("0").unwrap(), None);
        assert_eq!(optional_duration_seconds("30m").unwrap(), Some(1_800));
    }

    #[test]
    fn equivalent_durations_suppress_diffs() {
        assert!(durations_equivalent("1h", "60m"));
        assert!(durations_equivalent("1h0m0s", "1h"));
        assert!(!durations_equivalent("1h", "1h1s"));
        assert!(!durations_equivalent("1h", "bogus"));
    }
}
