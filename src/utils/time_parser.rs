use chrono::{DateTime, Duration, NaiveDate, Utc};

/// 时间输入解析
pub struct TimeParser;

impl TimeParser {
    /// 解析时间点，支持：
    /// - RFC3339：2026-10-01T12:00:00Z
    /// - 日期：2026-10-01（按 UTC 零点）
    pub fn parse_datetime(input: &str) -> Result<DateTime<Utc>, String> {
        let input = input.trim();

        if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
            return Ok(dt.with_timezone(&Utc));
        }

        NaiveDate::parse_from_str(input, "%Y-%m-%d")
            .ok()
            .and_then(|d| d.and_hms_opt(0, 0, 0))
            .map(|naive| naive.and_utc())
            .ok_or_else(|| {
                format!(
                    "Invalid datetime '{}'. Use RFC3339 (2026-10-01T12:00:00Z) or YYYY-MM-DD",
                    input
                )
            })
    }

    /// 解析截止时间：绝对时间或相对于 `now` 的偏移（如 "7d"、"1w2d"、"12h"）
    pub fn parse_until(input: &str, now: DateTime<Utc>) -> Result<DateTime<Utc>, String> {
        if let Ok(dt) = Self::parse_datetime(input) {
            return Ok(dt);
        }
        let offset = Self::parse_duration(input)?;
        Self::offset_from(now, offset)
    }

    /// `now + offset`，超出可表示范围时报错
    pub fn offset_from(now: DateTime<Utc>, offset: Duration) -> Result<DateTime<Utc>, String> {
        now.checked_add_signed(offset)
            .ok_or_else(|| "Time offset is out of range".to_string())
    }

    /// 解析相对时长：1d, 2w, 3mo, 1y, 1h30m, 2d12h
    pub fn parse_duration(input: &str) -> Result<Duration, String> {
        let input = input.trim();
        let mut total = Duration::zero();
        let mut rest = input;

        while !rest.is_empty() {
            let digits_end = rest
                .find(|c: char| !c.is_ascii_digit())
                .unwrap_or(rest.len());
            if digits_end == 0 {
                return Err(format!("Invalid duration: '{}'", input));
            }
            let num: i64 = rest[..digits_end]
                .parse()
                .map_err(|_| format!("Invalid number in duration: '{}'", input))?;
            rest = &rest[digits_end..];

            let unit_end = rest
                .find(|c: char| !c.is_ascii_alphabetic())
                .unwrap_or(rest.len());
            if unit_end == 0 {
                return Err(format!("Missing unit after '{}' in '{}'", num, input));
            }
            let unit = &rest[..unit_end];
            rest = &rest[unit_end..];

            let part = match unit {
                "s" | "sec" | "secs" => Duration::try_seconds(num),
                "m" | "min" | "mins" => Duration::try_minutes(num),
                "h" | "hour" | "hours" => Duration::try_hours(num),
                "d" | "day" | "days" => Duration::try_days(num),
                "w" | "week" | "weeks" => Duration::try_weeks(num),
                "mo" | "month" | "months" => num.checked_mul(30).and_then(Duration::try_days),
                "y" | "year" | "years" => num.checked_mul(365).and_then(Duration::try_days),
                _ => return Err(format!("Unsupported time unit: '{}'", unit)),
            };
            total = part
                .and_then(|part| total.checked_add(&part))
                .ok_or_else(|| format!("Duration is too large: '{}'", input))?;
        }

        if total <= Duration::zero() {
            return Err(format!("Duration must be positive: '{}'", input));
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_datetime_rfc3339() {
        let dt = TimeParser::parse_datetime("2026-10-01T12:00:00Z").unwrap();
        assert_eq!(dt.to_rfc3339(), "2026-10-01T12:00:00+00:00");
    }

    #[test]
    fn test_parse_datetime_with_offset_normalises_to_utc() {
        let dt = TimeParser::parse_datetime("2026-10-01T08:00:00+08:00").unwrap();
        assert_eq!(dt.to_rfc3339(), "2026-10-01T00:00:00+00:00");
    }

    #[test]
    fn test_parse_datetime_date_only() {
        let dt = TimeParser::parse_datetime("2026-12-31").unwrap();
        assert_eq!(dt.to_rfc3339(), "2026-12-31T00:00:00+00:00");
    }

    #[test]
    fn test_parse_datetime_invalid() {
        assert!(TimeParser::parse_datetime("next tuesday").is_err());
        assert!(TimeParser::parse_datetime("").is_err());
    }

    #[test]
    fn test_parse_duration_compound() {
        assert_eq!(TimeParser::parse_duration("1d2h").unwrap(), Duration::hours(26));
        assert_eq!(TimeParser::parse_duration("2w").unwrap(), Duration::days(14));
        assert_eq!(TimeParser::parse_duration("1mo").unwrap(), Duration::days(30));
        assert_eq!(TimeParser::parse_duration("90m").unwrap(), Duration::minutes(90));
    }

    #[test]
    fn test_parse_duration_rejects_garbage() {
        assert!(TimeParser::parse_duration("d").is_err());
        assert!(TimeParser::parse_duration("5").is_err());
        assert!(TimeParser::parse_duration("3x").is_err());
        assert!(TimeParser::parse_duration("0d").is_err());
    }

    #[test]
    fn test_parse_until_relative() {
        let now = Utc::now();
        let until = TimeParser::parse_until("7d", now).unwrap();
        assert_eq!(until - now, Duration::days(7));
    }

    #[test]
    fn test_oversized_durations_are_errors() {
        assert!(TimeParser::parse_duration("9999999999999d").is_err());
        assert!(TimeParser::parse_duration("999999999999999999y").is_err());
        assert!(TimeParser::parse_duration("99999999999999999999s").is_err());
        // 每段都合法，累加后溢出
        let huge = format!("{}w{}w", i64::MAX / 1_000_000_000, i64::MAX / 1_000_000_000);
        assert!(TimeParser::parse_duration(&huge).is_err());
    }

    #[test]
    fn test_parse_until_out_of_range() {
        let now = Utc::now();
        assert!(TimeParser::parse_until("999999999d", now).is_err());
        assert!(TimeParser::offset_from(now, Duration::MAX).is_err());
    }

    #[test]
    fn test_parse_until_absolute() {
        let now = Utc::now();
        let until = TimeParser::parse_until("2030-01-01", now).unwrap();
        assert_eq!(until.to_rfc3339(), "2030-01-01T00:00:00+00:00");
    }
}
