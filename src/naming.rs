//! Deterministic output file names for downloaded activities.

use crate::types::{Activity, FileFormat};
use chrono::NaiveDate;

pub const UNKNOWN_DATE: &str = "unknown_date";

/// Keeps alphanumerics, space, `-` and `_`, trims, then turns spaces into
/// underscores.
pub fn sanitize_name(name: &str) -> String {
    let kept: String = name
        .chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect();
    kept.trim().replace(' ', "_")
}

/// `YYYYMMDD` from the first ten characters of a local start time, or
/// [`UNKNOWN_DATE`] when they are not a calendar date.
pub fn date_stamp(start_time_local: &str) -> String {
    let head: String = start_time_local.chars().take(10).collect();
    match NaiveDate::parse_from_str(&head, "%Y-%m-%d") {
        Ok(date) => date.format("%Y%m%d").to_string(),
        Err(_) => UNKNOWN_DATE.to_string(),
    }
}

pub fn activity_filename(activity: &Activity, format: FileFormat) -> String {
    format!(
        "{}_{}_{}.{}",
        date_stamp(activity.start_time()),
        sanitize_name(activity.id.as_str()),
        sanitize_name(activity.display_name()),
        format.extension()
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filename_uses_date_id_and_clean_name() {
        let activity = Activity::new(987u64, Some("Morning Run: 5k!"), Some("2024-03-01 07:15:00"));
        assert_eq!(
            activity_filename(&activity, FileFormat::Gpx),
            "20240301_987_Morning_Run_5k.gpx"
        );
    }

    #[test]
    fn filename_is_deterministic() {
        let activity = Activity::new(42u64, Some("Lunch Ride"), Some("2023-11-05T12:00:00"));
        for format in [FileFormat::Gpx, FileFormat::Tcx, FileFormat::Fit, FileFormat::Original] {
            assert_eq!(
                activity_filename(&activity, format),
                activity_filename(&activity, format)
            );
        }
        assert!(activity_filename(&activity, FileFormat::Original).ends_with(".original"));
    }

    #[test]
    fn malformed_start_time_degrades_to_sentinel() {
        let activity = Activity::new(7u64, Some("Swim"), Some("not-a-date"));
        assert!(activity_filename(&activity, FileFormat::Fit).starts_with("unknown_date_"));
        assert_eq!(date_stamp(""), UNKNOWN_DATE);
        assert_eq!(date_stamp("2024-02-30"), UNKNOWN_DATE);
        assert_eq!(date_stamp("Unknown"), UNKNOWN_DATE);
    }

    #[test]
    fn missing_metadata_uses_defaults() {
        let activity = Activity::new(5u64, None, None);
        assert_eq!(
            activity_filename(&activity, FileFormat::Tcx),
            "unknown_date_5_Unnamed.tcx"
        );
    }

    #[test]
    fn sanitized_names_only_contain_safe_characters() {
        let inputs = [
            "  leading and trailing  ",
            "slash/../escape",
            "tabs\tand\nnewlines",
            "émoji 🚴 ride",
            "dots.and,commas;",
            "",
        ];
        for input in inputs {
            let out = sanitize_name(input);
            assert!(
                out.chars().all(|c| c.is_alphanumeric() || c == '-' || c == '_'),
                "{input:?} -> {out:?}"
            );
        }
        assert_eq!(sanitize_name("  leading and trailing  "), "leading_and_trailing");
        assert_eq!(sanitize_name("slash/../escape"), "slashescape");
    }

    #[test]
    fn multibyte_start_time_does_not_panic() {
        assert_eq!(date_stamp("日本語の日付ではない文字列"), UNKNOWN_DATE);
    }
}
