//! Submission file naming
//!
//! The clearinghouse derives output file names from batch metadata:
//! `INB_<StateCode>PROFKZN_MMDDYYYY_<seq>.dat` in production, with a
//! `TEST_` prefix for test interchanges. This module generates and
//! validates that grammar.

use crate::codes;
use crate::config::UsageIndicator;
use chrono::{Datelike, NaiveDate};
use regex::Regex;

/// Builds the canonical submission file name
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use kaizen::config::UsageIndicator;
/// use kaizen::core::naming::submission_filename;
///
/// let date = NaiveDate::from_ymd_opt(2026, 1, 15).unwrap();
/// assert_eq!(
///     submission_filename("KY", date, 1, UsageIndicator::Production),
///     "INB_KYPROFKZN_01152026_001.dat"
/// );
/// assert_eq!(
///     submission_filename("il", date, 2, UsageIndicator::Test),
///     "TEST_INB_ILPROFKZN_01152026_002.dat"
/// );
/// ```
pub fn submission_filename(
    state_code: &str,
    date: NaiveDate,
    sequence: u32,
    usage: UsageIndicator,
) -> String {
    let prefix = match usage {
        UsageIndicator::Test => "TEST_INB_",
        UsageIndicator::Production => "INB_",
    };
    format!(
        "{}{}PROFKZN_{}_{:03}.dat",
        prefix,
        state_code.to_ascii_uppercase(),
        date.format("%m%d%Y"),
        sequence
    )
}

/// Validates a file name against the submission grammar
///
/// # Errors
///
/// Returns a description of the first violation found.
pub fn validate_filename(filename: &str, usage: UsageIndicator) -> Result<(), String> {
    let pattern = Regex::new(r"^(TEST_)?INB_([A-Za-z]{2})PROFKZN_(\d{8})_(\d{3,})\.dat$")
        .map_err(|e| format!("internal pattern error: {e}"))?;

    let captures = pattern.captures(filename).ok_or_else(|| {
        let prefix = match usage {
            UsageIndicator::Test => "TEST_INB_",
            UsageIndicator::Production => "INB_",
        };
        format!(
            "Invalid filename format. Expected: {prefix}<StateCode>PROFKZN_MMDDYYYY_<seq>.dat, \
             e.g. {prefix}KYPROFKZN_01152026_001.dat"
        )
    })?;

    let has_test_prefix = captures.get(1).is_some();
    match usage {
        UsageIndicator::Test if !has_test_prefix => {
            return Err("Test files must start with TEST_INB_".to_string());
        }
        UsageIndicator::Production if has_test_prefix => {
            return Err("Production files must not have the TEST_ prefix".to_string());
        }
        _ => {}
    }

    let state = captures[2].to_ascii_uppercase();
    if !codes::is_state(&state) {
        return Err(format!("Invalid state code: {state}"));
    }

    let date_str = &captures[3];
    let date = NaiveDate::parse_from_str(date_str, "%m%d%Y")
        .map_err(|_| format!("Invalid date: {date_str}. Expected MMDDYYYY"))?;
    if date.year() < 2020 {
        return Err(format!("Date year {} is out of range", date.year()));
    }

    Ok(())
}
