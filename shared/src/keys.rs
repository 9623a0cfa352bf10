//! Composite record keys
//!
//! A record is addressed by `(date, branch, department[, group])`. The parts are
//! rendered into one string such as `2025-08-04_Mayon-Branch_Bakery`: words of a
//! label are joined with `-` and the parts with `_`. Characters that would
//! clash with either delimiter are percent-escaped inside labels, so two
//! different tuples never share a key and every key parses back to its parts.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::DateRange;

/// Separator between key parts
pub const PART_DELIMITER: &str = "_";
/// Separator between the words of one label
pub const WORD_DELIMITER: &str = "-";

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors raised when reading a key string back into its parts
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("expected 3 or 4 key parts, found {0}")]
    PartCount(usize),

    #[error("invalid date part: {0}")]
    InvalidDate(String),

    #[error("invalid escape sequence in label: {0}")]
    InvalidEscape(String),

    #[error("key is not in canonical form: {0}")]
    NonCanonical(String),
}

/// Collapse whitespace runs and trim, so `" Mayon   Branch "` becomes `"Mayon Branch"`
pub fn normalize_label(label: &str) -> String {
    label.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Render a composite key.
///
/// Equal inputs always give equal keys. A blank `group` is the same as no group.
pub fn generate_key(
    date: NaiveDate,
    branch: &str,
    department: &str,
    group: Option<&str>,
) -> String {
    let mut parts = vec![
        date.format(DATE_FORMAT).to_string(),
        encode_label(branch),
        encode_label(department),
    ];

    if let Some(group) = group.map(encode_label).filter(|g| !g.is_empty()) {
        parts.push(group);
    }

    parts.join(PART_DELIMITER)
}

/// Read a key produced by [`generate_key`] back into its parts
pub fn parse_key(key: &str) -> Result<KeyParts, KeyError> {
    let pieces: Vec<&str> = key.split(PART_DELIMITER).collect();
    if !(3..=4).contains(&pieces.len()) {
        return Err(KeyError::PartCount(pieces.len()));
    }

    let date = NaiveDate::parse_from_str(pieces[0], DATE_FORMAT)
        .map_err(|_| KeyError::InvalidDate(pieces[0].to_string()))?;
    let branch = decode_label(pieces[1])?;
    let department = decode_label(pieces[2])?;
    let group = pieces.get(3).map(|g| decode_label(g)).transpose()?;

    let parts = KeyParts::new(date, &branch, &department, group.as_deref());
    if parts.key() != key {
        return Err(KeyError::NonCanonical(key.to_string()));
    }

    Ok(parts)
}

fn encode_label(label: &str) -> String {
    label
        .split_whitespace()
        .map(escape_word)
        .collect::<Vec<_>>()
        .join(WORD_DELIMITER)
}

fn escape_word(word: &str) -> String {
    let mut out = String::with_capacity(word.len());
    for c in word.chars() {
        match c {
            '%' => out.push_str("%25"),
            '_' => out.push_str("%5F"),
            '-' => out.push_str("%2D"),
            _ => out.push(c),
        }
    }
    out
}

fn decode_label(encoded: &str) -> Result<String, KeyError> {
    let words = encoded
        .split(WORD_DELIMITER)
        .map(unescape_word)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(words.join(" "))
}

fn unescape_word(word: &str) -> Result<String, KeyError> {
    let mut out = String::with_capacity(word.len());
    let mut chars = word.chars();

    while let Some(c) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        let code: String = chars.by_ref().take(2).collect();
        match code.as_str() {
            "25" => out.push('%'),
            "5F" => out.push('_'),
            "2D" => out.push('-'),
            _ => return Err(KeyError::InvalidEscape(word.to_string())),
        }
    }

    Ok(out)
}

/// The tuple a composite key is built from, with normalized labels
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KeyParts {
    pub date: NaiveDate,
    pub branch: String,
    pub department: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
}

impl KeyParts {
    pub fn new(date: NaiveDate, branch: &str, department: &str, group: Option<&str>) -> Self {
        Self {
            date,
            branch: normalize_label(branch),
            department: normalize_label(department),
            group: group.map(normalize_label).filter(|g| !g.is_empty()),
        }
    }

    pub fn key(&self) -> String {
        generate_key(
            self.date,
            &self.branch,
            &self.department,
            self.group.as_deref(),
        )
    }
}

/// A validated composite key together with the parts it encodes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RecordKey {
    encoded: String,
    parts: KeyParts,
}

impl RecordKey {
    pub fn new(date: NaiveDate, branch: &str, department: &str, group: Option<&str>) -> Self {
        Self::from_parts(KeyParts::new(date, branch, department, group))
    }

    pub fn from_parts(parts: KeyParts) -> Self {
        let parts = KeyParts::new(
            parts.date,
            &parts.branch,
            &parts.department,
            parts.group.as_deref(),
        );
        Self {
            encoded: parts.key(),
            parts,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.encoded
    }

    pub fn parts(&self) -> &KeyParts {
        &self.parts
    }

    pub fn date(&self) -> NaiveDate {
        self.parts.date
    }

    pub fn branch(&self) -> &str {
        &self.parts.branch
    }

    pub fn department(&self) -> &str {
        &self.parts.department
    }

    pub fn group(&self) -> Option<&str> {
        self.parts.group.as_deref()
    }
}

impl FromStr for RecordKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts = parse_key(s)?;
        Ok(Self {
            encoded: s.to_string(),
            parts,
        })
    }
}

impl TryFrom<String> for RecordKey {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<RecordKey> for String {
    fn from(key: RecordKey) -> Self {
        key.encoded
    }
}

impl AsRef<str> for RecordKey {
    fn as_ref(&self) -> &str {
        &self.encoded
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encoded)
    }
}

/// Partial key used to list every record sharing some of its parts.
///
/// Unset fields match anything. Labels are normalized the same way keys are.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyFilter {
    pub dates: Option<DateRange>,
    pub branch: Option<String>,
    pub department: Option<String>,
    pub group: Option<String>,
}

impl KeyFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_date(mut self, date: NaiveDate) -> Self {
        self.dates = Some(DateRange::single(date));
        self
    }

    pub fn between(mut self, range: DateRange) -> Self {
        self.dates = Some(range);
        self
    }

    pub fn branch(mut self, branch: &str) -> Self {
        self.branch = Some(normalize_label(branch));
        self
    }

    pub fn department(mut self, department: &str) -> Self {
        self.department = Some(normalize_label(department));
        self
    }

    pub fn group(mut self, group: &str) -> Self {
        self.group = Some(normalize_label(group));
        self
    }

    pub fn matches(&self, parts: &KeyParts) -> bool {
        let label_matches = |wanted: &Option<String>, actual: &str| {
            wanted
                .as_deref()
                .map_or(true, |w| normalize_label(w) == actual)
        };

        self.dates.map_or(true, |range| range.contains(parts.date))
            && label_matches(&self.branch, &parts.branch)
            && label_matches(&self.department, &parts.department)
            && label_matches(&self.group, parts.group.as_deref().unwrap_or(""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_generate_key_joins_normalized_labels() {
        let key = generate_key(date(2025, 8, 4), "Mayon Branch", "Bakery", None);
        assert_eq!(key, "2025-08-04_Mayon-Branch_Bakery");
    }

    #[test]
    fn test_generate_key_is_deterministic() {
        let first = generate_key(date(2025, 8, 4), "One Balete", "Commissary", Some("Raw Materials"));
        let second = generate_key(date(2025, 8, 4), "One Balete", "Commissary", Some("Raw Materials"));
        assert_eq!(first, second);
        assert_eq!(first, "2025-08-04_One-Balete_Commissary_Raw-Materials");
    }

    #[test]
    fn test_whitespace_variants_share_a_key() {
        let a = generate_key(date(2025, 8, 4), "  Mayon\tBranch ", "Bakery", None);
        let b = generate_key(date(2025, 8, 4), "Mayon Branch", "Bakery", None);
        assert_eq!(a, b);
    }

    #[test]
    fn test_blank_group_is_no_group() {
        let a = generate_key(date(2025, 8, 4), "Mayon", "Bakery", Some("   "));
        let b = generate_key(date(2025, 8, 4), "Mayon", "Bakery", None);
        assert_eq!(a, b);
    }

    #[test]
    fn test_delimiters_inside_labels_do_not_collide() {
        // Without escaping both would render as 2025-08-04_A_B_C
        let a = generate_key(date(2025, 8, 4), "A_B", "C", None);
        let b = generate_key(date(2025, 8, 4), "A", "B", Some("C"));
        assert_ne!(a, b);

        let hyphen = generate_key(date(2025, 8, 4), "Mayon-Branch", "Bakery", None);
        let space = generate_key(date(2025, 8, 4), "Mayon Branch", "Bakery", None);
        assert_ne!(hyphen, space);
        assert_eq!(hyphen, "2025-08-04_Mayon%2DBranch_Bakery");
    }

    #[test]
    fn test_parse_key_round_trip() {
        let parts = KeyParts::new(date(2025, 12, 31), "50% Off_Outlet", "Cash-ier", Some("Non Food"));
        let parsed = parse_key(&parts.key()).unwrap();
        assert_eq!(parsed, parts);
        assert_eq!(parsed.branch, "50% Off_Outlet");
    }

    #[test]
    fn test_parse_key_rejects_malformed_keys() {
        assert_eq!(parse_key("2025-08-04_Mayon"), Err(KeyError::PartCount(2)));
        assert_eq!(parse_key("a_b_c_d_e"), Err(KeyError::PartCount(5)));
        assert!(matches!(parse_key("2025-13-04_Mayon_Bakery"), Err(KeyError::InvalidDate(_))));
        assert!(matches!(parse_key("2025-08-04_Ma%zzyon_Bakery"), Err(KeyError::InvalidEscape(_))));
        assert!(matches!(parse_key("2025-08-04_Mayon--Branch_Bakery"), Err(KeyError::NonCanonical(_))));
        assert!(matches!(parse_key("2025-08-04_Mayon_Bakery_"), Err(KeyError::NonCanonical(_))));
    }

    #[test]
    fn test_record_key_serde_as_string() {
        let key = RecordKey::new(date(2025, 8, 4), "Mayon Branch", "Bakery", None);
        let json = serde_json::to_string(&key).unwrap();
        assert_eq!(json, "\"2025-08-04_Mayon-Branch_Bakery\"");

        let back: RecordKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, key);
        assert_eq!(back.branch(), "Mayon Branch");
        assert!(serde_json::from_str::<RecordKey>("\"nope\"").is_err());
    }

    #[test]
    fn test_key_filter_matches_partial_parts() {
        let parts = KeyParts::new(date(2025, 8, 5), "Mayon", "Bakery", None);

        assert!(KeyFilter::new().matches(&parts));
        assert!(KeyFilter::new().on_date(date(2025, 8, 5)).branch("Mayon").matches(&parts));
        assert!(KeyFilter::new()
            .between(DateRange::new(date(2025, 8, 4), date(2025, 8, 10)))
            .department(" Bakery ")
            .matches(&parts));
        assert!(!KeyFilter::new().branch("One Balete").matches(&parts));
        assert!(!KeyFilter::new().group("Raw").matches(&parts));
    }
}
