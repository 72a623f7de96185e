// File descriptors for the explorer's file lists
//
// Logger files carry their creation time in the name (`YYYYMMDD_HHMMSS`).
// Names that don't match still list fine, just without a time.

use chrono::{NaiveDate, NaiveDateTime};
use regex::Regex;
use std::sync::OnceLock;

/// Shown in place of a creation time that couldn't be parsed
pub const NO_TIME: &str = "N/A";

fn stamp_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(\d{4})(\d{2})(\d{2})_(\d{2})(\d{2})(\d{2})").expect("static regex is valid")
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileDescriptor {
    pub name: String,
    pub created_at: Option<NaiveDateTime>,
}

impl FileDescriptor {
    /// Never fails: an unparseable name just has no creation time
    pub fn parse(name: &str) -> Self {
        Self {
            name: name.to_string(),
            created_at: parse_stamp(name),
        }
    }

    pub fn created_label(&self) -> String {
        self.created_at
            .map(|ts| ts.format("%Y-%m-%d %H:%M:%S").to_string())
            .unwrap_or_else(|| NO_TIME.to_string())
    }
}

fn parse_stamp(name: &str) -> Option<NaiveDateTime> {
    let caps = stamp_pattern().captures(name)?;
    let num = |i: usize| caps.get(i).and_then(|m| m.as_str().parse::<u32>().ok());

    let year = caps.get(1)?.as_str().parse::<i32>().ok()?;
    NaiveDate::from_ymd_opt(year, num(2)?, num(3)?)?.and_hms_opt(num(4)?, num(5)?, num(6)?)
}

/// Descriptors sorted newest first; undated names go last, by name
pub fn newest_first(names: &[String]) -> Vec<FileDescriptor> {
    let mut files: Vec<FileDescriptor> = names.iter().map(|n| FileDescriptor::parse(n)).collect();
    files.sort_by(|a, b| match (a.created_at, b.created_at) {
        (Some(x), Some(y)) => y.cmp(&x).then_with(|| a.name.cmp(&b.name)),
        (Some(_), None) => std::cmp::Ordering::Less,
        (None, Some(_)) => std::cmp::Ordering::Greater,
        (None, None) => a.name.cmp(&b.name),
    });
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_embedded_stamp() {
        let file = FileDescriptor::parse("20240115_143000.csv");
        let expected = NaiveDate::from_ymd_opt(2024, 1, 15)
            .unwrap()
            .and_hms_opt(14, 30, 0)
            .unwrap();
        assert_eq!(file.created_at, Some(expected));
        assert_eq!(file.created_label(), "2024-01-15 14:30:00");

        let prefixed = FileDescriptor::parse("energy_log_20240115_143000.csv");
        assert_eq!(prefixed.created_at, Some(expected));
    }

    #[test]
    fn test_bad_names_have_no_time() {
        for name in ["bad-name.csv", "20241315_250000.csv", ""] {
            let file = FileDescriptor::parse(name);
            assert_eq!(file.created_at, None, "{}", name);
            assert_eq!(file.created_label(), NO_TIME);
            assert_eq!(file.name, name);
        }
    }

    #[test]
    fn test_newest_first() {
        let names: Vec<String> = [
            "20240101_000000.csv",
            "notes.csv",
            "20240301_120000.csv",
            "20240201_080000.csv",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();

        let order: Vec<String> = newest_first(&names).into_iter().map(|f| f.name).collect();
        assert_eq!(
            order,
            vec![
                "20240301_120000.csv",
                "20240201_080000.csv",
                "20240101_000000.csv",
                "notes.csv"
            ]
        );
    }
}
