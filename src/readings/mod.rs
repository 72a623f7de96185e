//! Live readings: parsing, ordering and display formatting
//!
//! Parameter rows are ordered by a priority table kept as data. Each key is
//! classified by the longest table pattern it contains, so `reactive_power`
//! lands in the reactive tier even though it also contains `active_power`.

mod supervisor;

pub use supervisor::{Cadence, Reconcile, ReadingsSupervisor};

use crate::api::RawReadings;
use serde_json::Value;

/// Text shown when no readings are available
pub const NO_DATA: &str = "No data available. Start logging to see live readings.";

/// Keys that carry the reading timestamp rather than a measurement
const TIMESTAMP_KEYS: &[&str] = &["ts", "timestamp"];

/// Rank for keys that match no pattern
const OTHER_RANK: u8 = 8;

/// Rank of the timestamp row, always last
const TIMESTAMP_RANK: u8 = 9;

/// Substring patterns and their display rank (lower is earlier)
pub const PRIORITY_PATTERNS: &[(&str, u8)] = &[
    ("voltage", 0),
    ("current", 1),
    ("power", 2),
    ("active_power", 2),
    ("reactive_power", 3),
    ("apparent_power", 4),
    ("energy", 5),
    ("active_energy", 5),
    ("reactive_energy", 6),
    ("power_factor", 7),
];

/// Rank of a parameter key: longest matching pattern wins
pub fn priority_of(key: &str) -> u8 {
    let lower = key.to_lowercase();
    if TIMESTAMP_KEYS.contains(&lower.as_str()) {
        return TIMESTAMP_RANK;
    }
    PRIORITY_PATTERNS
        .iter()
        .filter(|(pattern, _)| lower.contains(pattern))
        .max_by_key(|(pattern, _)| pattern.len())
        .map(|(_, rank)| *rank)
        .unwrap_or(OTHER_RANK)
}

/// A measurement value as returned by the service
#[derive(Debug, Clone, PartialEq)]
pub enum ReadingValue {
    Number(f64),
    Text(String),
}

impl ReadingValue {
    fn from_json(value: &Value) -> Self {
        match value {
            Value::Number(n) => n
                .as_f64()
                .map(Self::Number)
                .unwrap_or_else(|| Self::Text(n.to_string())),
            Value::String(s) => Self::Text(s.clone()),
            other => Self::Text(other.to_string()),
        }
    }

    /// Numbers use fixed 3-decimal precision
    pub fn display(&self) -> String {
        match self {
            Self::Number(n) => format!("{:.3}", n),
            Self::Text(s) => s.clone(),
        }
    }
}

/// One poll's worth of readings
#[derive(Debug, Clone, PartialEq)]
pub struct Readings {
    pub values: Vec<(String, ReadingValue)>,
    pub timestamp: Option<String>,
}

impl Readings {
    /// `None` for an empty body: the logger has nothing yet
    pub fn from_raw(raw: &RawReadings) -> Option<Self> {
        if raw.is_empty() {
            return None;
        }

        let mut values = Vec::with_capacity(raw.len());
        let mut timestamp = None;
        for (key, value) in raw {
            if TIMESTAMP_KEYS.contains(&key.to_lowercase().as_str()) {
                timestamp = Some(match value {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                });
            } else {
                values.push((key.clone(), ReadingValue::from_json(value)));
            }
        }

        Some(Self { values, timestamp })
    }

    /// Display rows in priority order, ties broken by name, timestamp last
    pub fn rows(&self) -> Vec<ReadingRow> {
        let mut rows: Vec<ReadingRow> = self
            .values
            .iter()
            .map(|(name, value)| ReadingRow {
                name: name.clone(),
                value: value.display(),
            })
            .collect();

        rows.sort_by(|a, b| {
            priority_of(&a.name)
                .cmp(&priority_of(&b.name))
                .then_with(|| a.name.cmp(&b.name))
        });

        if let Some(ts) = &self.timestamp {
            rows.push(ReadingRow {
                name: "timestamp".to_string(),
                value: ts.clone(),
            });
        }
        rows
    }
}

/// A formatted parameter/value pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadingRow {
    pub name: String,
    pub value: String,
}

/// What the readings panel shows
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ReadingsView {
    /// Explicit empty state
    #[default]
    NoData,
    Table(Vec<ReadingRow>),
}

impl ReadingsView {
    pub fn from_readings(readings: &Readings) -> Self {
        Self::Table(readings.rows())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Self::NoData)
    }
}
