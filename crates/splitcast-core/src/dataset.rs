use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime};
use polars::prelude::{AnyValue, DataFrame, TimeUnit};

/// Days between 0001-01-01 (CE day 1) and the Unix epoch.
const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

/// A single grouping column value, normalized out of polars' borrowed `AnyValue`.
#[derive(Debug, Clone)]
pub enum KeyValue {
    Null,
    Boolean(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    Str(String),
    Date(NaiveDate),
    Datetime(NaiveDateTime),
}

impl KeyValue {
    pub fn from_any_value(value: &AnyValue<'_>) -> Self {
        match value {
            AnyValue::Null => KeyValue::Null,
            AnyValue::Boolean(v) => KeyValue::Boolean(*v),
            AnyValue::Int8(v) => KeyValue::Int(i64::from(*v)),
            AnyValue::Int16(v) => KeyValue::Int(i64::from(*v)),
            AnyValue::Int32(v) => KeyValue::Int(i64::from(*v)),
            AnyValue::Int64(v) => KeyValue::Int(*v),
            AnyValue::UInt8(v) => KeyValue::UInt(u64::from(*v)),
            AnyValue::UInt16(v) => KeyValue::UInt(u64::from(*v)),
            AnyValue::UInt32(v) => KeyValue::UInt(u64::from(*v)),
            AnyValue::UInt64(v) => KeyValue::UInt(*v),
            AnyValue::Float32(v) => KeyValue::Float(f64::from(*v)),
            AnyValue::Float64(v) => KeyValue::Float(*v),
            AnyValue::String(v) => KeyValue::Str((*v).to_string()),
            AnyValue::StringOwned(v) => KeyValue::Str(v.to_string()),
            AnyValue::Date(days) => date_from_epoch_days(*days)
                .map(KeyValue::Date)
                .unwrap_or(KeyValue::Int(i64::from(*days))),
            AnyValue::Datetime(value, unit, _) => datetime_from_epoch(*value, *unit)
                .map(KeyValue::Datetime)
                .unwrap_or(KeyValue::Int(*value)),
            other => KeyValue::Str(other.to_string()),
        }
    }
}

impl PartialEq for KeyValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (KeyValue::Null, KeyValue::Null) => true,
            (KeyValue::Boolean(a), KeyValue::Boolean(b)) => a == b,
            (KeyValue::Int(a), KeyValue::Int(b)) => a == b,
            (KeyValue::UInt(a), KeyValue::UInt(b)) => a == b,
            (KeyValue::Float(a), KeyValue::Float(b)) => a.to_bits() == b.to_bits(),
            (KeyValue::Str(a), KeyValue::Str(b)) => a == b,
            (KeyValue::Date(a), KeyValue::Date(b)) => a == b,
            (KeyValue::Datetime(a), KeyValue::Datetime(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for KeyValue {}

impl Hash for KeyValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            KeyValue::Null => {}
            KeyValue::Boolean(v) => v.hash(state),
            KeyValue::Int(v) => v.hash(state),
            KeyValue::UInt(v) => v.hash(state),
            KeyValue::Float(v) => v.to_bits().hash(state),
            KeyValue::Str(v) => v.hash(state),
            KeyValue::Date(v) => v.hash(state),
            KeyValue::Datetime(v) => v.hash(state),
        }
    }
}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Null => write!(f, "null"),
            KeyValue::Boolean(v) => write!(f, "{v}"),
            KeyValue::Int(v) => write!(f, "{v}"),
            KeyValue::UInt(v) => write!(f, "{v}"),
            KeyValue::Float(v) => write!(f, "{v}"),
            KeyValue::Str(v) => write!(f, "{v}"),
            KeyValue::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            KeyValue::Datetime(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S")),
        }
    }
}

/// Ordered tuple of grouping values, one per grouping column.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct GroupKey(Vec<KeyValue>);

impl GroupKey {
    pub fn new(values: Vec<KeyValue>) -> Self {
        Self(values)
    }

    pub fn values(&self) -> &[KeyValue] {
        &self.0
    }

    /// Joins the display form of every key value with `separator`.
    pub fn join(&self, separator: &str) -> String {
        self.0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(separator)
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.join(", "))
    }
}

/// History/forecast rows of one group. Both frames carry the full source schema.
#[derive(Debug, Clone)]
pub struct Partition {
    pub history: DataFrame,
    pub forecast: DataFrame,
}

impl Partition {
    pub fn history_rows(&self) -> usize {
        self.history.height()
    }

    pub fn forecast_rows(&self) -> usize {
        self.forecast.height()
    }
}

/// Threshold separating history (strictly before) from forecast (on or after).
///
/// `Text` is resolved against the timestamp column's type when the split runs:
/// string columns compare lexicographically, temporal and numeric columns parse it.
#[derive(Debug, Clone, PartialEq)]
pub enum Cutoff {
    Text(String),
    Date(NaiveDate),
    Datetime(NaiveDateTime),
    Int(i64),
    Float(f64),
}

impl fmt::Display for Cutoff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cutoff::Text(v) => write!(f, "'{v}'"),
            Cutoff::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            Cutoff::Datetime(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S")),
            Cutoff::Int(v) => write!(f, "{v}"),
            Cutoff::Float(v) => write!(f, "{v}"),
        }
    }
}

impl From<&str> for Cutoff {
    fn from(value: &str) -> Self {
        Cutoff::Text(value.to_string())
    }
}

impl From<String> for Cutoff {
    fn from(value: String) -> Self {
        Cutoff::Text(value)
    }
}

impl From<NaiveDate> for Cutoff {
    fn from(value: NaiveDate) -> Self {
        Cutoff::Date(value)
    }
}

impl From<NaiveDateTime> for Cutoff {
    fn from(value: NaiveDateTime) -> Self {
        Cutoff::Datetime(value)
    }
}

pub(crate) fn date_from_epoch_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?)
}

pub(crate) fn epoch_days(date: NaiveDate) -> i64 {
    i64::from(date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE)
}

pub(crate) fn datetime_from_epoch(value: i64, unit: TimeUnit) -> Option<NaiveDateTime> {
    let dt = match unit {
        TimeUnit::Nanoseconds => DateTime::from_timestamp_nanos(value),
        TimeUnit::Microseconds => DateTime::from_timestamp_micros(value)?,
        TimeUnit::Milliseconds => DateTime::from_timestamp_millis(value)?,
    };
    Some(dt.naive_utc())
}

pub(crate) fn datetime_to_epoch(value: NaiveDateTime, unit: TimeUnit) -> Option<i64> {
    let utc = value.and_utc();
    match unit {
        TimeUnit::Nanoseconds => utc.timestamp_nanos_opt(),
        TimeUnit::Microseconds => Some(utc.timestamp_micros()),
        TimeUnit::Milliseconds => Some(utc.timestamp_millis()),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn epoch_day_conversion_round_trips_known_dates() {
        let epoch = NaiveDate::from_ymd_opt(1970, 1, 1).unwrap();
        assert_eq!(epoch_days(epoch), 0);
        assert_eq!(date_from_epoch_days(0), Some(epoch));

        let cutoff = NaiveDate::from_ymd_opt(2021, 6, 1).unwrap();
        assert_eq!(epoch_days(cutoff), 18_779);
    }

    #[test]
    fn float_keys_hash_by_bit_pattern() {
        let mut seen = HashSet::new();
        seen.insert(GroupKey::new(vec![KeyValue::Float(1.5), KeyValue::Null]));
        assert!(seen.contains(&GroupKey::new(vec![KeyValue::Float(1.5), KeyValue::Null])));
        assert!(!seen.contains(&GroupKey::new(vec![KeyValue::Float(2.5), KeyValue::Null])));
    }

    #[test]
    fn key_join_uses_display_forms() {
        let key = GroupKey::new(vec![
            KeyValue::Str("store_a".into()),
            KeyValue::Int(7),
            KeyValue::Date(NaiveDate::from_ymd_opt(2021, 5, 1).unwrap()),
        ]);
        assert_eq!(key.join("_"), "store_a_7_2021-05-01");
        assert_eq!(key.to_string(), "(store_a, 7, 2021-05-01)");
    }
}
