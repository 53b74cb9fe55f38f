use std::collections::HashMap;

use chrono::{NaiveDate, NaiveDateTime, TimeZone as _, Timelike};
use chrono_tz::Tz;
use polars::prelude::*;
use tracing::debug;

use crate::dataset::{datetime_to_epoch, epoch_days, Cutoff, GroupKey, KeyValue, Partition};
use crate::error::SplitError;

const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Splits a dataset into per-group history/forecast partitions around a cutoff.
#[derive(Debug, Clone)]
pub struct GroupedTimeSplitter {
    group_columns: Vec<String>,
    timestamp_column: String,
    cutoff: Cutoff,
}

impl GroupedTimeSplitter {
    pub fn new<I, S>(
        group_columns: I,
        timestamp_column: impl Into<String>,
        cutoff: impl Into<Cutoff>,
    ) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            group_columns: group_columns.into_iter().map(Into::into).collect(),
            timestamp_column: timestamp_column.into(),
            cutoff: cutoff.into(),
        }
    }

    pub fn split<'a>(&self, df: &'a DataFrame) -> Result<GroupedSplit<'a>, SplitError> {
        split_by_group(df, &self.group_columns, &self.timestamp_column, &self.cutoff)
    }
}

/// Row indices routed to each side of one group, in source order.
#[derive(Debug)]
struct GroupRows {
    key: GroupKey,
    history: Vec<IdxSize>,
    forecast: Vec<IdxSize>,
}

impl GroupRows {
    fn new(key: GroupKey) -> Self {
        Self {
            key,
            history: Vec::new(),
            forecast: Vec::new(),
        }
    }

    fn materialize(self, df: &DataFrame) -> Result<(GroupKey, Partition), SplitError> {
        let history = df.take(&IdxCa::from_vec("history".into(), self.history))?;
        let forecast = df.take(&IdxCa::from_vec("forecast".into(), self.forecast))?;
        Ok((self.key, Partition { history, forecast }))
    }
}

/// Lazy sequence of `(GroupKey, Partition)` in first-seen group order.
///
/// Every key and every timestamp comparison is resolved before this value exists;
/// advancing the iterator only gathers the rows of the next group.
#[derive(Debug)]
pub struct GroupedSplit<'a> {
    df: &'a DataFrame,
    groups: std::vec::IntoIter<GroupRows>,
}

impl GroupedSplit<'_> {
    pub fn group_count(&self) -> usize {
        self.groups.len()
    }
}

impl Iterator for GroupedSplit<'_> {
    type Item = Result<(GroupKey, Partition), SplitError>;

    fn next(&mut self) -> Option<Self::Item> {
        let rows = self.groups.next()?;
        Some(rows.materialize(self.df))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.groups.size_hint()
    }
}

impl ExactSizeIterator for GroupedSplit<'_> {}

/// Groups `df` by `group_columns` and routes each row to history when
/// `timestamp_column < cutoff`, otherwise to forecast.
///
/// A frame with no columns at all is treated as an empty dataset and yields nothing.
pub fn split_by_group<'a, S: AsRef<str>>(
    df: &'a DataFrame,
    group_columns: &[S],
    timestamp_column: &str,
    cutoff: &Cutoff,
) -> Result<GroupedSplit<'a>, SplitError> {
    if group_columns.is_empty() {
        return Err(SplitError::InvalidArgument(
            "at least one group column is required".to_string(),
        ));
    }
    if let Cutoff::Text(raw) = cutoff {
        if raw.trim().is_empty() {
            return Err(SplitError::InvalidArgument(
                "cutoff must not be empty".to_string(),
            ));
        }
    }

    if df.width() == 0 {
        return Ok(GroupedSplit {
            df,
            groups: Vec::new().into_iter(),
        });
    }

    let key_columns = group_columns
        .iter()
        .map(|name| lookup_column(df, name.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    let timestamp = lookup_column(df, timestamp_column)?;
    let before_cutoff = before_cutoff_mask(timestamp, cutoff)?;

    let mut slots: HashMap<GroupKey, usize> = HashMap::new();
    let mut groups: Vec<GroupRows> = Vec::new();

    for (row, &is_history) in before_cutoff.iter().enumerate() {
        let values = key_columns
            .iter()
            .map(|column| column.get(row).map(|value| KeyValue::from_any_value(&value)))
            .collect::<PolarsResult<Vec<_>>>()?;
        let key = GroupKey::new(values);

        let slot = match slots.get(&key) {
            Some(&slot) => slot,
            None => {
                let slot = groups.len();
                slots.insert(key.clone(), slot);
                groups.push(GroupRows::new(key));
                slot
            }
        };

        let idx = row as IdxSize;
        if is_history {
            groups[slot].history.push(idx);
        } else {
            groups[slot].forecast.push(idx);
        }
    }

    for group in &groups {
        debug!(
            key = %group.key,
            history_rows = group.history.len(),
            forecast_rows = group.forecast.len(),
            "planned group partition"
        );
    }

    Ok(GroupedSplit {
        df,
        groups: groups.into_iter(),
    })
}

fn lookup_column<'a>(df: &'a DataFrame, name: &str) -> Result<&'a Column, SplitError> {
    df.column(name).map_err(|_| SplitError::Schema {
        column: name.to_string(),
    })
}

/// Evaluates `value < cutoff` for every row. Nulls are never before the cutoff.
fn before_cutoff_mask(column: &Column, cutoff: &Cutoff) -> Result<Vec<bool>, SplitError> {
    let incompatible = || SplitError::Comparison {
        column: column.name().to_string(),
        dtype: column.dtype().clone(),
        cutoff: cutoff.to_string(),
    };
    let unparseable = |raw: &str| {
        SplitError::InvalidArgument(format!(
            "cutoff '{raw}' cannot be read as a {} value for column '{}'",
            column.dtype(),
            column.name()
        ))
    };

    match column.dtype() {
        DataType::String => {
            let Cutoff::Text(bound) = cutoff else {
                return Err(incompatible());
            };
            let values = column.str()?;
            Ok(values
                .into_iter()
                .map(|value| value.is_some_and(|v| v < bound.as_str()))
                .collect())
        }
        DataType::Date => {
            let bound = match cutoff {
                Cutoff::Date(date) => epoch_days(*date),
                Cutoff::Datetime(datetime) => date_bound(*datetime),
                Cutoff::Text(raw) => {
                    date_bound(parse_datetime_text(raw).ok_or_else(|| unparseable(raw))?)
                }
                Cutoff::Int(_) | Cutoff::Float(_) => return Err(incompatible()),
            };
            let days = column.cast(&DataType::Int32)?;
            Ok(days
                .i32()?
                .into_iter()
                .map(|value| value.is_some_and(|v| i64::from(v) < bound))
                .collect())
        }
        DataType::Datetime(unit, zone) => {
            let naive = match cutoff {
                Cutoff::Datetime(datetime) => *datetime,
                Cutoff::Date(date) => midnight(*date),
                Cutoff::Text(raw) => parse_datetime_text(raw).ok_or_else(|| unparseable(raw))?,
                Cutoff::Int(_) | Cutoff::Float(_) => return Err(incompatible()),
            };
            let bound_utc = match zone {
                Some(zone) => {
                    let tz: Tz = zone.as_str().parse().map_err(|_| incompatible())?;
                    tz.from_local_datetime(&naive)
                        .earliest()
                        .ok_or_else(|| unparseable(&cutoff.to_string()))?
                        .naive_utc()
                }
                None => naive,
            };
            let bound = datetime_to_epoch(bound_utc, *unit)
                .ok_or_else(|| unparseable(&cutoff.to_string()))?;
            let ticks = column.cast(&DataType::Int64)?;
            Ok(ticks
                .i64()?
                .into_iter()
                .map(|value| value.is_some_and(|v| v < bound))
                .collect())
        }
        DataType::Int8 | DataType::Int16 | DataType::Int32 | DataType::Int64 => {
            let bound = integer_bound(cutoff).ok_or_else(|| match cutoff {
                Cutoff::Text(raw) => unparseable(raw),
                _ => incompatible(),
            })?;
            let integers = column.cast(&DataType::Int64)?;
            Ok(integers
                .i64()?
                .into_iter()
                .map(|value| value.is_some_and(|v| bound.admits(i128::from(v))))
                .collect())
        }
        DataType::UInt8 | DataType::UInt16 | DataType::UInt32 | DataType::UInt64 => {
            let bound = integer_bound(cutoff).ok_or_else(|| match cutoff {
                Cutoff::Text(raw) => unparseable(raw),
                _ => incompatible(),
            })?;
            let integers = column.cast(&DataType::UInt64)?;
            Ok(integers
                .u64()?
                .into_iter()
                .map(|value| value.is_some_and(|v| bound.admits(i128::from(v))))
                .collect())
        }
        DataType::Float32 | DataType::Float64 => {
            let bound = match cutoff {
                Cutoff::Int(value) => *value as f64,
                Cutoff::Float(value) => *value,
                Cutoff::Text(raw) => raw.trim().parse::<f64>().map_err(|_| unparseable(raw))?,
                Cutoff::Date(_) | Cutoff::Datetime(_) => return Err(incompatible()),
            };
            let numbers = column.cast(&DataType::Float64)?;
            Ok(numbers
                .f64()?
                .into_iter()
                .map(|value| value.is_some_and(|v| v < bound))
                .collect())
        }
        _ => Err(incompatible()),
    }
}

/// Exclusive upper bound for integer timestamps, widened so every i64 and u64 fits.
#[derive(Debug, Clone, Copy)]
enum IntegerBound {
    Below(i128),
    /// A NaN cutoff: no value is below it.
    Nothing,
}

impl IntegerBound {
    fn admits(self, value: i128) -> bool {
        match self {
            IntegerBound::Below(bound) => value < bound,
            IntegerBound::Nothing => false,
        }
    }

    fn from_float(cutoff: f64) -> Self {
        if cutoff.is_nan() {
            IntegerBound::Nothing
        } else {
            // For an integer v, v < x exactly when v < ceil(x); `as` saturates.
            IntegerBound::Below(cutoff.ceil() as i128)
        }
    }
}

/// Integer text is read exactly; other numeric text falls back to a float bound.
fn integer_bound(cutoff: &Cutoff) -> Option<IntegerBound> {
    match cutoff {
        Cutoff::Int(value) => Some(IntegerBound::Below(i128::from(*value))),
        Cutoff::Float(value) => Some(IntegerBound::from_float(*value)),
        Cutoff::Text(raw) => {
            let raw = raw.trim();
            raw.parse::<i128>()
                .ok()
                .map(IntegerBound::Below)
                .or_else(|| raw.parse::<f64>().ok().map(IntegerBound::from_float))
        }
        Cutoff::Date(_) | Cutoff::Datetime(_) => None,
    }
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(chrono::NaiveTime::MIN)
}

/// First epoch day whose midnight is not before `cutoff`.
fn date_bound(cutoff: NaiveDateTime) -> i64 {
    let days = epoch_days(cutoff.date());
    if cutoff.num_seconds_from_midnight() > 0 || cutoff.nanosecond() > 0 {
        days + 1
    } else {
        days
    }
}

fn parse_datetime_text(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .map(midnight)
        })
}
