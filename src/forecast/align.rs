//! Record validation and timestamp alignment of the two input series

use serde_json::Value;
use std::collections::HashMap;

use super::ForecastError;
use crate::domain::{RawPoint, SeriesKind, TimePoint, Timestamp};

/// Generation and weather observations sharing one instant
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AlignedRow {
    pub timestamp: Timestamp,
    pub dc_power: f64,
    pub irradiation: f64,
    pub hour: u32,
    pub dayofweek: u32,
}

impl AlignedRow {
    fn new(timestamp: Timestamp, dc_power: f64, irradiation: f64) -> Self {
        Self {
            timestamp,
            dc_power,
            irradiation,
            hour: timestamp.hour(),
            dayofweek: timestamp.day_of_week(),
        }
    }
}

/// Inner join of the two series, reduced to its size and terminal row
#[derive(Debug, Clone, Copy)]
pub struct AlignedSeries {
    row_count: usize,
    terminal: AlignedRow,
}

impl AlignedSeries {
    /// Number of rows in the join, counting every matching pair
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// The row with the latest timestamp (the last one on ties)
    pub fn terminal(&self) -> &AlignedRow {
        &self.terminal
    }
}

/// Validate raw records into observations, keeping input order.
pub fn parse_series(series: SeriesKind, raw: &[RawPoint]) -> Result<Vec<TimePoint>, ForecastError> {
    raw.iter()
        .enumerate()
        .map(|(index, point)| parse_point(series, index, point))
        .collect()
}

fn parse_point(series: SeriesKind, index: usize, raw: &RawPoint) -> Result<TimePoint, ForecastError> {
    let timestamp = match &raw.timestamp {
        None | Some(Value::Null) => {
            return Err(ForecastError::MissingField {
                series,
                index,
                field: "timestamp",
            })
        }
        Some(Value::String(text)) => {
            Timestamp::parse(text).ok_or_else(|| ForecastError::InvalidTimestamp {
                series,
                index,
                value: text.clone(),
            })?
        }
        Some(other) => {
            return Err(ForecastError::InvalidTimestamp {
                series,
                index,
                value: other.to_string(),
            })
        }
    };

    let value = match &raw.value {
        None | Some(Value::Null) => {
            return Err(ForecastError::MissingField {
                series,
                index,
                field: "value",
            })
        }
        Some(Value::Number(number)) => number
            .as_f64()
            .ok_or(ForecastError::InvalidValue { series, index })?,
        Some(_) => return Err(ForecastError::InvalidValue { series, index }),
    };

    Ok(TimePoint { timestamp, value })
}

/// Join generation and weather on exact instant equality.
///
/// The join runs in generation order and a timestamp repeated in both series
/// pairs every generation record with every weather record. The terminal row
/// is the last pair at the latest shared instant: the last generation record
/// at that instant with the last weather value for it.
pub fn align(generation: &[TimePoint], weather: &[TimePoint]) -> Result<AlignedSeries, ForecastError> {
    // instant -> (record count, last value)
    let mut weather_by_time: HashMap<Timestamp, (usize, f64)> = HashMap::with_capacity(weather.len());
    for point in weather {
        let entry = weather_by_time.entry(point.timestamp).or_insert((0, point.value));
        entry.0 += 1;
        entry.1 = point.value;
    }

    let mut row_count = 0usize;
    let mut terminal: Option<AlignedRow> = None;
    for gen in generation {
        let Some(&(matches, irradiation)) = weather_by_time.get(&gen.timestamp) else {
            continue;
        };
        row_count = row_count.saturating_add(matches);
        if terminal.map_or(true, |row| gen.timestamp >= row.timestamp) {
            terminal = Some(AlignedRow::new(gen.timestamp, gen.value, irradiation));
        }
    }

    let terminal = terminal.ok_or(ForecastError::NoOverlap)?;
    Ok(AlignedSeries { row_count, terminal })
}
