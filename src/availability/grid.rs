use thiserror::Error;

use crate::availability::hours::HOURS_PER_DAY;
use crate::availability::week::DAYS_PER_WEEK;

pub type Day = [bool; HOURS_PER_DAY];

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum GridError {
    #[error("cell (day {day}, hour {hour}) is outside the 7x24 grid")]
    OutOfRange { day: usize, hour: usize },
}

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid JSON at line {line}, column {column}: {source}")]
    Json {
        line: usize,
        column: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("expected {expected} days, found {0}", expected = DAYS_PER_WEEK)]
    DayCount(usize),
    #[error("day {day} has {found} hours, expected {expected}", expected = HOURS_PER_DAY)]
    HourCount { day: usize, found: usize },
    #[error("day {day}, hour {hour} holds {value}; only 0 and 1 are allowed")]
    SlotValue { day: usize, hour: usize, value: i64 },
}

/// Monday-first week of hourly availability, always 7x24.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct AvailabilityGrid {
    days: [Day; DAYS_PER_WEEK],
}

impl AvailabilityGrid {
    pub fn get(&self, day: usize, hour: usize) -> Result<bool, GridError> {
        check_cell(day, hour)?;
        Ok(self.days[day][hour])
    }

    pub fn set(&mut self, day: usize, hour: usize, value: bool) -> Result<(), GridError> {
        check_cell(day, hour)?;
        self.days[day][hour] = value;
        Ok(())
    }

    /// Flips one cell and returns its new value.
    pub fn toggle(&mut self, day: usize, hour: usize) -> Result<bool, GridError> {
        let value = !self.get(day, hour)?;
        self.set(day, hour, value)?;
        Ok(value)
    }

    pub fn days(&self) -> &[Day; DAYS_PER_WEEK] {
        &self.days
    }

    pub fn available_count(&self) -> usize {
        self.days.iter().flatten().filter(|slot| **slot).count()
    }

    /// Persisted form: a JSON array of 7 arrays of 24 `0`/`1` integers.
    pub fn encode(&self) -> String {
        let rows: Vec<Vec<u8>> = self
            .days
            .iter()
            .map(|day| day.iter().map(|slot| u8::from(*slot)).collect())
            .collect();
        serde_json::Value::from(rows).to_string()
    }

    pub fn decode(payload: &[u8]) -> Result<Self, DecodeError> {
        let rows = serde_json::from_slice::<Vec<Vec<i64>>>(payload).map_err(|source| {
            DecodeError::Json {
                line: source.line(),
                column: source.column(),
                source,
            }
        })?;
        if rows.len() != DAYS_PER_WEEK {
            return Err(DecodeError::DayCount(rows.len()));
        }

        let mut grid = Self::default();
        for (day, row) in rows.iter().enumerate() {
            if row.len() != HOURS_PER_DAY {
                return Err(DecodeError::HourCount {
                    day,
                    found: row.len(),
                });
            }
            for (hour, value) in row.iter().enumerate() {
                grid.days[day][hour] = match value {
                    0 => false,
                    1 => true,
                    other => {
                        return Err(DecodeError::SlotValue {
                            day,
                            hour,
                            value: *other,
                        });
                    }
                };
            }
        }
        Ok(grid)
    }
}

fn check_cell(day: usize, hour: usize) -> Result<(), GridError> {
    if day >= DAYS_PER_WEEK || hour >= HOURS_PER_DAY {
        return Err(GridError::OutOfRange { day, hour });
    }
    Ok(())
}
