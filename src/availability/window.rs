use std::ops::RangeInclusive;

use thiserror::Error;

use crate::availability::hours::{HOURS_PER_DAY, to_label};

pub const DEFAULT_START_HOUR: u8 = 7;
pub const DEFAULT_END_HOUR: u8 = 17;

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum WindowError {
    #[error("hour {0} is outside 0..=23")]
    HourOutOfRange(u8),
    #[error("window start {} would fall after end {}", to_label(*.start), to_label(*.end))]
    Inverted { start: u8, end: u8 },
}

/// Inclusive range of hour rows that the paint surface presents as editable.
///
/// Only display state: changing it never touches the stored grid.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub struct TimeWindow {
    start: u8,
    end: u8,
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self {
            start: DEFAULT_START_HOUR,
            end: DEFAULT_END_HOUR,
        }
    }
}

impl TimeWindow {
    pub fn new(start: u8, end: u8) -> Result<Self, WindowError> {
        check_hour(start)?;
        check_hour(end)?;
        if start > end {
            return Err(WindowError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> u8 {
        self.start
    }

    pub fn end(&self) -> u8 {
        self.end
    }

    pub fn set_start(&mut self, hour: u8) -> Result<(), WindowError> {
        *self = Self::new(hour, self.end)?;
        Ok(())
    }

    pub fn set_end(&mut self, hour: u8) -> Result<(), WindowError> {
        *self = Self::new(self.start, hour)?;
        Ok(())
    }

    pub fn contains(&self, hour: u8) -> bool {
        self.hours().contains(&hour)
    }

    pub fn hours(&self) -> RangeInclusive<u8> {
        self.start..=self.end
    }
}

fn check_hour(hour: u8) -> Result<(), WindowError> {
    if usize::from(hour) >= HOURS_PER_DAY {
        return Err(WindowError::HourOutOfRange(hour));
    }
    Ok(())
}
