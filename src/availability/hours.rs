use thiserror::Error;

pub const HOURS_PER_DAY: usize = 24;

#[derive(Debug, Clone, Eq, PartialEq, Error)]
pub enum FormatError {
    #[error("invalid hour label '{0}', expected H:00")]
    Pattern(String),
    #[error("hour {0} in label is outside 0..=23")]
    OutOfRange(u32),
}

/// Display label for an hour of the day, e.g. `9` -> `"9:00"`.
pub fn to_label(hour: u8) -> String {
    format!("{hour}:00")
}

/// Inverse of [`to_label`]. Also accepts a zero-padded hour such as `"09:00"`.
pub fn to_hour(label: &str) -> Result<u8, FormatError> {
    let trimmed = label.trim();
    let Some(digits) = trimmed.strip_suffix(":00") else {
        return Err(FormatError::Pattern(label.to_string()));
    };
    if digits.is_empty() || digits.len() > 2 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(FormatError::Pattern(label.to_string()));
    }

    let hour: u32 = digits
        .parse()
        .map_err(|_| FormatError::Pattern(label.to_string()))?;
    if hour >= HOURS_PER_DAY as u32 {
        return Err(FormatError::OutOfRange(hour));
    }
    Ok(hour as u8)
}

pub fn all_labels() -> Vec<String> {
    (0..HOURS_PER_DAY as u8).map(to_label).collect()
}
