use std::time::Duration;

use jiff::Timestamp;

use crate::commands::CommandError;

pub fn parse_integer(argument: &str) -> Result<i64, CommandError> {
    argument
        .parse::<i64>()
        .map_err(|_| CommandError::NotAnInteger)
}

/// Parses a finite float. `inf`/`nan` spellings are rejected.
pub fn parse_float(argument: &str) -> Result<f64, CommandError> {
    argument
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or(CommandError::NotAFloat)
}

/// A blocking timeout in (possibly fractional) seconds. Zero means wait forever.
pub fn parse_timeout_seconds(argument: &str) -> Result<Option<Duration>, CommandError> {
    let seconds = argument
        .parse::<f64>()
        .ok()
        .filter(|seconds| seconds.is_finite())
        .ok_or(CommandError::InvalidTimeout)?;

    if seconds < 0.0 {
        return Err(CommandError::NegativeTimeout);
    }

    if seconds == 0.0 {
        return Ok(None);
    }

    Duration::try_from_secs_f64(seconds)
        .map(Some)
        .map_err(|_| CommandError::InvalidTimeout)
}

/// A blocking timeout in whole milliseconds. Zero means wait forever.
pub fn parse_timeout_millis(argument: &str) -> Result<Option<Duration>, CommandError> {
    let millis = argument
        .parse::<i64>()
        .map_err(|_| CommandError::InvalidTimeout)?;

    if millis < 0 {
        return Err(CommandError::NegativeTimeout);
    }

    Ok((millis > 0).then(|| Duration::from_millis(millis as u64)))
}

pub fn now_in_milliseconds() -> u64 {
    Timestamp::now().as_millisecond().max(0) as u64
}
