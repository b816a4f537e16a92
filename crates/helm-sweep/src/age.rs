//! Age threshold parsing and eligibility evaluation.
//!
//! The `<age>` CLI argument is either an absolute epoch-seconds integer or a
//! compact duration token (`30m`, `2d`) meaning "older than this much".

use crate::error::SweepError;

/// Seconds per duration unit.
fn unit_factor(unit: char) -> Option<i64> {
    match unit {
        's' => Some(1),
        'm' => Some(60),
        'h' => Some(3600),
        'd' => Some(86_400),
        'w' => Some(604_800),
        _ => None,
    }
}

/// Parse a duration token matching `^[0-9]+[smhdw]$` into seconds.
///
/// No combined units ("1h30m" is invalid) and no fractions. Leading zeros
/// are accepted; values that overflow i64 seconds are rejected.
pub fn parse_duration(token: &str) -> Result<i64, SweepError> {
    let err = || SweepError::Duration(token.to_string());

    let mut chars = token.chars();
    let unit = chars.next_back().ok_or_else(err)?;
    let digits = chars.as_str();

    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(err());
    }

    let factor = unit_factor(unit).ok_or_else(err)?;
    let count: i64 = digits.parse().map_err(|_| err())?;
    count.checked_mul(factor).ok_or_else(err)
}

/// An age threshold: either a fixed epoch instant or a duration back from now.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Threshold {
    /// Absolute epoch seconds, UTC.
    Epoch(i64),
    /// Seconds to subtract from the current time at evaluation.
    Within(i64),
}

impl Threshold {
    /// Parse the `<age>` argument. All-digits is an absolute epoch value,
    /// otherwise it must be a duration token.
    pub fn parse(arg: &str) -> Result<Self, SweepError> {
        if !arg.is_empty() && arg.bytes().all(|b| b.is_ascii_digit()) {
            let epoch = arg
                .parse()
                .map_err(|_| SweepError::Duration(arg.to_string()))?;
            return Ok(Self::Epoch(epoch));
        }
        parse_duration(arg).map(Self::Within)
    }

    /// Resolve to the epoch cutoff, sampling `now` for relative thresholds.
    pub fn resolve(self, now: i64) -> i64 {
        match self {
            Self::Epoch(epoch) => epoch,
            Self::Within(secs) => now - secs,
        }
    }
}

/// A release deployed at or before the cutoff is old enough to sweep.
/// The boundary is inclusive.
pub fn is_eligible(last_deployed_epoch: i64, threshold_epoch: i64) -> bool {
    last_deployed_epoch <= threshold_epoch
}
