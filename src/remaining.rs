//! Decomposition of a millisecond count into days, hours, minutes and seconds.

use std::fmt;

const SECOND: u64 = 1000;
const MINUTE: u64 = SECOND * 60;
const HOUR: u64 = MINUTE * 60;
const DAY: u64 = HOUR * 24;

/// Remaining time split into whole calendar units.
///
/// Each unit is taken modulo its parent unit, so `hours` is always below 24,
/// `minutes` and `seconds` below 60. `days` is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Remaining {
    /// Whole days.
    pub days: u64,
    /// Hours within the current day.
    pub hours: u64,
    /// Minutes within the current hour.
    pub minutes: u64,
    /// Seconds within the current minute.
    pub seconds: u64,
}

impl Remaining {
    /// The four units as zero-padded, at least two digit strings, in
    /// days/hours/minutes/seconds order.
    pub fn padded(&self) -> [String; 4] {
        [
            pad(self.days),
            pad(self.hours),
            pad(self.minutes),
            pad(self.seconds),
        ]
    }
}

impl fmt::Display for Remaining {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02}:{:02}:{:02}:{:02}",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}

/// Splits `ms` milliseconds into [`Remaining`] units using floor division.
///
/// ```rust
/// use countdown_widgets::remaining::{convert_ms, Remaining};
///
/// assert_eq!(
///     convert_ms(90_061_000),
///     Remaining { days: 1, hours: 1, minutes: 1, seconds: 1 }
/// );
/// assert_eq!(convert_ms(999), Remaining::default());
/// ```
pub fn convert_ms(ms: u64) -> Remaining {
    Remaining {
        days: ms / DAY,
        hours: (ms % DAY) / HOUR,
        minutes: (ms % HOUR) / MINUTE,
        seconds: (ms % MINUTE) / SECOND,
    }
}

/// Formats `value` with at least two digits, padding with a leading zero.
pub fn pad(value: u64) -> String {
    format!("{:02}", value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_of_each_unit() {
        let r = convert_ms(90_061_000);
        assert_eq!(
            r,
            Remaining {
                days: 1,
                hours: 1,
                minutes: 1,
                seconds: 1
            }
        );
    }

    #[test]
    fn test_sub_second_is_zero() {
        assert_eq!(convert_ms(999), Remaining::default());
        assert_eq!(convert_ms(0), Remaining::default());
    }

    #[test]
    fn test_units_wrap_at_parent() {
        // 23:59:59.999
        let r = convert_ms(DAY - 1);
        assert_eq!(r.days, 0);
        assert_eq!(r.hours, 23);
        assert_eq!(r.minutes, 59);
        assert_eq!(r.seconds, 59);

        let r = convert_ms(DAY);
        assert_eq!(r, Remaining { days: 1, ..Default::default() });
    }

    #[test]
    fn test_padding() {
        assert_eq!(pad(0), "00");
        assert_eq!(pad(7), "07");
        assert_eq!(pad(42), "42");
        // Padding never truncates.
        assert_eq!(pad(123), "123");

        let r = convert_ms(3 * DAY + 4 * HOUR + 5 * MINUTE + 6 * SECOND);
        assert_eq!(r.padded(), ["03", "04", "05", "06"]);
        assert_eq!(r.to_string(), "03:04:05:06");
    }
}
