//! Time units and human-readable duration formatting

use std::fmt;
use std::time::Duration;

/// A signed duration counted in 100 ns ticks.
///
/// This is the unit media durations and presentation clock times are
/// reported in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WindowsTimeUnits(i64);

impl WindowsTimeUnits {
    /// Ticks per second
    pub const TICKS_PER_SECOND: i64 = 10_000_000;
    const TICKS_PER_MICROSECOND: i64 = 10;

    pub const ZERO: Self = Self(0);

    pub const fn from_ticks(ticks: i64) -> Self {
        Self(ticks)
    }

    /// Convert from microseconds (`AV_TIME_BASE`).
    pub const fn from_micros(micros: i64) -> Self {
        Self(micros.saturating_mul(Self::TICKS_PER_MICROSECOND))
    }

    pub const fn ticks(self) -> i64 {
        self.0
    }

    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    pub const fn abs(self) -> Self {
        Self(self.0.saturating_abs())
    }

    pub fn as_secs_f64(self) -> f64 {
        self.0 as f64 / Self::TICKS_PER_SECOND as f64
    }

    /// Whole days of the absolute duration.
    pub fn days(self) -> i64 {
        self.abs().0 / (Self::TICKS_PER_SECOND * 86_400)
    }

    /// Hours component (0-23) of the absolute duration.
    pub fn hours(self) -> i64 {
        (self.abs().0 / (Self::TICKS_PER_SECOND * 3_600)) % 24
    }

    /// Minutes component (0-59) of the absolute duration.
    pub fn minutes(self) -> i64 {
        (self.abs().0 / (Self::TICKS_PER_SECOND * 60)) % 60
    }

    /// Seconds component (0-59) of the absolute duration.
    pub fn seconds(self) -> i64 {
        (self.abs().0 / Self::TICKS_PER_SECOND) % 60
    }

    /// Milliseconds component (0-999) of the absolute duration.
    pub fn milliseconds(self) -> i64 {
        (self.abs().0 / (Self::TICKS_PER_MICROSECOND * 1_000)) % 1_000
    }

    /// Microseconds component (0-999999) of the absolute duration.
    pub fn microseconds(self) -> i64 {
        (self.abs().0 / Self::TICKS_PER_MICROSECOND) % 1_000_000
    }
}

impl From<WindowsTimeUnits> for Duration {
    /// Negative durations saturate to zero.
    fn from(value: WindowsTimeUnits) -> Self {
        let ticks = value.0.max(0) as u64;
        let per_second = WindowsTimeUnits::TICKS_PER_SECOND as u64;
        Duration::new(ticks / per_second, ((ticks % per_second) * 100) as u32)
    }
}

impl From<Duration> for WindowsTimeUnits {
    fn from(value: Duration) -> Self {
        let ticks = value.as_nanos() / 100;
        Self(i64::try_from(ticks).unwrap_or(i64::MAX))
    }
}

/// Formats a duration as `[-][D.][HH:]MM:SS[.ffffff]`.
///
/// Days are only shown when non-zero; hours when there are hours or days.
/// The sub-second part is rounded to `sub_second_precision` digits (at most 6)
/// and omitted when the precision is 0.
#[derive(Debug, Clone, Copy)]
pub struct DurationPrinter {
    duration: WindowsTimeUnits,
    sub_second_precision: u32,
}

impl DurationPrinter {
    pub const MAX_PRECISION: u32 = 6;

    pub fn new(duration: WindowsTimeUnits) -> Self {
        Self::with_precision(duration, Self::MAX_PRECISION)
    }

    pub fn with_precision(duration: WindowsTimeUnits, sub_second_precision: u32) -> Self {
        Self {
            duration,
            sub_second_precision: sub_second_precision.min(Self::MAX_PRECISION),
        }
    }
}

impl fmt::Display for DurationPrinter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.duration.is_negative() {
            f.write_str("-")?;
        }

        // Round to the requested precision before splitting into components so
        // that a carry propagates into the seconds.
        let step = 10i64.pow(Self::MAX_PRECISION - self.sub_second_precision);
        let micros = self.duration.abs().ticks() / 10;
        let rounded = ((micros + step / 2) / step) * step;
        let duration = WindowsTimeUnits::from_micros(rounded);

        let days = duration.days();
        if days > 0 {
            write!(f, "{}.", days)?;
        }

        let hours = duration.hours();
        if hours > 0 || days > 0 {
            write!(f, "{:02}:", hours)?;
        }

        write!(f, "{:02}:{:02}", duration.minutes(), duration.seconds())?;

        if self.sub_second_precision > 0 {
            let fraction = duration.microseconds() / step;
            write!(
                f,
                ".{:0width$}",
                fraction,
                width = self.sub_second_precision as usize
            )?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: f64) -> WindowsTimeUnits {
        WindowsTimeUnits::from_ticks((s * WindowsTimeUnits::TICKS_PER_SECOND as f64).round() as i64)
    }

    #[test]
    fn test_components() {
        let d = secs(90_061.002_003);
        assert_eq!(d.days(), 1);
        assert_eq!(d.hours(), 1);
        assert_eq!(d.minutes(), 1);
        assert_eq!(d.seconds(), 1);
        assert_eq!(d.milliseconds(), 2);
        assert_eq!(d.microseconds(), 2_003);
    }

    #[test]
    fn test_print_zero() {
        assert_eq!(DurationPrinter::new(WindowsTimeUnits::ZERO).to_string(), "00:00.000000");
    }

    #[test]
    fn test_print_minutes_only() {
        let printer = DurationPrinter::with_precision(secs(205.5), 3);
        assert_eq!(printer.to_string(), "03:25.500");
    }

    #[test]
    fn test_print_hours_without_fraction() {
        let printer = DurationPrinter::with_precision(secs(3_723.0), 0);
        assert_eq!(printer.to_string(), "01:02:03");
    }

    #[test]
    fn test_print_days() {
        let printer = DurationPrinter::with_precision(secs(93_600.0), 0);
        assert_eq!(printer.to_string(), "1.02:00:00");
    }

    #[test]
    fn test_print_negative() {
        let printer = DurationPrinter::with_precision(secs(-1.5), 1);
        assert_eq!(printer.to_string(), "-00:01.5");
    }

    #[test]
    fn test_print_rounding_carries() {
        let printer = DurationPrinter::with_precision(secs(59.9996), 3);
        assert_eq!(printer.to_string(), "01:00.000");
    }

    #[test]
    fn test_precision_is_capped() {
        let printer = DurationPrinter::with_precision(secs(1.25), 9);
        assert_eq!(printer.to_string(), "00:01.250000");
    }

    #[test]
    fn test_std_duration_conversion() {
        let d = WindowsTimeUnits::from_micros(1_500_000);
        assert_eq!(Duration::from(d), Duration::from_millis(1_500));
        assert_eq!(WindowsTimeUnits::from(Duration::from_millis(1_500)), d);
        assert_eq!(Duration::from(secs(-3.0)), Duration::ZERO);
    }
}
