use std::fmt;

use chrono::{DateTime, LocalResult, NaiveDateTime, NaiveTime, Offset, TimeDelta, TimeZone, Utc};
use chrono_tz::Tz;

use crate::ConversionError;

/// Minimum and maximum dates a submission must fall between (inclusive),
/// normalized to midnight in one time zone.
/// An absent side leaves that side unconstrained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DateBounds {
    minimum:   Option<DateTime<Tz>>,
    maximum:   Option<DateTime<Tz>>,
    time_zone: Tz,
}

impl DateBounds {
    /// Builds bounds from instants, normalizing each present side to midnight in `time_zone`.
    ///
    /// # Errors
    /// Returns `ConversionError::OutOfZoneRange` if a bound's calendar day
    /// cannot be represented in `time_zone`.
    pub fn new(
        minimum: Option<DateTime<Utc>>,
        maximum: Option<DateTime<Utc>>,
        time_zone: Tz,
    ) -> Result<Self, ConversionError> {
        let normalize = |d: DateTime<Utc>| checked_midnight(d, time_zone);
        let bounds = Self {
            minimum: minimum.map(normalize).transpose()?,
            maximum: maximum.map(normalize).transpose()?,
            time_zone,
        };
        if bounds.is_inverted() {
            tracing::warn!("Date bounds {} are inverted; no date can satisfy them", bounds);
        }
        Ok(bounds)
    }

    /// Returns the normalized minimum, if any
    pub const fn minimum(&self) -> Option<DateTime<Tz>> {
        self.minimum
    }

    /// Returns the normalized maximum, if any
    pub const fn maximum(&self) -> Option<DateTime<Tz>> {
        self.maximum
    }

    /// Returns the zone the bounds are normalized in
    pub const fn time_zone(&self) -> Tz {
        self.time_zone
    }

    /// True when neither side is constrained
    pub const fn is_unbounded(&self) -> bool {
        self.minimum.is_none() && self.maximum.is_none()
    }

    /// True when both sides are present and the minimum is after the maximum
    pub fn is_inverted(&self) -> bool {
        matches!((self.minimum, self.maximum), (Some(min), Some(max)) if min > max)
    }

    /// Checks if the calendar day of `date` lies within the bounds.
    /// Time of day is ignored: the date is normalized the same way the bounds are.
    /// A date whose day cannot be represented in the zone is never contained.
    pub fn contains(&self, date: DateTime<Utc>) -> bool {
        let Some(day) = at_midnight(date, self.time_zone) else {
            return false;
        };
        let after_minimum = self.minimum.is_none_or(|min| day >= min);
        let before_maximum = self.maximum.is_none_or(|max| day <= max);
        after_minimum && before_maximum
    }
}

impl fmt::Display for DateBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = |d: Option<DateTime<Tz>>| d.map_or_else(|| "..".to_owned(), |d| d.date_naive().to_string());
        write!(f, "{}/{} ({})", side(self.minimum), side(self.maximum), self.time_zone.name())
    }
}

/// Start of the calendar day containing `date`, as seen in `time_zone`.
/// When midnight is skipped by a daylight saving change, the first instant of
/// the day is used instead.
///
/// Returns `None` when that day lies outside the range chrono can represent
/// in `time_zone`, as happens for instants near `DateTime::<Utc>::MAX_UTC`
/// in zones east of UTC.
pub fn at_midnight(date: DateTime<Utc>, time_zone: Tz) -> Option<DateTime<Tz>> {
    let midnight = wall_clock(date, time_zone)?.date().and_time(NaiveTime::MIN);
    resolve_local(midnight, time_zone)
}

/// `at_midnight`, reporting an unrepresentable day as a conversion error.
pub(crate) fn checked_midnight(date: DateTime<Utc>, time_zone: Tz) -> Result<DateTime<Tz>, ConversionError> {
    at_midnight(date, time_zone).ok_or_else(|| ConversionError::OutOfZoneRange {
        instant: date,
        zone:    time_zone.name().to_owned(),
    })
}

/// Wall-clock time of `date` in `time_zone`, if chrono can represent it.
pub(crate) fn wall_clock(date: DateTime<Utc>, time_zone: Tz) -> Option<NaiveDateTime> {
    let offset = time_zone.offset_from_utc_datetime(&date.naive_utc()).fix();
    date.naive_utc().checked_add_offset(offset)
}

/// Places a wall-clock time in `time_zone`: the earlier instant when the time
/// repeats, the time one hour later when it was skipped.
pub(crate) fn resolve_local(local: NaiveDateTime, time_zone: Tz) -> Option<DateTime<Tz>> {
    match time_zone.from_local_datetime(&local) {
        LocalResult::Single(t) => Some(t),
        LocalResult::Ambiguous(earliest, _) => Some(earliest),
        LocalResult::None => local
            .checked_add_signed(TimeDelta::hours(1))
            .and_then(|shifted| time_zone.from_local_datetime(&shifted).earliest()),
    }
}
