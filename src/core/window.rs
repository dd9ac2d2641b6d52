use std::fmt::{Display, Formatter};

use chrono::{DateTime, TimeDelta, TimeZone, Utc};

use crate::core::minute::MinuteOfDay;

/// Where a window came from.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Source {
    /// Utility-supplied smart charging window.
    Dispatch,

    /// Fixed nightly tariff window.
    OffPeak,
}

impl Display for Source {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Dispatch => write!(f, "dispatch"),
            Self::OffPeak => write!(f, "off-peak"),
        }
    }
}

/// Utility-supplied dispatch, in UTC.
#[must_use]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Dispatch {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Window as supplied: the end may precede the start, meaning it runs past midnight.
#[must_use]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct RawWindow {
    pub start: MinuteOfDay,
    pub end: MinuteOfDay,
    pub source: Source,
}

impl RawWindow {
    pub const fn off_peak(start: MinuteOfDay, end: MinuteOfDay) -> Self {
        Self { start, end, source: Source::OffPeak }
    }

    /// Project a UTC dispatch onto the wall clock of `timezone`.
    ///
    /// Only the start is projected, the end follows from the actual length. Otherwise a clock
    /// change inside the dispatch would stretch, shrink, or even cancel it out.
    /// A dispatch lasting a whole day or longer covers every minute.
    pub fn from_dispatch<Tz: TimeZone>(
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        timezone: &Tz,
    ) -> Result<Self, Warning> {
        if end <= start {
            return Err(Warning::Inverted { start, end });
        }
        let length = end - start;
        if length >= TimeDelta::days(1) {
            return Ok(Self {
                start: MinuteOfDay::MIDNIGHT,
                end: MinuteOfDay::END_OF_DAY,
                source: Source::Dispatch,
            });
        }
        let start = MinuteOfDay::from(start.with_timezone(timezone).time());
        let length = u16::try_from(length.num_minutes()).unwrap_or_default();
        Ok(Self { start, end: start.wrapping_add(length), source: Source::Dispatch })
    }
}

/// Normalized half-open window, `start < end` always holds.
#[must_use]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct TimeWindow {
    pub start: MinuteOfDay,
    pub end: MinuteOfDay,
    pub source: Source,
}

/// Dropped input, recorded instead of failing the run.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Warning {
    /// Start equals end: either empty or a whole day, there is no telling.
    Empty { source: Source, at: MinuteOfDay },

    OutOfRange { source: Source, start: MinuteOfDay, end: MinuteOfDay },

    /// Dispatch that ends before it starts.
    Inverted { start: DateTime<Utc>, end: DateTime<Utc> },
}

impl Display for Warning {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Empty { source, at } => write!(f, "ambiguous {source} window at {at}"),
            Self::OutOfRange { source, start, end } => {
                write!(f, "{source} window {start}-{end} is out of the day range")
            }
            Self::Inverted { start, end } => {
                write!(f, "dispatch ends ({end}) before it starts ({start})")
            }
        }
    }
}
