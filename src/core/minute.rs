use std::{
    fmt::{Debug, Display, Formatter},
    str::FromStr,
};

use chrono::{NaiveTime, Timelike};
use serde_with::{DeserializeFromStr, SerializeDisplay};

use crate::prelude::*;

/// Minute offset from the local midnight.
///
/// Valid values are `0..=1440`, where `1440` may only appear as an exclusive end.
#[must_use]
#[derive(
    Copy,
    Clone,
    Default,
    Eq,
    Hash,
    Ord,
    PartialEq,
    PartialOrd,
    DeserializeFromStr,
    SerializeDisplay,
    derive_more::Into,
)]
pub struct MinuteOfDay(u16);

impl MinuteOfDay {
    pub const MIDNIGHT: Self = Self(0);

    /// Exclusive end of a day.
    pub const END_OF_DAY: Self = Self(Self::MINUTES_PER_DAY);

    pub const MINUTES_PER_DAY: u16 = 24 * 60;

    /// Returns [`None`] when the value lies beyond the end of the day.
    #[must_use]
    pub const fn new(minute: u16) -> Option<Self> {
        if minute <= Self::MINUTES_PER_DAY { Some(Self(minute)) } else { None }
    }

    #[must_use]
    pub const fn from_hm(hour: u16, minute: u16) -> Option<Self> {
        if hour > 24 || minute >= 60 {
            return None;
        }
        Self::new(hour * 60 + minute)
    }

    #[must_use]
    pub const fn get(self) -> u16 {
        self.0
    }

    #[must_use]
    pub const fn is_end_of_day(self) -> bool {
        self.0 == Self::MINUTES_PER_DAY
    }

    /// Move forward, wrapping past midnight. A sum landing exactly on midnight gives `24:00`.
    pub const fn wrapping_add(self, minutes: u16) -> Self {
        let sum = self.0 + minutes % Self::MINUTES_PER_DAY;
        if sum > Self::MINUTES_PER_DAY { Self(sum - Self::MINUTES_PER_DAY) } else { Self(sum) }
    }

    /// Minutes elapsed from `earlier` to `self`, zero when `earlier` is later.
    #[must_use]
    pub const fn minutes_since(self, earlier: Self) -> u16 {
        self.0.saturating_sub(earlier.0)
    }
}

impl From<NaiveTime> for MinuteOfDay {
    #[expect(clippy::cast_possible_truncation)]
    fn from(time: NaiveTime) -> Self {
        Self((time.hour() * 60 + time.minute()) as u16)
    }
}

impl FromStr for MinuteOfDay {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let (hour, minute) =
            s.split_once(':').with_context(|| format!("`{s}` is not in `HH:MM` format"))?;
        let hour: u16 = hour.parse().with_context(|| format!("invalid hour in `{s}`"))?;
        let minute: u16 = minute.parse().with_context(|| format!("invalid minute in `{s}`"))?;
        Self::from_hm(hour, minute).with_context(|| format!("`{s}` is out of the day range"))
    }
}

impl Display for MinuteOfDay {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl Debug for MinuteOfDay {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        Display::fmt(self, f)
    }
}
