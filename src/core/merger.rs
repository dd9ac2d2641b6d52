use itertools::Itertools;

use crate::core::{minute::MinuteOfDay, window::TimeWindow};

/// Union of one or more overlapping or touching windows.
#[must_use]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct MergedInterval {
    pub start: MinuteOfDay,
    pub end: MinuteOfDay,
}

impl MergedInterval {
    #[must_use]
    pub const fn duration(self) -> u16 {
        self.end.minutes_since(self.start)
    }

    /// Idle minutes between `self` and the following interval.
    #[must_use]
    pub const fn gap_to(self, next: Self) -> u16 {
        next.start.minutes_since(self.end)
    }

    pub fn span(self, other: Self) -> Self {
        Self { start: self.start.min(other.start), end: self.end.max(other.end) }
    }
}

impl From<TimeWindow> for MergedInterval {
    fn from(window: TimeWindow) -> Self {
        Self { start: window.start, end: window.end }
    }
}

/// Sweep the sorted windows once, coalescing those that overlap or touch.
///
/// The result is disjoint, ordered, and covers exactly the same minutes as the input.
#[must_use]
pub fn merge(windows: impl IntoIterator<Item = TimeWindow>) -> Vec<MergedInterval> {
    windows
        .into_iter()
        .map(MergedInterval::from)
        .sorted_by_key(|interval| (interval.start, interval.end))
        .coalesce(|running, next| {
            if next.start <= running.end { Ok(running.span(next)) } else { Err((running, next)) }
        })
        .collect()
}
