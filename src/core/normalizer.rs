use crate::{
    core::{
        minute::MinuteOfDay,
        window::{RawWindow, TimeWindow, Warning},
    },
    prelude::*,
};

#[must_use]
#[derive(Debug, Default)]
pub struct Normalized {
    pub windows: Vec<TimeWindow>,
    pub warnings: Vec<Warning>,
}

/// Turn raw windows into non-wrapping ones, splitting at midnight.
///
/// Zero-length and out-of-range windows are dropped and recorded as warnings.
pub fn normalize(raw_windows: impl IntoIterator<Item = RawWindow>) -> Normalized {
    let mut normalized = Normalized::default();
    for raw in raw_windows {
        let RawWindow { start, end, source } = raw;
        if start.is_end_of_day() {
            normalized.reject(Warning::OutOfRange { source, start, end });
        } else if start == end {
            normalized.reject(Warning::Empty { source, at: start });
        } else if start < end {
            normalized.windows.push(TimeWindow { start, end, source });
        } else {
            normalized.windows.push(TimeWindow { start, end: MinuteOfDay::END_OF_DAY, source });
            if end != MinuteOfDay::MIDNIGHT {
                normalized.windows.push(TimeWindow { start: MinuteOfDay::MIDNIGHT, end, source });
            }
        }
    }
    normalized
}

impl Normalized {
    pub fn reject(&mut self, warning: Warning) {
        warn!("dropping the window: {warning}");
        self.warnings.push(warning);
    }
}
