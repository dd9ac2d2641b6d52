use serde::{Deserialize, Serialize};

use crate::core::{merger::MergedInterval, minute::MinuteOfDay};

/// Number of programmable charge slots on the inverter.
pub const N_SLOTS: usize = 6;

#[must_use]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Slot {
    pub index: usize,
    pub start: MinuteOfDay,
    pub end: MinuteOfDay,

    #[serde(rename = "enabled")]
    pub is_enabled: bool,
}

impl Slot {
    /// Placeholder for an unused slot.
    pub const fn disabled(index: usize) -> Self {
        Self { index, start: MinuteOfDay::MIDNIGHT, end: MinuteOfDay::MIDNIGHT, is_enabled: false }
    }

    pub const fn enabled(index: usize, interval: MergedInterval) -> Self {
        Self { index, start: interval.start, end: interval.end, is_enabled: true }
    }

    /// Charging minutes, zero for a disabled slot.
    #[must_use]
    pub const fn duration(self) -> u16 {
        if self.is_enabled { self.end.minutes_since(self.start) } else { 0 }
    }

    /// Start, end and the flag: what tells two slots apart when diffing.
    #[must_use]
    pub const fn triple(self) -> (MinuteOfDay, MinuteOfDay, bool) {
        (self.start, self.end, self.is_enabled)
    }
}

/// Complete inverter schedule: exactly [`N_SLOTS`] slots, indexed in order.
#[must_use]
#[derive(
    Copy,
    Clone,
    Debug,
    Eq,
    PartialEq,
    Serialize,
    Deserialize,
    derive_more::IntoIterator,
)]
pub struct SlotSet(#[into_iterator(owned, ref)] [Slot; N_SLOTS]);

impl Default for SlotSet {
    fn default() -> Self {
        Self(std::array::from_fn(Slot::disabled))
    }
}

impl SlotSet {
    /// Fill the slots in order, the rest stay disabled.
    ///
    /// Intervals beyond [`N_SLOTS`] are ignored, consolidate them first.
    pub fn from_intervals(intervals: &[MergedInterval]) -> Self {
        debug_assert!(intervals.len() <= N_SLOTS, "{} intervals do not fit", intervals.len());
        Self(std::array::from_fn(|index| {
            intervals
                .get(index)
                .map_or_else(|| Slot::disabled(index), |interval| Slot::enabled(index, *interval))
        }))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Slot> {
        self.0.iter()
    }

    pub fn enabled(&self) -> impl Iterator<Item = &Slot> {
        self.iter().filter(|slot| slot.is_enabled)
    }

    #[must_use]
    pub fn n_enabled(&self) -> usize {
        self.enabled().count()
    }

    #[must_use]
    pub fn enabled_minutes(&self) -> u32 {
        self.iter().map(|slot| u32::from(slot.duration())).sum()
    }
}

/// Single per-slot mutation to push to the inverter.
#[must_use]
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize)]
pub struct SlotWrite {
    pub index: usize,
    pub start: MinuteOfDay,
    pub end: MinuteOfDay,

    #[serde(rename = "enabled")]
    pub is_enabled: bool,
}

impl From<Slot> for SlotWrite {
    fn from(slot: Slot) -> Self {
        Self { index: slot.index, start: slot.start, end: slot.end, is_enabled: slot.is_enabled }
    }
}
