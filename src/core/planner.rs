use std::iter::once;

use chrono::TimeZone;
use itertools::Itertools;

use crate::{
    core::{
        allocator::allocate,
        differ::diff,
        merger::merge,
        minute::MinuteOfDay,
        normalizer::normalize,
        slot::{SlotSet, SlotWrite},
        window::{Dispatch, RawWindow, Warning},
    },
    prelude::*,
};

/// One reconciliation run: dispatches and the off-peak window in, slots and writes out.
#[derive(bon::Builder)]
pub struct Planner<'a, Tz: TimeZone> {
    dispatches: &'a [Dispatch],
    off_peak_start: MinuteOfDay,
    off_peak_end: MinuteOfDay,

    /// Last applied schedule, if known.
    previous: Option<&'a SlotSet>,

    /// Wall clock the dispatches are projected onto.
    timezone: Tz,
}

#[must_use]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Plan {
    pub slots: SlotSet,
    pub writes: Vec<SlotWrite>,
    pub report: Report,
}

#[must_use]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Report {
    pub warnings: Vec<Warning>,
    pub n_windows: usize,
    pub n_merged: usize,
    pub requested_minutes: u32,
    pub added_minutes: u32,
    pub uncovered_minutes: u32,
}

impl<Tz: TimeZone> Planner<'_, Tz> {
    #[instrument(skip_all, fields(n_dispatches = self.dispatches.len()))]
    pub fn plan(&self) -> Plan {
        let mut inverted = Vec::new();
        let raw_windows = self
            .dispatches
            .iter()
            .filter_map(|dispatch| {
                RawWindow::from_dispatch(dispatch.start, dispatch.end, &self.timezone)
                    .map_err(|warning| inverted.push(warning))
                    .ok()
            })
            .chain(once(RawWindow::off_peak(self.off_peak_start, self.off_peak_end)))
            .collect_vec();

        let mut normalized = normalize(raw_windows);
        for warning in inverted {
            normalized.reject(warning);
        }
        let n_windows = normalized.windows.len();
        let merged = merge(normalized.windows);
        let allocation = allocate(&merged);
        let writes = diff(&allocation.slots, self.previous);

        let report = Report {
            warnings: normalized.warnings,
            n_windows,
            n_merged: merged.len(),
            requested_minutes: merged.iter().map(|interval| u32::from(interval.duration())).sum(),
            added_minutes: allocation.added_minutes,
            uncovered_minutes: allocation.uncovered_minutes,
        };
        info!(
            n_windows = report.n_windows,
            n_merged = report.n_merged,
            n_enabled = allocation.slots.n_enabled(),
            n_writes = writes.len(),
            n_warnings = report.warnings.len(),
            added_minutes = report.added_minutes,
            uncovered_minutes = report.uncovered_minutes,
            "planned",
        );
        Plan { slots: allocation.slots, writes, report }
    }
}
