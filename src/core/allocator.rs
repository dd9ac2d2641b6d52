use itertools::Itertools;

use crate::{
    core::{
        merger::MergedInterval,
        slot::{N_SLOTS, SlotSet},
    },
    prelude::*,
};

#[must_use]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Allocation {
    pub slots: SlotSet,

    /// Non-requested charging introduced by consolidation.
    pub added_minutes: u32,

    /// Requested time that did not make it into any slot.
    pub uncovered_minutes: u32,
}

/// Fit the merged intervals into the inverter slots.
///
/// While there are too many intervals, the adjacent pair separated by the smallest gap
/// gets merged, the earliest pair winning a tie. The gap is then charged for as well.
pub fn allocate(merged: &[MergedInterval]) -> Allocation {
    let mut intervals = merged.to_vec();
    while intervals.len() > N_SLOTS {
        let Some(position) =
            intervals.iter().tuple_windows().map(|(prev, next)| prev.gap_to(*next)).position_min()
        else {
            break;
        };
        debug!(
            prev = ?intervals[position],
            next = ?intervals[position + 1],
            gap = intervals[position].gap_to(intervals[position + 1]),
            "consolidating…",
        );
        let next = intervals.remove(position + 1);
        intervals[position] = intervals[position].span(next);
    }

    let requested_minutes = total_minutes(merged);
    let allocated_minutes = total_minutes(&intervals);
    let covered_minutes: u32 = merged
        .iter()
        .map(|requested| intervals.iter().map(|slot| overlap(*requested, *slot)).sum::<u32>())
        .sum();
    let allocation = Allocation {
        slots: SlotSet::from_intervals(&intervals),
        added_minutes: allocated_minutes.saturating_sub(covered_minutes),
        uncovered_minutes: requested_minutes.saturating_sub(covered_minutes),
    };
    if merged.len() > N_SLOTS {
        info!(
            n_intervals = merged.len(),
            added_minutes = allocation.added_minutes,
            uncovered_minutes = allocation.uncovered_minutes,
            "consolidated the intervals into {N_SLOTS} slots",
        );
    }
    allocation
}

fn total_minutes(intervals: &[MergedInterval]) -> u32 {
    intervals.iter().map(|interval| u32::from(interval.duration())).sum()
}

fn overlap(lhs: MergedInterval, rhs: MergedInterval) -> u32 {
    u32::from(lhs.end.min(rhs.end).minutes_since(lhs.start.max(rhs.start)))
}
