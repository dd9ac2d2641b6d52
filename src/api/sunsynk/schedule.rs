use std::iter::once;

use itertools::Itertools;

use crate::{
    core::{MinuteOfDay, SlotSet},
    prelude::*,
};

/// Number of time-of-use programs on the inverter.
pub const N_PROGRAMS: usize = 6;

/// Padding candidates are taken from this grid.
const PADDING_STEP: u16 = 30;

/// Inverter program as written: from `start` on, grid-charge or not, until the next program.
#[must_use]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct Transition {
    pub start: MinuteOfDay,
    pub is_charging: bool,
}

impl Transition {
    const fn new(start: MinuteOfDay, is_charging: bool) -> Self {
        Self { start, is_charging }
    }
}

/// Full set of inverter programs, starting at midnight in ascending order.
#[must_use]
#[derive(Copy, Clone, Debug, Eq, PartialEq, derive_more::IntoIterator)]
pub struct Schedule(#[into_iterator(owned, ref)] [Transition; N_PROGRAMS]);

/// Single program to reprogram.
#[must_use]
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct ProgramWrite {
    pub index: usize,
    pub transition: Transition,
}

impl Schedule {
    /// Translate the slots into on/off transitions.
    ///
    /// Every enabled slot switches charging on at its start and off at its end, unless it ends
    /// at midnight or where the next one starts. Unused programs repeat the state in effect.
    pub fn from_slots(slots: &SlotSet) -> Result<Self> {
        let enabled = slots
            .enabled()
            .filter(|slot| slot.start < slot.end)
            .sorted_by_key(|slot| slot.start)
            .collect_vec();

        let mut transitions = Vec::with_capacity(2 * enabled.len() + 1);
        if enabled.first().is_none_or(|slot| slot.start != MinuteOfDay::MIDNIGHT) {
            transitions.push(Transition::new(MinuteOfDay::MIDNIGHT, false));
        }
        let nexts = enabled.iter().skip(1).map(Some).chain(once(None));
        for (slot, next) in enabled.iter().zip(nexts) {
            if transitions.last().is_none_or(|last| !last.is_charging) {
                transitions.push(Transition::new(slot.start, true));
            }
            if !slot.end.is_end_of_day() && next.is_none_or(|next| next.start > slot.end) {
                transitions.push(Transition::new(slot.end, false));
            }
        }
        ensure!(
            transitions.len() <= N_PROGRAMS,
            "the slots need {} on/off transitions, the inverter only has {N_PROGRAMS} programs",
            transitions.len(),
        );

        let padding = (0..MinuteOfDay::MINUTES_PER_DAY)
            .step_by(usize::from(PADDING_STEP))
            .filter_map(MinuteOfDay::new)
            .filter(|minute| transitions.iter().all(|transition| transition.start != *minute))
            .take(N_PROGRAMS - transitions.len())
            .map(|minute| Transition::new(minute, Self::state_at(&transitions, minute)))
            .collect_vec();
        let programs: Result<[Transition; N_PROGRAMS], _> = transitions
            .into_iter()
            .chain(padding)
            .sorted_by_key(|transition| transition.start)
            .collect_vec()
            .try_into();
        let Ok(programs) = programs else {
            bail!("failed to pad the programs to {N_PROGRAMS}");
        };
        Ok(Self(programs))
    }

    /// Whether the inverter grid-charges at the minute.
    #[must_use]
    pub fn is_charging_at(&self, minute: MinuteOfDay) -> bool {
        Self::state_at(&self.0, minute)
    }

    /// Programs to write to turn `previous` into `self`, in index order.
    ///
    /// Without a previous schedule every program is written.
    pub fn diff(&self, previous: Option<&Self>) -> Vec<ProgramWrite> {
        self.0
            .iter()
            .enumerate()
            .filter(|(index, transition)| {
                previous.is_none_or(|previous| previous.0[*index] != **transition)
            })
            .map(|(index, transition)| ProgramWrite { index, transition: *transition })
            .collect()
    }

    fn state_at(transitions: &[Transition], minute: MinuteOfDay) -> bool {
        transitions
            .iter()
            .rev()
            .find(|transition| transition.start <= minute)
            .is_some_and(|transition| transition.is_charging)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Utc};
    use proptest::prelude::*;

    use super::*;
    use crate::core::{Dispatch, MergedInterval, Planner};

    fn minute(s: &str) -> MinuteOfDay {
        s.parse().unwrap()
    }

    fn at(time: &str) -> DateTime<Utc> {
        format!("2025-11-17T{time}:00Z").parse().unwrap()
    }

    fn planned(dispatches: &[Dispatch]) -> SlotSet {
        Planner::builder()
            .dispatches(dispatches)
            .off_peak_start(minute("23:30"))
            .off_peak_end(minute("05:30"))
            .timezone(Utc)
            .build()
            .plan()
            .slots
    }

    fn programs(schedule: &Schedule) -> Vec<(String, bool)> {
        schedule
            .into_iter()
            .map(|transition| (transition.start.to_string(), transition.is_charging))
            .collect()
    }

    fn pair(start: &str, is_charging: bool) -> (String, bool) {
        (start.to_string(), is_charging)
    }

    #[test]
    fn test_off_peak_only() -> Result {
        let schedule = Schedule::from_slots(&planned(&[]))?;
        assert_eq!(
            programs(&schedule),
            [
                pair("00:00", true),
                pair("00:30", true),
                pair("01:00", true),
                pair("01:30", true),
                pair("05:30", false),
                pair("23:30", true),
            ],
        );
        Ok(())
    }

    #[test]
    fn test_charges_only_inside_the_windows() -> Result {
        let schedule = Schedule::from_slots(&planned(&[Dispatch { start: at("06:00"), end: at("07:00") }]))?;
        assert_eq!(
            programs(&schedule),
            [
                pair("00:00", true),
                pair("00:30", true),
                pair("05:30", false),
                pair("06:00", true),
                pair("07:00", false),
                pair("23:30", true),
            ],
        );
        assert!(schedule.is_charging_at(minute("00:00")));
        assert!(schedule.is_charging_at(minute("03:00")));
        assert!(!schedule.is_charging_at(minute("05:30")));
        assert!(!schedule.is_charging_at(minute("05:45")));
        assert!(schedule.is_charging_at(minute("06:30")));
        assert!(!schedule.is_charging_at(minute("07:00")));
        assert!(!schedule.is_charging_at(minute("12:00")));
        assert!(!schedule.is_charging_at(minute("23:29")));
        assert!(schedule.is_charging_at(minute("23:45")));
        Ok(())
    }

    #[test]
    fn test_no_slots_never_charges() -> Result {
        let schedule = Schedule::from_slots(&SlotSet::default())?;
        assert!(schedule.into_iter().all(|transition| !transition.is_charging));
        assert_eq!(schedule.0[0].start, MinuteOfDay::MIDNIGHT);
        Ok(())
    }

    #[test]
    fn test_whole_day() -> Result {
        let interval = MergedInterval { start: MinuteOfDay::MIDNIGHT, end: MinuteOfDay::END_OF_DAY };
        let schedule = Schedule::from_slots(&SlotSet::from_intervals(&[interval]))?;
        assert!(schedule.into_iter().all(|transition| transition.is_charging));
        Ok(())
    }

    #[test]
    fn test_too_many_transitions_refused() {
        let dispatches = [
            Dispatch { start: at("06:00"), end: at("07:00") },
            Dispatch { start: at("12:00"), end: at("13:00") },
        ];
        assert!(Schedule::from_slots(&planned(&dispatches)).is_err());
    }

    #[test]
    fn test_diff() -> Result {
        let previous = Schedule::from_slots(&planned(&[]))?;
        let schedule = Schedule::from_slots(&planned(&[Dispatch { start: at("06:00"), end: at("07:00") }]))?;
        assert_eq!(schedule.diff(Some(&schedule)), []);
        assert_eq!(schedule.diff(None).len(), N_PROGRAMS);
        let writes = schedule.diff(Some(&previous));
        assert_eq!(
            writes.iter().map(|write| write.index).collect_vec(),
            [2, 3, 4],
        );
        assert_eq!(writes[0].transition, Transition::new(minute("05:30"), false));
        assert_eq!(writes[1].transition, Transition::new(minute("06:00"), true));
        assert_eq!(writes[2].transition, Transition::new(minute("07:00"), false));
        Ok(())
    }

    fn arbitrary_slots() -> impl Strategy<Value = SlotSet> {
        prop::collection::btree_set(0..=MinuteOfDay::MINUTES_PER_DAY, 0..=12).prop_map(|points| {
            let intervals = points
                .into_iter()
                .tuples()
                .filter_map(|(start, end)| {
                    Some(MergedInterval { start: MinuteOfDay::new(start)?, end: MinuteOfDay::new(end)? })
                })
                .collect_vec();
            SlotSet::from_intervals(&intervals)
        })
    }

    proptest! {
        #[test]
        fn schedule_charges_exactly_inside_the_slots(slots in arbitrary_slots()) {
            match Schedule::from_slots(&slots) {
                Ok(schedule) => {
                    let starts = schedule.into_iter().map(|transition| transition.start).collect_vec();
                    prop_assert_eq!(starts[0], MinuteOfDay::MIDNIGHT);
                    prop_assert!(starts.iter().tuple_windows().all(|(a, b)| a < b));
                    for minute in (0..MinuteOfDay::MINUTES_PER_DAY).filter_map(MinuteOfDay::new) {
                        let is_requested =
                            slots.enabled().any(|slot| slot.start <= minute && minute < slot.end);
                        prop_assert_eq!(schedule.is_charging_at(minute), is_requested, "at {}", minute);
                    }
                }
                Err(_) => prop_assert!(slots.n_enabled() > 2),
            }
        }
    }
}
