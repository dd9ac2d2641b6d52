use crate::core::slot::{SlotSet, SlotWrite};

/// Writes needed to turn `previous` into `new`, in index order.
///
/// Without a previous state every slot is written.
pub fn diff(new: &SlotSet, previous: Option<&SlotSet>) -> Vec<SlotWrite> {
    let Some(previous) = previous else {
        return new.iter().copied().map(SlotWrite::from).collect();
    };
    new.iter()
        .zip(previous)
        .filter(|(new, previous)| new.triple() != previous.triple())
        .map(|(new, _)| SlotWrite::from(*new))
        .collect()
}
