mod allocator;
mod differ;
mod merger;
mod minute;
mod normalizer;
mod planner;
mod slot;
mod window;

pub use self::{
    merger::MergedInterval,
    minute::MinuteOfDay,
    planner::Planner,
    slot::{N_SLOTS, SlotSet, SlotWrite},
    window::Dispatch,
};
