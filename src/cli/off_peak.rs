use clap::Parser;

use crate::core::MinuteOfDay;

/// Fixed nightly tariff window, local wall-clock time.
#[derive(Copy, Clone, Parser)]
pub struct OffPeakArgs {
    #[clap(long = "off-peak-start", env = "OFF_PEAK_START_TIME", default_value = "23:30")]
    pub start: MinuteOfDay,

    #[clap(long = "off-peak-end", env = "OFF_PEAK_END_TIME", default_value = "05:30")]
    pub end: MinuteOfDay,
}
