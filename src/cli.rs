mod burrow;
mod heartbeat;
mod octopus;
mod off_peak;
mod sunsynk;
mod sync;

use clap::{Parser, Subcommand};

pub use self::sunsynk::ChargeArgs;
use crate::cli::{burrow::BurrowArgs, sync::SyncArgs};

#[derive(Parser)]
#[command(author, version, about, propagate_version = true)]
#[must_use]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Main command: fetch the dispatches, plan the slots, and push the changed ones to the inverter.
    #[clap(name = "sync")]
    Sync(Box<SyncArgs>),

    /// Development tools.
    #[clap(name = "burrow")]
    Burrow(Box<BurrowArgs>),
}
