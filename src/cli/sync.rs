use std::path::{Path, PathBuf};

use chrono::{Local, Utc};
use clap::Parser;

use crate::{
    api::sunsynk::{self, ProgramWrite, Schedule},
    cli::{
        heartbeat::HeartbeatArgs,
        octopus::OctopusApiArgs,
        off_peak::OffPeakArgs,
        sunsynk::{ChargeArgs, SunsynkApiArgs},
    },
    core::{Planner, SlotSet},
    prelude::*,
    state::State,
    tables::{build_dispatches_table, build_slots_table, build_writes_table},
};

#[derive(Parser)]
pub struct SyncArgs {
    /// Do not write the programs to the inverter nor persist the state (dry run).
    #[clap(long)]
    pub scout: bool,

    /// Last applied schedule.
    #[clap(long = "state-path", env = "STATE_PATH", default_value = "octosynk.toml")]
    pub state_path: PathBuf,

    #[clap(flatten)]
    pub off_peak: OffPeakArgs,

    #[clap(flatten)]
    pub charge: ChargeArgs,

    #[clap(flatten)]
    pub octopus: OctopusApiArgs,

    #[clap(flatten)]
    pub sunsynk: SunsynkApiArgs,

    #[clap(flatten)]
    pub heartbeat: HeartbeatArgs,
}

impl SyncArgs {
    #[instrument(skip_all, fields(scout = self.scout))]
    pub async fn run(self) -> Result {
        let dispatches = self.octopus.get_planned_dispatches().await?;
        println!("{}", build_dispatches_table(&dispatches));

        let state = State::read_from(&self.state_path);
        let plan = Planner::builder()
            .dispatches(&dispatches)
            .off_peak_start(self.off_peak.start)
            .off_peak_end(self.off_peak.end)
            .maybe_previous(state.slots.as_ref())
            .timezone(Local)
            .build()
            .plan();
        println!("{}", build_slots_table(&plan.slots, &plan.writes));

        let schedule = Schedule::from_slots(&plan.slots)?;
        let previous = state.slots.as_ref().and_then(|slots| Schedule::from_slots(slots).ok());
        let writes = schedule.diff(previous.as_ref());
        if !writes.is_empty() {
            println!("{}", build_writes_table(&writes, self.charge));
        }

        let mut sunsynk = self.sunsynk.connect()?;
        apply(
            &mut sunsynk,
            &self.sunsynk.serial_number,
            &writes,
            self.charge,
            plan.slots,
            &self.state_path,
            self.scout,
        )
        .await?;

        self.heartbeat.send().await;
        Ok(())
    }
}

/// Write the programs in index order, then remember the slots.
///
/// The state is only replaced once every write has succeeded. Scouting touches neither.
#[instrument(skip_all, fields(n_writes = writes.len(), scout = scout))]
async fn apply(
    sunsynk: &mut sunsynk::Api,
    serial_number: &str,
    writes: &[ProgramWrite],
    charge: ChargeArgs,
    slots: SlotSet,
    state_path: &Path,
    scout: bool,
) -> Result {
    if scout {
        info!("scouting, leaving the inverter alone");
        return Ok(());
    }
    for write in writes {
        sunsynk.write(serial_number, write, charge).await?;
    }
    State::new(slots, Utc::now()).write_to(state_path)?;
    info!("applied");
    Ok(())
}
