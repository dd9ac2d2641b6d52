use clap::{Parser, Subcommand};

use crate::{
    cli::{octopus::OctopusApiArgs, sunsynk::SunsynkApiArgs},
    prelude::*,
    tables::{build_dispatches_table, build_programs_table},
};

#[derive(Parser)]
pub struct BurrowArgs {
    #[command(subcommand)]
    command: BurrowCommand,
}

impl BurrowArgs {
    pub async fn run(self) -> Result {
        match self.command {
            BurrowCommand::Dispatches(args) => args.run().await,
            BurrowCommand::Inverter(args) => args.run().await,
        }
    }
}

#[derive(Subcommand)]
enum BurrowCommand {
    /// Print the planned Octopus dispatches.
    Dispatches(BurrowDispatchesArgs),

    /// Print the current Sunsynk programs.
    Inverter(BurrowInverterArgs),
}

#[derive(Parser)]
struct BurrowDispatchesArgs {
    #[clap(flatten)]
    octopus: OctopusApiArgs,
}

impl BurrowDispatchesArgs {
    #[instrument(skip_all)]
    async fn run(self) -> Result {
        let dispatches = self.octopus.get_planned_dispatches().await?;
        info!(len = dispatches.len(), "gotcha");
        println!("{}", build_dispatches_table(&dispatches));
        Ok(())
    }
}

#[derive(Parser)]
struct BurrowInverterArgs {
    #[clap(flatten)]
    sunsynk: SunsynkApiArgs,
}

impl BurrowInverterArgs {
    #[instrument(skip_all)]
    async fn run(self) -> Result {
        let programs = self.sunsynk.connect()?.read_programs(&self.sunsynk.serial_number).await?;
        println!("{}", build_programs_table(&programs));
        Ok(())
    }
}
