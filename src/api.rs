pub mod octopus;
pub mod sunsynk;
