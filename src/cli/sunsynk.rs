use clap::{Parser, value_parser};
use reqwest::Url;

use crate::{api::sunsynk, prelude::*};

#[derive(Parser)]
pub struct SunsynkApiArgs {
    /// Base URL, must end with a slash.
    #[clap(
        long = "sunsynk-api-url",
        env = "SUNSYNK_API_URL",
        default_value = "https://api.sunsynk.net/api/v1/"
    )]
    pub base_url: Url,

    /// Login base URL, must end with a slash.
    #[clap(
        long = "sunsynk-auth-url",
        env = "SUNSYNK_AUTH_URL",
        default_value = "https://api.sunsynk.net/"
    )]
    pub auth_url: Url,

    #[clap(long = "sunsynk-username", env = "SUNSYNK_USERNAME")]
    pub username: String,

    #[clap(long = "sunsynk-password", env = "SUNSYNK_PASSWORD", hide_env_values = true)]
    pub password: String,

    #[clap(long = "sunsynk-serial-number", alias = "serial", env = "SUNSYNK_SERIAL_NUMBER")]
    pub serial_number: String,
}

impl SunsynkApiArgs {
    pub fn connect(&self) -> Result<sunsynk::Api> {
        sunsynk::Api::new(
            self.base_url.clone(),
            self.auth_url.clone(),
            sunsynk::Credentials { username: self.username.clone(), password: self.password.clone() },
        )
    }
}

/// What an enabled slot asks the inverter to do.
#[derive(Copy, Clone, Debug, Parser)]
pub struct ChargeArgs {
    /// Grid charging power in watts.
    #[clap(long = "max-power-watts", env = "MAX_POWER_WATTS", default_value = "8000")]
    pub power_watts: u32,

    /// Target state-of-charge percent of an enabled slot.
    #[clap(
        long = "soc-max",
        env = "SOC_MAX",
        default_value = "100",
        value_parser = value_parser!(u32).range(0..=100)
    )]
    pub soc_max: u32,

    /// State-of-charge percent held by a disabled slot.
    #[clap(
        long = "soc-min",
        env = "SOC_MIN",
        default_value = "20",
        value_parser = value_parser!(u32).range(0..=100)
    )]
    pub soc_min: u32,
}

impl ChargeArgs {
    #[must_use]
    pub const fn target_soc(self, is_charging: bool) -> u32 {
        if is_charging { self.soc_max } else { self.soc_min }
    }
}
