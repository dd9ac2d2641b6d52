use serde::{Deserialize, Deserializer};
use serde_json::{Map, Value, json};
use serde_with::{DisplayFromStr, PickFirst, serde_as};

use crate::{api::sunsynk::schedule::ProgramWrite, cli::ChargeArgs, core::MinuteOfDay, prelude::*};

/// One of the inverter's time-of-use programs.
///
/// The inverter only keeps the start: a program lasts until the next one starts.
#[must_use]
#[serde_as]
#[derive(Clone, Debug, Eq, PartialEq, Deserialize)]
pub struct Program {
    pub start: MinuteOfDay,

    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub power_watts: u32,

    /// Target state-of-charge percent.
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub target_soc: u32,

    #[serde(deserialize_with = "deserialize_flag")]
    pub is_enabled: bool,
}

impl Program {
    /// Pick the fields of the `index`-th program out of the flat settings map.
    pub fn from_settings(settings: &Map<String, Value>, index: usize) -> Result<Self> {
        let number = index + 1;
        let field = |name: String| {
            settings.get(&name).cloned().with_context(|| format!("missing `{name}` setting"))
        };
        let is_enabled = field(format!("time{number}on"))
            .or_else(|_| field(format!("time{number}On")))?;
        let value = json!({
            "start": field(format!("sellTime{number}"))?,
            "power_watts": field(format!("sellTime{number}Pac"))?,
            "target_soc": field(format!("cap{number}"))?,
            "is_enabled": is_enabled,
        });
        serde_json::from_value(value).with_context(|| format!("failed to parse program #{number}"))
    }
}

/// Settings fragment which reprograms a single program.
///
/// A charging program targets `SOC_MAX`, an idle one holds `SOC_MIN`.
pub fn build_settings(
    serial_number: &str,
    write: &ProgramWrite,
    charge: ChargeArgs,
) -> Map<String, Value> {
    let number = write.index + 1;
    let is_charging = write.transition.is_charging;
    let mut settings = Map::new();
    settings.insert("sn".to_string(), serial_number.into());
    settings.insert(format!("sellTime{number}"), write.transition.start.to_string().into());
    settings.insert(format!("sellTime{number}Pac"), charge.power_watts.to_string().into());
    settings.insert(format!("cap{number}"), charge.target_soc(is_charging).to_string().into());
    settings.insert(format!("time{number}on"), is_charging.into());
    settings
}

fn deserialize_flag<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Number(u8),
        Text(String),
    }

    Ok(match Flag::deserialize(deserializer)? {
        Flag::Bool(flag) => flag,
        Flag::Number(number) => number != 0,
        Flag::Text(text) => text == "1" || text.eq_ignore_ascii_case("true"),
    })
}
