use std::{fs, path::Path};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{core::SlotSet, prelude::*};

/// Schedule preserved between the runs.
#[must_use]
#[derive(Default, Serialize, Deserialize)]
pub struct State {
    #[serde(default)]
    pub applied_at: Option<DateTime<Utc>>,

    /// Last schedule pushed to the inverter.
    #[serde(default)]
    pub slots: Option<SlotSet>,
}

impl State {
    pub fn new(slots: SlotSet, applied_at: DateTime<Utc>) -> Self {
        Self { applied_at: Some(applied_at), slots: Some(slots) }
    }

    /// Read the state, falling back to an empty one so that the run rewrites all the slots.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn read_from(path: &Path) -> Self {
        Self::read_fallibly_from(path).unwrap_or_else(|error| {
            error!("failed to read the state, starting over: {error:#}");
            Self::default()
        })
    }

    fn read_fallibly_from(path: &Path) -> Result<Self> {
        if path.is_file() {
            info!("reading the state…");
            Ok(toml::from_slice(&fs::read(path)?)?)
        } else {
            info!("no previous state");
            Ok(Self::default())
        }
    }

    #[instrument(skip_all, fields(path = %path.display()))]
    pub fn write_to(&self, path: &Path) -> Result {
        info!("writing the state…");
        fs::write(path, toml::to_string(self)?)
            .with_context(|| format!("failed to write `{}`", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::core::MinuteOfDay;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("octosynk-{}-{name}.toml", std::process::id()))
    }

    #[test]
    fn test_missing_file_is_empty_state() {
        let state = State::read_from(&temp_path("missing"));
        assert!(state.slots.is_none());
        assert!(state.applied_at.is_none());
    }

    #[test]
    fn test_corrupt_file_is_empty_state() -> Result {
        let path = temp_path("corrupt");
        fs::write(&path, "slots = 42")?;
        let state = State::read_from(&path);
        fs::remove_file(&path)?;
        assert!(state.slots.is_none());
        Ok(())
    }

    #[test]
    fn test_write_then_read_ok() -> Result {
        let path = temp_path("written");
        let slots = SlotSet::default();
        let applied_at = "2025-11-17T02:00:00Z".parse()?;
        State::new(slots, applied_at).write_to(&path)?;
        let state = State::read_from(&path);
        fs::remove_file(&path)?;
        assert_eq!(state.slots, Some(slots));
        assert_eq!(state.applied_at, Some(applied_at));
        assert!(state.slots.unwrap().iter().all(|slot| slot.end == MinuteOfDay::MIDNIGHT));
        Ok(())
    }
}
