use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;

use crate::availability::hours::{to_hour, to_label};
use crate::availability::step::StepSettings;
use crate::availability::week::AnchorPolicy;
use crate::availability::window::{DEFAULT_END_HOUR, DEFAULT_START_HOUR, TimeWindow};

pub fn load_step_settings(path: &Path) -> Result<StepSettings> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("unable to read config file {}", path.display()))?;
    parse_step_settings_text(&content)
}

pub fn parse_step_settings_text(content: &str) -> Result<StepSettings> {
    let raw = serde_json::from_str::<ConfigFile>(content).map_err(|err| {
        let line = err.line();
        let column = err.column();
        anyhow::anyhow!("invalid JSON at line {line}, column {column}: {err}")
    })?;

    if raw.version != 1 {
        bail!(
            "unsupported config version {}; expected version 1",
            raw.version
        );
    }

    let start = to_hour(&raw.settings.start_time)
        .with_context(|| format!("invalid start_time '{}'", raw.settings.start_time))?;
    let end = to_hour(&raw.settings.end_time)
        .with_context(|| format!("invalid end_time '{}'", raw.settings.end_time))?;
    let window = TimeWindow::new(start, end).context("invalid default time window")?;

    Ok(StepSettings {
        window,
        anchor_policy: raw.settings.anchor_policy,
    })
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    version: u32,
    #[serde(default)]
    settings: SettingsFile,
}

#[derive(Debug, Deserialize)]
struct SettingsFile {
    #[serde(default = "default_start_time")]
    start_time: String,
    #[serde(default = "default_end_time")]
    end_time: String,
    #[serde(default)]
    anchor_policy: AnchorPolicy,
}

impl Default for SettingsFile {
    fn default() -> Self {
        Self {
            start_time: default_start_time(),
            end_time: default_end_time(),
            anchor_policy: AnchorPolicy::default(),
        }
    }
}

fn default_start_time() -> String {
    to_label(DEFAULT_START_HOUR)
}

fn default_end_time() -> String {
    to_label(DEFAULT_END_HOUR)
}
