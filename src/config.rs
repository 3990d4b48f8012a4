use crate::network_trace::NetworkState;
use crate::traversal::SearchType;
use anyhow::Result;
use figment::{providers::{Env, Format, Toml}, Figment};
use serde::Deserialize;
use std::path::PathBuf;
use validator::Validate;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub logging: LoggingConfig,
    pub trace: TraceConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// `tracing_subscriber` filter directives, overridden by `RUST_LOG`.
    pub filter: String,
    pub json: bool,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct TraceConfig {
    /// JSON network description to load.
    pub network_file: PathBuf,
    /// Network state(s) to energize and assign.
    #[serde(default)]
    pub state: StateSelection,
    #[serde(default)]
    pub search_type: SearchType,
    /// Equipment to report the downstream tree, reach and positions from.
    #[serde(default)]
    #[validate(length(min = 1))]
    pub start_equipment: Option<String>,
    /// Caps the reach trace at this many equipment steps.
    #[serde(default)]
    #[validate(range(min = 1))]
    pub step_limit: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateSelection {
    #[default]
    Normal,
    Current,
    Both,
}

impl StateSelection {
    pub fn states(self) -> Vec<NetworkState> {
        match self {
            Self::Normal => vec![NetworkState::Normal],
            Self::Current => vec![NetworkState::Current],
            Self::Both => vec![NetworkState::Normal, NetworkState::Current],
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::from_figment(
            Figment::new()
                .merge(Toml::file("config/default.toml"))
                .merge(Env::prefixed("CIM_TRACE__").split("__")),
        )
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Self = figment.extract()?;
        config.trace.validate()?;
        Ok(config)
    }
}
