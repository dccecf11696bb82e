use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use tracing::{error, info};
use tread_kinematics::PivotPolicy;

use crate::source::Segment;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub simulation: SimulationSettings,
    #[serde(default)]
    pub robots: Vec<RobotSettings>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SimulationSettings {
    #[serde(default = "default_tick_period_ms")]
    pub tick_period_ms: u64,
    /// Upper bound on ticks; 0 means no bound.
    #[serde(default)]
    pub max_ticks: u64,
    #[serde(default = "default_report_interval_ms")]
    pub report_interval_ms: u64,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        SimulationSettings {
            tick_period_ms: default_tick_period_ms(),
            max_ticks: 0,
            report_interval_ms: default_report_interval_ms(),
        }
    }
}

fn default_tick_period_ms() -> u64 {
    10
}

fn default_report_interval_ms() -> u64 {
    250
}

#[derive(Debug, Clone, Deserialize)]
pub struct RobotSettings {
    /// Defaults to `NXT<n>` with `n` counted from 1 in file order.
    pub name: Option<String>,
    pub wheel_span: f64,
    pub wheel_diameter: f64,
    #[serde(default)]
    pub pivot_policy: PivotPolicy,
    #[serde(default)]
    pub start: StartPose,
    /// Read the compass relative to the heading the robot starts with.
    #[serde(default)]
    pub zero_compass_on_start: bool,
    #[serde(default)]
    pub script: Vec<Segment>,
}

#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct StartPose {
    #[serde(default)]
    pub x: f64,
    #[serde(default)]
    pub z: f64,
    /// Radians, counter-clockwise seen from above.
    #[serde(default)]
    pub yaw: f64,
}

impl Settings {
    fn from_config(config: Config) -> Result<Self, ConfigError> {
        let settings: Settings = config.try_deserialize()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Parses settings from TOML text, without environment overrides.
    pub fn from_toml_str(toml: &str) -> Result<Self, ConfigError> {
        let config = Config::builder()
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?;
        Self::from_config(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.simulation.tick_period_ms == 0 {
            return Err(ConfigError::Message("simulation.tick_period_ms must be at least 1".into()));
        }
        if self.simulation.report_interval_ms == 0 {
            return Err(ConfigError::Message("simulation.report_interval_ms must be at least 1".into()));
        }
        Ok(())
    }
}

pub fn load_config(path: &str) -> Result<Settings, ConfigError> {
    info!("Attempting to load configuration from {}", path);

    let settings = Config::builder()
        .add_source(File::new(path, FileFormat::Toml).required(true))
        .add_source(
            Environment::with_prefix("TREAD")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        )
        .build()
        .and_then(Settings::from_config);

    match settings {
        Ok(settings) => {
            info!(robots = settings.robots.len(), simulation = ?settings.simulation, "Successfully loaded configuration");
            Ok(settings)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            Err(e)
        }
    }
}
