use serde::Deserialize;
use std::path::PathBuf;

/// Complete TrainSafe configuration
#[derive(Debug, Clone, Deserialize)]
pub struct TrainsafeConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub seed: SeedConfig,
    #[serde(default)]
    pub stepper: StepperConfig,
}

/// HTTP/WebSocket listener configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5000
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

/// Seed state configuration
#[derive(Debug, Clone, Deserialize)]
pub struct SeedConfig {
    /// Path to the initial-state JSON file; the built-in two-train
    /// default is used when the file does not exist
    #[serde(default = "default_seed_file")]
    pub file: Option<PathBuf>,
}

fn default_seed_file() -> Option<PathBuf> {
    Some(PathBuf::from("data/trains_initial.json"))
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            file: default_seed_file(),
        }
    }
}

/// Demo stepper configuration (off by default)
#[derive(Debug, Clone, Deserialize)]
pub struct StepperConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Seconds between stepping passes
    #[serde(default = "default_stepper_interval")]
    pub interval_seconds: f64,
}

fn default_stepper_interval() -> f64 {
    2.0
}

impl Default for StepperConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_seconds: default_stepper_interval(),
        }
    }
}

impl Default for TrainsafeConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            seed: SeedConfig::default(),
            stepper: StepperConfig::default(),
        }
    }
}

/// Load configuration from TOML file
pub fn load_config(path: &str) -> Result<TrainsafeConfig, Box<dyn std::error::Error>> {
    let contents = std::fs::read_to_string(path)?;
    let config: TrainsafeConfig = toml::from_str(&contents)?;
    Ok(config)
}
