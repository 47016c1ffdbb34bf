use std::path::Path;

use config::{Config, Environment, File, FileFormat};
use miette::{Context, IntoDiagnostic, Result};
use serde::Deserialize;

use crate::outside::{FFMPEG, FFPROBE};

/// Config file read from the working directory when no path is given
pub const DEFAULT_CONFIG_FILE: &str = "segmux.toml";

/// Prefix of the environment variables overriding the config file
pub const ENV_PREFIX: &str = "SEGMUX";

/// Tool-wide settings, from lowest to highest priority:
/// built-in defaults, the TOML config file, `SEGMUX_*` environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Program used to transcode
    pub ffmpeg: String,
    /// Program used to probe source durations
    pub ffprobe: String,
    /// Default segment duration in seconds
    pub segment_duration: u32,
    /// Default playlist size, 0 keeps every segment
    pub list_size: u32,
    /// Maximum log level (`error`, `warn`, `info`, `debug`, `trace`)
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            ffmpeg: FFMPEG.to_string(),
            ffprobe: FFPROBE.to_string(),
            segment_duration: 2,
            list_size: 0,
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Load the settings. An explicit config file must exist,
    /// the default one is optional.
    pub fn load(config_file: Option<&Path>) -> Result<Self> {
        let file = match config_file {
            Some(path) => File::from(path).format(FileFormat::Toml).required(true),
            None => File::new(DEFAULT_CONFIG_FILE, FileFormat::Toml).required(false),
        };

        Config::builder()
            .add_source(file)
            .add_source(Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .into_diagnostic()
            .wrap_err("Could not load the configuration")?
            .try_deserialize()
            .into_diagnostic()
            .wrap_err("Invalid configuration")
    }

    pub fn log_level(&self) -> Result<tracing::Level> {
        self.log_level
            .parse()
            .into_diagnostic()
            .wrap_err_with(|| format!("Invalid log level '{}'", self.log_level))
    }
}
