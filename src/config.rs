//! Layered configuration for the countdown page.
//!
//! Values come from, in increasing priority: built-in defaults, an optional
//! TOML file, and `COUNTDOWN_`-prefixed environment variables where `__`
//! separates nested keys (`COUNTDOWN_TOAST__TIMEOUT_MS=3000`).

use crate::{countdown, datepicker};
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Default configuration file name.
pub const DEFAULT_FILE: &str = "countdown.toml";

/// Prefix of environment overrides.
pub const ENV_PREFIX: &str = "COUNTDOWN_";

/// Configuration failures.
#[derive(Debug, Error)]
pub enum Error {
    /// A source could not be read or did not match the expected shape.
    #[error("invalid configuration: {0}")]
    Figment(#[from] Box<figment::Error>),
    /// A value is out of range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl From<figment::Error> for Error {
    fn from(err: figment::Error) -> Self {
        Error::Figment(Box::new(err))
    }
}

/// Countdown widget settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CountdownConfig {
    /// Selector of the countdown container.
    pub selector: String,
    /// Milliseconds between ticks.
    pub tick_interval_ms: u64,
}

impl Default for CountdownConfig {
    fn default() -> Self {
        Self {
            selector: "div.timer-wrapper".to_string(),
            tick_interval_ms: 1000,
        }
    }
}

/// Date picker settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PickerConfig {
    /// Allow picking hours and minutes.
    pub enable_time: bool,
    /// 24-hour clock display.
    pub time_24hr: bool,
    /// Minute step.
    pub minute_increment: u32,
}

impl Default for PickerConfig {
    fn default() -> Self {
        let defaults = datepicker::Options::default();
        Self {
            enable_time: defaults.enable_time,
            time_24hr: defaults.time_24hr,
            minute_increment: defaults.minute_increment,
        }
    }
}

/// Delayed outcome form settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    /// Selector of the form.
    pub selector: String,
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            selector: "form".to_string(),
        }
    }
}

/// Toast settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToastConfig {
    /// Milliseconds a toast stays visible.
    pub timeout_ms: u64,
    /// Maximum number of toasts shown at once.
    pub max_visible: usize,
}

impl Default for ToastConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 5000,
            max_visible: 5,
        }
    }
}

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Countdown widget.
    pub countdown: CountdownConfig,
    /// Date picker.
    pub picker: PickerConfig,
    /// Delayed outcome form.
    pub form: FormConfig,
    /// Toasts.
    pub toast: ToastConfig,
    /// File receiving log output. Logs go to stderr when unset.
    pub log_file: Option<PathBuf>,
}

impl Config {
    /// Loads defaults, then `path` if it exists, then the environment.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        Self::from_figment(
            Figment::from(Serialized::defaults(Config::default()))
                .merge(Toml::file(path.as_ref()))
                .merge(Env::prefixed(ENV_PREFIX).split("__")),
        )
    }

    /// Extracts and validates a configuration from `figment`.
    pub fn from_figment(figment: Figment) -> Result<Self, Error> {
        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), Error> {
        if self.countdown.tick_interval_ms == 0 {
            return Err(Error::Invalid(
                "countdown.tick_interval_ms must be positive".to_string(),
            ));
        }
        if self.picker.minute_increment == 0 || self.picker.minute_increment > 59 {
            return Err(Error::Invalid(
                "picker.minute_increment must be between 1 and 59".to_string(),
            ));
        }
        Ok(())
    }

    /// Countdown options derived from this configuration.
    pub fn countdown_options(&self) -> countdown::Options {
        countdown::Options {
            interval: Duration::from_millis(self.countdown.tick_interval_ms),
            picker: datepicker::Options {
                enable_time: self.picker.enable_time,
                time_24hr: self.picker.time_24hr,
                default_date: None,
                minute_increment: self.picker.minute_increment,
            },
        }
    }

    /// How long toasts stay visible.
    pub fn toast_timeout(&self) -> Duration {
        Duration::from_millis(self.toast.timeout_ms)
    }
}
