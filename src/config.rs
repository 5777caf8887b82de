//! Input configuration.
//!
//! Per-class tuning loaded from TOML:
//!
//! ```toml
//! [classes.xbox]
//! press_threshold = 0.6
//!
//! [classes.xbox.calibration.ls]
//! center_x = 0.02
//! deadzone = 0.12
//!
//! [classes.ps4.calibration.rs]
//! deadzone = 0.08
//! range = 0.95
//! ```
//!
//! A [`DeviceSeeker`](crate::seeker::DeviceSeeker) built
//! [`with_config`](crate::seeker::DeviceSeeker::with_config) applies its
//! [`ClassConfig`] to every device it registers. Omitted calibration fields
//! take their [`StickCalibration::default`] values.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::class::validate_threshold;
use crate::controller::StickCalibration;
use crate::device::{DeviceAdapter, InputDevice};
use crate::error::{ConfigError, ValidationError};

/// Configuration for every device class, keyed by class id.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InputConfig {
    pub classes: BTreeMap<String, ClassConfig>,
}

/// Tuning for the devices of one class.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassConfig {
    /// Overrides the class press threshold.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub press_threshold: Option<f32>,
    /// Stick calibrations keyed by feature id.
    pub calibration: BTreeMap<String, StickCalibration>,
}

impl InputConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: InputConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string(self)?)
    }

    /// Configuration of one class, if present.
    pub fn class(&self, id: &str) -> Option<&ClassConfig> {
        self.classes.get(id)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (class, config) in &self.classes {
            config.validate().map_err(|source| ConfigError::Invalid {
                class: class.clone(),
                source,
            })?;
        }
        Ok(())
    }
}

impl ClassConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(t) = self.press_threshold {
            validate_threshold(t)?;
        }
        for calibration in self.calibration.values() {
            calibration.validate()?;
        }
        Ok(())
    }

    /// Apply threshold and calibrations to `device`.
    ///
    /// Calibrations naming a feature the device does not have as a stick are
    /// skipped with a warning.
    pub fn apply<A: DeviceAdapter>(&self, device: &mut InputDevice<A>) {
        if let Some(t) = self.press_threshold {
            if let Err(e) = device.set_press_threshold(t) {
                log::warn!("ignoring press threshold: {e}");
            }
        }
        for (stick, calibration) in &self.calibration {
            if let Err(e) = device.calibrate_stick_by_id(stick, Some(*calibration)) {
                log::warn!("ignoring calibration for {stick:?}: {e}");
            }
        }
    }
}
