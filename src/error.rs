//! Error types.
//!
//! Errors local to one feature or one device are collected into aggregate
//! reports ([`DevicePollError`], [`SeekerPollError`]) instead of aborting the
//! poll pass. Only construction-time validation and whole-pass seek failures
//! surface on their own.

use std::fmt;

use thiserror::Error;

use crate::device::DeviceId;

/// Boxed error used by update functions and adapters.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Malformed declaration (feature id, class table, threshold, calibration).
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("id cannot be empty")]
    EmptyId,

    #[error("id {0:?} contains whitespace")]
    WhitespaceInId(String),

    #[error("feature {feature:?} is declared more than once by device class {class:?}")]
    DuplicateFeature { class: String, feature: String },

    #[error("press threshold {0} is outside (0.0, 1.0]")]
    PressThreshold(f32),

    #[error("invalid stick calibration: {0}")]
    Calibration(String),
}

/// A feature was queried on a device whose class never declared it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("feature {feature:?} is not declared by device class {class:?}")]
pub struct UnknownFeatureError {
    pub class: String,
    pub feature: String,
}

/// Failure to obtain mutable access to a feature state.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FeatureAccessError {
    #[error(transparent)]
    Unknown(#[from] UnknownFeatureError),

    #[error("feature {feature:?} is input-only and cannot be written by the application")]
    ReadOnly { feature: String },

    #[error("feature {feature:?} is not an analog stick")]
    NotAStick { feature: String },

    #[error(transparent)]
    Invalid(#[from] ValidationError),
}

/// A feature's state factory broke its binding contract.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeatureContractError {
    #[error("state created by feature {feature:?} is bound to {found}, expected {expected}")]
    ForeignDevice {
        feature: String,
        expected: DeviceId,
        found: DeviceId,
    },

    #[error("state created by feature {feature:?} is bound to a different feature")]
    ForeignFeature { feature: String },
}

/// An update function failed for one mapped feature.
#[derive(Debug, Error)]
#[error("update of feature {feature:?} failed: {source}")]
pub struct FeatureUpdateError {
    pub feature: String,
    #[source]
    pub source: BoxError,
}

/// A declared feature has no registry entry, so polling never updates it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("feature {feature:?} is declared but has no mapping")]
pub struct UnmappedFeatureError {
    pub feature: String,
}

/// Per-feature problem recorded during a device poll.
#[derive(Debug, Error)]
pub enum FeatureFault {
    #[error(transparent)]
    Update(#[from] FeatureUpdateError),

    #[error(transparent)]
    Unmapped(#[from] UnmappedFeatureError),
}

impl FeatureFault {
    /// Id of the feature this fault concerns.
    pub fn feature(&self) -> &str {
        match self {
            FeatureFault::Update(e) => &e.feature,
            FeatureFault::Unmapped(e) => &e.feature,
        }
    }
}

/// Failure reported by a device adapter while sampling or writing outputs.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("sampling failed: {0}")]
    Sample(#[source] BoxError),

    #[error("writing outputs failed: {0}")]
    Output(#[source] BoxError),
}

/// Aggregate report of everything that went wrong during one device poll.
#[derive(Debug)]
pub struct DevicePollError {
    pub device: DeviceId,
    pub class: String,
    pub adapter: Vec<AdapterError>,
    pub faults: Vec<FeatureFault>,
}

impl DevicePollError {
    pub(crate) fn new(device: DeviceId, class: &str) -> Self {
        Self {
            device,
            class: class.to_string(),
            adapter: Vec::new(),
            faults: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.adapter.is_empty() && self.faults.is_empty()
    }

    /// `Ok(())` when nothing was recorded.
    pub(crate) fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// Faults recorded for the feature with the given id.
    pub fn faults_for<'a>(&'a self, feature: &'a str) -> impl Iterator<Item = &'a FeatureFault> {
        self.faults.iter().filter(move |f| f.feature() == feature)
    }
}

impl fmt::Display for DevicePollError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} device {}: {} adapter error(s), {} feature fault(s)",
            self.class,
            self.device,
            self.adapter.len(),
            self.faults.len()
        )?;
        for e in &self.adapter {
            write!(f, "; {e}")?;
        }
        for fault in &self.faults {
            write!(f, "; {fault}")?;
        }
        Ok(())
    }
}

impl std::error::Error for DevicePollError {}

/// Discovery failure.
#[derive(Debug, Error)]
pub enum SeekError {
    #[error("device discovery failed: {0}")]
    Discovery(#[source] BoxError),

    #[error("failed to open device {handle}: {source}")]
    Open {
        handle: String,
        #[source]
        source: BoxError,
    },

    #[error("device construction rejected: {0}")]
    Contract(#[from] FeatureContractError),

    #[error("backend unavailable: {0}")]
    Backend(#[source] BoxError),
}

/// A registered device failed while being polled by its seeker.
#[derive(Debug, Error)]
#[error("{source}")]
pub struct SeekDeviceError {
    pub class: String,
    pub device: DeviceId,
    #[source]
    pub source: DevicePollError,
}

/// Aggregate report of one seeker poll.
#[derive(Debug)]
pub struct SeekerPollError {
    pub class: String,
    pub seek: Vec<SeekError>,
    pub devices: Vec<SeekDeviceError>,
}

impl SeekerPollError {
    pub(crate) fn new(class: &str) -> Self {
        Self {
            class: class.to_string(),
            seek: Vec::new(),
            devices: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.seek.is_empty() && self.devices.is_empty()
    }

    pub(crate) fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for SeekerPollError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} seeker: {} seek error(s), {} device error(s)",
            self.class,
            self.seek.len(),
            self.devices.len()
        )?;
        for e in &self.seek {
            write!(f, "; {e}")?;
        }
        for e in &self.devices {
            write!(f, "; {e}")?;
        }
        Ok(())
    }
}

impl std::error::Error for SeekerPollError {}

/// Aggregate report of one [`Manager::poll`](crate::manager::Manager::poll).
#[derive(Debug, Error)]
#[error("{} seeker(s) reported errors", .seekers.len())]
pub struct ManagerPollError {
    pub seekers: Vec<SeekerPollError>,
}

/// Configuration loading/validation failure.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid config for class {class:?}: {source}")]
    Invalid {
        class: String,
        #[source]
        source: ValidationError,
    },
}
