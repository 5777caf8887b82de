//! Events.
//!
//! Devices and seekers describe what happened during a poll as [`InputEvent`]s:
//! press/release edges of buttons, triggers and stick directions, device
//! registration changes, and dual-report ambiguity notifications.
//!
//! Events are buffered by their producer and drained by the caller (usually
//! [`Manager::poll`](crate::manager::Manager::poll), which forwards them to the
//! [`InputEventBus`](crate::eventbus::InputEventBus)).
//!
//! ## Ordering
//! Within one poll, events appear in production order: registrations first,
//! then per-device edges in registration order, then unregistrations, then
//! ambiguity changes.

use std::fmt;
use std::time::Instant;

use crate::device::DeviceId;
use crate::pressable::Direction;

/// What happened.
#[derive(Clone, Debug, PartialEq)]
pub enum InputKind {
    /// A button, trigger, or stick direction went down this poll.
    ///
    /// `direction` is set for stick directions.
    Pressed {
        feature: String,
        direction: Option<Direction>,
    },

    /// A button, trigger, or stick direction went up this poll.
    Released {
        feature: String,
        direction: Option<Direction>,
    },

    /// A seeker discovered and registered a device.
    DeviceRegistered { name: String },

    /// A seeker dropped a device after its final poll.
    DeviceUnregistered { name: String },

    /// More than one device of a dual-reporting class is registered.
    Ambiguous { count: usize },

    /// The count of a dual-reporting class dropped back to one or zero.
    AmbiguityResolved { count: usize },
}

/// Timestamped event.
#[derive(Clone, Debug)]
pub struct InputEvent {
    /// Capture time (monotonic).
    pub at: Instant,
    /// Device class id of the producer.
    pub class: String,
    /// Device concerned; `None` for class-wide notifications.
    pub device: Option<DeviceId>,
    pub kind: InputKind,
}

impl InputEvent {
    pub fn new(class: impl Into<String>, device: Option<DeviceId>, kind: InputKind) -> Self {
        Self {
            at: Instant::now(),
            class: class.into(),
            device,
            kind,
        }
    }

    /// Press or release edge.
    pub fn is_press(&self) -> bool {
        matches!(
            self.kind,
            InputKind::Pressed { .. } | InputKind::Released { .. }
        )
    }

    /// Registration or ambiguity change.
    pub fn is_lifecycle(&self) -> bool {
        !self.is_press()
    }

    /// Feature id for press/release events.
    pub fn feature(&self) -> Option<&str> {
        match &self.kind {
            InputKind::Pressed { feature, .. } | InputKind::Released { feature, .. } => {
                Some(feature)
            }
            _ => None,
        }
    }
}

impl fmt::Display for InputEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}", self.class)?;
        if let Some(device) = self.device {
            write!(f, " {device}")?;
        }
        write!(f, "] ")?;
        match &self.kind {
            InputKind::Pressed { feature, direction } => {
                write!(f, "pressed {feature}")?;
                if let Some(d) = direction {
                    write!(f, ".{}", d.as_str())?;
                }
                Ok(())
            }
            InputKind::Released { feature, direction } => {
                write!(f, "released {feature}")?;
                if let Some(d) = direction {
                    write!(f, ".{}", d.as_str())?;
                }
                Ok(())
            }
            InputKind::DeviceRegistered { name } => write!(f, "registered {name:?}"),
            InputKind::DeviceUnregistered { name } => write!(f, "unregistered {name:?}"),
            InputKind::Ambiguous { count } => write!(f, "ambiguous: {count} devices registered"),
            InputKind::AmbiguityResolved { count } => {
                write!(f, "ambiguity resolved: {count} device(s) registered")
            }
        }
    }
}
