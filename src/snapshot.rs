//! Per-frame snapshot of device states.
//!
//! [`Snapshot`] is an owned, read-only copy of every registered device's
//! feature values at one point in time, usually right after
//! [`Manager::poll`](crate::manager::Manager::poll). It does not poll and is
//! cheap to clone for fan-out (recorders, debug overlays, network sync).
//!
//! Devices appear in seeker order, then registration order. Feature values
//! appear in class declaration order.
//!
//! ```
//! use stickhal::backends::virtual_input::{VirtualHub, VirtualPad};
//! use stickhal::manager::Manager;
//! use stickhal::seeker::DeviceSeeker;
//! use stickhal::state::StateValue;
//!
//! let hub = VirtualHub::xbox();
//! let pad = VirtualPad::new("pad");
//! hub.attach(pad.clone());
//!
//! let mut manager = Manager::new();
//! manager.add_seeker(DeviceSeeker::new(hub));
//! pad.press(0);
//! manager.poll().unwrap();
//!
//! let snap = manager.snapshot();
//! let (_, dev) = snap.iter().next().unwrap();
//! assert_eq!(dev.get("a"), Some(&StateValue::Button { pressed: true }));
//! println!("{}", snap.to_json().unwrap());
//! ```

use serde::Serialize;

use crate::device::{Device, DeviceId};
use crate::state::StateValue;

/// Feature values of one device.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DeviceSnapshot {
    pub class: String,
    pub name: String,
    pub connected: bool,
    pub values: Vec<(String, StateValue)>,
}

impl DeviceSnapshot {
    pub fn capture(device: &dyn Device) -> Self {
        Self {
            class: device.class().id().to_string(),
            name: device.name().to_string(),
            connected: device.is_connected(),
            values: device
                .states()
                .values()
                .map(|(id, v)| (id.to_string(), v))
                .collect(),
        }
    }

    /// Value of the feature with the given id.
    pub fn get(&self, feature: &str) -> Option<&StateValue> {
        self.values
            .iter()
            .find(|(id, _)| id == feature)
            .map(|(_, v)| v)
    }
}

/// Owned snapshot of all registered devices.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Snapshot(pub Vec<(DeviceId, DeviceSnapshot)>);

impl Snapshot {
    #[inline]
    pub fn get(&self, device: DeviceId) -> Option<&DeviceSnapshot> {
        self.0.iter().find(|(id, _)| *id == device).map(|(_, d)| d)
    }

    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = &(DeviceId, DeviceSnapshot)> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    #[inline]
    pub fn into_inner(self) -> Vec<(DeviceId, DeviceSnapshot)> {
        self.0
    }

    /// Pretty-printed JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
