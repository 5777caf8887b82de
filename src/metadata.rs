//! Device metadata.
//!
//! [`DeviceMeta`] is what an adapter knows about the hardware behind it.
//! Every field is optional; backends fill what their platform reports.
//! [`DeviceInfo`] pairs that with the runtime identity of a registered
//! device and is what [`Manager::devices`](crate::manager::Manager::devices)
//! lists.
//!
//! `vid`/`pid` and `serial_number` are usually stable across reconnects.
//! `path` is platform-specific and may change between ports; treat it as a
//! diagnostic.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::device::DeviceId;

/// Hardware description supplied by an adapter.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceMeta {
    /// Short bus hint: `"usb"`, `"bluetooth"`, `"xinput"`, `"virtual"`.
    pub bus: Option<String>,
    pub vid: Option<u16>,
    pub pid: Option<u16>,
    /// Product name reported by the driver or firmware.
    pub product_string: Option<String>,
    pub serial_number: Option<String>,
    /// HID interface index; some stacks report `-1` for "not applicable".
    pub interface_number: Option<i32>,
    pub usage_page: Option<u16>,
    pub usage: Option<u16>,
    /// Opaque OS path.
    pub path: Option<String>,
}

/// Registered device, as listed by the manager.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct DeviceInfo {
    pub id: DeviceId,
    pub class: String,
    pub name: String,
    pub connected: bool,
    pub meta: DeviceMeta,
}

impl fmt::Display for DeviceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {:?}", self.class, self.id, self.name)?;
        if let (Some(vid), Some(pid)) = (self.meta.vid, self.meta.pid) {
            write!(f, " [{vid:04x}:{pid:04x}]")?;
        }
        if !self.connected {
            write!(f, " (disconnected)")?;
        }
        Ok(())
    }
}
