//! `hidapi` devices and discovery.

use std::ffi::CString;
use std::sync::Arc;

use hidapi::{BusType, DeviceInfo, HidApi, HidDevice};

use super::adapter::{HidAdapter, ReportSource};
use super::report::{HidReportLayout, DS4_PIDS, SONY_VID};
use crate::class::DeviceClass;
use crate::error::{BoxError, SeekError};
use crate::metadata::DeviceMeta;
use crate::seeker::Discover;

impl ReportSource for HidDevice {
    fn read_report(&mut self, buf: &mut [u8]) -> Result<usize, BoxError> {
        Ok(self.read(buf)?)
    }

    fn write_report(&mut self, report: &[u8]) -> Result<(), BoxError> {
        self.write(report)?;
        Ok(())
    }
}

/// Discovery of the HID devices matching a vendor id and a set of product
/// ids. Handles are OS device paths.
///
/// A controller plugged in over USB while paired over Bluetooth shows up
/// twice, so this backend reports its class as dual-reporting.
pub struct HidDiscovery {
    api: HidApi,
    layout: Arc<HidReportLayout>,
    vid: u16,
    pids: Vec<u16>,
}

impl HidDiscovery {
    pub fn new(layout: Arc<HidReportLayout>, vid: u16, pids: &[u16]) -> Result<Self, SeekError> {
        let api = HidApi::new().map_err(|e| SeekError::Backend(Box::new(e)))?;
        Ok(Self {
            api,
            layout,
            vid,
            pids: pids.to_vec(),
        })
    }

    /// DualShock 4 controllers.
    pub fn ds4() -> Result<Self, SeekError> {
        Self::new(HidReportLayout::ds4_usb(), SONY_VID, &DS4_PIDS)
    }

    fn matches(&self, info: &DeviceInfo) -> bool {
        info.vendor_id() == self.vid && self.pids.contains(&info.product_id())
    }

    fn info(&self, path: &CString) -> Option<&DeviceInfo> {
        self.api
            .device_list()
            .find(|info| info.path() == path.as_c_str())
    }
}

fn meta(info: &DeviceInfo) -> DeviceMeta {
    let bus = match info.bus_type() {
        BusType::Usb => "usb",
        BusType::Bluetooth => "bluetooth",
        _ => "hid",
    };
    let interface_number = info.interface_number();
    DeviceMeta {
        bus: Some(bus.into()),
        vid: Some(info.vendor_id()),
        pid: Some(info.product_id()),
        product_string: info.product_string().map(str::to_string),
        serial_number: info.serial_number().map(str::to_string),
        interface_number: (interface_number >= 0).then_some(interface_number),
        usage_page: Some(info.usage_page()),
        usage: Some(info.usage()),
        path: Some(info.path().to_string_lossy().into_owned()),
    }
}

impl Discover for HidDiscovery {
    type Adapter = HidAdapter<HidDevice>;
    type Handle = CString;

    fn class(&self) -> &Arc<DeviceClass> {
        self.layout.class()
    }

    fn seek(&mut self) -> Result<Vec<CString>, SeekError> {
        self.api
            .refresh_devices()
            .map_err(|e| SeekError::Discovery(Box::new(e)))?;
        let mut paths: Vec<CString> = Vec::new();
        for info in self.api.device_list().filter(|info| self.matches(info)) {
            let path = info.path().to_owned();
            if !paths.contains(&path) {
                paths.push(path);
            }
        }
        Ok(paths)
    }

    fn open(&mut self, handle: &CString) -> Result<Self::Adapter, SeekError> {
        let open_err = |source: BoxError| SeekError::Open {
            handle: handle.to_string_lossy().into_owned(),
            source,
        };
        let (name, meta) = match self.info(handle) {
            Some(info) => (
                info.product_string().unwrap_or("HID controller").to_string(),
                meta(info),
            ),
            None => return Err(open_err("device left the enumeration".into())),
        };
        let device = self
            .api
            .open_path(handle.as_c_str())
            .map_err(|e| open_err(Box::new(e)))?;
        if let Err(e) = device.set_blocking_mode(false) {
            log::warn!("{name}: could not switch to non-blocking reads: {e}");
        }
        log::debug!(
            "opened {name} [{:04x}:{:04x}] on {}",
            meta.vid.unwrap_or_default(),
            meta.pid.unwrap_or_default(),
            handle.to_string_lossy()
        );
        Ok(HidAdapter::new(device, Arc::clone(&self.layout), name, meta))
    }

    fn dual_reports(&self) -> bool {
        true
    }
}
