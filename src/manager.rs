//! Top-level polling.
//!
//! A [`Manager`] owns one seeker per device class and the event bus. Each
//! [`poll`](Manager::poll) runs every seeker in the order they were added,
//! forwards the events they produced to the bus, and folds their error
//! reports into one [`ManagerPollError`]. A failing seeker never stops the
//! others.

use crate::config::InputConfig;
use crate::device::Device;
use crate::error::ManagerPollError;
use crate::eventbus::InputEventBus;
use crate::metadata::DeviceInfo;
use crate::seeker::{DeviceSeeker, Discover, Seek};
use crate::snapshot::{DeviceSnapshot, Snapshot};

#[derive(Default)]
pub struct Manager {
    seekers: Vec<Box<dyn Seek>>,
    bus: InputEventBus,
}

impl Manager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Manager with the seekers of every backend compiled in: XInput on
    /// Windows and DualShock 4 over HID with the `hid` feature.
    pub fn discover() -> Self {
        Self::discover_with(&InputConfig::default())
    }

    /// Like [`discover`](Self::discover), applying the matching class
    /// section of `config` to every device the seekers register.
    #[cfg_attr(not(any(windows, feature = "hid")), allow(unused_variables, unused_mut))]
    pub fn discover_with(config: &InputConfig) -> Self {
        let mut manager = Self::new();

        #[cfg(windows)]
        {
            use crate::backends::xinput::XInputDiscovery;
            manager.add_seeker(configured(XInputDiscovery::new(), config));
        }

        #[cfg(feature = "hid")]
        {
            use crate::backends::hid::HidDiscovery;
            match HidDiscovery::ds4() {
                Ok(discovery) => manager.add_seeker(configured(discovery, config)),
                Err(e) => log::error!("HID backend disabled: {e}"),
            }
        }

        log::info!("{} seeker(s) enabled", manager.seekers.len());
        manager
    }

    pub fn add_seeker<S: Seek + 'static>(&mut self, seeker: S) {
        log::debug!("added {} seeker", seeker.class().id());
        self.seekers.push(Box::new(seeker));
    }

    pub fn seekers(&self) -> &[Box<dyn Seek>] {
        &self.seekers
    }

    pub fn bus(&self) -> &InputEventBus {
        &self.bus
    }

    pub fn bus_mut(&mut self) -> &mut InputEventBus {
        &mut self.bus
    }

    /// Poll every seeker once.
    pub fn poll(&mut self) -> Result<(), ManagerPollError> {
        let mut failed = Vec::new();
        for seeker in &mut self.seekers {
            if let Err(e) = seeker.poll() {
                log::debug!("{e}");
                failed.push(e);
            }
            let events = seeker.drain_events();
            self.bus.emit_all(&events);
        }
        if failed.is_empty() {
            Ok(())
        } else {
            Err(ManagerPollError { seekers: failed })
        }
    }

    /// Every registered device, seeker by seeker.
    pub fn devices(&self) -> Vec<DeviceInfo> {
        self.iter_devices()
            .map(|d| DeviceInfo {
                id: d.id(),
                class: d.class().id().to_string(),
                name: d.name().to_string(),
                connected: d.is_connected(),
                meta: d.meta(),
            })
            .collect()
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot(
            self.iter_devices()
                .map(|d| (d.id(), DeviceSnapshot::capture(d)))
                .collect(),
        )
    }

    fn iter_devices(&self) -> impl Iterator<Item = &dyn Device> {
        self.seekers.iter().flat_map(|s| s.devices())
    }
}

#[cfg_attr(not(any(windows, feature = "hid")), allow(dead_code))]
fn configured<D: Discover>(discovery: D, config: &InputConfig) -> DeviceSeeker<D> {
    let class = config.class(discovery.class().id()).cloned();
    let seeker = DeviceSeeker::new(discovery);
    match class {
        Some(c) => seeker.with_config(c),
        None => seeker,
    }
}

impl std::fmt::Debug for Manager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let classes: Vec<&str> = self.seekers.iter().map(|s| s.class().id()).collect();
        f.debug_struct("Manager")
            .field("seekers", &classes)
            .field("bus", &self.bus)
            .finish()
    }
}
