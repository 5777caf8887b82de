//! Device discovery and lifecycle.
//!
//! A [`DeviceSeeker`] tracks every device of one class. Each
//! [`poll`](DeviceSeeker::poll) runs four phases:
//!
//! 1. **Discovery**: [`Discover::seek`] lists the handles currently present;
//!    every handle not yet registered is opened and registered.
//! 2. **Poll**: every registered device is polled in registration order.
//!    A failing device is recorded and the pass moves on.
//! 3. **Liveness**: devices whose adapter reported disconnection during
//!    phase 2 are unregistered. That poll was their final one. Removal only
//!    happens after a successful discovery, so a failed `seek()` leaves the
//!    registration set untouched.
//! 4. **Ambiguity**: for classes that dual-report (one controller visible
//!    through two transports), an [`InputKind::Ambiguous`] event fires when
//!    the registered count goes from at most one to more than one, and
//!    [`InputKind::AmbiguityResolved`] when it drops back. Nothing is merged;
//!    the application decides which device to use.
//!
//! Registration is terminal per instance: a device found again after being
//! unregistered gets a new [`DeviceId`].

use std::fmt::Debug;
use std::sync::Arc;

use crate::class::DeviceClass;
use crate::config::ClassConfig;
use crate::device::{Device, DeviceAdapter, DeviceId, InputDevice};
use crate::error::{SeekDeviceError, SeekError, SeekerPollError};
use crate::event::{InputEvent, InputKind};

/// Platform discovery capability for one device class.
pub trait Discover: 'static {
    type Adapter: DeviceAdapter;
    /// Identifies one physical device across `seek()` calls.
    type Handle: Clone + PartialEq + Debug + 'static;

    fn class(&self) -> &Arc<DeviceClass>;

    /// Handles of every device currently present.
    fn seek(&mut self) -> Result<Vec<Self::Handle>, SeekError>;

    fn open(&mut self, handle: &Self::Handle) -> Result<Self::Adapter, SeekError>;

    /// Whether one physical device may show up under two handles.
    fn dual_reports(&self) -> bool {
        false
    }
}

/// Object-safe view of a seeker, used by the [`Manager`](crate::manager::Manager).
pub trait Seek {
    fn class(&self) -> &Arc<DeviceClass>;
    fn poll(&mut self) -> Result<(), SeekerPollError>;
    /// Registered devices in registration order.
    fn devices(&self) -> Vec<&dyn Device>;
    fn drain_events(&mut self) -> Vec<InputEvent>;
}

struct Registered<D: Discover> {
    handle: D::Handle,
    device: InputDevice<D::Adapter>,
}

/// Registration set and lifecycle for the devices found by `D`.
pub struct DeviceSeeker<D: Discover> {
    discovery: D,
    config: Option<ClassConfig>,
    registered: Vec<Registered<D>>,
    ambiguous: bool,
    events: Vec<InputEvent>,
}

impl<D: Discover> DeviceSeeker<D> {
    pub fn new(discovery: D) -> Self {
        Self {
            discovery,
            config: None,
            registered: Vec::new(),
            ambiguous: false,
            events: Vec::new(),
        }
    }

    /// Apply `config` to every device registered from now on.
    pub fn with_config(mut self, config: ClassConfig) -> Self {
        self.config = Some(config);
        self
    }

    pub fn discovery(&self) -> &D {
        &self.discovery
    }

    pub fn discovery_mut(&mut self) -> &mut D {
        &mut self.discovery
    }

    pub fn len(&self) -> usize {
        self.registered.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }

    /// Whether an ambiguity notification is outstanding.
    pub fn is_ambiguous(&self) -> bool {
        self.ambiguous
    }

    pub fn iter(&self) -> impl Iterator<Item = &InputDevice<D::Adapter>> {
        self.registered.iter().map(|r| &r.device)
    }

    pub fn get(&self, id: DeviceId) -> Option<&InputDevice<D::Adapter>> {
        self.iter().find(|d| d.id() == id)
    }

    pub fn get_mut(&mut self, id: DeviceId) -> Option<&mut InputDevice<D::Adapter>> {
        self.registered
            .iter_mut()
            .map(|r| &mut r.device)
            .find(|d| d.id() == id)
    }

    /// Handle the device was registered under.
    pub fn handle(&self, id: DeviceId) -> Option<&D::Handle> {
        self.registered
            .iter()
            .find(|r| r.device.id() == id)
            .map(|r| &r.handle)
    }

    fn class_id(&self) -> &str {
        self.discovery.class().id()
    }

    fn register(&mut self, handle: D::Handle) -> Result<(), SeekError> {
        let adapter = self.discovery.open(&handle)?;
        let mut device = InputDevice::new(Arc::clone(self.discovery.class()), adapter)?;
        if let Some(config) = &self.config {
            config.apply(&mut device);
        }

        log::debug!(
            "registered {} {} {:?} as {:?}",
            self.class_id(),
            device.id(),
            device.name(),
            handle
        );
        self.events.push(InputEvent::new(
            self.class_id(),
            Some(device.id()),
            InputKind::DeviceRegistered {
                name: device.name().to_string(),
            },
        ));
        self.registered.push(Registered { handle, device });
        Ok(())
    }

    fn discover(&mut self, report: &mut SeekerPollError) -> bool {
        let handles = match self.discovery.seek() {
            Ok(handles) => handles,
            Err(e) => {
                log::error!("{} discovery failed: {e}", self.class_id());
                report.seek.push(e);
                return false;
            }
        };

        for handle in handles {
            if self.registered.iter().any(|r| r.handle == handle) {
                continue;
            }
            if let Err(e) = self.register(handle) {
                log::error!("{} registration failed: {e}", self.class_id());
                report.seek.push(e);
            }
        }
        true
    }

    fn poll_devices(&mut self, report: &mut SeekerPollError) {
        let class = self.discovery.class().id();
        for r in &mut self.registered {
            if let Err(source) = r.device.poll() {
                report.devices.push(SeekDeviceError {
                    class: class.to_string(),
                    device: r.device.id(),
                    source,
                });
            }
            self.events.extend(r.device.drain_events());
        }
    }

    fn drop_disconnected(&mut self) {
        let (gone, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.registered)
            .into_iter()
            .partition(|r| !r.device.is_connected());
        self.registered = kept;

        for r in gone {
            log::debug!(
                "unregistered {} {} {:?}",
                self.class_id(),
                r.device.id(),
                r.device.name()
            );
            self.events.push(InputEvent::new(
                self.class_id(),
                Some(r.device.id()),
                InputKind::DeviceUnregistered {
                    name: r.device.name().to_string(),
                },
            ));
        }
    }

    fn check_ambiguity(&mut self) {
        if !self.discovery.dual_reports() {
            return;
        }
        let count = self.registered.len();
        if count > 1 && !self.ambiguous {
            self.ambiguous = true;
            log::warn!(
                "{} devices of class {} registered; one controller may be reporting twice",
                count,
                self.class_id()
            );
            self.events.push(InputEvent::new(
                self.class_id(),
                None,
                InputKind::Ambiguous { count },
            ));
        } else if count <= 1 && self.ambiguous {
            self.ambiguous = false;
            log::info!("{} ambiguity resolved ({} registered)", self.class_id(), count);
            self.events.push(InputEvent::new(
                self.class_id(),
                None,
                InputKind::AmbiguityResolved { count },
            ));
        }
    }

    /// Run one discovery/poll/liveness/ambiguity pass.
    ///
    /// Seek and device failures are collected; every registered device is
    /// polled regardless.
    pub fn poll(&mut self) -> Result<(), SeekerPollError> {
        let mut report = SeekerPollError::new(self.class_id());
        let discovered = self.discover(&mut report);
        self.poll_devices(&mut report);
        if discovered {
            self.drop_disconnected();
        }
        self.check_ambiguity();
        log::trace!("{} seeker: {} registered", self.class_id(), self.len());
        report.into_result()
    }
}

impl<D: Discover> Seek for DeviceSeeker<D> {
    fn class(&self) -> &Arc<DeviceClass> {
        self.discovery.class()
    }

    fn poll(&mut self) -> Result<(), SeekerPollError> {
        DeviceSeeker::poll(self)
    }

    fn devices(&self) -> Vec<&dyn Device> {
        self.registered
            .iter()
            .map(|r| &r.device as &dyn Device)
            .collect()
    }

    fn drain_events(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::virtual_input::{VirtualHub, VirtualPad};
    use crate::controller::xbox;
    use crate::pressable::Pressable;

    fn kinds(events: &[InputEvent]) -> Vec<&InputKind> {
        events.iter().map(|e| &e.kind).collect()
    }

    #[test]
    fn test_register_and_unregister() {
        let hub = VirtualHub::xbox();
        let mut seeker = DeviceSeeker::new(hub.clone());

        seeker.poll().unwrap();
        assert!(seeker.is_empty());

        let pad = VirtualPad::new("pad 0");
        hub.attach(pad.clone());
        seeker.poll().unwrap();
        assert_eq!(seeker.len(), 1);
        let first_id = seeker.iter().next().unwrap().id();
        assert!(matches!(
            kinds(&seeker.drain_events())[..],
            [InputKind::DeviceRegistered { .. }]
        ));

        seeker.poll().unwrap();
        assert_eq!(seeker.len(), 1);

        hub.detach(&pad);
        seeker.poll().unwrap();
        assert!(seeker.is_empty());
        assert!(matches!(
            kinds(&seeker.drain_events())[..],
            [InputKind::DeviceUnregistered { .. }]
        ));

        hub.attach(pad);
        seeker.poll().unwrap();
        assert_ne!(seeker.iter().next().unwrap().id(), first_id);
    }

    #[test]
    fn test_final_poll_releases_held_button() {
        let hub = VirtualHub::xbox();
        let pad = VirtualPad::new("pad");
        hub.attach(pad.clone());
        let mut seeker = DeviceSeeker::new(hub.clone());
        seeker.poll().unwrap();

        pad.press(0);
        seeker.poll().unwrap();
        seeker.drain_events();

        hub.detach(&pad);
        seeker.poll().unwrap();
        let events = seeker.drain_events();
        assert_eq!(
            kinds(&events),
            vec![
                &InputKind::Released {
                    feature: "a".into(),
                    direction: None
                },
                &InputKind::DeviceUnregistered {
                    name: "pad".into()
                },
            ]
        );
    }

    #[test]
    fn test_seek_failure_keeps_set_and_polls() {
        let hub = VirtualHub::xbox();
        let pad = VirtualPad::new("pad");
        hub.attach(pad.clone());
        let mut seeker = DeviceSeeker::new(hub.clone());
        seeker.poll().unwrap();
        let id = seeker.iter().next().unwrap().id();

        hub.fail_next_seek("bus reset");
        pad.press(1);
        let report = seeker.poll().unwrap_err();
        assert_eq!(report.seek.len(), 1);
        assert!(report.devices.is_empty());
        assert_eq!(seeker.len(), 1);
        let dev = seeker.get(id).unwrap();
        assert!(dev.state(&xbox().b).unwrap().is_pressed());
    }

    #[test]
    fn test_ambiguity_is_edge_triggered() {
        let hub = VirtualHub::xbox().dual_report(true);
        let mut seeker = DeviceSeeker::new(hub.clone());
        let pads: Vec<_> = (0..2).map(|i| VirtualPad::new(&format!("pad {i}"))).collect();

        let mut ambiguous = 0;
        let mut resolved = 0;
        for count in [1, 1, 2, 2, 2, 1] {
            while hub.len() < count {
                hub.attach(pads[hub.len()].clone());
            }
            while hub.len() > count {
                hub.detach(&pads[hub.len() - 1]);
            }
            seeker.poll().unwrap();
            assert_eq!(seeker.len(), count);
            for e in seeker.drain_events() {
                match e.kind {
                    InputKind::Ambiguous { count } => {
                        assert_eq!(count, 2);
                        ambiguous += 1;
                    }
                    InputKind::AmbiguityResolved { count } => {
                        assert_eq!(count, 1);
                        resolved += 1;
                    }
                    _ => {}
                }
            }
        }
        assert_eq!((ambiguous, resolved), (1, 1));
        assert!(!seeker.is_ambiguous());
    }

    #[test]
    fn test_no_ambiguity_for_single_report_class() {
        let hub = VirtualHub::xbox();
        hub.attach(VirtualPad::new("a"));
        hub.attach(VirtualPad::new("b"));
        let mut seeker = DeviceSeeker::new(hub);
        seeker.poll().unwrap();
        assert_eq!(seeker.len(), 2);
        assert!(!seeker
            .drain_events()
            .iter()
            .any(|e| matches!(e.kind, InputKind::Ambiguous { .. })));
    }

    #[test]
    fn test_failing_device_does_not_block_others() {
        let hub = VirtualHub::xbox();
        let broken = VirtualPad::new("broken");
        let fine = VirtualPad::new("fine");
        hub.attach(broken.clone());
        hub.attach(fine.clone());
        let mut seeker = DeviceSeeker::new(hub);
        seeker.poll().unwrap();

        broken.fail_reads(true);
        fine.press(0);
        let report = seeker.poll().unwrap_err();
        assert_eq!(report.devices.len(), 1);
        assert!(report.seek.is_empty());

        let fine_dev = seeker.iter().find(|d| d.name() == "fine").unwrap();
        assert!(fine_dev.state(&xbox().a).unwrap().is_pressed());
    }

    #[test]
    fn test_config_applied_on_registration() {
        let hub = VirtualHub::xbox();
        hub.attach(VirtualPad::new("pad"));
        let config = ClassConfig {
            press_threshold: Some(0.8),
            calibration: [(
                "ls".to_string(),
                crate::controller::StickCalibration::with_deadzone(0.2),
            )]
            .into_iter()
            .collect(),
        };
        let mut seeker = DeviceSeeker::new(hub).with_config(config);
        seeker.poll().unwrap();
        let dev = seeker.iter().next().unwrap();
        assert_eq!(dev.press_threshold(), 0.8);
        assert_eq!(
            dev.state(&xbox().ls).unwrap().calibration().map(|c| c.deadzone),
            Some(0.2)
        );
    }
}
