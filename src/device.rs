//! Devices and adapters.
//!
//! A [`DeviceAdapter`] is the platform side of a device: it reports
//! connectivity, samples one raw frame per poll, declares where each feature
//! lives in that frame, and pushes output values back to the hardware.
//!
//! [`InputDevice`] composes an adapter with its class's
//! [`StateStore`](crate::store::StateStore) and a
//! [`MappedFeatureRegistry`](crate::registry::MappedFeatureRegistry). One call
//! to [`InputDevice::poll`] runs, in order:
//!
//! 1. `is_connected()` on the adapter (once);
//! 2. `sample_frame()` when connected, or a neutral `Frame::default()` when not;
//! 3. mapping dispatch against the frame;
//! 4. `apply_outputs()` when connected;
//! 5. edge detection, producing press/release [`InputEvent`]s.
//!
//! A failed sample skips steps 3 and 4 for that poll; states keep their last
//! values. Every failure of the pass is collected into one
//! [`DevicePollError`].
//!
//! [`Device`] is the object-safe view used by seekers and the manager.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::class::{validate_threshold, DeviceClass};
use crate::controller::{StickCalibration, StickState};
use crate::error::{
    AdapterError, DevicePollError, FeatureAccessError, FeatureContractError, FeatureFault,
    UnknownFeatureError, ValidationError,
};
use crate::event::{InputEvent, InputKind};
use crate::feature::Feature;
use crate::metadata::DeviceMeta;
use crate::pressable::Edge;
use crate::registry::MappedFeatureRegistry;
use crate::state::State;
use crate::store::StateStore;

static NEXT_DEVICE_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of one device instance.
///
/// Rediscovering a device after it was unregistered yields a new id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct DeviceId(u64);

impl DeviceId {
    pub fn next() -> Self {
        DeviceId(NEXT_DEVICE_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "dev#{}", self.0)
    }
}

/// Platform sampling capability for one physical device.
pub trait DeviceAdapter: 'static {
    /// Raw per-poll data. `Default` is the neutral frame (nothing pressed,
    /// sticks centered) dispatched while disconnected.
    type Frame: Default + 'static;

    /// Register one entry per feature of the device class.
    fn map_features(&self, registry: &mut MappedFeatureRegistry<Self::Frame>);

    /// Whether the device is still reachable. Called once per poll.
    fn is_connected(&mut self) -> bool;

    /// Sample the current raw frame. Called once per poll while connected.
    fn sample_frame(&mut self) -> Result<Self::Frame, AdapterError>;

    /// Push output values written into `frame` by the update functions.
    fn apply_outputs(&mut self, _frame: &Self::Frame) -> Result<(), AdapterError> {
        Ok(())
    }

    fn name(&self) -> &str;

    fn meta(&self) -> DeviceMeta {
        DeviceMeta::default()
    }
}

/// Object-safe view of a polled device.
pub trait Device {
    fn id(&self) -> DeviceId;
    fn class(&self) -> &Arc<DeviceClass>;
    fn name(&self) -> &str;
    fn meta(&self) -> DeviceMeta;

    /// Connectivity reported by the adapter during the last poll.
    fn is_connected(&self) -> bool;

    /// Read-only view of every feature state.
    fn states(&self) -> &StateStore;

    fn poll(&mut self) -> Result<(), DevicePollError>;

    /// Take the events buffered since the last drain.
    fn drain_events(&mut self) -> Vec<InputEvent>;
}

/// A device of one class driven by adapter `A`.
pub struct InputDevice<A: DeviceAdapter> {
    id: DeviceId,
    class: Arc<DeviceClass>,
    adapter: A,
    registry: MappedFeatureRegistry<A::Frame>,
    store: StateStore,
    press_threshold: f32,
    connected: bool,
    unmapped_reported: bool,
    events: Vec<InputEvent>,
}

impl<A: DeviceAdapter> InputDevice<A> {
    /// Create the device, its states, and the adapter's mapping entries.
    pub fn new(class: Arc<DeviceClass>, adapter: A) -> Result<Self, FeatureContractError> {
        let id = DeviceId::next();
        let store = StateStore::new(&class, id)?;
        let mut registry = MappedFeatureRegistry::new();
        adapter.map_features(&mut registry);

        Ok(Self {
            id,
            press_threshold: class.press_threshold(),
            class,
            adapter,
            registry,
            store,
            connected: true,
            unmapped_reported: false,
            events: Vec::new(),
        })
    }

    pub fn state<S: State>(&self, feature: &Feature<S>) -> Result<&S, UnknownFeatureError> {
        self.store.get(feature)
    }

    /// Mutable access for output and bidirectional features.
    ///
    /// Input features are written by the poll path only and are refused with
    /// [`FeatureAccessError::ReadOnly`].
    pub fn state_mut<S: State>(&mut self, feature: &Feature<S>) -> Result<&mut S, FeatureAccessError> {
        if !feature.flow().is_writable() && self.store.contains(feature.key()) {
            return Err(FeatureAccessError::ReadOnly {
                feature: feature.id().to_string(),
            });
        }
        Ok(self.store.get_mut(feature)?)
    }

    /// Set or clear the calibration of a stick.
    pub fn calibrate_stick(
        &mut self,
        feature: &Feature<StickState>,
        calibration: Option<StickCalibration>,
    ) -> Result<(), FeatureAccessError> {
        if let Some(c) = &calibration {
            c.validate()?;
        }
        self.store.get_mut(feature)?.set_calibration(calibration);
        Ok(())
    }

    /// [`calibrate_stick`](Self::calibrate_stick) addressed by feature id.
    pub fn calibrate_stick_by_id(
        &mut self,
        id: &str,
        calibration: Option<StickCalibration>,
    ) -> Result<(), FeatureAccessError> {
        if let Some(c) = &calibration {
            c.validate()?;
        }
        let class = self.class.id().to_string();
        let state = self.store.get_any_mut(id).ok_or_else(|| UnknownFeatureError {
            class,
            feature: id.to_string(),
        })?;
        let stick = state
            .as_any_mut()
            .downcast_mut::<StickState>()
            .ok_or_else(|| FeatureAccessError::NotAStick {
                feature: id.to_string(),
            })?;
        stick.set_calibration(calibration);
        Ok(())
    }

    pub fn press_threshold(&self) -> f32 {
        self.press_threshold
    }

    /// Override the class press threshold for this device.
    pub fn set_press_threshold(&mut self, threshold: f32) -> Result<(), ValidationError> {
        validate_threshold(threshold)?;
        self.press_threshold = threshold;
        Ok(())
    }

    pub fn adapter(&self) -> &A {
        &self.adapter
    }

    pub fn adapter_mut(&mut self) -> &mut A {
        &mut self.adapter
    }

    pub fn registry(&self) -> &MappedFeatureRegistry<A::Frame> {
        &self.registry
    }

    /// Run one full poll cycle. See the module docs for the order of steps.
    pub fn poll(&mut self) -> Result<(), DevicePollError> {
        let mut report = DevicePollError::new(self.id, self.class.id());

        self.connected = self.adapter.is_connected();
        let frame = if self.connected {
            match self.adapter.sample_frame() {
                Ok(frame) => Some(frame),
                Err(e) => {
                    log::debug!("{} {}: {e}", self.class.id(), self.id);
                    report.adapter.push(e);
                    None
                }
            }
        } else {
            Some(A::Frame::default())
        };

        if !self.unmapped_reported {
            self.unmapped_reported = true;
            for e in self.registry.unmapped(&self.class) {
                log::warn!("{} {}: {e}", self.class.id(), self.id);
                report.faults.push(FeatureFault::Unmapped(e));
            }
        }

        if let Some(mut frame) = frame {
            let failures = self.registry.dispatch(&mut self.store, &mut frame);
            report
                .faults
                .extend(failures.into_iter().map(FeatureFault::Update));

            if self.connected {
                if let Err(e) = self.adapter.apply_outputs(&frame) {
                    report.adapter.push(e);
                }
            }
        }

        for (feature, edge) in self.store.settle(self.press_threshold) {
            let kind = match edge.edge {
                Edge::Pressed => InputKind::Pressed {
                    feature,
                    direction: edge.direction,
                },
                Edge::Released => InputKind::Released {
                    feature,
                    direction: edge.direction,
                },
            };
            self.events
                .push(InputEvent::new(self.class.id(), Some(self.id), kind));
        }

        log::trace!(
            "polled {} {} (connected: {})",
            self.class.id(),
            self.id,
            self.connected
        );
        report.into_result()
    }
}

impl<A: DeviceAdapter> Device for InputDevice<A> {
    fn id(&self) -> DeviceId {
        self.id
    }

    fn class(&self) -> &Arc<DeviceClass> {
        &self.class
    }

    fn name(&self) -> &str {
        self.adapter.name()
    }

    fn meta(&self) -> DeviceMeta {
        self.adapter.meta()
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn states(&self) -> &StateStore {
        &self.store
    }

    fn poll(&mut self) -> Result<(), DevicePollError> {
        InputDevice::poll(self)
    }

    fn drain_events(&mut self) -> Vec<InputEvent> {
        std::mem::take(&mut self.events)
    }
}

impl<A: DeviceAdapter> fmt::Debug for InputDevice<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InputDevice")
            .field("id", &self.id)
            .field("class", &self.class.id())
            .field("name", &self.adapter.name())
            .field("connected", &self.connected)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{button, rumble, stick, ButtonState, RumbleState, StickPos};
    use crate::error::BoxError;
    use crate::pressable::{Direction, Pressable};

    #[derive(Default, Clone)]
    struct Frame {
        a: bool,
        b: bool,
        stick: (f32, f32),
        motor: f32,
    }

    struct Handles {
        class: Arc<DeviceClass>,
        a: Feature<ButtonState>,
        b: Feature<ButtonState>,
        stick: Feature<crate::controller::StickState>,
        motor: Feature<RumbleState>,
    }

    fn handles() -> Handles {
        let mut builder = DeviceClass::builder("test_pad");
        let a = builder.declare(button("a").unwrap());
        let b = builder.declare(button("b").unwrap());
        let stick = builder.declare(stick("stick").unwrap());
        let motor = builder.declare(rumble("motor").unwrap());
        Handles {
            class: builder.build().unwrap(),
            a,
            b,
            stick,
            motor,
        }
    }

    struct ScriptAdapter {
        h: Handles,
        frame: Frame,
        connected: bool,
        fail_sample: bool,
        break_a: bool,
        skip_motor: bool,
        written: Vec<f32>,
        connectivity_queries: usize,
    }

    impl ScriptAdapter {
        fn new(h: Handles) -> Self {
            Self {
                h,
                frame: Frame::default(),
                connected: true,
                fail_sample: false,
                break_a: false,
                skip_motor: false,
                written: Vec::new(),
                connectivity_queries: 0,
            }
        }
    }

    impl DeviceAdapter for ScriptAdapter {
        type Frame = Frame;

        fn map_features(&self, registry: &mut MappedFeatureRegistry<Frame>) {
            let break_a = self.break_a;
            registry.map_feature(&self.h.a, (), move |s: &mut ButtonState, _: &(), f: &mut Frame| {
                if break_a {
                    return Err("a is wired wrong".into());
                }
                s.set_pressed(f.a);
                Ok(())
            });
            registry.map_feature(&self.h.b, (), |s: &mut ButtonState, _: &(), f: &mut Frame| {
                s.set_pressed(f.b);
                Ok(())
            });
            registry.map_feature(&self.h.stick, (), |s: &mut StickState, _: &(), f: &mut Frame| {
                s.set_raw(StickPos::new(f.stick.0, f.stick.1));
                Ok(())
            });
            if !self.skip_motor {
                registry.map_feature(
                    &self.h.motor,
                    (),
                    |s: &mut RumbleState, _: &(), f: &mut Frame| -> Result<(), BoxError> {
                        f.motor = s.force();
                        Ok(())
                    },
                );
            }
        }

        fn is_connected(&mut self) -> bool {
            self.connectivity_queries += 1;
            self.connected
        }

        fn sample_frame(&mut self) -> Result<Frame, AdapterError> {
            if self.fail_sample {
                return Err(AdapterError::Sample("usb stall".into()));
            }
            Ok(self.frame.clone())
        }

        fn apply_outputs(&mut self, frame: &Frame) -> Result<(), AdapterError> {
            self.written.push(frame.motor);
            Ok(())
        }

        fn name(&self) -> &str {
            "script pad"
        }
    }

    fn device(configure: impl FnOnce(&mut ScriptAdapter)) -> (InputDevice<ScriptAdapter>, Handles) {
        let h = handles();
        let mut adapter = ScriptAdapter::new(handles_clone(&h));
        configure(&mut adapter);
        (InputDevice::new(Arc::clone(&h.class), adapter).unwrap(), h)
    }

    fn handles_clone(h: &Handles) -> Handles {
        Handles {
            class: Arc::clone(&h.class),
            a: h.a.clone(),
            b: h.b.clone(),
            stick: h.stick.clone(),
            motor: h.motor.clone(),
        }
    }

    #[test]
    fn test_poll_is_idempotent() {
        let (mut dev, h) = device(|a| a.frame.stick = (0.3, -0.6));
        dev.poll().unwrap();
        let first: Vec<_> = dev.states().values().map(|(id, v)| (id.to_string(), v)).collect();
        dev.poll().unwrap();
        let second: Vec<_> = dev.states().values().map(|(id, v)| (id.to_string(), v)).collect();
        assert_eq!(first, second);
        assert!(dev.state(&h.stick).unwrap().is_pressed(Direction::Down));
    }

    #[test]
    fn test_press_then_release_events() {
        let (mut dev, h) = device(|_| {});
        let mut frames = Vec::new();
        for pressed in [false, true, true, false] {
            dev.adapter_mut().frame.a = pressed;
            dev.poll().unwrap();
            frames.push(dev.drain_events());
        }
        assert!(frames[0].is_empty());
        assert_eq!(
            frames[1].iter().map(|e| e.kind.clone()).collect::<Vec<_>>(),
            vec![InputKind::Pressed {
                feature: "a".into(),
                direction: None
            }]
        );
        assert!(frames[2].is_empty());
        assert_eq!(
            frames[3][0].kind,
            InputKind::Released {
                feature: "a".into(),
                direction: None
            }
        );
        assert!(!dev.state(&h.a).unwrap().is_pressed());
    }

    #[test]
    fn test_failing_feature_is_isolated() {
        let (mut dev, h) = device(|a| {
            a.break_a = true;
            a.frame.a = true;
            a.frame.b = true;
        });
        let report = dev.poll().unwrap_err();
        assert_eq!(report.faults.len(), 1);
        assert_eq!(report.faults_for("a").count(), 1);
        assert!(dev.state(&h.b).unwrap().is_pressed());
        assert!(!dev.state(&h.a).unwrap().is_pressed());
    }

    #[test]
    fn test_unmapped_feature_reported_once() {
        let (mut dev, _h) = device(|a| a.skip_motor = true);
        let report = dev.poll().unwrap_err();
        assert_eq!(report.faults.len(), 1);
        assert!(matches!(&report.faults[0], FeatureFault::Unmapped(e) if e.feature == "motor"));
        assert!(dev.poll().is_ok());
    }

    #[test]
    fn test_output_written_by_application_reaches_adapter() {
        let (mut dev, h) = device(|_| {});
        dev.state_mut(&h.motor).unwrap().set_force(0.75);
        dev.poll().unwrap();
        assert_eq!(dev.adapter().written, vec![0.75]);
    }

    #[test]
    fn test_input_state_is_read_only() {
        let (mut dev, h) = device(|_| {});
        assert_eq!(
            dev.state_mut(&h.a).unwrap_err(),
            FeatureAccessError::ReadOnly {
                feature: "a".into()
            }
        );
        let foreign = rumble("motor").unwrap();
        assert!(matches!(
            dev.state_mut(&foreign),
            Err(FeatureAccessError::Unknown(_))
        ));
    }

    #[test]
    fn test_sample_failure_keeps_last_values() {
        let (mut dev, h) = device(|a| a.frame.a = true);
        dev.poll().unwrap();
        dev.adapter_mut().fail_sample = true;
        dev.adapter_mut().frame.a = false;
        let report = dev.poll().unwrap_err();
        assert_eq!(report.adapter.len(), 1);
        assert!(dev.state(&h.a).unwrap().is_pressed());
        assert!(dev.adapter().written.len() == 1);
    }

    #[test]
    fn test_disconnect_dispatches_neutral_frame() {
        let (mut dev, h) = device(|a| a.frame.a = true);
        dev.poll().unwrap();
        dev.drain_events();
        dev.adapter_mut().connected = false;
        dev.poll().unwrap();
        assert!(!dev.is_connected());
        assert!(!dev.state(&h.a).unwrap().is_pressed());
        assert_eq!(dev.drain_events().len(), 1);
        assert_eq!(dev.adapter().written.len(), 1);
        assert_eq!(dev.adapter().connectivity_queries, 2);
    }

    #[test]
    fn test_calibration_by_id() {
        let (mut dev, h) = device(|a| a.frame.stick = (0.05, 0.0));
        dev.calibrate_stick_by_id("stick", Some(StickCalibration::with_deadzone(0.1)))
            .unwrap();
        dev.poll().unwrap();
        assert_eq!(dev.state(&h.stick).unwrap().x(), 0.0);
        assert_eq!(dev.state(&h.stick).unwrap().raw().x, 0.05);

        assert!(matches!(
            dev.calibrate_stick_by_id("a", None),
            Err(FeatureAccessError::NotAStick { .. })
        ));
        assert!(matches!(
            dev.calibrate_stick_by_id("nope", None),
            Err(FeatureAccessError::Unknown(_))
        ));
        assert!(matches!(
            dev.calibrate_stick(&h.stick, Some(StickCalibration::with_deadzone(2.0))),
            Err(FeatureAccessError::Invalid(_))
        ));
    }

    #[test]
    fn test_press_threshold_override() {
        let (mut dev, h) = device(|a| a.frame.stick = (-0.3, 0.0));
        dev.poll().unwrap();
        assert!(!dev.state(&h.stick).unwrap().is_pressed(Direction::Left));
        dev.set_press_threshold(0.25).unwrap();
        dev.poll().unwrap();
        assert!(dev.state(&h.stick).unwrap().is_pressed(Direction::Left));
        assert!(dev.set_press_threshold(0.0).is_err());
    }
}
