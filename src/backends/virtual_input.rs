//! Virtual devices.
//!
//! [`VirtualPad`] is a scriptable joystick source and [`VirtualHub`] a
//! discovery backend handing pads out to a
//! [`DeviceSeeker`](crate::seeker::DeviceSeeker). Both are cheap handles to
//! shared state, so a test (or a demo, or an input recorder) keeps a clone and
//! drives the pad while the seeker polls it.
//!
//! ```
//! use stickhal::backends::virtual_input::{VirtualHub, VirtualPad};
//! use stickhal::controller::xbox;
//! use stickhal::seeker::DeviceSeeker;
//! use stickhal::Pressable;
//!
//! let hub = VirtualHub::xbox();
//! let pad = VirtualPad::new("Virtual Pad 0");
//! hub.attach(pad.clone());
//!
//! let mut seeker = DeviceSeeker::new(hub.clone());
//! pad.press(0);
//! seeker.poll().unwrap();
//!
//! let dev = seeker.iter().next().unwrap();
//! assert!(dev.state(&xbox().a).unwrap().is_pressed());
//! ```
//!
//! Pads are single-threaded (`Rc`) handles.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use crate::backends::joystick::{JoystickAdapter, JoystickFrame, JoystickLayout, JoystickSource};
use crate::class::DeviceClass;
use crate::error::{BoxError, SeekError};
use crate::metadata::DeviceMeta;
use crate::seeker::Discover;

#[derive(Debug, Default)]
struct PadState {
    buttons: Vec<bool>,
    axes: Vec<f32>,
    motors: Vec<f32>,
    plugged: bool,
    fail_reads: bool,
}

/// Scriptable joystick.
#[derive(Clone, Debug)]
pub struct VirtualPad {
    name: Rc<str>,
    state: Rc<RefCell<PadState>>,
}

impl VirtualPad {
    pub fn new(name: &str) -> Self {
        Self {
            name: Rc::from(name),
            state: Rc::new(RefCell::new(PadState::default())),
        }
    }

    pub fn press(&self, button: usize) {
        self.set_button(button, true);
    }

    pub fn release(&self, button: usize) {
        self.set_button(button, false);
    }

    pub fn set_button(&self, button: usize, pressed: bool) {
        let mut s = self.state.borrow_mut();
        if s.buttons.len() <= button {
            s.buttons.resize(button + 1, false);
        }
        s.buttons[button] = pressed;
    }

    /// Set a raw axis value (`y` down-positive, triggers `-1` released).
    pub fn set_axis(&self, axis: usize, value: f32) {
        let mut s = self.state.borrow_mut();
        if s.axes.len() <= axis {
            s.axes.resize(axis + 1, 0.0);
        }
        s.axes[axis] = value;
    }

    /// Make reads fail until cleared.
    pub fn fail_reads(&self, fail: bool) {
        self.state.borrow_mut().fail_reads = fail;
    }

    /// Last motor intensities written by the device.
    pub fn motors(&self) -> Vec<f32> {
        self.state.borrow().motors.clone()
    }

    pub fn is_plugged(&self) -> bool {
        self.state.borrow().plugged
    }

    /// Connect with every input at rest for `layout`.
    pub fn plug(&self, layout: &JoystickLayout) {
        let mut s = self.state.borrow_mut();
        s.buttons = vec![false; layout.button_count()];
        s.axes = layout.rest_axes();
        s.motors.clear();
        s.plugged = true;
    }

    pub fn unplug(&self) {
        self.state.borrow_mut().plugged = false;
    }

    fn same_pad(&self, other: &VirtualPad) -> bool {
        Rc::ptr_eq(&self.state, &other.state)
    }
}

impl JoystickSource for VirtualPad {
    fn is_present(&mut self) -> bool {
        self.is_plugged()
    }

    fn read(&mut self) -> Result<JoystickFrame, BoxError> {
        let s = self.state.borrow();
        if s.fail_reads {
            return Err(format!("{}: injected read failure", self.name).into());
        }
        Ok(JoystickFrame {
            buttons: s.buttons.clone(),
            axes: s.axes.clone(),
            motors: Vec::new(),
        })
    }

    fn write_motors(&mut self, motors: &[f32]) -> Result<(), BoxError> {
        self.state.borrow_mut().motors = motors.to_vec();
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn meta(&self) -> DeviceMeta {
        DeviceMeta {
            bus: Some("virtual".into()),
            product_string: Some(self.name.to_string()),
            ..DeviceMeta::default()
        }
    }
}

#[derive(Debug, Default)]
struct HubState {
    next_handle: u32,
    pads: Vec<(u32, VirtualPad)>,
    fail_next_seek: Option<String>,
}

/// Discovery over attached [`VirtualPad`]s.
///
/// Every attach hands out a fresh handle, so a pad detached and attached
/// again is discovered as a new device.
#[derive(Clone, Debug)]
pub struct VirtualHub {
    layout: Arc<JoystickLayout>,
    dual_report: bool,
    state: Rc<RefCell<HubState>>,
}

impl VirtualHub {
    pub fn new(layout: Arc<JoystickLayout>) -> Self {
        Self {
            layout,
            dual_report: false,
            state: Rc::new(RefCell::new(HubState::default())),
        }
    }

    pub fn xbox() -> Self {
        Self::new(JoystickLayout::xbox())
    }

    pub fn ps4() -> Self {
        Self::new(JoystickLayout::ps4())
    }

    /// Treat the class as one that may report a controller twice.
    pub fn dual_report(mut self, dual: bool) -> Self {
        self.dual_report = dual;
        self
    }

    /// Plug `pad` in and return its handle.
    pub fn attach(&self, pad: VirtualPad) -> u32 {
        pad.plug(&self.layout);
        let mut s = self.state.borrow_mut();
        let handle = s.next_handle;
        s.next_handle += 1;
        s.pads.push((handle, pad));
        handle
    }

    /// Unplug `pad`. Returns whether it was attached.
    pub fn detach(&self, pad: &VirtualPad) -> bool {
        let mut s = self.state.borrow_mut();
        let before = s.pads.len();
        s.pads.retain(|(_, p)| !p.same_pad(pad));
        let found = s.pads.len() != before;
        if found {
            pad.unplug();
        }
        found
    }

    pub fn len(&self) -> usize {
        self.state.borrow().pads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Make the next `seek()` fail with `message`.
    pub fn fail_next_seek(&self, message: impl Into<String>) {
        self.state.borrow_mut().fail_next_seek = Some(message.into());
    }
}

impl Discover for VirtualHub {
    type Adapter = JoystickAdapter<VirtualPad>;
    type Handle = u32;

    fn class(&self) -> &Arc<DeviceClass> {
        self.layout.class()
    }

    fn seek(&mut self) -> Result<Vec<u32>, SeekError> {
        let mut s = self.state.borrow_mut();
        if let Some(message) = s.fail_next_seek.take() {
            return Err(SeekError::Discovery(message.into()));
        }
        Ok(s.pads.iter().map(|(h, _)| *h).collect())
    }

    fn open(&mut self, handle: &u32) -> Result<Self::Adapter, SeekError> {
        let s = self.state.borrow();
        let pad = s
            .pads
            .iter()
            .find(|(h, _)| h == handle)
            .map(|(_, p)| p.clone())
            .ok_or_else(|| SeekError::Open {
                handle: handle.to_string(),
                source: "pad is no longer attached".into(),
            })?;
        Ok(JoystickAdapter::new(pad, Arc::clone(&self.layout)))
    }

    fn dual_reports(&self) -> bool {
        self.dual_report
    }
}
