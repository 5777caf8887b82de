//! XInput backend.
//!
//! Xbox-style controllers on Windows are read through XInput slots `0..4`.
//! Decoding of the `XINPUT_GAMEPAD` record is platform independent and lives
//! here; the Windows port and discovery are in [`windows`].
//!
//! # Conventions
//! - Thumbsticks are normalized to `[-1, 1]`. XInput reports `y` up-positive,
//!   which is what [`StickState`] expects, so no inversion happens.
//! - Triggers map `0..=255` to `[0, 1]`.
//! - The D-pad is four independent buttons.
//! - Rumble forces map `[0, 1]` to the full `u16` motor speed range.
//!
//! The guide button is only reported by the undocumented extended state
//! call; through `XInputGetState` it stays released.

use std::sync::Arc;

use crate::class::DeviceClass;
use crate::controller::{xbox, ButtonState, RumbleState, StickPos, StickState, TriggerState};
use crate::device::DeviceAdapter;
use crate::error::{AdapterError, BoxError};
use crate::metadata::DeviceMeta;
use crate::registry::MappedFeatureRegistry;

#[cfg(windows)]
pub mod windows;

#[cfg(windows)]
pub use self::windows::{SystemPort, XInputDiscovery};

/// Number of XInput user slots.
pub const SLOT_COUNT: u32 = 4;

pub const DPAD_UP: u16 = 0x0001;
pub const DPAD_DOWN: u16 = 0x0002;
pub const DPAD_LEFT: u16 = 0x0004;
pub const DPAD_RIGHT: u16 = 0x0008;
pub const START: u16 = 0x0010;
pub const BACK: u16 = 0x0020;
pub const LEFT_THUMB: u16 = 0x0040;
pub const RIGHT_THUMB: u16 = 0x0080;
pub const LEFT_SHOULDER: u16 = 0x0100;
pub const RIGHT_SHOULDER: u16 = 0x0200;
pub const GUIDE: u16 = 0x0400;
pub const A: u16 = 0x1000;
pub const B: u16 = 0x2000;
pub const X: u16 = 0x4000;
pub const Y: u16 = 0x8000;

/// Gamepad record as XInput reports it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct XInputGamepad {
    pub buttons: u16,
    pub left_trigger: u8,
    pub right_trigger: u8,
    pub thumb_lx: i16,
    pub thumb_ly: i16,
    pub thumb_rx: i16,
    pub thumb_ry: i16,
}

impl XInputGamepad {
    #[inline]
    pub fn is_down(&self, mask: u16) -> bool {
        self.buttons & mask != 0
    }
}

/// One poll of an XInput slot plus the vibration to send back.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct XInputFrame {
    pub gamepad: XInputGamepad,
    /// Left (low-frequency) and right (high-frequency) motor speeds.
    pub vibration: [u16; 2],
}

/// Map `[-32768, 32767]` to `[-1, 1]`.
#[inline]
pub fn normalize_thumb(v: i16) -> f32 {
    if v >= 0 {
        v as f32 / 32767.0
    } else {
        v as f32 / 32768.0
    }
}

#[inline]
pub fn normalize_trigger(v: u8) -> f32 {
    v as f32 / 255.0
}

/// Map a force in `[0, 1]` to a motor speed.
#[inline]
pub fn motor_speed(force: f32) -> u16 {
    (force.clamp(0.0, 1.0) * u16::MAX as f32).round() as u16
}

/// Access to one XInput slot.
pub trait XInputPort: 'static {
    fn slot(&self) -> u32;

    /// Current gamepad record, or `None` when nothing is plugged in.
    fn get_state(&mut self) -> Option<XInputGamepad>;

    fn set_vibration(&mut self, left: u16, right: u16) -> Result<(), BoxError>;
}

#[derive(Clone, Copy, Debug)]
enum Thumb {
    Left,
    Right,
}

#[derive(Clone, Copy, Debug)]
enum Side {
    Left,
    Right,
}

fn update_button(s: &mut ButtonState, mask: &u16, f: &mut XInputFrame) -> Result<(), BoxError> {
    s.set_pressed(f.gamepad.is_down(*mask));
    Ok(())
}

fn update_thumb(s: &mut StickState, thumb: &Thumb, f: &mut XInputFrame) -> Result<(), BoxError> {
    let g = &f.gamepad;
    let (x, y) = match thumb {
        Thumb::Left => (g.thumb_lx, g.thumb_ly),
        Thumb::Right => (g.thumb_rx, g.thumb_ry),
    };
    s.set_raw(StickPos::new(normalize_thumb(x), normalize_thumb(y)));
    Ok(())
}

fn update_trigger(s: &mut TriggerState, side: &Side, f: &mut XInputFrame) -> Result<(), BoxError> {
    let raw = match side {
        Side::Left => f.gamepad.left_trigger,
        Side::Right => f.gamepad.right_trigger,
    };
    s.set_force(normalize_trigger(raw));
    Ok(())
}

fn update_motor(s: &mut RumbleState, side: &Side, f: &mut XInputFrame) -> Result<(), BoxError> {
    let slot = match side {
        Side::Left => 0,
        Side::Right => 1,
    };
    f.vibration[slot] = motor_speed(s.force());
    Ok(())
}

/// [`DeviceAdapter`] of the [`xbox`] class over one XInput slot.
pub struct XInputAdapter<P: XInputPort> {
    port: P,
    name: String,
    last: Option<XInputGamepad>,
    sent: Option<[u16; 2]>,
}

impl<P: XInputPort> XInputAdapter<P> {
    pub fn new(port: P) -> Self {
        let name = format!("XInput Controller {}", port.slot());
        Self {
            port,
            name,
            last: None,
            sent: None,
        }
    }

    pub fn class() -> &'static Arc<DeviceClass> {
        &xbox().class
    }

    pub fn port(&self) -> &P {
        &self.port
    }

    pub fn port_mut(&mut self) -> &mut P {
        &mut self.port
    }
}

impl<P: XInputPort> DeviceAdapter for XInputAdapter<P> {
    type Frame = XInputFrame;

    fn map_features(&self, registry: &mut MappedFeatureRegistry<XInputFrame>) {
        let x = xbox();
        let buttons = [
            (&x.a, A),
            (&x.b, B),
            (&x.x, X),
            (&x.y, Y),
            (&x.lb, LEFT_SHOULDER),
            (&x.rb, RIGHT_SHOULDER),
            (&x.back, BACK),
            (&x.start, START),
            (&x.guide, GUIDE),
            (&x.l_thumb, LEFT_THUMB),
            (&x.r_thumb, RIGHT_THUMB),
            (&x.up, DPAD_UP),
            (&x.down, DPAD_DOWN),
            (&x.left, DPAD_LEFT),
            (&x.right, DPAD_RIGHT),
        ];
        for (feature, mask) in buttons {
            registry.map_feature(feature, mask, update_button);
        }
        registry.map_feature(&x.ls, Thumb::Left, update_thumb);
        registry.map_feature(&x.rs, Thumb::Right, update_thumb);
        registry.map_feature(&x.lt, Side::Left, update_trigger);
        registry.map_feature(&x.rt, Side::Right, update_trigger);
        registry.map_feature(&x.rumble_coarse, Side::Left, update_motor);
        registry.map_feature(&x.rumble_fine, Side::Right, update_motor);
    }

    fn is_connected(&mut self) -> bool {
        self.last = self.port.get_state();
        if self.last.is_none() {
            self.sent = None;
        }
        self.last.is_some()
    }

    fn sample_frame(&mut self) -> Result<XInputFrame, AdapterError> {
        let gamepad = self
            .last
            .take()
            .ok_or_else(|| AdapterError::Sample(format!("slot {} is empty", self.port.slot()).into()))?;
        Ok(XInputFrame {
            gamepad,
            vibration: [0; 2],
        })
    }

    fn apply_outputs(&mut self, frame: &XInputFrame) -> Result<(), AdapterError> {
        if self.sent == Some(frame.vibration) {
            return Ok(());
        }
        let [left, right] = frame.vibration;
        self.port
            .set_vibration(left, right)
            .map_err(AdapterError::Output)?;
        self.sent = Some(frame.vibration);
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn meta(&self) -> DeviceMeta {
        let slot = self.port.slot();
        DeviceMeta {
            bus: Some("xinput".into()),
            vid: Some(0x045e),
            product_string: Some(self.name.clone()),
            serial_number: Some(format!("xinput:{slot}")),
            path: Some(format!("xinput:{slot}")),
            ..DeviceMeta::default()
        }
    }
}
