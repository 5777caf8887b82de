//! Generic joystick sampling.
//!
//! Many platform APIs (GLFW, SDL, evdev) expose a controller as flat arrays
//! of buttons and axes. [`JoystickAdapter`] turns any such
//! [`JoystickSource`] into a [`DeviceAdapter`] using a declarative
//! [`JoystickLayout`]: which button index feeds which button feature, which
//! axes form each stick, and which axis drives each trigger.
//!
//! Per-model quirks are a transform on the layout entry, not a new adapter:
//! the built-in layouts remap trigger axes from `[-1, 1]` to `[0, 1]`, the
//! GameCube layout stretches the short travel of its sticks with an
//! [`AxisRange`], and the Joy-Con layouts build a stick out of the four hat
//! buttons ([`ButtonStick`]) and a trigger out of a single button.
//!
//! Features a layout leaves out are reported as unmapped on the first poll.
//! GLFW cannot drive the DualShock 4 lightbar, so [`JoystickLayout::ps4`]
//! leaves it unmapped.
//!
//! # Axis conventions
//! Sources report axes in `[-1, 1]` with `y` pointing down, as GLFW does.
//! Layout entries with `invert_y` flip `y` so that sticks read up-positive.
//!
//! # Empty frames
//! A frame with no buttons (or no axes) is the neutral frame: every mapped
//! feature reads as released/centered. A non-empty frame that is too short for
//! a mapped index is a per-feature error.

use std::sync::{Arc, OnceLock};

use thiserror::Error;

use crate::class::DeviceClass;
use crate::controller::{gc, joycon_left, joycon_right, ps4, xbox, JoyCon};
use crate::controller::{ButtonState, RumbleState, StickPos, StickState, TriggerState};
use crate::device::DeviceAdapter;
use crate::error::{AdapterError, BoxError};
use crate::feature::Feature;
use crate::metadata::DeviceMeta;
use crate::registry::MappedFeatureRegistry;

/// One raw sample of a joystick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct JoystickFrame {
    pub buttons: Vec<bool>,
    pub axes: Vec<f32>,
    /// Motor intensities written by update functions, sized by the adapter.
    pub motors: Vec<f32>,
}

/// Flat button/axis source.
pub trait JoystickSource: 'static {
    fn is_present(&mut self) -> bool;

    /// Sample buttons and axes. `motors` in the result is ignored.
    fn read(&mut self) -> Result<JoystickFrame, BoxError>;

    fn write_motors(&mut self, _motors: &[f32]) -> Result<(), BoxError> {
        Ok(())
    }

    fn name(&self) -> &str;

    fn meta(&self) -> DeviceMeta {
        DeviceMeta::default()
    }
}

#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("button index {index} out of range (frame has {len})")]
    Button { index: usize, len: usize },

    #[error("axis index {index} out of range (frame has {len})")]
    Axis { index: usize, len: usize },

    #[error("motor index {index} out of range (frame has {len})")]
    Motor { index: usize, len: usize },
}

/// Raw travel of one axis, remapped linearly onto `[-1, 1]`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisRange {
    pub min: f32,
    pub max: f32,
}

impl AxisRange {
    pub fn new(min: f32, max: f32) -> Self {
        Self { min, max }
    }

    /// `min` maps to `-1` and `max` to `1`; values past either end clamp.
    /// An empty range reads as centered.
    pub fn remap(self, v: f32) -> f32 {
        let span = self.max - self.min;
        if span == 0.0 {
            return 0.0;
        }
        ((v - self.min) / span * 2.0 - 1.0).clamp(-1.0, 1.0)
    }

    pub fn center(self) -> f32 {
        (self.min + self.max) / 2.0
    }
}

/// Axes making up one stick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StickAxes {
    pub x: usize,
    pub y: usize,
    /// Optional third axis (twist, throttle).
    pub z: Option<usize>,
    pub invert_y: bool,
    /// Raw travel of `x` and `y` when it is narrower than `[-1, 1]`.
    pub range: Option<(AxisRange, AxisRange)>,
}

impl StickAxes {
    pub fn xy(x: usize, y: usize) -> Self {
        Self {
            x,
            y,
            z: None,
            invert_y: true,
            range: None,
        }
    }

    pub fn ranged(mut self, x: AxisRange, y: AxisRange) -> Self {
        self.range = Some((x, y));
        self
    }
}

/// Stick driven by four direction buttons and an optional click.
///
/// Left wins over right and up over down. The click reads as `z = -1`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ButtonStick {
    pub up: usize,
    pub down: usize,
    pub left: usize,
    pub right: usize,
    pub thumb: Option<usize>,
}

impl ButtonStick {
    fn max_index(&self) -> usize {
        let dirs = self.up.max(self.down).max(self.left).max(self.right);
        dirs.max(self.thumb.unwrap_or(0))
    }
}

/// Axis driving one trigger, with an optional range transform.
#[derive(Clone, Copy, Debug)]
pub struct TriggerAxis {
    pub axis: usize,
    pub transform: Option<fn(f32) -> f32>,
}

/// `[-1, 1]` to `[0, 1]`.
pub fn signed_to_unit(v: f32) -> f32 {
    (v + 1.0) / 2.0
}

/// Where each feature of a class lives in a [`JoystickFrame`].
#[derive(Debug)]
pub struct JoystickLayout {
    class: Arc<DeviceClass>,
    buttons: Vec<(Feature<ButtonState>, usize)>,
    sticks: Vec<(Feature<StickState>, StickAxes)>,
    button_sticks: Vec<(Feature<StickState>, ButtonStick)>,
    triggers: Vec<(Feature<TriggerState>, TriggerAxis)>,
    button_triggers: Vec<(Feature<TriggerState>, usize)>,
    motors: Vec<(Feature<RumbleState>, usize)>,
}

impl JoystickLayout {
    pub fn new(class: Arc<DeviceClass>) -> Self {
        Self {
            class,
            buttons: Vec::new(),
            sticks: Vec::new(),
            button_sticks: Vec::new(),
            triggers: Vec::new(),
            button_triggers: Vec::new(),
            motors: Vec::new(),
        }
    }

    pub fn button(mut self, feature: &Feature<ButtonState>, index: usize) -> Self {
        self.buttons.push((feature.clone(), index));
        self
    }

    pub fn stick(mut self, feature: &Feature<StickState>, axes: StickAxes) -> Self {
        self.sticks.push((feature.clone(), axes));
        self
    }

    pub fn button_stick(mut self, feature: &Feature<StickState>, buttons: ButtonStick) -> Self {
        self.button_sticks.push((feature.clone(), buttons));
        self
    }

    pub fn trigger(mut self, feature: &Feature<TriggerState>, axis: TriggerAxis) -> Self {
        self.triggers.push((feature.clone(), axis));
        self
    }

    /// Digital trigger: fully pulled while button `index` is down.
    pub fn button_trigger(mut self, feature: &Feature<TriggerState>, index: usize) -> Self {
        self.button_triggers.push((feature.clone(), index));
        self
    }

    pub fn motor(mut self, feature: &Feature<RumbleState>, index: usize) -> Self {
        self.motors.push((feature.clone(), index));
        self
    }

    pub fn class(&self) -> &Arc<DeviceClass> {
        &self.class
    }

    /// Number of button slots a source must report.
    pub fn button_count(&self) -> usize {
        let buttons = self.buttons.iter().map(|(_, i)| i + 1);
        let sticks = self.button_sticks.iter().map(|(_, b)| b.max_index() + 1);
        let triggers = self.button_triggers.iter().map(|(_, i)| i + 1);
        buttons.chain(sticks).chain(triggers).max().unwrap_or(0)
    }

    /// Number of axis slots a source must report.
    pub fn axis_count(&self) -> usize {
        let sticks = self
            .sticks
            .iter()
            .map(|(_, a)| a.x.max(a.y).max(a.z.unwrap_or(0)) + 1);
        let triggers = self.triggers.iter().map(|(_, t)| t.axis + 1);
        sticks.chain(triggers).max().unwrap_or(0)
    }

    pub fn motor_count(&self) -> usize {
        self.motors.iter().map(|(_, i)| i + 1).max().unwrap_or(0)
    }

    /// Axis values of a controller at rest: centered sticks, released
    /// triggers (`-1` before their transform).
    pub fn rest_axes(&self) -> Vec<f32> {
        let mut axes = vec![0.0; self.axis_count()];
        for (_, s) in &self.sticks {
            if let Some((x, y)) = s.range {
                axes[s.x] = x.center();
                axes[s.y] = y.center();
            }
        }
        for (_, t) in &self.triggers {
            if t.transform.is_some() {
                axes[t.axis] = -1.0;
            }
        }
        axes
    }

    /// GLFW gamepad layout of an Xbox controller.
    pub fn xbox() -> Arc<JoystickLayout> {
        static LAYOUT: OnceLock<Arc<JoystickLayout>> = OnceLock::new();
        Arc::clone(LAYOUT.get_or_init(|| {
            let x = xbox();
            let trigger = |axis| TriggerAxis {
                axis,
                transform: Some(signed_to_unit as fn(f32) -> f32),
            };
            Arc::new(
                JoystickLayout::new(Arc::clone(&x.class))
                    .button(&x.a, 0)
                    .button(&x.b, 1)
                    .button(&x.x, 2)
                    .button(&x.y, 3)
                    .button(&x.lb, 4)
                    .button(&x.rb, 5)
                    .button(&x.back, 6)
                    .button(&x.start, 7)
                    .button(&x.guide, 8)
                    .button(&x.l_thumb, 9)
                    .button(&x.r_thumb, 10)
                    .button(&x.up, 11)
                    .button(&x.right, 12)
                    .button(&x.down, 13)
                    .button(&x.left, 14)
                    .stick(&x.ls, StickAxes::xy(0, 1))
                    .stick(&x.rs, StickAxes::xy(2, 3))
                    .trigger(&x.lt, trigger(4))
                    .trigger(&x.rt, trigger(5))
                    .motor(&x.rumble_coarse, 0)
                    .motor(&x.rumble_fine, 1),
            )
        }))
    }

    /// Raw joystick layout of a DualShock 4 (buttons and axes as the
    /// controller reports them, not the remapped gamepad view).
    pub fn ps4() -> Arc<JoystickLayout> {
        static LAYOUT: OnceLock<Arc<JoystickLayout>> = OnceLock::new();
        Arc::clone(LAYOUT.get_or_init(|| {
            let p = ps4();
            let trigger = |axis| TriggerAxis {
                axis,
                transform: Some(signed_to_unit as fn(f32) -> f32),
            };
            Arc::new(
                JoystickLayout::new(Arc::clone(&p.class))
                    .button(&p.square, 0)
                    .button(&p.cross, 1)
                    .button(&p.circle, 2)
                    .button(&p.triangle, 3)
                    .button(&p.l1, 4)
                    .button(&p.r1, 5)
                    .button(&p.share, 8)
                    .button(&p.options, 9)
                    .button(&p.l3, 10)
                    .button(&p.r3, 11)
                    .button(&p.ps, 12)
                    .button(&p.tpad, 13)
                    .button(&p.up, 14)
                    .button(&p.right, 15)
                    .button(&p.down, 16)
                    .button(&p.left, 17)
                    .stick(&p.ls, StickAxes::xy(0, 1))
                    .stick(&p.rs, StickAxes::xy(2, 5))
                    .trigger(&p.lt, trigger(3))
                    .trigger(&p.rt, trigger(4))
                    .motor(&p.rumble_strong, 0)
                    .motor(&p.rumble_weak, 1),
            )
        }))
    }

    /// GameCube controller behind a USB adapter. The sticks never reach the
    /// ends of the raw axis range, so their travel is stretched to `[-1, 1]`.
    pub fn gc() -> Arc<JoystickLayout> {
        static LAYOUT: OnceLock<Arc<JoystickLayout>> = OnceLock::new();
        Arc::clone(LAYOUT.get_or_init(|| {
            let g = gc();
            let trigger = |axis| TriggerAxis {
                axis,
                transform: Some(signed_to_unit as fn(f32) -> f32),
            };
            let main = AxisRange::new(-0.8, 0.8);
            let c_stick = AxisRange::new(-0.7, 0.7);
            Arc::new(
                JoystickLayout::new(Arc::clone(&g.class))
                    .button(&g.x, 0)
                    .button(&g.a, 1)
                    .button(&g.b, 2)
                    .button(&g.y, 3)
                    .button(&g.l, 4)
                    .button(&g.r, 5)
                    .button(&g.z, 7)
                    .button(&g.start, 9)
                    .button(&g.up, 12)
                    .button(&g.right, 13)
                    .button(&g.down, 14)
                    .button(&g.left, 15)
                    .stick(&g.ls, StickAxes::xy(0, 1).ranged(main, main))
                    .stick(&g.rs, StickAxes::xy(5, 2).ranged(c_stick, c_stick))
                    .trigger(&g.lt, trigger(3))
                    .trigger(&g.rt, trigger(4))
                    .motor(&g.rumble, 0),
            )
        }))
    }

    /// Left Joy-Con on its own. GLFW reports the stick as a hat, appended
    /// after the buttons as up, right, down, left.
    pub fn joycon_left() -> Arc<JoystickLayout> {
        static LAYOUT: OnceLock<Arc<JoystickLayout>> = OnceLock::new();
        Arc::clone(LAYOUT.get_or_init(|| {
            let j = joycon_left();
            Arc::new(
                joycon_layout(j, [2, 1, 0, 3], 14, 8, 13)
                    .button_stick(&j.stick, joycon_hat(10))
                    .button_trigger(&j.trigger, 15),
            )
        }))
    }

    /// Right Joy-Con on its own, same hat convention as the left one.
    pub fn joycon_right() -> Arc<JoystickLayout> {
        static LAYOUT: OnceLock<Arc<JoystickLayout>> = OnceLock::new();
        Arc::clone(LAYOUT.get_or_init(|| {
            let j = joycon_right();
            Arc::new(
                joycon_layout(j, [1, 2, 3, 0], 14, 9, 12)
                    .button_stick(&j.stick, joycon_hat(11))
                    .button_trigger(&j.trigger, 15),
            )
        }))
    }
}

/// Buttons shared by both Joy-Con halves. `face` is north, south, west, east.
fn joycon_layout(
    j: &JoyCon,
    face: [usize; 4],
    shoulder: usize,
    menu: usize,
    system: usize,
) -> JoystickLayout {
    JoystickLayout::new(Arc::clone(&j.class))
        .button(&j.north, face[0])
        .button(&j.south, face[1])
        .button(&j.west, face[2])
        .button(&j.east, face[3])
        .button(&j.sl, 4)
        .button(&j.sr, 5)
        .button(&j.shoulder, shoulder)
        .button(&j.menu, menu)
        .button(&j.system, system)
}

fn joycon_hat(thumb: usize) -> ButtonStick {
    ButtonStick {
        up: 16,
        right: 17,
        down: 18,
        left: 19,
        thumb: Some(thumb),
    }
}

fn button_at(f: &JoystickFrame, index: usize) -> Result<bool, LayoutError> {
    if f.buttons.is_empty() {
        return Ok(false);
    }
    f.buttons.get(index).copied().ok_or(LayoutError::Button {
        index,
        len: f.buttons.len(),
    })
}

fn axis_at(f: &JoystickFrame, index: usize) -> Result<f32, LayoutError> {
    f.axes.get(index).copied().ok_or(LayoutError::Axis {
        index,
        len: f.axes.len(),
    })
}

fn update_button(s: &mut ButtonState, index: &usize, f: &mut JoystickFrame) -> Result<(), BoxError> {
    s.set_pressed(button_at(f, *index)?);
    Ok(())
}

fn update_stick(s: &mut StickState, axes: &StickAxes, f: &mut JoystickFrame) -> Result<(), BoxError> {
    if f.axes.is_empty() {
        s.set_raw(StickPos::CENTER);
        return Ok(());
    }
    let mut x = axis_at(f, axes.x)?;
    let mut y = axis_at(f, axes.y)?;
    if let Some((rx, ry)) = axes.range {
        x = rx.remap(x);
        y = ry.remap(y);
    }
    let z = match axes.z {
        Some(i) => axis_at(f, i)?,
        None => 0.0,
    };
    s.set_raw(StickPos {
        x,
        y: if axes.invert_y { -y } else { y },
        z,
    });
    Ok(())
}

fn update_trigger(s: &mut TriggerState, axis: &TriggerAxis, f: &mut JoystickFrame) -> Result<(), BoxError> {
    if f.axes.is_empty() {
        s.set_force(0.0);
        return Ok(());
    }
    let v = axis_at(f, axis.axis)?;
    s.set_force(axis.transform.map_or(v, |t| t(v)));
    Ok(())
}

fn update_button_stick(s: &mut StickState, b: &ButtonStick, f: &mut JoystickFrame) -> Result<(), BoxError> {
    let x = if button_at(f, b.left)? {
        -1.0
    } else if button_at(f, b.right)? {
        1.0
    } else {
        0.0
    };
    let y = if button_at(f, b.up)? {
        1.0
    } else if button_at(f, b.down)? {
        -1.0
    } else {
        0.0
    };
    let z = match b.thumb {
        Some(i) if button_at(f, i)? => -1.0,
        _ => 0.0,
    };
    s.set_raw(StickPos { x, y, z });
    Ok(())
}

fn update_button_trigger(s: &mut TriggerState, index: &usize, f: &mut JoystickFrame) -> Result<(), BoxError> {
    s.set_force(if button_at(f, *index)? { 1.0 } else { 0.0 });
    Ok(())
}

fn update_motor(s: &mut RumbleState, index: &usize, f: &mut JoystickFrame) -> Result<(), BoxError> {
    if f.motors.is_empty() {
        return Ok(());
    }
    let len = f.motors.len();
    let slot = f
        .motors
        .get_mut(*index)
        .ok_or(LayoutError::Motor { index: *index, len })?;
    *slot = s.force();
    Ok(())
}

/// [`DeviceAdapter`] over a [`JoystickSource`] and a [`JoystickLayout`].
pub struct JoystickAdapter<S: JoystickSource> {
    source: S,
    layout: Arc<JoystickLayout>,
}

impl<S: JoystickSource> JoystickAdapter<S> {
    pub fn new(source: S, layout: Arc<JoystickLayout>) -> Self {
        Self { source, layout }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn layout(&self) -> &Arc<JoystickLayout> {
        &self.layout
    }
}

impl<S: JoystickSource> DeviceAdapter for JoystickAdapter<S> {
    type Frame = JoystickFrame;

    fn map_features(&self, registry: &mut MappedFeatureRegistry<JoystickFrame>) {
        for (feature, index) in &self.layout.buttons {
            registry.map_feature(feature, *index, update_button);
        }
        for (feature, axes) in &self.layout.sticks {
            registry.map_feature(feature, *axes, update_stick);
        }
        for (feature, buttons) in &self.layout.button_sticks {
            registry.map_feature(feature, *buttons, update_button_stick);
        }
        for (feature, axis) in &self.layout.triggers {
            registry.map_feature(feature, *axis, update_trigger);
        }
        for (feature, index) in &self.layout.button_triggers {
            registry.map_feature(feature, *index, update_button_trigger);
        }
        for (feature, index) in &self.layout.motors {
            registry.map_feature(feature, *index, update_motor);
        }
    }

    fn is_connected(&mut self) -> bool {
        self.source.is_present()
    }

    fn sample_frame(&mut self) -> Result<JoystickFrame, AdapterError> {
        let mut frame = self.source.read().map_err(AdapterError::Sample)?;
        frame.motors = vec![0.0; self.layout.motor_count()];
        Ok(frame)
    }

    fn apply_outputs(&mut self, frame: &JoystickFrame) -> Result<(), AdapterError> {
        if frame.motors.is_empty() {
            return Ok(());
        }
        self.source
            .write_motors(&frame.motors)
            .map_err(AdapterError::Output)
    }

    fn name(&self) -> &str {
        self.source.name()
    }

    fn meta(&self) -> DeviceMeta {
        self.source.meta()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::Rgba;
    use crate::device::{Device, InputDevice};
    use crate::error::FeatureFault;
    use crate::pressable::{Direction, Pressable};

    struct Fixed {
        frame: JoystickFrame,
        written: Vec<Vec<f32>>,
    }

    impl JoystickSource for Fixed {
        fn is_present(&mut self) -> bool {
            true
        }

        fn read(&mut self) -> Result<JoystickFrame, BoxError> {
            Ok(self.frame.clone())
        }

        fn write_motors(&mut self, motors: &[f32]) -> Result<(), BoxError> {
            self.written.push(motors.to_vec());
            Ok(())
        }

        fn name(&self) -> &str {
            "fixed"
        }
    }

    fn device(
        layout: Arc<JoystickLayout>,
        buttons: Vec<bool>,
        axes: Vec<f32>,
    ) -> InputDevice<JoystickAdapter<Fixed>> {
        let source = Fixed {
            frame: JoystickFrame {
                buttons,
                axes,
                motors: Vec::new(),
            },
            written: Vec::new(),
        };
        InputDevice::new(Arc::clone(layout.class()), JoystickAdapter::new(source, layout)).unwrap()
    }

    fn ps4_device(buttons: Vec<bool>, axes: Vec<f32>) -> InputDevice<JoystickAdapter<Fixed>> {
        device(JoystickLayout::ps4(), buttons, axes)
    }

    /// Poll a fresh PS4 device whose only fault is the unmapped lightbar.
    fn first_ps4_poll(dev: &mut InputDevice<JoystickAdapter<Fixed>>) {
        let report = dev.poll().unwrap_err();
        assert!(report.adapter.is_empty());
        let failed: Vec<_> = report.faults.iter().map(|f| f.feature()).collect();
        assert_eq!(failed, vec!["lightbar"]);
    }

    #[test]
    fn test_ps4_triggers_remapped_to_unit_range() {
        let mut axes = JoystickLayout::ps4().rest_axes();
        axes[3] = 1.0;
        axes[4] = 0.0;
        let mut dev = ps4_device(vec![false; 18], axes);
        first_ps4_poll(&mut dev);
        assert_eq!(dev.state(&ps4().lt).unwrap().force(), 1.0);
        assert_eq!(dev.state(&ps4().rt).unwrap().force(), 0.5);
        assert!(dev.state(&ps4().lt).unwrap().is_pressed());
    }

    #[test]
    fn test_ps4_buttons_and_right_stick() {
        let mut buttons = vec![false; 18];
        buttons[1] = true;
        buttons[17] = true;
        let mut axes = JoystickLayout::ps4().rest_axes();
        axes[2] = 0.7;
        axes[5] = 0.9;
        let mut dev = ps4_device(buttons, axes);
        first_ps4_poll(&mut dev);
        dev.poll().unwrap();

        let p = ps4();
        assert!(dev.state(&p.cross).unwrap().is_pressed());
        assert!(dev.state(&p.left).unwrap().is_pressed());
        assert!(!dev.state(&p.square).unwrap().is_pressed());
        let rs = dev.state(&p.rs).unwrap();
        assert_eq!(rs.position(), StickPos::new(0.7, -0.9));
        assert!(rs.is_pressed(Direction::Down));
        assert!(rs.is_pressed(Direction::Right));
    }

    #[test]
    fn test_ps4_lightbar_is_reported_unmapped() {
        let mut dev = ps4_device(vec![false; 18], JoystickLayout::ps4().rest_axes());
        dev.state_mut(&ps4().lightbar)
            .unwrap()
            .set_color(Rgba::from_rgb(0xff0000));

        let report = dev.poll().unwrap_err();
        assert_eq!(report.faults.len(), 1);
        assert!(matches!(
            &report.faults[0],
            FeatureFault::Unmapped(e) if e.feature == "lightbar"
        ));

        dev.poll().unwrap();
        assert_eq!(
            dev.state(&ps4().lightbar).unwrap().color(),
            Rgba::from_rgb(0xff0000)
        );
    }

    #[test]
    fn test_short_frame_reports_offending_features_only() {
        let mut dev = ps4_device(vec![false; 4], JoystickLayout::ps4().rest_axes());
        let report = dev.poll().unwrap_err();
        let failed: Vec<_> = report.faults.iter().map(|f| f.feature()).collect();
        assert_eq!(
            failed,
            vec![
                "lightbar", "l1", "r1", "share", "options", "l3", "r3", "ps", "tpad", "dpad_up",
                "dpad_right", "dpad_down", "dpad_left"
            ]
        );
    }

    #[test]
    fn test_rumble_written_to_motor_slots() {
        let mut dev = ps4_device(vec![false; 18], JoystickLayout::ps4().rest_axes());
        dev.state_mut(&ps4().rumble_weak).unwrap().set_force(0.25);
        first_ps4_poll(&mut dev);
        assert_eq!(dev.adapter().source().written, vec![vec![0.0, 0.25]]);
    }

    #[test]
    fn test_layout_sizes() {
        let x = JoystickLayout::xbox();
        assert_eq!(x.button_count(), 15);
        assert_eq!(x.axis_count(), 6);
        assert_eq!(x.motor_count(), 2);
        assert_eq!(x.rest_axes(), vec![0.0, 0.0, 0.0, 0.0, -1.0, -1.0]);
        assert_eq!(JoystickLayout::ps4().button_count(), 18);
        assert_eq!(JoystickLayout::gc().button_count(), 16);
        assert_eq!(JoystickLayout::gc().axis_count(), 6);
        assert_eq!(JoystickLayout::joycon_left().button_count(), 20);
        assert_eq!(JoystickLayout::joycon_right().axis_count(), 0);
    }

    #[test]
    fn test_every_class_feature_is_mapped() {
        let dev = ps4_device(Vec::new(), Vec::new());
        let unmapped: Vec<_> = dev
            .registry()
            .unmapped(dev.class())
            .into_iter()
            .map(|e| e.feature)
            .collect();
        assert_eq!(unmapped, vec!["lightbar"]);

        for layout in [
            JoystickLayout::xbox(),
            JoystickLayout::gc(),
            JoystickLayout::joycon_left(),
            JoystickLayout::joycon_right(),
        ] {
            let dev = device(layout, Vec::new(), Vec::new());
            assert!(dev.registry().unmapped(dev.class()).is_empty());
        }
    }

    #[test]
    fn test_axis_range_remap() {
        let r = AxisRange::new(-0.8, 0.6);
        assert_eq!(r.remap(-0.8), -1.0);
        assert_eq!(r.remap(0.6), 1.0);
        assert_eq!(r.remap(-0.1), 0.0);
        assert_eq!(r.remap(0.9), 1.0);
        assert_eq!(r.remap(-2.0), -1.0);
        assert_eq!(AxisRange::new(0.5, 0.5).remap(0.7), 0.0);
    }

    #[test]
    fn test_gc_sticks_stretched_to_full_travel() {
        let layout = JoystickLayout::gc();
        let mut axes = layout.rest_axes();
        axes[0] = 0.8;
        axes[1] = 0.4;
        axes[5] = -0.7;
        let mut dev = device(layout, vec![false; 16], axes);
        dev.poll().unwrap();

        let g = gc();
        let ls = dev.state(&g.ls).unwrap().raw();
        assert_eq!(ls.x, 1.0);
        assert!((ls.y + 0.5).abs() < 1e-6);
        assert_eq!(dev.state(&g.rs).unwrap().raw().x, -1.0);
        assert!(dev.state(&g.ls).unwrap().is_pressed(Direction::Right));
        assert_eq!(dev.state(&g.lt).unwrap().force(), 0.0);
    }

    #[test]
    fn test_joycon_stick_from_hat_buttons() {
        let layout = JoystickLayout::joycon_left();
        let mut buttons = vec![false; 20];
        buttons[16] = true;
        buttons[18] = true;
        buttons[19] = true;
        buttons[17] = true;
        buttons[10] = true;
        let mut dev = device(layout, buttons, Vec::new());
        dev.poll().unwrap();

        let stick = dev.state(&joycon_left().stick).unwrap().raw();
        assert_eq!(stick, StickPos { x: -1.0, y: 1.0, z: -1.0 });
    }

    #[test]
    fn test_joycon_trigger_from_button() {
        let layout = JoystickLayout::joycon_right();
        let mut buttons = vec![false; 20];
        buttons[15] = true;
        buttons[0] = true;
        buttons[18] = true;
        let mut dev = device(layout, buttons, Vec::new());
        dev.poll().unwrap();

        let j = joycon_right();
        let zr = dev.state(&j.trigger).unwrap();
        assert_eq!(zr.force(), 1.0);
        assert!(zr.is_pressed());
        assert!(dev.state(&j.east).unwrap().is_pressed());
        assert_eq!(dev.state(&j.stick).unwrap().raw(), StickPos::new(0.0, -1.0));
    }

    #[test]
    fn test_joycon_released_and_short_frames() {
        let mut dev = device(JoystickLayout::joycon_left(), vec![false; 20], Vec::new());
        dev.poll().unwrap();
        let j = joycon_left();
        assert_eq!(dev.state(&j.trigger).unwrap().force(), 0.0);
        assert_eq!(dev.state(&j.stick).unwrap().raw(), StickPos::CENTER);

        let mut short = device(JoystickLayout::joycon_left(), vec![false; 16], Vec::new());
        let report = short.poll().unwrap_err();
        let failed: Vec<_> = report.faults.iter().map(|f| f.feature()).collect();
        assert_eq!(failed, vec!["ls"]);
    }
}
