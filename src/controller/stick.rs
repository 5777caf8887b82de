//! Analog sticks and their calibration.
//!
//! Coordinates are `x` right-positive and `y` up-positive, nominally in
//! `[-1.0, 1.0]`. `z` carries an optional third axis (twist, throttle) and is
//! passed through calibration untouched.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::pressable::{Direction, PressTracker, SettleCtx};
use crate::state::{State, StateBinding, StateValue};

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StickPos {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub z: f32,
}

impl StickPos {
    pub const CENTER: StickPos = StickPos {
        x: 0.0,
        y: 0.0,
        z: 0.0,
    };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y, z: 0.0 }
    }
}

/// Radial deadzone calibration.
///
/// The raw position is re-centered on `(center_x, center_y)`. Distances up to
/// `deadzone` read as the center; distances between `deadzone` and `range`
/// are rescaled linearly onto `[0, 1]`, and anything past `range` saturates
/// at 1.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StickCalibration {
    pub center_x: f32,
    pub center_y: f32,
    pub deadzone: f32,
    pub range: f32,
}

impl Default for StickCalibration {
    fn default() -> Self {
        Self {
            center_x: 0.0,
            center_y: 0.0,
            deadzone: 0.0,
            range: 1.0,
        }
    }
}

impl StickCalibration {
    pub fn with_deadzone(deadzone: f32) -> Self {
        Self {
            deadzone,
            ..Self::default()
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let fields = [self.center_x, self.center_y, self.deadzone, self.range];
        if fields.iter().any(|v| !v.is_finite()) {
            return Err(ValidationError::Calibration("values must be finite".into()));
        }
        if self.center_x.abs() > 1.0 || self.center_y.abs() > 1.0 {
            return Err(ValidationError::Calibration(format!(
                "center ({}, {}) is outside [-1, 1]",
                self.center_x, self.center_y
            )));
        }
        if !(0.0..1.0).contains(&self.deadzone) {
            return Err(ValidationError::Calibration(format!(
                "deadzone {} is outside [0, 1)",
                self.deadzone
            )));
        }
        if self.range <= self.deadzone {
            return Err(ValidationError::Calibration(format!(
                "range {} must exceed deadzone {}",
                self.range, self.deadzone
            )));
        }
        Ok(())
    }

    /// Map a raw position to its calibrated value. Pure: the same input always
    /// yields the same output.
    pub fn apply(&self, raw: StickPos) -> StickPos {
        let dx = raw.x - self.center_x;
        let dy = raw.y - self.center_y;
        let mag = dx.hypot(dy);
        if mag <= self.deadzone {
            return StickPos { z: raw.z, ..StickPos::CENTER };
        }
        let scaled = ((mag - self.deadzone) / (self.range - self.deadzone)).min(1.0);
        let k = scaled / mag;
        StickPos {
            x: dx * k,
            y: dy * k,
            z: raw.z,
        }
    }
}

/// Analog stick state.
///
/// Holds the last raw sample, the optional calibration, the calibrated
/// position derived from both, and one press tracker per [`Direction`].
#[derive(Clone, Debug)]
pub struct StickState {
    binding: StateBinding,
    raw: StickPos,
    calibration: Option<StickCalibration>,
    calibrated: StickPos,
    directions: [PressTracker; 4],
}

impl StickState {
    pub fn new(binding: StateBinding) -> Self {
        Self {
            binding,
            raw: StickPos::CENTER,
            calibration: None,
            calibrated: StickPos::CENTER,
            directions: [PressTracker::default(); 4],
        }
    }

    /// Last sampled position, before calibration.
    pub fn raw(&self) -> StickPos {
        self.raw
    }

    /// Calibrated position; equal to [`raw`](Self::raw) without calibration.
    pub fn position(&self) -> StickPos {
        self.calibrated
    }

    pub fn x(&self) -> f32 {
        self.calibrated.x
    }

    pub fn y(&self) -> f32 {
        self.calibrated.y
    }

    pub fn set_raw(&mut self, raw: StickPos) {
        self.raw = raw;
        self.recalibrate();
    }

    pub fn calibration(&self) -> Option<&StickCalibration> {
        self.calibration.as_ref()
    }

    pub(crate) fn set_calibration(&mut self, calibration: Option<StickCalibration>) {
        self.calibration = calibration;
        self.recalibrate();
    }

    fn recalibrate(&mut self) {
        self.calibrated = match &self.calibration {
            Some(c) => c.apply(self.raw),
            None => self.raw,
        };
    }

    pub fn direction(&self, direction: Direction) -> &PressTracker {
        &self.directions[direction_slot(direction)]
    }

    pub fn is_pressed(&self, direction: Direction) -> bool {
        self.direction(direction).is_pressed()
    }
}

fn direction_slot(direction: Direction) -> usize {
    match direction {
        Direction::Up => 0,
        Direction::Down => 1,
        Direction::Left => 2,
        Direction::Right => 3,
    }
}

impl State for StickState {
    fn binding(&self) -> &StateBinding {
        &self.binding
    }

    fn settle(&mut self, ctx: &mut SettleCtx) {
        self.recalibrate();
        let StickPos { x, y, .. } = self.calibrated;
        let t = ctx.press_threshold();
        for dir in Direction::ALL {
            let tracker = &mut self.directions[direction_slot(dir)];
            ctx.track(tracker, Some(dir), dir.is_pressed_by(x, y, t));
        }
    }

    fn value(&self) -> StateValue {
        StateValue::Stick {
            raw: self.raw,
            calibrated: self.calibrated,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::stick;
    use crate::device::DeviceId;
    use crate::pressable::Edge;

    fn new_stick() -> StickState {
        stick("ls").unwrap().create_state(DeviceId::next())
    }

    fn settle(state: &mut StickState, t: f32) -> Vec<(Option<Direction>, Edge)> {
        let mut ctx = SettleCtx::new(t);
        state.settle(&mut ctx);
        ctx.take_edges()
            .into_iter()
            .map(|e| (e.direction, e.edge))
            .collect()
    }

    #[test]
    fn test_left_pressed_past_threshold() {
        let mut s = new_stick();
        s.set_raw(StickPos::new(-0.9, 0.0));
        assert_eq!(settle(&mut s, 0.5), vec![(Some(Direction::Left), Edge::Pressed)]);
        assert!(s.is_pressed(Direction::Left));
        assert!(!s.is_pressed(Direction::Right));

        s.set_raw(StickPos::new(0.0, 0.0));
        assert_eq!(settle(&mut s, 0.5), vec![(Some(Direction::Left), Edge::Released)]);
        for dir in Direction::ALL {
            assert!(!s.is_pressed(dir));
        }
    }

    #[test]
    fn test_diagonal_presses_two_directions() {
        let mut s = new_stick();
        s.set_raw(StickPos::new(0.8, 0.8));
        settle(&mut s, 0.5);
        assert!(s.is_pressed(Direction::Up));
        assert!(s.is_pressed(Direction::Right));
        assert!(!s.is_pressed(Direction::Down));
        assert!(!s.is_pressed(Direction::Left));
    }

    #[test]
    fn test_no_calibration_is_pass_through() {
        let mut s = new_stick();
        let raw = StickPos { x: 0.3, y: -0.7, z: 0.1 };
        s.set_raw(raw);
        assert_eq!(s.position(), raw);
    }

    #[test]
    fn test_calibration_does_not_drift() {
        let mut s = new_stick();
        s.set_calibration(Some(StickCalibration {
            center_x: 0.1,
            center_y: 0.0,
            deadzone: 0.1,
            range: 0.9,
        }));
        s.set_raw(StickPos::new(0.6, 0.0));
        settle(&mut s, 0.5);
        let first = s.position();
        for _ in 0..10 {
            s.set_raw(StickPos::new(0.6, 0.0));
            settle(&mut s, 0.5);
        }
        assert_eq!(s.position(), first);
        assert!((first.x - 0.5).abs() < 1e-6);
        assert_eq!(s.raw(), StickPos::new(0.6, 0.0));
    }

    #[test]
    fn test_deadzone_and_saturation() {
        let c = StickCalibration::with_deadzone(0.2);
        assert_eq!(c.apply(StickPos::new(0.15, 0.1)), StickPos::CENTER);
        let full = c.apply(StickPos::new(1.5, 0.0));
        assert!((full.x - 1.0).abs() < 1e-6);
        let z = c.apply(StickPos { x: 0.0, y: 0.0, z: 0.4 });
        assert_eq!(z.z, 0.4);
    }

    #[test]
    fn test_calibration_validation() {
        assert!(StickCalibration::default().validate().is_ok());
        assert!(StickCalibration::with_deadzone(1.0).validate().is_err());
        assert!(StickCalibration {
            range: 0.1,
            ..StickCalibration::with_deadzone(0.2)
        }
        .validate()
        .is_err());
        assert!(StickCalibration {
            center_x: f32::NAN,
            ..StickCalibration::default()
        }
        .validate()
        .is_err());
    }
}
