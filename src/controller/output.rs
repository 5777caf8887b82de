//! Output feature states.
//!
//! Application code writes these through
//! [`InputDevice::state_mut`](crate::device::InputDevice::state_mut); the
//! adapter's update functions copy them into the outgoing frame on the next
//! poll.

use serde::{Deserialize, Serialize};

use crate::state::{State, StateBinding, StateValue};

/// Rumble motor intensity, `0.0` off to `1.0` full.
#[derive(Clone, Debug)]
pub struct RumbleState {
    binding: StateBinding,
    force: f32,
}

impl RumbleState {
    pub fn new(binding: StateBinding) -> Self {
        Self {
            binding,
            force: 0.0,
        }
    }

    pub fn force(&self) -> f32 {
        self.force
    }

    /// Store `force`, clamped to `[0, 1]`. NaN turns the motor off.
    pub fn set_force(&mut self, force: f32) {
        self.force = if force.is_nan() {
            0.0
        } else {
            force.clamp(0.0, 1.0)
        };
    }
}

impl State for RumbleState {
    fn binding(&self) -> &StateBinding {
        &self.binding
    }

    fn value(&self) -> StateValue {
        StateValue::Rumble { force: self.force }
    }
}

/// 8-bit RGBA color.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const OFF: Rgba = Rgba {
        r: 0,
        g: 0,
        b: 0,
        a: 0,
    };

    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// From `0xRRGGBB`, fully opaque.
    pub fn from_rgb(rgb: u32) -> Self {
        Self::from_rgba(rgb << 8 | 0xff, true)
    }

    /// From `0xRRGGBBAA`. With `use_alpha == false` the alpha byte is
    /// ignored and the color is fully opaque.
    pub fn from_rgba(rgba: u32, use_alpha: bool) -> Self {
        let [r, g, b, a] = rgba.to_be_bytes();
        Self {
            r,
            g,
            b,
            a: if use_alpha { a } else { 0xff },
        }
    }

    /// Color premultiplied by alpha, as sent to lights without an alpha channel.
    pub fn premultiplied(self) -> [u8; 3] {
        let scale = |c: u8| ((c as u16 * self.a as u16 + 127) / 255) as u8;
        [scale(self.r), scale(self.g), scale(self.b)]
    }
}

/// Light color output.
#[derive(Clone, Debug)]
pub struct LightbarState {
    binding: StateBinding,
    color: Rgba,
}

impl LightbarState {
    pub fn new(binding: StateBinding) -> Self {
        Self {
            binding,
            color: Rgba::OFF,
        }
    }

    pub fn color(&self) -> Rgba {
        self.color
    }

    pub fn set_color(&mut self, color: Rgba) {
        self.color = color;
    }
}

impl State for LightbarState {
    fn binding(&self) -> &StateBinding {
        &self.binding
    }

    fn value(&self) -> StateValue {
        StateValue::Lightbar { color: self.color }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rgba_from_packed() {
        assert_eq!(Rgba::from_rgb(0x112233), Rgba::new(0x11, 0x22, 0x33, 0xff));
        assert_eq!(
            Rgba::from_rgba(0x11223344, true),
            Rgba::new(0x11, 0x22, 0x33, 0x44)
        );
        assert_eq!(
            Rgba::from_rgba(0x11223344, false),
            Rgba::new(0x11, 0x22, 0x33, 0xff)
        );
    }

    #[test]
    fn test_premultiplied() {
        assert_eq!(Rgba::new(200, 100, 0, 255).premultiplied(), [200, 100, 0]);
        assert_eq!(Rgba::new(200, 100, 0, 0).premultiplied(), [0, 0, 0]);
        assert_eq!(Rgba::new(255, 255, 255, 128).premultiplied(), [128, 128, 128]);
    }
}
