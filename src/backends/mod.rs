//! Device backends.
//!
//! - [`joystick`]: flat button/axis sources (GLFW-style) through a layout.
//! - [`virtual_input`]: scriptable pads and discovery for tests and demos.
//! - [`xinput`]: Xbox controllers through XInput (Windows).
//! - [`hid`]: raw HID reports; device discovery needs the `hid` feature.

pub mod hid;
pub mod joystick;
pub mod virtual_input;
pub mod xinput;
