//! Concrete feature states and built-in controller classes.
//!
//! The constructor functions ([`button`], [`stick`], [`trigger`], [`rumble`],
//! [`lightbar`]) declare features whose factories create the matching state
//! type. [`xbox()`], [`ps4()`], [`gc()`], [`joycon_left()`] and
//! [`joycon_right()`] return the shared class tables of the built-in
//! controller models.

mod button;
mod gc;
mod joycon;
mod output;
mod ps4;
mod stick;
mod trigger;
mod xbox;

pub use button::ButtonState;
pub use gc::{gc, GcController};
pub use joycon::{joycon_left, joycon_right, JoyCon};
pub use output::{LightbarState, Rgba, RumbleState};
pub use ps4::{ps4, Ps4Controller};
pub use stick::{StickCalibration, StickPos, StickState};
pub use trigger::TriggerState;
pub use xbox::{xbox, XboxController};

use crate::error::ValidationError;
use crate::feature::{Feature, FeatureFlow};

/// Digital button (input).
pub fn button(id: &str) -> Result<Feature<ButtonState>, ValidationError> {
    Feature::new(id, FeatureFlow::In, ButtonState::new)
}

/// Analog stick with four virtual directional buttons (input).
pub fn stick(id: &str) -> Result<Feature<StickState>, ValidationError> {
    Feature::new(id, FeatureFlow::In, StickState::new)
}

/// Analog trigger (input).
pub fn trigger(id: &str) -> Result<Feature<TriggerState>, ValidationError> {
    Feature::new(id, FeatureFlow::In, TriggerState::new)
}

/// Rumble motor (output).
pub fn rumble(id: &str) -> Result<Feature<RumbleState>, ValidationError> {
    Feature::new(id, FeatureFlow::Out, RumbleState::new)
}

/// RGB(A) light (output).
pub fn lightbar(id: &str) -> Result<Feature<LightbarState>, ValidationError> {
    Feature::new(id, FeatureFlow::Out, LightbarState::new)
}
