use std::sync::{Arc, OnceLock};

use crate::class::DeviceClass;
use crate::controller::{button, rumble, stick, trigger};
use crate::controller::{ButtonState, RumbleState, StickState, TriggerState};
use crate::error::ValidationError;
use crate::feature::Feature;

/// Xbox-style gamepad: feature table and typed handles.
#[derive(Debug)]
pub struct XboxController {
    pub class: Arc<DeviceClass>,

    pub a: Feature<ButtonState>,
    pub b: Feature<ButtonState>,
    pub x: Feature<ButtonState>,
    pub y: Feature<ButtonState>,
    pub lb: Feature<ButtonState>,
    pub rb: Feature<ButtonState>,
    pub back: Feature<ButtonState>,
    pub start: Feature<ButtonState>,
    pub guide: Feature<ButtonState>,
    pub l_thumb: Feature<ButtonState>,
    pub r_thumb: Feature<ButtonState>,
    pub up: Feature<ButtonState>,
    pub down: Feature<ButtonState>,
    pub left: Feature<ButtonState>,
    pub right: Feature<ButtonState>,

    pub ls: Feature<StickState>,
    pub rs: Feature<StickState>,
    pub lt: Feature<TriggerState>,
    pub rt: Feature<TriggerState>,

    /// Low-frequency (left) motor.
    pub rumble_coarse: Feature<RumbleState>,
    /// High-frequency (right) motor.
    pub rumble_fine: Feature<RumbleState>,
}

impl XboxController {
    pub const CLASS_ID: &'static str = "xbox";

    fn build() -> Result<Self, ValidationError> {
        let mut c = DeviceClass::builder(Self::CLASS_ID);
        let a = c.declare(button("a")?);
        let b = c.declare(button("b")?);
        let x = c.declare(button("x")?);
        let y = c.declare(button("y")?);
        let lb = c.declare(button("lb")?);
        let rb = c.declare(button("rb")?);
        let back = c.declare(button("back")?);
        let start = c.declare(button("start")?);
        let guide = c.declare(button("guide")?);
        let l_thumb = c.declare(button("l_thumb")?);
        let r_thumb = c.declare(button("r_thumb")?);
        let up = c.declare(button("dpad_up")?);
        let down = c.declare(button("dpad_down")?);
        let left = c.declare(button("dpad_left")?);
        let right = c.declare(button("dpad_right")?);
        let ls = c.declare(stick("ls")?);
        let rs = c.declare(stick("rs")?);
        let lt = c.declare(trigger("lt")?);
        let rt = c.declare(trigger("rt")?);
        let rumble_coarse = c.declare(rumble("rumble_coarse")?);
        let rumble_fine = c.declare(rumble("rumble_fine")?);

        Ok(Self {
            class: c.build()?,
            a,
            b,
            x,
            y,
            lb,
            rb,
            back,
            start,
            guide,
            l_thumb,
            r_thumb,
            up,
            down,
            left,
            right,
            ls,
            rs,
            lt,
            rt,
            rumble_coarse,
            rumble_fine,
        })
    }
}

/// Shared Xbox class table.
pub fn xbox() -> &'static XboxController {
    static XBOX: OnceLock<XboxController> = OnceLock::new();
    XBOX.get_or_init(|| match XboxController::build() {
        Ok(table) => table,
        Err(e) => panic!("built-in Xbox class table is invalid: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_shared() {
        assert!(std::ptr::eq(xbox(), xbox()));
        assert_eq!(xbox().class.id(), "xbox");
        assert_eq!(xbox().class.features().len(), 21);
        assert!(xbox().class.declares(xbox().rumble_fine.key()));
    }
}
