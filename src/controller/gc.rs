use std::sync::{Arc, OnceLock};

use crate::class::DeviceClass;
use crate::controller::{button, rumble, stick, trigger};
use crate::controller::{ButtonState, RumbleState, StickState, TriggerState};
use crate::error::ValidationError;
use crate::feature::Feature;

/// GameCube controller.
#[derive(Debug)]
pub struct GcController {
    pub class: Arc<DeviceClass>,

    pub a: Feature<ButtonState>,
    pub b: Feature<ButtonState>,
    pub x: Feature<ButtonState>,
    pub y: Feature<ButtonState>,
    pub start: Feature<ButtonState>,
    pub z: Feature<ButtonState>,
    /// Digital click at the end of the R trigger travel.
    pub r: Feature<ButtonState>,
    pub l: Feature<ButtonState>,
    pub up: Feature<ButtonState>,
    pub down: Feature<ButtonState>,
    pub left: Feature<ButtonState>,
    pub right: Feature<ButtonState>,

    pub ls: Feature<StickState>,
    /// C stick.
    pub rs: Feature<StickState>,
    pub lt: Feature<TriggerState>,
    pub rt: Feature<TriggerState>,

    pub rumble: Feature<RumbleState>,
}

impl GcController {
    pub const CLASS_ID: &'static str = "gc";

    fn build() -> Result<Self, ValidationError> {
        let mut c = DeviceClass::builder(Self::CLASS_ID);
        let a = c.declare(button("a")?);
        let b = c.declare(button("b")?);
        let x = c.declare(button("x")?);
        let y = c.declare(button("y")?);
        let start = c.declare(button("start")?);
        let z = c.declare(button("z")?);
        let r = c.declare(button("r")?);
        let l = c.declare(button("l")?);
        let up = c.declare(button("dpad_up")?);
        let down = c.declare(button("dpad_down")?);
        let left = c.declare(button("dpad_left")?);
        let right = c.declare(button("dpad_right")?);
        let ls = c.declare(stick("ls")?);
        let rs = c.declare(stick("rs")?);
        let lt = c.declare(trigger("lt")?);
        let rt = c.declare(trigger("rt")?);
        let rumble = c.declare(rumble("rumble")?);

        Ok(Self {
            class: c.build()?,
            a,
            b,
            x,
            y,
            start,
            z,
            r,
            l,
            up,
            down,
            left,
            right,
            ls,
            rs,
            lt,
            rt,
            rumble,
        })
    }
}

/// Shared GameCube class table.
pub fn gc() -> &'static GcController {
    static GC: OnceLock<GcController> = OnceLock::new();
    GC.get_or_init(|| match GcController::build() {
        Ok(table) => table,
        Err(e) => panic!("built-in GameCube class table is invalid: {e}"),
    })
}
