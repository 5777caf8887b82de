use std::sync::{Arc, OnceLock};

use crate::class::DeviceClass;
use crate::controller::{button, lightbar, rumble, stick, trigger};
use crate::controller::{ButtonState, LightbarState, RumbleState, StickState, TriggerState};
use crate::error::ValidationError;
use crate::feature::Feature;

/// DualShock 4: feature table and typed handles.
#[derive(Debug)]
pub struct Ps4Controller {
    pub class: Arc<DeviceClass>,

    pub square: Feature<ButtonState>,
    pub cross: Feature<ButtonState>,
    pub circle: Feature<ButtonState>,
    pub triangle: Feature<ButtonState>,
    pub l1: Feature<ButtonState>,
    pub r1: Feature<ButtonState>,
    pub share: Feature<ButtonState>,
    pub options: Feature<ButtonState>,
    pub l3: Feature<ButtonState>,
    pub r3: Feature<ButtonState>,
    pub ps: Feature<ButtonState>,
    pub tpad: Feature<ButtonState>,
    pub up: Feature<ButtonState>,
    pub down: Feature<ButtonState>,
    pub left: Feature<ButtonState>,
    pub right: Feature<ButtonState>,

    pub ls: Feature<StickState>,
    pub rs: Feature<StickState>,
    /// L2.
    pub lt: Feature<TriggerState>,
    /// R2.
    pub rt: Feature<TriggerState>,

    pub rumble_strong: Feature<RumbleState>,
    pub rumble_weak: Feature<RumbleState>,
    pub lightbar: Feature<LightbarState>,
}

impl Ps4Controller {
    pub const CLASS_ID: &'static str = "ps4";

    fn build() -> Result<Self, ValidationError> {
        let mut c = DeviceClass::builder(Self::CLASS_ID);
        let square = c.declare(button("square")?);
        let cross = c.declare(button("cross")?);
        let circle = c.declare(button("circle")?);
        let triangle = c.declare(button("triangle")?);
        let l1 = c.declare(button("l1")?);
        let r1 = c.declare(button("r1")?);
        let share = c.declare(button("share")?);
        let options = c.declare(button("options")?);
        let l3 = c.declare(button("l3")?);
        let r3 = c.declare(button("r3")?);
        let ps = c.declare(button("ps")?);
        let tpad = c.declare(button("tpad")?);
        let up = c.declare(button("dpad_up")?);
        let down = c.declare(button("dpad_down")?);
        let left = c.declare(button("dpad_left")?);
        let right = c.declare(button("dpad_right")?);
        let ls = c.declare(stick("ls")?);
        let rs = c.declare(stick("rs")?);
        let lt = c.declare(trigger("l2")?);
        let rt = c.declare(trigger("r2")?);
        let rumble_strong = c.declare(rumble("rumble_strong")?);
        let rumble_weak = c.declare(rumble("rumble_weak")?);
        let lightbar = c.declare(lightbar("lightbar")?);

        Ok(Self {
            class: c.build()?,
            square,
            cross,
            circle,
            triangle,
            l1,
            r1,
            share,
            options,
            l3,
            r3,
            ps,
            tpad,
            up,
            down,
            left,
            right,
            ls,
            rs,
            lt,
            rt,
            rumble_strong,
            rumble_weak,
            lightbar,
        })
    }
}

/// Shared DualShock 4 class table.
pub fn ps4() -> &'static Ps4Controller {
    static PS4: OnceLock<Ps4Controller> = OnceLock::new();
    PS4.get_or_init(|| match Ps4Controller::build() {
        Ok(table) => table,
        Err(e) => panic!("built-in PS4 class table is invalid: {e}"),
    })
}
