use std::sync::{Arc, OnceLock};

use crate::class::DeviceClass;
use crate::controller::{button, stick, trigger};
use crate::controller::{ButtonState, StickState, TriggerState};
use crate::error::ValidationError;
use crate::feature::Feature;

/// One Joy-Con of a Switch pair.
///
/// Both halves share this shape; only the feature ids differ. Face buttons
/// are named by position. The stick's `z` axis reads `-1` while the stick is
/// clicked, and the shoulder trigger (ZL/ZR) is digital, so its force is
/// always `0` or `1`.
#[derive(Debug)]
pub struct JoyCon {
    pub class: Arc<DeviceClass>,

    pub north: Feature<ButtonState>,
    pub south: Feature<ButtonState>,
    pub west: Feature<ButtonState>,
    pub east: Feature<ButtonState>,
    pub sl: Feature<ButtonState>,
    pub sr: Feature<ButtonState>,
    /// L or R.
    pub shoulder: Feature<ButtonState>,
    /// Minus or plus.
    pub menu: Feature<ButtonState>,
    /// Capture or home.
    pub system: Feature<ButtonState>,

    pub stick: Feature<StickState>,
    /// ZL or ZR.
    pub trigger: Feature<TriggerState>,
}

struct Ids {
    class: &'static str,
    face: [&'static str; 4],
    shoulder: &'static str,
    menu: &'static str,
    system: &'static str,
    stick: &'static str,
    trigger: &'static str,
}

impl JoyCon {
    pub const LEFT_CLASS_ID: &'static str = "joycon_l";
    pub const RIGHT_CLASS_ID: &'static str = "joycon_r";

    fn build(ids: &Ids) -> Result<Self, ValidationError> {
        let mut c = DeviceClass::builder(ids.class);
        let [n, s, w, e] = ids.face;
        let north = c.declare(button(n)?);
        let south = c.declare(button(s)?);
        let west = c.declare(button(w)?);
        let east = c.declare(button(e)?);
        let sl = c.declare(button("sl")?);
        let sr = c.declare(button("sr")?);
        let shoulder = c.declare(button(ids.shoulder)?);
        let menu = c.declare(button(ids.menu)?);
        let system = c.declare(button(ids.system)?);
        let stick = c.declare(stick(ids.stick)?);
        let trigger = c.declare(trigger(ids.trigger)?);

        Ok(Self {
            class: c.build()?,
            north,
            south,
            west,
            east,
            sl,
            sr,
            shoulder,
            menu,
            system,
            stick,
            trigger,
        })
    }
}

/// Shared left Joy-Con class table.
pub fn joycon_left() -> &'static JoyCon {
    static LEFT: OnceLock<JoyCon> = OnceLock::new();
    LEFT.get_or_init(|| {
        let ids = Ids {
            class: JoyCon::LEFT_CLASS_ID,
            face: ["dpad_up", "dpad_down", "dpad_left", "dpad_right"],
            shoulder: "l",
            menu: "minus",
            system: "capture",
            stick: "ls",
            trigger: "zl",
        };
        match JoyCon::build(&ids) {
            Ok(table) => table,
            Err(e) => panic!("built-in left Joy-Con class table is invalid: {e}"),
        }
    })
}

/// Shared right Joy-Con class table.
pub fn joycon_right() -> &'static JoyCon {
    static RIGHT: OnceLock<JoyCon> = OnceLock::new();
    RIGHT.get_or_init(|| {
        let ids = Ids {
            class: JoyCon::RIGHT_CLASS_ID,
            face: ["x", "b", "y", "a"],
            shoulder: "r",
            menu: "plus",
            system: "home",
            stick: "rs",
            trigger: "zr",
        };
        match JoyCon::build(&ids) {
            Ok(table) => table,
            Err(e) => panic!("built-in right Joy-Con class table is invalid: {e}"),
        }
    })
}
