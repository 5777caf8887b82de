use crate::pressable::{PressTracker, Pressable, SettleCtx};
use crate::state::{State, StateBinding, StateValue};

/// Digital button.
///
/// The update path writes the sampled flag with [`set_pressed`](Self::set_pressed);
/// edges become visible through [`Pressable`] once the poll settles.
#[derive(Clone, Debug)]
pub struct ButtonState {
    binding: StateBinding,
    pressed: bool,
    tracker: PressTracker,
}

impl ButtonState {
    pub fn new(binding: StateBinding) -> Self {
        Self {
            binding,
            pressed: false,
            tracker: PressTracker::default(),
        }
    }

    /// Flag written by the last update. Unlike [`Pressable::is_pressed`]
    /// this changes before the poll settles.
    pub fn raw_pressed(&self) -> bool {
        self.pressed
    }

    pub fn set_pressed(&mut self, pressed: bool) {
        self.pressed = pressed;
    }
}

impl State for ButtonState {
    fn binding(&self) -> &StateBinding {
        &self.binding
    }

    fn settle(&mut self, ctx: &mut SettleCtx) {
        ctx.track(&mut self.tracker, None, self.pressed);
    }

    fn value(&self) -> StateValue {
        StateValue::Button {
            pressed: self.pressed,
        }
    }
}

impl Pressable for ButtonState {
    fn tracker(&self) -> &PressTracker {
        &self.tracker
    }
}
