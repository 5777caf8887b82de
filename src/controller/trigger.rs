use crate::pressable::{PressTracker, Pressable, SettleCtx};
use crate::state::{State, StateBinding, StateValue};

/// Analog trigger, `0.0` released to `1.0` fully pulled.
///
/// Counts as pressed once the force reaches the press threshold.
#[derive(Clone, Debug)]
pub struct TriggerState {
    binding: StateBinding,
    force: f32,
    tracker: PressTracker,
}

impl TriggerState {
    pub fn new(binding: StateBinding) -> Self {
        Self {
            binding,
            force: 0.0,
            tracker: PressTracker::default(),
        }
    }

    pub fn force(&self) -> f32 {
        self.force
    }

    /// Store `force`, clamped to `[0, 1]`. NaN reads as released.
    pub fn set_force(&mut self, force: f32) {
        self.force = if force.is_nan() {
            0.0
        } else {
            force.clamp(0.0, 1.0)
        };
    }
}

impl State for TriggerState {
    fn binding(&self) -> &StateBinding {
        &self.binding
    }

    fn settle(&mut self, ctx: &mut SettleCtx) {
        let pressed = self.force >= ctx.press_threshold();
        ctx.track(&mut self.tracker, None, pressed);
    }

    fn value(&self) -> StateValue {
        StateValue::Trigger { force: self.force }
    }
}

impl Pressable for TriggerState {
    fn tracker(&self) -> &PressTracker {
        &self.tracker
    }
}
