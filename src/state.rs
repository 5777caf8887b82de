//! Per-device feature state.
//!
//! A state holds the current value of one feature on one device. Each state
//! carries a [`StateBinding`] naming the device and the feature that created
//! it; the binding is fixed at creation and checked by
//! [`Feature::create_verified_state`](crate::feature::Feature::create_verified_state).
//!
//! States are owned by a [`StateStore`](crate::store::StateStore). Application
//! code reads them through shared references; only the poll path (mapping
//! dispatch and [`State::settle`]) mutates input states.

use std::any::Any;

use serde::Serialize;

use crate::controller::{Rgba, StickPos};
use crate::device::DeviceId;
use crate::feature::FeatureKey;
use crate::pressable::SettleCtx;

/// Identity of a state: the device and feature it belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct StateBinding {
    device: DeviceId,
    feature: FeatureKey,
}

impl StateBinding {
    pub fn new(device: DeviceId, feature: FeatureKey) -> Self {
        Self { device, feature }
    }

    pub fn device(&self) -> DeviceId {
        self.device
    }

    pub fn feature(&self) -> FeatureKey {
        self.feature
    }
}

/// Behavior shared by all feature states.
pub trait State: Any + Send {
    /// Binding recorded at creation.
    fn binding(&self) -> &StateBinding;

    /// Derive press/release edges from the value written by this poll.
    ///
    /// Called once per poll, after mapping dispatch. States without a
    /// pressed notion keep the default no-op.
    fn settle(&mut self, _ctx: &mut SettleCtx) {}

    /// Serializable copy of the current value.
    fn value(&self) -> StateValue;
}

/// Object-safe view of a [`State`] that can be downcast to its concrete type.
pub trait AnyState: State {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<S: State> AnyState for S {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Plain value of a state, used by snapshots.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StateValue {
    Button { pressed: bool },
    Stick { raw: StickPos, calibrated: StickPos },
    Trigger { force: f32 },
    Rumble { force: f32 },
    Lightbar { color: Rgba },
}
