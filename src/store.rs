//! Per-device state storage.
//!
//! A [`StateStore`] owns exactly one state for every feature its device class
//! declares. All states are created and verified when the store is built, so a
//! store that exists is complete.
//!
//! Application code gets shared references through [`StateStore::get`]. Mutable
//! access is crate-private and used by the poll path only; output features are
//! written through [`InputDevice::state_mut`](crate::device::InputDevice::state_mut).
//!
//! A store is not synchronized. Callers sharing a device across threads must
//! provide their own locking.

use std::collections::HashMap;
use std::sync::Arc;

use crate::class::DeviceClass;
use crate::device::DeviceId;
use crate::error::{FeatureContractError, UnknownFeatureError};
use crate::feature::{AnyFeature, Feature, FeatureKey};
use crate::pressable::{PressEdge, SettleCtx};
use crate::state::{AnyState, State, StateValue};

struct StoreEntry {
    feature: Arc<dyn AnyFeature>,
    state: Box<dyn AnyState>,
}

/// Feature states of one device.
pub struct StateStore {
    class: String,
    entries: Vec<StoreEntry>,
    by_key: HashMap<FeatureKey, usize>,
}

impl StateStore {
    /// Create and verify one state per declared feature.
    pub fn new(class: &DeviceClass, device: DeviceId) -> Result<Self, FeatureContractError> {
        let mut entries = Vec::with_capacity(class.features().len());
        let mut by_key = HashMap::with_capacity(class.features().len());
        for feature in class.features() {
            let state = feature.create_verified_any(device)?;
            by_key.insert(feature.key(), entries.len());
            entries.push(StoreEntry {
                feature: Arc::clone(feature),
                state,
            });
        }
        Ok(Self {
            class: class.id().to_string(),
            entries,
            by_key,
        })
    }

    /// Id of the device class this store was built for.
    pub fn class(&self) -> &str {
        &self.class
    }

    fn unknown(&self, feature: &str) -> UnknownFeatureError {
        UnknownFeatureError {
            class: self.class.clone(),
            feature: feature.to_string(),
        }
    }

    /// Read the state of `feature`.
    pub fn get<S: State>(&self, feature: &Feature<S>) -> Result<&S, UnknownFeatureError> {
        self.by_key
            .get(&feature.key())
            .and_then(|&i| self.entries[i].state.as_any().downcast_ref::<S>())
            .ok_or_else(|| self.unknown(feature.id()))
    }

    pub(crate) fn get_mut<S: State>(
        &mut self,
        feature: &Feature<S>,
    ) -> Result<&mut S, UnknownFeatureError> {
        let Some(&i) = self.by_key.get(&feature.key()) else {
            return Err(self.unknown(feature.id()));
        };
        let class = &self.class;
        self.entries[i]
            .state
            .as_any_mut()
            .downcast_mut::<S>()
            .ok_or_else(|| UnknownFeatureError {
                class: class.clone(),
                feature: feature.id().to_string(),
            })
    }

    /// Look a state up by feature id, without knowing its type.
    pub fn get_any(&self, id: &str) -> Result<&dyn AnyState, UnknownFeatureError> {
        self.entries
            .iter()
            .find(|e| e.feature.id() == id)
            .map(|e| e.state.as_ref())
            .ok_or_else(|| self.unknown(id))
    }

    pub(crate) fn get_any_mut(&mut self, id: &str) -> Option<&mut dyn AnyState> {
        for entry in &mut self.entries {
            if entry.feature.id() == id {
                return Some(entry.state.as_mut());
            }
        }
        None
    }

    pub(crate) fn get_by_key_mut(&mut self, key: FeatureKey) -> Option<&mut dyn AnyState> {
        let i = *self.by_key.get(&key)?;
        Some(self.entries[i].state.as_mut())
    }

    pub fn contains(&self, key: FeatureKey) -> bool {
        self.by_key.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Run edge detection over every state, in declaration order.
    ///
    /// Returns the edges produced this poll, tagged with their feature id.
    pub(crate) fn settle(&mut self, press_threshold: f32) -> Vec<(String, PressEdge)> {
        let mut out = Vec::new();
        let mut ctx = SettleCtx::new(press_threshold);
        for entry in &mut self.entries {
            entry.state.settle(&mut ctx);
            for edge in ctx.take_edges() {
                out.push((entry.feature.id().to_string(), edge));
            }
        }
        out
    }

    /// `(feature id, value)` pairs in declaration order.
    pub fn values(&self) -> impl Iterator<Item = (&str, StateValue)> + '_ {
        self.entries
            .iter()
            .map(|e| (e.feature.id(), e.state.value()))
    }
}
