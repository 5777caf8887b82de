//! Mapping dispatch.
//!
//! A [`MappedFeatureRegistry`] binds each feature of a device class to an
//! adapter-specific *mapping descriptor* (where the value lives in the raw
//! frame) and an *update function* (how to move it between frame and state).
//! Adapters fill the registry once, in
//! [`DeviceAdapter::map_features`](crate::device::DeviceAdapter::map_features);
//! the owning [`InputDevice`](crate::device::InputDevice) then calls
//! [`dispatch`](MappedFeatureRegistry::dispatch) once per poll.
//!
//! # Semantics
//! - One entry per feature. Mapping a feature again replaces its entry in
//!   place (last write wins, original position kept).
//! - Dispatch runs every entry in registration order. A failing update is
//!   captured as a [`FeatureUpdateError`] and does not stop the pass.
//! - The frame is passed mutably so output features can write the values the
//!   adapter pushes to the hardware afterwards.
//!
//! ```
//! use stickhal::class::DeviceClass;
//! use stickhal::controller::{button, ButtonState};
//! use stickhal::registry::MappedFeatureRegistry;
//! use stickhal::store::StateStore;
//! use stickhal::device::DeviceId;
//!
//! struct Frame { bits: u8 }
//!
//! let mut builder = DeviceClass::builder("one_button");
//! let fire = builder.declare(button("fire")?);
//! let class = builder.build()?;
//!
//! let mut registry = MappedFeatureRegistry::<Frame>::new();
//! registry.map_feature(&fire, 0x01u8, |s: &mut ButtonState, mask: &u8, f: &mut Frame| {
//!     s.set_pressed(f.bits & mask != 0);
//!     Ok(())
//! });
//!
//! let mut store = StateStore::new(&class, DeviceId::next()).unwrap();
//! let errors = registry.dispatch(&mut store, &mut Frame { bits: 0x01 });
//! assert!(errors.is_empty());
//! assert!(store.get(&fire)?.raw_pressed());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::any::Any;
use std::fmt;

use crate::class::DeviceClass;
use crate::error::{BoxError, FeatureUpdateError, UnknownFeatureError, UnmappedFeatureError};
use crate::feature::{Feature, FeatureKey};
use crate::state::{AnyState, State};
use crate::store::StateStore;

type ErasedUpdate<F> = dyn Fn(&mut dyn AnyState, &dyn Any, &mut F) -> Result<(), BoxError> + Send;

struct MappedEntry<F> {
    key: FeatureKey,
    id: String,
    mapping: Box<dyn Any + Send>,
    update: Box<ErasedUpdate<F>>,
}

/// Registered `(feature, mapping, update)` entries for one device, over raw frames of type `F`.
pub struct MappedFeatureRegistry<F> {
    entries: Vec<MappedEntry<F>>,
}

#[derive(Debug, thiserror::Error)]
#[error("state or mapping does not have the type registered for feature {0:?}")]
struct MappingTypeError(String);

impl<F: 'static> MappedFeatureRegistry<F> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Bind `feature` to `mapping` and `update`.
    pub fn map_feature<S, M, U>(&mut self, feature: &Feature<S>, mapping: M, update: U)
    where
        S: State,
        M: Send + 'static,
        U: Fn(&mut S, &M, &mut F) -> Result<(), BoxError> + Send + 'static,
    {
        let id = feature.id().to_string();
        let err_id = id.clone();
        let erased: Box<ErasedUpdate<F>> = Box::new(
            move |state: &mut dyn AnyState, mapping: &dyn Any, frame: &mut F| {
                let state = state.as_any_mut().downcast_mut::<S>();
                let mapping = mapping.downcast_ref::<M>();
                match (state, mapping) {
                    (Some(state), Some(mapping)) => update(state, mapping, frame),
                    _ => Err(MappingTypeError(err_id.clone()).into()),
                }
            },
        );

        let entry = MappedEntry {
            key: feature.key(),
            id,
            mapping: Box::new(mapping),
            update: erased,
        };

        match self.entries.iter_mut().find(|e| e.key == entry.key) {
            Some(slot) => {
                log::debug!("remapping feature {:?}", entry.id);
                *slot = entry;
            }
            None => self.entries.push(entry),
        }
    }

    /// Drop the entry for `feature`. Returns whether one existed.
    pub fn unmap_feature<S>(&mut self, feature: &Feature<S>) -> bool {
        let before = self.entries.len();
        self.entries.retain(|e| e.key != feature.key());
        before != self.entries.len()
    }

    pub fn is_mapped<S>(&self, feature: &Feature<S>) -> bool {
        self.entries.iter().any(|e| e.key == feature.key())
    }

    /// Mapping descriptor registered for `feature`, if it has type `M`.
    pub fn mapping<S, M: 'static>(&self, feature: &Feature<S>) -> Option<&M> {
        self.entries
            .iter()
            .find(|e| e.key == feature.key())
            .and_then(|e| e.mapping.downcast_ref::<M>())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Mapped feature ids, in registration order.
    pub fn feature_ids(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.id.as_str())
    }

    /// Features `class` declares that have no entry here.
    pub fn unmapped(&self, class: &DeviceClass) -> Vec<UnmappedFeatureError> {
        class
            .features()
            .iter()
            .filter(|f| !self.entries.iter().any(|e| e.key == f.key()))
            .map(|f| UnmappedFeatureError {
                feature: f.id().to_string(),
            })
            .collect()
    }

    /// Run every update function against `frame`, in registration order.
    ///
    /// Returns the failures of this pass; an empty vector means every mapped
    /// feature was updated.
    pub fn dispatch(&self, store: &mut StateStore, frame: &mut F) -> Vec<FeatureUpdateError> {
        let mut errors = Vec::new();
        for entry in &self.entries {
            let result = match store.get_by_key_mut(entry.key) {
                Some(state) => (entry.update)(state, entry.mapping.as_ref(), frame),
                None => Err(Box::new(UnknownFeatureError {
                    class: store.class().to_string(),
                    feature: entry.id.clone(),
                }) as BoxError),
            };
            if let Err(source) = result {
                errors.push(FeatureUpdateError {
                    feature: entry.id.clone(),
                    source,
                });
            }
        }
        errors
    }
}

impl<F: 'static> Default for MappedFeatureRegistry<F> {
    fn default() -> Self {
        Self::new()
    }
}

impl<F> fmt::Debug for MappedFeatureRegistry<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|e| &e.id))
            .finish()
    }
}
