//! Feature declarations.
//!
//! A [`Feature`] describes one capability of a device class (a button, an
//! analog stick, a rumble motor, ...). Features are immutable and carry no
//! per-device data: they are declared once per class and shared by every
//! device of that class. The per-device value lives in a [`State`] created by
//! the feature's factory and owned by the device's
//! [`StateStore`](crate::store::StateStore).
//!
//! Equality is identity: two features compare equal only if one is a clone
//! of the other, even when their ids match.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::device::DeviceId;
use crate::error::{FeatureContractError, ValidationError};
use crate::state::{AnyState, State, StateBinding};

static NEXT_FEATURE_KEY: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of a declared feature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeatureKey(u64);

impl FeatureKey {
    fn next() -> Self {
        FeatureKey(NEXT_FEATURE_KEY.fetch_add(1, Ordering::Relaxed))
    }
}

/// Direction data travels for a feature.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeatureFlow {
    /// Sampled from the device (buttons, sticks, triggers).
    In,
    /// Written by the application and pushed to the device (rumble, lightbar).
    Out,
    Bidirectional,
}

impl FeatureFlow {
    /// Whether application code may mutate states of this flow.
    pub fn is_writable(self) -> bool {
        !matches!(self, FeatureFlow::In)
    }
}

/// Check a feature or class id: non-empty, no whitespace.
pub fn validate_id(id: &str) -> Result<(), ValidationError> {
    if id.is_empty() {
        return Err(ValidationError::EmptyId);
    }
    if id.chars().any(char::is_whitespace) {
        return Err(ValidationError::WhitespaceInId(id.to_string()));
    }
    Ok(())
}

type StateFactory<S> = dyn Fn(StateBinding) -> S + Send + Sync;

struct FeatureInner<S> {
    key: FeatureKey,
    id: String,
    flow: FeatureFlow,
    factory: Box<StateFactory<S>>,
}

/// Typed feature declaration producing states of type `S`.
pub struct Feature<S> {
    inner: Arc<FeatureInner<S>>,
}

impl<S: State> Feature<S> {
    /// Declare a feature.
    ///
    /// `factory` receives the binding for the new state and must store it
    /// unchanged; [`create_verified_state`](Self::create_verified_state)
    /// rejects states that report any other binding.
    pub fn new(
        id: impl Into<String>,
        flow: FeatureFlow,
        factory: impl Fn(StateBinding) -> S + Send + Sync + 'static,
    ) -> Result<Self, ValidationError> {
        let id = id.into();
        validate_id(&id)?;
        Ok(Self {
            inner: Arc::new(FeatureInner {
                key: FeatureKey::next(),
                id,
                flow,
                factory: Box::new(factory),
            }),
        })
    }

    /// Run the factory without checking the result.
    pub fn create_state(&self, device: DeviceId) -> S {
        (self.inner.factory)(StateBinding::new(device, self.inner.key))
    }

    /// Run the factory and check the new state is bound to exactly
    /// `device` and this feature.
    pub fn create_verified_state(&self, device: DeviceId) -> Result<S, FeatureContractError> {
        let state = self.create_state(device);
        let binding = *state.binding();
        if binding.device() != device {
            return Err(FeatureContractError::ForeignDevice {
                feature: self.inner.id.clone(),
                expected: device,
                found: binding.device(),
            });
        }
        if binding.feature() != self.inner.key {
            return Err(FeatureContractError::ForeignFeature {
                feature: self.inner.id.clone(),
            });
        }
        Ok(state)
    }
}

impl<S> Feature<S> {
    pub fn key(&self) -> FeatureKey {
        self.inner.key
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    pub fn flow(&self) -> FeatureFlow {
        self.inner.flow
    }
}

impl<S> Clone for Feature<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S> PartialEq for Feature<S> {
    fn eq(&self, other: &Self) -> bool {
        self.inner.key == other.inner.key
    }
}

impl<S> Eq for Feature<S> {}

impl<S> Hash for Feature<S> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.key.hash(state);
    }
}

impl<S> fmt::Debug for Feature<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Feature")
            .field("id", &self.inner.id)
            .field("flow", &self.inner.flow)
            .finish()
    }
}

/// Type-erased view of a [`Feature`], used by device class tables.
pub trait AnyFeature: Send + Sync {
    fn key(&self) -> FeatureKey;
    fn id(&self) -> &str;
    fn flow(&self) -> FeatureFlow;
    fn create_verified_any(&self, device: DeviceId)
        -> Result<Box<dyn AnyState>, FeatureContractError>;
}

impl<S: State> AnyFeature for Feature<S> {
    fn key(&self) -> FeatureKey {
        self.inner.key
    }

    fn id(&self) -> &str {
        &self.inner.id
    }

    fn flow(&self) -> FeatureFlow {
        self.inner.flow
    }

    fn create_verified_any(
        &self,
        device: DeviceId,
    ) -> Result<Box<dyn AnyState>, FeatureContractError> {
        Ok(Box::new(self.create_verified_state(device)?))
    }
}

impl fmt::Debug for dyn AnyFeature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AnyFeature")
            .field("id", &self.id())
            .field("flow", &self.flow())
            .finish()
    }
}
