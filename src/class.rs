//! Device classes.
//!
//! A [`DeviceClass`] is the static table of features shared by every device of
//! one model. It is assembled once through [`DeviceClassBuilder`], validated on
//! [`build`](DeviceClassBuilder::build), and then shared behind an `Arc`.
//!
//! ```
//! use stickhal::class::DeviceClass;
//! use stickhal::controller::{button, stick};
//!
//! let mut builder = DeviceClass::builder("arcade");
//! let fire = builder.declare(button("fire")?);
//! let stick = builder.declare(stick("stick")?);
//! let class = builder.build()?;
//!
//! assert_eq!(class.id(), "arcade");
//! assert!(class.declares(fire.key()));
//! assert!(class.feature("stick").is_some());
//! # let _ = stick;
//! # Ok::<(), stickhal::error::ValidationError>(())
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::ValidationError;
use crate::feature::{validate_id, AnyFeature, Feature, FeatureKey};
use crate::pressable::DEFAULT_PRESS_THRESHOLD;
use crate::state::State;

/// Validated feature table of one device model.
#[derive(Debug)]
pub struct DeviceClass {
    id: String,
    features: Vec<Arc<dyn AnyFeature>>,
    by_id: HashMap<String, usize>,
    press_threshold: f32,
}

impl DeviceClass {
    pub fn builder(id: impl Into<String>) -> DeviceClassBuilder {
        DeviceClassBuilder {
            id: id.into(),
            features: Vec::new(),
            press_threshold: DEFAULT_PRESS_THRESHOLD,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Declared features, in declaration order.
    pub fn features(&self) -> &[Arc<dyn AnyFeature>] {
        &self.features
    }

    pub fn feature(&self, id: &str) -> Option<&Arc<dyn AnyFeature>> {
        self.by_id.get(id).map(|&i| &self.features[i])
    }

    /// Whether the feature with this key belongs to the class.
    pub fn declares(&self, key: FeatureKey) -> bool {
        self.features.iter().any(|f| f.key() == key)
    }

    /// Default threshold for deriving presses from analog values.
    pub fn press_threshold(&self) -> f32 {
        self.press_threshold
    }
}

/// Collects feature declarations for a [`DeviceClass`].
pub struct DeviceClassBuilder {
    id: String,
    features: Vec<Arc<dyn AnyFeature>>,
    press_threshold: f32,
}

impl DeviceClassBuilder {
    /// Add a feature to the table and hand back a typed handle to it.
    pub fn declare<S: State>(&mut self, feature: Feature<S>) -> Feature<S> {
        self.features.push(Arc::new(feature.clone()));
        feature
    }

    pub fn press_threshold(&mut self, threshold: f32) -> &mut Self {
        self.press_threshold = threshold;
        self
    }

    pub fn build(self) -> Result<Arc<DeviceClass>, ValidationError> {
        validate_id(&self.id)?;
        validate_threshold(self.press_threshold)?;

        let mut by_id = HashMap::with_capacity(self.features.len());
        for (i, feature) in self.features.iter().enumerate() {
            if by_id.insert(feature.id().to_string(), i).is_some() {
                return Err(ValidationError::DuplicateFeature {
                    class: self.id,
                    feature: feature.id().to_string(),
                });
            }
        }

        Ok(Arc::new(DeviceClass {
            id: self.id,
            features: self.features,
            by_id,
            press_threshold: self.press_threshold,
        }))
    }
}

/// Thresholds must lie in `(0.0, 1.0]`.
pub fn validate_threshold(threshold: f32) -> Result<(), ValidationError> {
    if threshold > 0.0 && threshold <= 1.0 {
        Ok(())
    } else {
        Err(ValidationError::PressThreshold(threshold))
    }
}
