//! Device-agnostic game input.
//!
//! Application code talks to typed *features* (a button, a stick, a rumble
//! motor) declared once per device class. Backends sample raw frames and map
//! them onto feature states through a per-device registry of update
//! functions; seekers discover devices and keep the registered set current.
//!
//! ```
//! use stickhal::backends::virtual_input::{VirtualHub, VirtualPad};
//! use stickhal::controller::xbox;
//! use stickhal::seeker::DeviceSeeker;
//! use stickhal::Pressable;
//!
//! let hub = VirtualHub::xbox();
//! let pad = VirtualPad::new("pad");
//! hub.attach(pad.clone());
//!
//! let mut seeker = DeviceSeeker::new(hub);
//! seeker.poll().unwrap();
//! pad.press(0);
//! seeker.poll().unwrap();
//!
//! let dev = seeker.iter().next().unwrap();
//! let a = dev.state(&xbox().a).unwrap();
//! assert!(a.is_pressed());
//! ```
//!
//! Everything is single-threaded and driven by explicit `poll` calls.

pub mod backends;
pub mod class;
pub mod config;
pub mod controller;
pub mod device;
pub mod error;
pub mod event;
pub mod eventbus;
pub mod feature;
pub mod filtered_listener;
pub mod logger;
pub mod manager;
pub mod metadata;
pub mod pressable;
pub mod registry;
pub mod seeker;
pub mod snapshot;
pub mod state;
pub mod store;

pub use class::{DeviceClass, DeviceClassBuilder};
pub use device::{Device, DeviceAdapter, DeviceId, InputDevice};
pub use error::*;
pub use event::{InputEvent, InputKind};
pub use eventbus::{EventFilter, InputEventBus, InputListener};
pub use feature::{Feature, FeatureFlow};
pub use manager::Manager;
pub use pressable::{Direction, Pressable};
pub use registry::MappedFeatureRegistry;
pub use seeker::{DeviceSeeker, Discover, Seek};
pub use state::{State, StateValue};
pub use store::StateStore;
