//! Raw HID backend.
//!
//! [`report`] decodes fixed-offset reports and [`adapter`] turns a report
//! stream into a device. Both are platform independent. With the `hid`
//! feature, [`HidDiscovery`] finds and opens devices through `hidapi`.

pub mod adapter;
pub mod report;

#[cfg(feature = "hid")]
mod hidapi_backend;

pub use adapter::{HidAdapter, ReportSource, MAX_REPORTS_PER_TICK};
pub use report::{HidFrame, HidReportLayout, ReportError};

#[cfg(feature = "hid")]
pub use hidapi_backend::HidDiscovery;
