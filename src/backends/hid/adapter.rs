//! [`DeviceAdapter`] over a stream of raw HID reports.

use std::fmt;
use std::sync::Arc;

use super::report::{HidFrame, HidReportLayout};
use crate::device::DeviceAdapter;
use crate::error::{AdapterError, BoxError};
use crate::metadata::DeviceMeta;
use crate::registry::MappedFeatureRegistry;

/// Maximum number of reports drained per poll.
///
/// Keeps a device that produces reports faster than the host polls from
/// starving the rest of the pass.
pub const MAX_REPORTS_PER_TICK: usize = 32;

/// Non-blocking report I/O.
pub trait ReportSource: 'static {
    /// Read one report into `buf`. `Ok(0)` means nothing is pending.
    fn read_report(&mut self, buf: &mut [u8]) -> Result<usize, BoxError>;

    fn write_report(&mut self, report: &[u8]) -> Result<(), BoxError>;
}

/// Device driven by the reports of `R`, decoded with a [`HidReportLayout`].
///
/// The newest accepted report of each poll wins; reports with a foreign
/// report id are skipped. A read error marks the device as lost, so it
/// reads neutral until its seeker drops it.
pub struct HidAdapter<R: ReportSource> {
    source: R,
    layout: Arc<HidReportLayout>,
    name: String,
    meta: DeviceMeta,
    buf: Vec<u8>,
    last: Vec<u8>,
    sent: Vec<u8>,
    lost: bool,
}

impl<R: ReportSource> HidAdapter<R> {
    pub fn new(source: R, layout: Arc<HidReportLayout>, name: impl Into<String>, meta: DeviceMeta) -> Self {
        let buf = vec![0u8; layout.report_len()];
        Self {
            source,
            layout,
            name: name.into(),
            meta,
            buf,
            last: Vec::new(),
            sent: Vec::new(),
            lost: false,
        }
    }

    pub fn source(&self) -> &R {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut R {
        &mut self.source
    }

    pub fn layout(&self) -> &Arc<HidReportLayout> {
        &self.layout
    }

    /// Most recent accepted input report.
    pub fn last_report(&self) -> &[u8] {
        &self.last
    }
}

impl<R: ReportSource> DeviceAdapter for HidAdapter<R> {
    type Frame = HidFrame;

    fn map_features(&self, registry: &mut MappedFeatureRegistry<HidFrame>) {
        self.layout.map_features(registry);
    }

    fn is_connected(&mut self) -> bool {
        !self.lost
    }

    fn sample_frame(&mut self) -> Result<HidFrame, AdapterError> {
        for _ in 0..MAX_REPORTS_PER_TICK {
            match self.source.read_report(&mut self.buf) {
                Ok(0) => break,
                Ok(n) => {
                    let report = &self.buf[..n.min(self.buf.len())];
                    match self.layout.accepts(report) {
                        Ok(()) => self.last = report.to_vec(),
                        Err(e) => log::trace!("{}: skipping report: {e}", self.name),
                    }
                }
                Err(e) => {
                    self.lost = true;
                    self.sent.clear();
                    return Err(AdapterError::Sample(e));
                }
            }
        }
        Ok(HidFrame {
            input: self.last.clone(),
            output: self.layout.output_template(),
        })
    }

    fn apply_outputs(&mut self, frame: &HidFrame) -> Result<(), AdapterError> {
        if frame.output.is_empty() || frame.output == self.sent {
            return Ok(());
        }
        self.source
            .write_report(&frame.output)
            .map_err(AdapterError::Output)?;
        self.sent = frame.output.clone();
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn meta(&self) -> DeviceMeta {
        self.meta.clone()
    }
}

impl<R: ReportSource> fmt::Debug for HidAdapter<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HidAdapter")
            .field("name", &self.name)
            .field("class", &self.layout.class().id())
            .field("lost", &self.lost)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    use crate::controller::{ps4, Rgba};
    use crate::device::{Device, InputDevice};
    use crate::pressable::{Direction, Pressable};

    #[derive(Default)]
    struct Scripted {
        pending: VecDeque<Result<Vec<u8>, String>>,
        written: Vec<Vec<u8>>,
    }

    impl ReportSource for Scripted {
        fn read_report(&mut self, buf: &mut [u8]) -> Result<usize, BoxError> {
            match self.pending.pop_front() {
                None => Ok(0),
                Some(Err(e)) => Err(e.into()),
                Some(Ok(report)) => {
                    buf[..report.len()].copy_from_slice(&report);
                    Ok(report.len())
                }
            }
        }

        fn write_report(&mut self, report: &[u8]) -> Result<(), BoxError> {
            self.written.push(report.to_vec());
            Ok(())
        }
    }

    fn neutral() -> Vec<u8> {
        let mut r = vec![0u8; 64];
        r[0] = 0x01;
        r[1..5].copy_from_slice(&[0x80; 4]);
        r[5] = 0x08;
        r
    }

    fn device(reports: Vec<Result<Vec<u8>, String>>) -> InputDevice<HidAdapter<Scripted>> {
        let layout = HidReportLayout::ds4_usb();
        let source = Scripted {
            pending: reports.into(),
            written: Vec::new(),
        };
        let adapter = HidAdapter::new(source, Arc::clone(&layout), "Wireless Controller", DeviceMeta::default());
        InputDevice::new(Arc::clone(layout.class()), adapter).unwrap()
    }

    #[test]
    fn test_decodes_ds4_report() {
        let mut r = neutral();
        r[1] = 0x00; // ls full left
        r[4] = 0x00; // rs full up
        r[5] = 0x02 | 0x20; // hat right, cross
        r[6] = 0x01 | 0x20; // l1, options
        r[7] = 0x01; // ps
        r[9] = 0xff;
        let mut dev = device(vec![Ok(r)]);
        dev.poll().unwrap();

        let p = ps4();
        assert!(dev.state(&p.cross).unwrap().is_pressed());
        assert!(dev.state(&p.right).unwrap().is_pressed());
        assert!(!dev.state(&p.up).unwrap().is_pressed());
        assert!(dev.state(&p.l1).unwrap().is_pressed());
        assert!(dev.state(&p.options).unwrap().is_pressed());
        assert!(dev.state(&p.ps).unwrap().is_pressed());
        assert!(dev.state(&p.ls).unwrap().is_pressed(Direction::Left));
        assert!(dev.state(&p.rs).unwrap().is_pressed(Direction::Up));
        assert_eq!(dev.state(&p.rt).unwrap().force(), 1.0);
        assert_eq!(dev.state(&p.lt).unwrap().force(), 0.0);
    }

    #[test]
    fn test_newest_report_wins_and_foreign_ids_skipped() {
        let mut first = neutral();
        first[5] = 0x08 | 0x10;
        let mut foreign = neutral();
        foreign[0] = 0x11;
        foreign[5] = 0x08 | 0x80;
        let mut dev = device(vec![Ok(neutral()), Ok(first), Ok(foreign)]);
        dev.poll().unwrap();

        let p = ps4();
        assert!(dev.state(&p.square).unwrap().is_pressed());
        assert!(!dev.state(&p.triangle).unwrap().is_pressed());

        // No new reports: the last one still holds.
        dev.poll().unwrap();
        assert!(dev.state(&p.square).unwrap().is_pressed());
    }

    #[test]
    fn test_outputs_written_on_change() {
        let mut dev = device(vec![Ok(neutral())]);
        let p = ps4();
        dev.state_mut(&p.rumble_strong).unwrap().set_force(1.0);
        dev.state_mut(&p.lightbar).unwrap().set_color(Rgba::from_rgb(0x0000ff));
        dev.poll().unwrap();
        dev.poll().unwrap();

        let written = &dev.adapter().source().written;
        assert_eq!(written.len(), 1);
        assert_eq!(written[0][0], 0x05);
        assert_eq!(written[0][4], 0);
        assert_eq!(written[0][5], 0xff);
        assert_eq!(&written[0][6..9], &[0, 0, 0xff]);
    }

    #[test]
    fn test_read_error_marks_device_lost() {
        let mut held = neutral();
        held[5] = 0x08 | 0x20;
        let mut dev = device(vec![Ok(held), Ok(Vec::new()), Err("device unplugged".into())]);
        dev.poll().unwrap();
        assert!(dev.state(&ps4().cross).unwrap().is_pressed());

        let report = dev.poll().unwrap_err();
        assert_eq!(report.adapter.len(), 1);
        assert!(dev.state(&ps4().cross).unwrap().is_pressed());

        dev.poll().unwrap();
        assert!(!dev.is_connected());
        assert!(!dev.state(&ps4().cross).unwrap().is_pressed());
    }
}
