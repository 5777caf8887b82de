//! Fixed-offset HID report decoding.
//!
//! A [`HidReportLayout`] says where each feature of a class lives in a raw
//! input report (byte offsets and bit masks) and where outputs go in the
//! output report. Decoding is pure, so layouts are tested without hardware.
//!
//! Offsets count from the first byte returned by the read, which is the
//! report id when the device numbers its reports.
//!
//! Sticks are unsigned bytes centered on `0x80` with `y` pointing down. The
//! D-pad is a hat nibble: `0` up, clockwise to `7` up-left, `8` neutral.

use std::sync::{Arc, OnceLock};

use thiserror::Error;

use crate::class::DeviceClass;
use crate::controller::{
    ps4, ButtonState, LightbarState, RumbleState, StickPos, StickState, TriggerState,
};
use crate::error::BoxError;
use crate::feature::Feature;
use crate::pressable::Direction;
use crate::registry::MappedFeatureRegistry;

/// Sony's USB vendor id.
pub const SONY_VID: u16 = 0x054c;

/// DualShock 4 product ids (first revision, second revision, USB wireless
/// adaptor).
pub const DS4_PIDS: [u16; 3] = [0x05c4, 0x09cc, 0x0ba0];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReportError {
    #[error("offset {offset} past end of {len}-byte report")]
    OutOfRange { offset: usize, len: usize },

    #[error("unexpected report id {found:#04x} (want {want:#04x})")]
    ReportId { found: u8, want: u8 },
}

/// Where a button is read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ButtonSource {
    Bit { byte: usize, mask: u8 },
    /// Direction of the hat in the low nibble of `byte`.
    Hat { byte: usize, direction: Direction },
}

/// Bytes holding one stick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StickBytes {
    pub x: usize,
    pub y: usize,
}

/// One raw input report plus the output report being built.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct HidFrame {
    /// Empty while disconnected.
    pub input: Vec<u8>,
    pub output: Vec<u8>,
}

/// Output report shape.
#[derive(Clone, Debug)]
pub struct OutputReport {
    /// Template with the report id and enable flags already set.
    pub template: Vec<u8>,
    pub rumble: Vec<(Feature<RumbleState>, usize)>,
    /// Red, green, blue byte offsets.
    pub light: Option<(Feature<LightbarState>, [usize; 3])>,
}

/// Feature positions in a class's input and output reports.
#[derive(Debug)]
pub struct HidReportLayout {
    class: Arc<DeviceClass>,
    report_id: Option<u8>,
    report_len: usize,
    buttons: Vec<(Feature<ButtonState>, ButtonSource)>,
    sticks: Vec<(Feature<StickState>, StickBytes)>,
    triggers: Vec<(Feature<TriggerState>, usize)>,
    output: Option<OutputReport>,
}

impl HidReportLayout {
    pub fn new(class: Arc<DeviceClass>, report_len: usize) -> Self {
        Self {
            class,
            report_id: None,
            report_len,
            buttons: Vec::new(),
            sticks: Vec::new(),
            triggers: Vec::new(),
            output: None,
        }
    }

    /// Require byte 0 of every input report to be `id`.
    pub fn report_id(mut self, id: u8) -> Self {
        self.report_id = Some(id);
        self
    }

    pub fn bit(mut self, feature: &Feature<ButtonState>, byte: usize, mask: u8) -> Self {
        self.buttons
            .push((feature.clone(), ButtonSource::Bit { byte, mask }));
        self
    }

    pub fn hat(mut self, feature: &Feature<ButtonState>, byte: usize, direction: Direction) -> Self {
        self.buttons
            .push((feature.clone(), ButtonSource::Hat { byte, direction }));
        self
    }

    pub fn stick(mut self, feature: &Feature<StickState>, x: usize, y: usize) -> Self {
        self.sticks.push((feature.clone(), StickBytes { x, y }));
        self
    }

    pub fn trigger(mut self, feature: &Feature<TriggerState>, byte: usize) -> Self {
        self.triggers.push((feature.clone(), byte));
        self
    }

    pub fn output(mut self, output: OutputReport) -> Self {
        self.output = Some(output);
        self
    }

    pub fn class(&self) -> &Arc<DeviceClass> {
        &self.class
    }

    /// Input report length in bytes, report id included.
    pub fn report_len(&self) -> usize {
        self.report_len
    }

    pub fn input_report_id(&self) -> Option<u8> {
        self.report_id
    }

    /// Fresh output report, or empty if the class has no outputs.
    pub fn output_template(&self) -> Vec<u8> {
        self.output
            .as_ref()
            .map(|o| o.template.clone())
            .unwrap_or_default()
    }

    /// Whether `report` is an input report of this layout.
    pub fn accepts(&self, report: &[u8]) -> Result<(), ReportError> {
        match (self.report_id, report.first()) {
            (Some(want), Some(&found)) if found != want => Err(ReportError::ReportId { found, want }),
            _ => Ok(()),
        }
    }

    /// Register one update function per feature of the layout.
    pub fn map_features(&self, registry: &mut MappedFeatureRegistry<HidFrame>) {
        for (feature, source) in &self.buttons {
            registry.map_feature(feature, *source, update_button);
        }
        for (feature, bytes) in &self.sticks {
            registry.map_feature(feature, *bytes, update_stick);
        }
        for (feature, byte) in &self.triggers {
            registry.map_feature(feature, *byte, update_trigger);
        }
        if let Some(output) = &self.output {
            for (feature, byte) in &output.rumble {
                registry.map_feature(feature, *byte, update_rumble);
            }
            if let Some((feature, rgb)) = &output.light {
                registry.map_feature(feature, *rgb, update_light);
            }
        }
    }

    /// DualShock 4 over USB (input report `0x01`, output report `0x05`).
    pub fn ds4_usb() -> Arc<HidReportLayout> {
        static LAYOUT: OnceLock<Arc<HidReportLayout>> = OnceLock::new();
        Arc::clone(LAYOUT.get_or_init(|| {
            let p = ps4();
            let mut template = vec![0u8; 32];
            template[0] = 0x05;
            // Rumble and lightbar enable bits.
            template[1] = 0x07;
            Arc::new(
                HidReportLayout::new(Arc::clone(&p.class), 64)
                    .report_id(0x01)
                    .stick(&p.ls, 1, 2)
                    .stick(&p.rs, 3, 4)
                    .hat(&p.up, 5, Direction::Up)
                    .hat(&p.right, 5, Direction::Right)
                    .hat(&p.down, 5, Direction::Down)
                    .hat(&p.left, 5, Direction::Left)
                    .bit(&p.square, 5, 0x10)
                    .bit(&p.cross, 5, 0x20)
                    .bit(&p.circle, 5, 0x40)
                    .bit(&p.triangle, 5, 0x80)
                    .bit(&p.l1, 6, 0x01)
                    .bit(&p.r1, 6, 0x02)
                    .bit(&p.share, 6, 0x10)
                    .bit(&p.options, 6, 0x20)
                    .bit(&p.l3, 6, 0x40)
                    .bit(&p.r3, 6, 0x80)
                    .bit(&p.ps, 7, 0x01)
                    .bit(&p.tpad, 7, 0x02)
                    .trigger(&p.lt, 8)
                    .trigger(&p.rt, 9)
                    .output(OutputReport {
                        template,
                        rumble: vec![(p.rumble_weak.clone(), 4), (p.rumble_strong.clone(), 5)],
                        light: Some((p.lightbar.clone(), [6, 7, 8])),
                    }),
            )
        }))
    }
}

fn byte_at(report: &[u8], offset: usize) -> Result<u8, ReportError> {
    report.get(offset).copied().ok_or(ReportError::OutOfRange {
        offset,
        len: report.len(),
    })
}

fn slot_at(report: &mut [u8], offset: usize) -> Result<&mut u8, ReportError> {
    let len = report.len();
    report
        .get_mut(offset)
        .ok_or(ReportError::OutOfRange { offset, len })
}

/// Hat nibble to pressed state of `direction`.
pub fn hat_pressed(nibble: u8, direction: Direction) -> bool {
    match direction {
        Direction::Up => matches!(nibble, 7 | 0 | 1),
        Direction::Right => matches!(nibble, 1..=3),
        Direction::Down => matches!(nibble, 3..=5),
        Direction::Left => matches!(nibble, 5..=7),
    }
}

/// Unsigned byte centered on `0x80` to `[-1, 1]`.
pub fn axis_from_byte(v: u8) -> f32 {
    let centered = v as f32 - 128.0;
    if centered >= 0.0 {
        centered / 127.0
    } else {
        centered / 128.0
    }
}

fn update_button(s: &mut ButtonState, source: &ButtonSource, f: &mut HidFrame) -> Result<(), BoxError> {
    if f.input.is_empty() {
        s.set_pressed(false);
        return Ok(());
    }
    let pressed = match *source {
        ButtonSource::Bit { byte, mask } => byte_at(&f.input, byte)? & mask != 0,
        ButtonSource::Hat { byte, direction } => hat_pressed(byte_at(&f.input, byte)? & 0x0f, direction),
    };
    s.set_pressed(pressed);
    Ok(())
}

fn update_stick(s: &mut StickState, bytes: &StickBytes, f: &mut HidFrame) -> Result<(), BoxError> {
    if f.input.is_empty() {
        s.set_raw(StickPos::CENTER);
        return Ok(());
    }
    let x = axis_from_byte(byte_at(&f.input, bytes.x)?);
    let y = axis_from_byte(byte_at(&f.input, bytes.y)?);
    s.set_raw(StickPos::new(x, -y));
    Ok(())
}

fn update_trigger(s: &mut TriggerState, byte: &usize, f: &mut HidFrame) -> Result<(), BoxError> {
    let raw = if f.input.is_empty() {
        0
    } else {
        byte_at(&f.input, *byte)?
    };
    s.set_force(raw as f32 / 255.0);
    Ok(())
}

fn update_rumble(s: &mut RumbleState, byte: &usize, f: &mut HidFrame) -> Result<(), BoxError> {
    if f.output.is_empty() {
        return Ok(());
    }
    *slot_at(&mut f.output, *byte)? = (s.force() * 255.0).round() as u8;
    Ok(())
}

fn update_light(s: &mut LightbarState, rgb: &[usize; 3], f: &mut HidFrame) -> Result<(), BoxError> {
    if f.output.is_empty() {
        return Ok(());
    }
    for (offset, value) in rgb.iter().zip(s.color().premultiplied()) {
        *slot_at(&mut f.output, *offset)? = value;
    }
    Ok(())
}
