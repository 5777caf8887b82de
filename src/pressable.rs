//! Press/release edge detection.
//!
//! Every boolean-valued state owns a [`PressTracker`] holding the pressed flag
//! of the previous and the current poll. Analog sticks own four of them, one
//! per [`Direction`], driven by comparing the calibrated position against the
//! press threshold.
//!
//! # Ordering
//! Trackers advance exactly once per poll, strictly after the mapping
//! dispatch wrote the new raw value and before application code reads the
//! frame. An edge is therefore visible for exactly one poll.
//!
//! # Thresholds
//! - `x <= -T` presses [`Direction::Left`], `x >= T` presses [`Direction::Right`]
//! - `y >= T` presses [`Direction::Up`], `y <= -T` presses [`Direction::Down`]
//!
//! `T` is the device class press threshold, [`DEFAULT_PRESS_THRESHOLD`] unless
//! overridden. No debouncing is applied.

use serde::{Deserialize, Serialize};

/// Press threshold used when neither the class nor the config sets one.
pub const DEFAULT_PRESS_THRESHOLD: f32 = 0.5;

/// Virtual directional button derived from an analog stick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Whether a stick at `(x, y)` presses this direction for threshold `t`.
    pub fn is_pressed_by(self, x: f32, y: f32, t: f32) -> bool {
        match self {
            Direction::Up => y >= t,
            Direction::Down => y <= -t,
            Direction::Left => x <= -t,
            Direction::Right => x >= t,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

/// A transition between two consecutive polls.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Edge {
    Pressed,
    Released,
}

/// Previous/current pressed flags of one boolean input.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PressTracker {
    previous: bool,
    current: bool,
}

impl PressTracker {
    /// Shift the current flag into history and record `pressed`.
    pub fn advance(&mut self, pressed: bool) -> Option<Edge> {
        self.previous = self.current;
        self.current = pressed;
        self.edge()
    }

    /// Edge between the last two recorded flags, if any.
    pub fn edge(&self) -> Option<Edge> {
        match (self.previous, self.current) {
            (false, true) => Some(Edge::Pressed),
            (true, false) => Some(Edge::Released),
            _ => None,
        }
    }

    pub fn is_pressed(&self) -> bool {
        self.current
    }

    pub fn just_pressed(&self) -> bool {
        !self.previous && self.current
    }

    pub fn just_released(&self) -> bool {
        self.previous && !self.current
    }
}

/// An edge emitted while settling one state.
///
/// `direction` is `Some` for stick directions and `None` for plain buttons
/// and triggers.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PressEdge {
    pub direction: Option<Direction>,
    pub edge: Edge,
}

/// Context handed to [`State::settle`](crate::state::State::settle).
#[derive(Debug)]
pub struct SettleCtx {
    press_threshold: f32,
    edges: Vec<PressEdge>,
}

impl SettleCtx {
    pub fn new(press_threshold: f32) -> Self {
        Self {
            press_threshold,
            edges: Vec::new(),
        }
    }

    pub fn press_threshold(&self) -> f32 {
        self.press_threshold
    }

    /// Advance `tracker` and record the resulting edge.
    pub fn track(&mut self, tracker: &mut PressTracker, direction: Option<Direction>, pressed: bool) {
        if let Some(edge) = tracker.advance(pressed) {
            self.edges.push(PressEdge { direction, edge });
        }
    }

    pub(crate) fn take_edges(&mut self) -> Vec<PressEdge> {
        std::mem::take(&mut self.edges)
    }
}

/// States with a pressed notion.
pub trait Pressable {
    fn tracker(&self) -> &PressTracker;

    fn is_pressed(&self) -> bool {
        self.tracker().is_pressed()
    }

    /// Pressed this poll and not the one before.
    fn just_pressed(&self) -> bool {
        self.tracker().just_pressed()
    }

    /// Released this poll after being pressed the one before.
    fn just_released(&self) -> bool {
        self.tracker().just_released()
    }
}
