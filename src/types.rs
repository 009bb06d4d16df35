//! Core types shared by the tracking pipeline, the interaction layer and the canvas.

use std::fmt;
use std::sync::Arc;

/// Screen buffer handed to the window each frame.
#[derive(Clone)]
pub struct FrameBuffer {
    pub width: usize,      // how wide the frame is on screen (pixels)
    pub height: usize,     // how tall the frame is on screen (pixels)
    pub pixels: Vec<u32>,  // each entry is 0x00RRGGBB for minifb
}

impl FrameBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, pixels: vec![0u32; width * height] }
    }

    pub fn fill(&mut self, color: u32) {
        self.pixels.iter_mut().for_each(|p| *p = color);
    }
}

/// 2D point. Normalized [0,1] for cursors, pixels once mapped onto a surface.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Width/height pair in pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle in pixels; `x`,`y` is the top-left corner.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// Grow on every side by `padding`.
    pub fn padded(&self, padding: f32) -> Rect {
        Rect::new(
            self.x - padding,
            self.y - padding,
            self.width + 2.0 * padding,
            self.height + 2.0 * padding,
        )
    }

    /// Inclusive on all four edges. NaN anywhere never hits.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.right() && p.y >= self.y && p.y <= self.bottom()
    }
}

/// Which hand a detection was classified as.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum HandLabel {
    Left,
    Right,
}

impl HandLabel {
    pub const ALL: [HandLabel; 2] = [HandLabel::Left, HandLabel::Right];

    /// Parse a provider string ("Left", "right", ...).
    pub fn parse(s: &str) -> Option<HandLabel> {
        match s.trim().to_ascii_lowercase().as_str() {
            "left" => Some(HandLabel::Left),
            "right" => Some(HandLabel::Right),
            _ => None,
        }
    }
}

impl fmt::Display for HandLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandLabel::Left => write!(f, "Left"),
            HandLabel::Right => write!(f, "Right"),
        }
    }
}

/// One value per hand label. Replaces string-keyed maps for per-hand state.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PerHand<T> {
    left: T,
    right: T,
}

impl<T> PerHand<T> {
    pub fn new(left: T, right: T) -> Self {
        Self { left, right }
    }

    pub fn get(&self, label: HandLabel) -> &T {
        match label {
            HandLabel::Left => &self.left,
            HandLabel::Right => &self.right,
        }
    }

    pub fn get_mut(&mut self, label: HandLabel) -> &mut T {
        match label {
            HandLabel::Left => &mut self.left,
            HandLabel::Right => &mut self.right,
        }
    }
}

/// Hand landmark indices (MediaPipe hand landmark model convention).
#[allow(dead_code)]
pub mod landmarks {
    pub const COUNT: usize = 21;

    pub const WRIST: usize = 0;
    pub const THUMB_CMC: usize = 1;
    pub const THUMB_MCP: usize = 2;
    pub const THUMB_IP: usize = 3;
    pub const THUMB_TIP: usize = 4;
    pub const INDEX_FINGER_MCP: usize = 5;
    pub const INDEX_FINGER_PIP: usize = 6;
    pub const INDEX_FINGER_DIP: usize = 7;
    pub const INDEX_FINGER_TIP: usize = 8;
    pub const MIDDLE_FINGER_MCP: usize = 9;
    pub const MIDDLE_FINGER_PIP: usize = 10;
    pub const MIDDLE_FINGER_DIP: usize = 11;
    pub const MIDDLE_FINGER_TIP: usize = 12;
    pub const RING_FINGER_MCP: usize = 13;
    pub const RING_FINGER_PIP: usize = 14;
    pub const RING_FINGER_DIP: usize = 15;
    pub const RING_FINGER_TIP: usize = 16;
    pub const PINKY_MCP: usize = 17;
    pub const PINKY_PIP: usize = 18;
    pub const PINKY_DIP: usize = 19;
    pub const PINKY_TIP: usize = 20;

    /// Cursor anchor: the middle MCP joint barely moves while pinching.
    pub const CURSOR_ANCHOR: usize = MIDDLE_FINGER_MCP;
}

/// A single hand landmark, normalized to the (mirrored) camera image.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Landmark {
    /// X coordinate (0.0 to 1.0, normalized to image width)
    pub x: f32,
    /// Y coordinate (0.0 to 1.0, normalized to image height)
    pub y: f32,
    /// Depth relative to the wrist; unused by the 2D pipeline
    pub z: f32,
}

impl Landmark {
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn xy(&self) -> Point {
        Point::new(self.x, self.y)
    }
}

/// One detected hand exactly as the provider reported it.
#[derive(Clone, Debug, PartialEq)]
pub struct RawHandObservation {
    pub label: HandLabel,
    pub landmarks: [Landmark; landmarks::COUNT],
}

impl RawHandObservation {
    pub fn new(label: HandLabel, landmarks: [Landmark; landmarks::COUNT]) -> Self {
        Self { label, landmarks }
    }

    pub fn landmark(&self, index: usize) -> Point {
        self.landmarks[index].xy()
    }

    pub fn is_finite(&self) -> bool {
        self.landmarks
            .iter()
            .all(|l| l.x.is_finite() && l.y.is_finite())
    }
}

/// Everything one provider frame reported; empty means "no hands in view".
pub type ObservationSet = Vec<RawHandObservation>;

/// Processed view of one hand for one tick. Never mutated after construction.
#[derive(Clone, Debug, PartialEq)]
pub struct HandSnapshot {
    pub label: HandLabel,
    pub landmarks: [Landmark; landmarks::COUNT],
    /// Normalized + smoothed cursor in [0,1]^2
    pub cursor: Point,
    pub is_pinching: bool,
    /// Thumb-tip to index-tip distance that drove the pinch state
    pub pinch_distance: f32,
}

/// All hands for one tick (0..=2, at most one per label).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameSnapshot {
    /// Monotonic id; 0 is the placeholder before the provider's first frame
    pub frame_id: u64,
    pub hands: Vec<HandSnapshot>,
}

impl FrameSnapshot {
    pub fn is_empty(&self) -> bool {
        self.hands.is_empty()
    }

    pub fn hand(&self, label: HandLabel) -> Option<&HandSnapshot> {
        self.hands.iter().find(|h| h.label == label)
    }

    pub fn primary(&self) -> Option<&HandSnapshot> {
        self.hands.first()
    }
}

/// What the aggregator hands to consumers each tick.
#[derive(Clone, Debug)]
pub struct TrackedFrame {
    pub snapshot: Arc<FrameSnapshot>,
    /// True when the provider produced nothing new; `snapshot` is the frozen last one
    pub stale: bool,
}
