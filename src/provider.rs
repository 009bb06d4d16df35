//! Hand landmark providers and the hand-off slot between them and the tick.
//!
//! Providers run on their own thread at their own cadence and publish into an
//! [`ObservationMailbox`]. The render tick takes whatever is newest without
//! waiting; older unread sets are overwritten (latest wins).

use std::io::{BufRead, BufReader};
use std::process::{Child, Command, Stdio};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, JoinHandle};

use serde::Deserialize;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::types::{
    HandLabel, Landmark, ObservationSet, Point, RawHandObservation, landmarks,
};

// ════════════════════════════════════════════════════════════════════════════
// ObservationMailbox
// ════════════════════════════════════════════════════════════════════════════

struct Shared {
    latest: Mutex<Option<ObservationSet>>,
    closed: AtomicBool,
}

/// Single-slot, latest-wins handoff. Cheap to clone; all clones share the slot.
#[derive(Clone)]
pub struct ObservationMailbox {
    shared: Arc<Shared>,
}

impl Default for ObservationMailbox {
    fn default() -> Self {
        Self::new()
    }
}

impl ObservationMailbox {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared { latest: Mutex::new(None), closed: AtomicBool::new(false) }),
        }
    }

    fn slot(&self) -> MutexGuard<'_, Option<ObservationSet>> {
        // A panicking provider cannot leave a half-written Vec behind; keep going.
        self.shared.latest.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Replace whatever is waiting with `set`.
    pub fn publish(&self, set: ObservationSet) {
        *self.slot() = Some(set);
    }

    /// Take the newest set, if one arrived since the last take. Never blocks
    /// on the provider.
    pub fn take(&self) -> Option<ObservationSet> {
        self.slot().take()
    }

    /// Ask providers to stop; they check this between frames.
    pub fn close(&self) {
        self.shared.closed.store(true, Ordering::Release);
    }

    pub fn is_closed(&self) -> bool {
        self.shared.closed.load(Ordering::Acquire)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// LandmarkProvider trait
// ════════════════════════════════════════════════════════════════════════════

/// Anything that can deliver observation sets into a mailbox.
pub trait LandmarkProvider: Send + 'static {
    /// Publish frames until the source ends or the mailbox is closed.
    fn run(self: Box<Self>, mailbox: ObservationMailbox) -> Result<()>;
}

/// Spawn a provider on its own thread and return the mailbox it feeds.
pub fn spawn_provider<P: LandmarkProvider>(provider: P) -> (ObservationMailbox, JoinHandle<()>) {
    let mailbox = ObservationMailbox::new();
    let tx = mailbox.clone();
    let handle = thread::spawn(move || {
        if let Err(e) = Box::new(provider).run(tx) {
            warn!("landmark provider stopped: {e}");
        }
    });
    (mailbox, handle)
}

// ════════════════════════════════════════════════════════════════════════════
// Provider wire format (one JSON object per line)
// ════════════════════════════════════════════════════════════════════════════

#[derive(Deserialize, Debug)]
struct LandmarkJson {
    x: f32,
    y: f32,
    #[serde(default)]
    z: f32,
}

#[derive(Deserialize, Debug)]
struct HandJson {
    handedness: String,
    #[serde(default)]
    #[allow(dead_code)]
    score: f32,
    landmarks: Vec<LandmarkJson>,
}

#[derive(Deserialize, Debug)]
struct DetectionJson {
    #[serde(default)]
    hands: Vec<HandJson>,
    #[serde(default)]
    error: Option<String>,
}

/// Parse one provider line.
///
/// Hands with an unknown label or the wrong number of landmarks are dropped
/// individually; the rest of the frame is kept.
pub fn parse_detection_line(line: &str) -> Result<ObservationSet> {
    let parsed: DetectionJson = serde_json::from_str(line)?;
    if let Some(err) = parsed.error {
        return Err(Error::Provider(err));
    }

    let mut set = ObservationSet::with_capacity(parsed.hands.len());
    for hand in parsed.hands {
        let Some(label) = HandLabel::parse(&hand.handedness) else {
            warn!(handedness = %hand.handedness, "unknown handedness, hand dropped");
            continue;
        };
        if hand.landmarks.len() != landmarks::COUNT {
            warn!(count = hand.landmarks.len(), "expected 21 landmarks, hand dropped");
            continue;
        }
        let mut points = [Landmark::default(); landmarks::COUNT];
        for (dst, src) in points.iter_mut().zip(&hand.landmarks) {
            *dst = Landmark::new(src.x, src.y, src.z);
        }
        set.push(RawHandObservation::new(label, points));
    }
    Ok(set)
}

// ════════════════════════════════════════════════════════════════════════════
// CommandProvider: external landmark helper process
// ════════════════════════════════════════════════════════════════════════════

/// Runs a helper (e.g. a MediaPipe script) that prints one detection per line.
pub struct CommandProvider {
    program: String,
    args: Vec<String>,
}

impl CommandProvider {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self { program: program.into(), args }
    }

    /// Split a shell-like command line on whitespace.
    pub fn from_command_line(cmd: &str) -> Result<Self> {
        let mut parts = cmd.split_whitespace().map(str::to_string);
        let program = parts
            .next()
            .ok_or_else(|| Error::Provider("empty provider command".into()))?;
        Ok(Self::new(program, parts.collect()))
    }

    fn spawn(&self) -> Result<Child> {
        Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| Error::Provider(format!("spawn {}: {e}", self.program)))
    }
}

impl LandmarkProvider for CommandProvider {
    fn run(self: Box<Self>, mailbox: ObservationMailbox) -> Result<()> {
        let mut child = self.spawn()?;
        info!(program = %self.program, "landmark provider started");

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Provider("helper stdout not captured".into()))?;
        let result = pump_lines(BufReader::new(stdout), &mailbox);

        let _ = child.kill();
        let _ = child.wait();
        result
    }
}

/// Feed every line from `reader` into the mailbox until EOF or close.
///
/// Lines are split on raw bytes, so a frame that is not valid UTF-8 is just
/// another bad frame. Only a failing read ends the pump.
pub fn pump_lines<R: BufRead>(mut reader: R, mailbox: &ObservationMailbox) -> Result<()> {
    let mut buf = Vec::new();
    loop {
        buf.clear();
        if reader.read_until(b'\n', &mut buf)? == 0 || mailbox.is_closed() {
            break;
        }
        let line = String::from_utf8_lossy(&buf);
        if line.trim().is_empty() {
            continue;
        }
        match parse_detection_line(&line) {
            Ok(set) => mailbox.publish(set),
            Err(e) => {
                // Unusable frame counts as "no hands" rather than "no news".
                warn!("bad provider frame: {e}");
                mailbox.publish(Vec::new());
            }
        }
    }
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Simulated hand, pointer driven, no camera needed
// ════════════════════════════════════════════════════════════════════════════

/// Finger offsets (relative to the middle MCP) of a relaxed open hand.
const OPEN_HAND: [(f32, f32); landmarks::COUNT] = [
    (0.00, 0.12),   // wrist
    (-0.04, 0.10),  // thumb cmc
    (-0.07, 0.07),  // thumb mcp
    (-0.09, 0.04),  // thumb ip
    (-0.10, 0.01),  // thumb tip
    (-0.03, 0.00),  // index mcp
    (-0.035, -0.05),
    (-0.04, -0.08),
    (-0.04, -0.10), // index tip
    (0.00, 0.00),   // middle mcp (anchor)
    (0.00, -0.06),
    (0.00, -0.09),
    (0.00, -0.11),
    (0.03, 0.00),   // ring mcp
    (0.03, -0.05),
    (0.035, -0.08),
    (0.035, -0.10),
    (0.055, 0.01),  // pinky mcp
    (0.06, -0.03),
    (0.065, -0.05),
    (0.065, -0.07),
];

/// Build a plausible 21-point hand whose cursor anchor sits at `anchor`
/// (raw camera space). When `pinching`, thumb and index tips touch.
pub fn synthetic_hand(label: HandLabel, anchor: Point, pinching: bool) -> RawHandObservation {
    let mut points = [Landmark::default(); landmarks::COUNT];
    for (dst, (dx, dy)) in points.iter_mut().zip(OPEN_HAND) {
        *dst = Landmark::new(anchor.x + dx, anchor.y + dy, 0.0);
    }
    if pinching {
        let index = points[landmarks::INDEX_FINGER_TIP];
        points[landmarks::THUMB_TIP] = Landmark::new(index.x - 0.005, index.y + 0.005, 0.0);
    }
    RawHandObservation::new(label, points)
}

/// Drives one synthetic hand from a screen-space pointer (e.g. the mouse).
///
/// The pointer is inverse-mapped through the active margin so the cursor
/// produced by the pipeline lands back under the pointer.
#[derive(Clone, Copy, Debug)]
pub struct SimulatedHand {
    label: HandLabel,
    margin: f32,
}

impl SimulatedHand {
    pub fn new(label: HandLabel, margin: f32) -> Self {
        Self { label, margin }
    }

    /// `screen` is normalized to the window, `[0,1]^2`.
    pub fn observe(&self, screen: Point, pinching: bool) -> RawHandObservation {
        let span = 1.0 - 2.0 * self.margin;
        let raw = Point::new(self.margin + screen.x * span, self.margin + screen.y * span);
        synthetic_hand(self.label, raw, pinching)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pinch::pinch_distance;
    use std::io::Cursor;

    fn hand_json(label: &str, n: usize) -> String {
        let pts: Vec<String> = (0..n)
            .map(|i| format!(r#"{{"x":{},"y":0.5,"z":0.0}}"#, 0.3 + i as f32 * 0.01))
            .collect();
        format!(r#"{{"handedness":"{label}","score":0.9,"landmarks":[{}]}}"#, pts.join(","))
    }

    #[test]
    fn mailbox_is_latest_wins() {
        let mb = ObservationMailbox::new();
        assert!(mb.take().is_none());
        mb.publish(vec![synthetic_hand(HandLabel::Left, Point::new(0.1, 0.1), false)]);
        mb.publish(Vec::new());
        assert_eq!(mb.take(), Some(Vec::new()));
        assert!(mb.take().is_none());
    }

    #[test]
    fn parses_two_hands() {
        let line = format!(r#"{{"hands":[{},{}]}}"#, hand_json("Left", 21), hand_json("Right", 21));
        let set = parse_detection_line(&line).unwrap();
        assert_eq!(set.len(), 2);
        assert_eq!(set[0].label, HandLabel::Left);
        assert!((set[1].landmarks[20].x - 0.5).abs() < 1e-6);
    }

    #[test]
    fn malformed_hands_are_dropped_individually() {
        let line = format!(
            r#"{{"hands":[{},{},{}]}}"#,
            hand_json("Left", 20),
            hand_json("Middle", 21),
            hand_json("right", 21)
        );
        let set = parse_detection_line(&line).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set[0].label, HandLabel::Right);
    }

    #[test]
    fn error_field_is_reported() {
        let err = parse_detection_line(r#"{"hands":[],"error":"camera busy"}"#).unwrap_err();
        assert!(matches!(err, Error::Provider(msg) if msg == "camera busy"));
    }

    #[test]
    fn pump_turns_garbage_into_empty_frames() {
        let mb = ObservationMailbox::new();
        let input = format!("{{\"hands\":[{}]}}\nnot json\n", hand_json("Left", 21));
        pump_lines(Cursor::new(input), &mb).unwrap();
        assert_eq!(mb.take(), Some(Vec::new()));
    }

    #[test]
    fn pump_survives_non_utf8_frames() {
        let mut input = b"{\"hands\":[],\"error\":\"\xff\xfe\"}\n".to_vec();
        input.extend_from_slice(format!("{{\"hands\":[{}]}}\n", hand_json("Left", 21)).as_bytes());

        let mb = ObservationMailbox::new();
        pump_lines(Cursor::new(input), &mb).unwrap();
        let set = mb.take().unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set[0].label, HandLabel::Left);

        // as the last line it reads as "no hands"
        let mut input = format!("{{\"hands\":[{}]}}\n", hand_json("Left", 21)).into_bytes();
        input.extend_from_slice(b"\xc3\x28 not json\n");
        pump_lines(Cursor::new(input), &mb).unwrap();
        assert_eq!(mb.take(), Some(Vec::new()));
    }

    #[test]
    fn pump_stops_when_closed() {
        let mb = ObservationMailbox::new();
        mb.close();
        let input = format!("{{\"hands\":[{}]}}\n", hand_json("Left", 21));
        pump_lines(Cursor::new(input), &mb).unwrap();
        assert!(mb.take().is_none());
    }

    #[test]
    fn synthetic_pinch_distances_straddle_default_thresholds() {
        let open = synthetic_hand(HandLabel::Left, Point::new(0.5, 0.5), false);
        let closed = synthetic_hand(HandLabel::Left, Point::new(0.5, 0.5), true);
        assert!(pinch_distance(&open) > 0.058);
        assert!(pinch_distance(&closed) < 0.038);
    }

    #[test]
    fn simulated_hand_inverse_maps_margin() {
        let sim = SimulatedHand::new(HandLabel::Right, 0.22);
        let obs = sim.observe(Point::new(0.0, 1.0), false);
        let anchor = obs.landmark(landmarks::CURSOR_ANCHOR);
        assert!((anchor.x - 0.22).abs() < 1e-6);
        assert!((anchor.y - 0.78).abs() < 1e-6);
    }
}
