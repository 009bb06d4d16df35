//! Pinch-to-activate hit testing for on-screen targets.
//!
//! Callers register every target's current rectangle each tick, then call
//! [`InteractionDetector::poll`] with that tick's snapshot. Activation is
//! edge-triggered: a target fires only on the tick where a hand hovering it
//! goes from open to pinched. Holding the pinch, or sliding an already-held
//! pinch onto a target, fires nothing.

use crate::types::{FrameSnapshot, PerHand, Point, Rect, Size};

#[derive(Clone, Debug)]
struct Target<T> {
    id: T,
    rect: Rect,
    padding: f32,
}

/// Result of one poll, in hit order, without duplicates.
#[derive(Clone, Debug, PartialEq)]
pub struct InteractionEvents<T> {
    /// Targets under at least one cursor
    pub hovered: Vec<T>,
    /// Hovered targets whose hand is holding a pinch
    pub pressed: Vec<T>,
    /// Targets that received a fresh pinch this tick
    pub activated: Vec<T>,
}

impl<T> Default for InteractionEvents<T> {
    fn default() -> Self {
        Self { hovered: Vec::new(), pressed: Vec::new(), activated: Vec::new() }
    }
}

impl<T: PartialEq> InteractionEvents<T> {
    pub fn is_hovered(&self, id: &T) -> bool {
        self.hovered.contains(id)
    }

    pub fn is_pressed(&self, id: &T) -> bool {
        self.pressed.contains(id)
    }

    pub fn is_activated(&self, id: &T) -> bool {
        self.activated.contains(id)
    }
}

/// Owns the per-hand "was pinching" edge state shared by every target.
pub struct InteractionDetector<T> {
    targets: Vec<Target<T>>,
    was_pinching: PerHand<bool>,
}

impl<T: Clone + PartialEq> Default for InteractionDetector<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + PartialEq> InteractionDetector<T> {
    pub fn new() -> Self {
        Self { targets: Vec::new(), was_pinching: PerHand::default() }
    }

    /// Add or move a target for the current tick. Re-registering an id
    /// replaces its rectangle.
    pub fn register(&mut self, id: T, rect: Rect, padding: f32) {
        match self.targets.iter_mut().find(|t| t.id == id) {
            Some(existing) => {
                existing.rect = rect;
                existing.padding = padding;
            }
            None => self.targets.push(Target { id, rect, padding }),
        }
    }

    pub fn target_count(&self) -> usize {
        self.targets.len()
    }

    /// Hit-test this tick's targets against `snapshot` and consume the
    /// registrations. Cursors are scaled by `viewport` into the targets'
    /// pixel space.
    pub fn poll(&mut self, snapshot: &FrameSnapshot, viewport: Size) -> InteractionEvents<T> {
        let targets = std::mem::take(&mut self.targets);
        let mut events = InteractionEvents::default();

        for hand in &snapshot.hands {
            let cursor = Point::new(hand.cursor.x * viewport.width, hand.cursor.y * viewport.height);
            let was = self.was_pinching.get_mut(hand.label);
            let pinch_edge = hand.is_pinching && !*was;
            *was = hand.is_pinching;

            for target in &targets {
                if !target.rect.padded(target.padding).contains(cursor) {
                    continue;
                }
                push_unique(&mut events.hovered, &target.id);
                if hand.is_pinching {
                    push_unique(&mut events.pressed, &target.id);
                }
                if pinch_edge {
                    push_unique(&mut events.activated, &target.id);
                }
            }
        }

        events
    }
}

fn push_unique<T: Clone + PartialEq>(list: &mut Vec<T>, id: &T) {
    if !list.contains(id) {
        list.push(id.clone());
    }
}
