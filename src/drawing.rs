//! Pinch-driven drawing engine.
//!
//! One stroke per pinch of the primary hand (the first hand in the snapshot):
//!
//! ```text
//!           pinch closes                  pinch opens / hand lost
//!   Idle ─────────────────▶ Drawing ───────────────────────────▶ Idle
//!                          (anchor, last)        finalize()
//! ```
//!
//! Freehand and eraser write straight into the persistent layer every tick.
//! Line, rectangle and ellipse only draw a dashed preview until release, then
//! commit once. Text asks a [`TextPrompt`] for content at release.
//!
//! Losing the hand mid-stroke goes through the same finalize path as a
//! release, using the last known point, so no stroke is left hanging.

use tracing::debug;

use crate::canvas::{CLEAR, Canvas, opaque};
use crate::config::DrawingConfig;
use crate::raster::{self, PREVIEW_DASH};
use crate::types::{FrameSnapshot, Point, Size};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Tool {
    Freehand,
    Eraser,
    Line,
    Rectangle,
    Ellipse,
    Text,
}

impl Tool {
    pub const ALL: [Tool; 6] =
        [Tool::Freehand, Tool::Eraser, Tool::Line, Tool::Rectangle, Tool::Ellipse, Tool::Text];

    pub fn name(self) -> &'static str {
        match self {
            Tool::Freehand => "Brush",
            Tool::Eraser => "Eraser",
            Tool::Line => "Line",
            Tool::Rectangle => "Rect",
            Tool::Ellipse => "Circle",
            Tool::Text => "Text",
        }
    }

    /// Shapes that are previewed while dragging and committed on release.
    pub fn is_shape(self) -> bool {
        matches!(self, Tool::Line | Tool::Rectangle | Tool::Ellipse)
    }
}

/// Where the session is within a stroke.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum StrokePhase {
    Idle,
    Drawing {
        /// Tool captured when the pinch closed
        tool: Tool,
        anchor: Point,
        last: Point,
    },
}

#[derive(Clone, Debug)]
pub struct DrawingSession {
    pub tool: Tool,
    /// 0xRRGGBB
    pub color: u32,
    pub stroke_width: u32,
    pub phase: StrokePhase,
}

impl DrawingSession {
    pub fn is_drawing(&self) -> bool {
        matches!(self.phase, StrokePhase::Drawing { .. })
    }
}

/// Synchronous source of text for the text tool. `None` means cancelled.
pub trait TextPrompt {
    fn request_text(&mut self) -> Option<String>;
}

impl<F: FnMut() -> Option<String>> TextPrompt for F {
    fn request_text(&mut self) -> Option<String> {
        self()
    }
}

/// What one tick did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// No canvas attached yet; try again next tick
    Skipped,
    Idle,
    Drawing,
    /// A stroke ended this tick
    Finalized,
}

pub struct DrawingEngine {
    session: DrawingSession,
    canvas: Option<Canvas>,
    min_width: u32,
    max_width: u32,
    /// Size the normalized cursor is scaled to
    viewport: Size,
    /// Top-left of the canvas inside the viewport
    origin: Point,
}

impl DrawingEngine {
    pub fn new(config: &DrawingConfig) -> Self {
        Self {
            session: DrawingSession {
                tool: Tool::Freehand,
                color: config.palette.first().copied().unwrap_or(0xffffff),
                stroke_width: config.stroke_width,
                phase: StrokePhase::Idle,
            },
            canvas: None,
            min_width: config.min_stroke_width,
            max_width: config.max_stroke_width,
            viewport: Size::new(0.0, 0.0),
            origin: Point::default(),
        }
    }

    pub fn session(&self) -> &DrawingSession {
        &self.session
    }

    pub fn canvas(&self) -> Option<&Canvas> {
        self.canvas.as_ref()
    }

    /// Mount the canvas. A canvas of another size is resized in place so
    /// committed ink survives.
    pub fn attach(&mut self, width: usize, height: usize) {
        match &mut self.canvas {
            Some(canvas) => canvas.resize(width, height),
            None => self.canvas = Some(Canvas::new(width, height)),
        }
        if self.viewport.width <= 0.0 || self.viewport.height <= 0.0 {
            self.viewport = Size::new(width as f32, height as f32);
        }
    }

    /// Unmount the canvas; ticks are skipped until the next attach.
    pub fn detach(&mut self) -> Option<Canvas> {
        self.session.phase = StrokePhase::Idle;
        self.canvas.take()
    }

    /// Describe how the canvas sits inside the cursor's viewport.
    pub fn set_placement(&mut self, viewport: Size, origin: Point) {
        self.viewport = viewport;
        self.origin = origin;
    }

    pub fn set_tool(&mut self, tool: Tool) {
        self.session.tool = tool;
    }

    pub fn set_color(&mut self, rgb: u32) {
        self.session.color = rgb & 0x00FF_FFFF;
    }

    /// Grow or shrink the stroke, clamped to the configured bounds.
    pub fn adjust_stroke_width(&mut self, delta: i32) -> u32 {
        let next = (self.session.stroke_width as i64 + delta as i64)
            .clamp(self.min_width as i64, self.max_width as i64);
        self.session.stroke_width = next as u32;
        self.session.stroke_width
    }

    /// Wipe all committed ink.
    pub fn clear(&mut self) {
        if let Some(canvas) = &mut self.canvas {
            canvas.persistent.clear();
        }
    }

    /// Canvas pixel position of a normalized cursor.
    pub fn to_canvas(&self, cursor: Point) -> Point {
        Point::new(
            cursor.x * self.viewport.width - self.origin.x,
            cursor.y * self.viewport.height - self.origin.y,
        )
    }

    /// Advance the stroke state machine by one snapshot.
    pub fn tick(&mut self, snapshot: &FrameSnapshot, prompt: &mut dyn TextPrompt) -> TickOutcome {
        if self.canvas.is_none() {
            return TickOutcome::Skipped;
        }

        let Some(hand) = snapshot.primary() else {
            return match self.session.phase {
                StrokePhase::Drawing { last, .. } => {
                    debug!("hand lost mid-stroke, finalizing");
                    self.finalize(last, prompt);
                    TickOutcome::Finalized
                }
                StrokePhase::Idle => TickOutcome::Idle,
            };
        };

        let p = self.to_canvas(hand.cursor);
        match (self.session.phase, hand.is_pinching) {
            (StrokePhase::Idle, true) => {
                self.session.phase = StrokePhase::Drawing { tool: self.session.tool, anchor: p, last: p };
                self.continue_stroke(p);
                TickOutcome::Drawing
            }
            (StrokePhase::Drawing { .. }, true) => {
                self.continue_stroke(p);
                TickOutcome::Drawing
            }
            (StrokePhase::Drawing { .. }, false) => {
                self.finalize(p, prompt);
                TickOutcome::Finalized
            }
            (StrokePhase::Idle, false) => TickOutcome::Idle,
        }
    }

    fn continue_stroke(&mut self, p: Point) {
        let StrokePhase::Drawing { tool, anchor, last } = self.session.phase else { return };
        let width = self.session.stroke_width as f32;
        let ink = opaque(self.session.color);
        let Some(canvas) = self.canvas.as_mut() else { return };

        match tool {
            Tool::Freehand => {
                raster::stroke_segment(&mut canvas.persistent, last, p, width, ink, None, 0.0);
            }
            Tool::Eraser => {
                raster::stroke_segment(&mut canvas.persistent, last, p, width, CLEAR, None, 0.0);
            }
            Tool::Line | Tool::Rectangle | Tool::Ellipse => {
                canvas.preview.clear();
                draw_shape(canvas, tool, anchor, p, width, ink, true);
            }
            Tool::Text => canvas.preview.clear(),
        }
        self.session.phase = StrokePhase::Drawing { tool, anchor, last: p };
    }

    fn finalize(&mut self, end: Point, prompt: &mut dyn TextPrompt) {
        let StrokePhase::Drawing { tool, anchor, .. } = self.session.phase else { return };
        self.session.phase = StrokePhase::Idle;

        let width = self.session.stroke_width;
        let ink = opaque(self.session.color);
        let Some(canvas) = self.canvas.as_mut() else { return };
        canvas.preview.clear();

        match tool {
            Tool::Line | Tool::Rectangle | Tool::Ellipse => {
                draw_shape(canvas, tool, anchor, end, width as f32, ink, false);
                debug!(tool = tool.name(), ?anchor, ?end, "shape committed");
            }
            Tool::Text => {
                if let Some(text) = prompt.request_text().filter(|t| !t.trim().is_empty()) {
                    stamp_text(canvas, anchor, &text, width, ink);
                }
            }
            Tool::Freehand | Tool::Eraser => {}
        }
    }
}

/// Draw `tool`'s shape from `anchor` to `end`, as a dashed preview or as
/// committed ink.
fn draw_shape(canvas: &mut Canvas, tool: Tool, anchor: Point, end: Point, width: f32, ink: u32, preview: bool) {
    let (layer, dash) = if preview {
        (&mut canvas.preview, Some(PREVIEW_DASH))
    } else {
        (&mut canvas.persistent, None)
    };
    match tool {
        Tool::Line => {
            raster::stroke_segment(layer, anchor, end, width, ink, dash, 0.0);
        }
        Tool::Rectangle => raster::stroke_rect(layer, anchor, end, width, ink, dash),
        Tool::Ellipse => raster::stroke_circle(layer, anchor, anchor.distance(end), width, ink, dash),
        _ => {}
    }
}

/// Text is set with its baseline at the anchor, glyphs `4 * width` px tall.
fn stamp_text(canvas: &mut Canvas, anchor: Point, text: &str, width: u32, ink: u32) {
    let height = (width * 4) as i32;
    let scale = (height / raster::GLYPH_H).max(1);
    let top = anchor.y.round() as i32 - raster::GLYPH_H * scale;
    raster::draw_text(&mut canvas.persistent, anchor.x.round() as i32, top, text, scale, ink);
}
