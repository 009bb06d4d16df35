//! The per-frame scheduler that wires the pipeline to its consumers.
//!
//! One [`Session::tick`] per displayed frame:
//!
//! 1. hand the provider's newest observations (if any) to the tracker,
//! 2. register the toolbar targets and poll the interaction detector,
//! 3. apply any toolbar activations to the drawing engine,
//! 4. advance the drawing engine with the same snapshot, unless the primary
//!    hand's current pinch closed over the toolbar.
//!
//! [`Session::render`] then paints the result into a screen buffer. Nothing
//! in a tick blocks; the text prompt is the only synchronous wait and happens
//! on purpose when a text stroke ends.

use std::io::{self, Write};
use std::path::PathBuf;

use tracing::{info, warn};

use crate::config::Config;
use crate::drawing::{DrawingEngine, TextPrompt, TickOutcome, Tool};
use crate::interaction::{InteractionDetector, InteractionEvents};
use crate::raster;
use crate::skeleton;
use crate::tracking::HandTracker;
use crate::types::{FrameBuffer, ObservationSet, Point, Rect, Size, TrackedFrame};

// ════════════════════════════════════════════════════════════════════════════
// Toolbar
// ════════════════════════════════════════════════════════════════════════════

/// Height of the strip above the canvas.
pub const TOOLBAR_HEIGHT: f32 = 64.0;

const BUTTON_W: f32 = 64.0;
const SWATCH_W: f32 = 40.0;
const BUTTON_H: f32 = 40.0;
const GAP: f32 = 8.0;
const MARGIN: f32 = 12.0;

/// Every pinchable control on the toolbar.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToolbarAction {
    Tool(Tool),
    Color(u32),
    Thinner,
    Thicker,
    Clear,
    Export,
}

impl ToolbarAction {
    fn label(&self) -> Option<&'static str> {
        match self {
            ToolbarAction::Tool(tool) => Some(tool.name()),
            ToolbarAction::Color(_) => None,
            ToolbarAction::Thinner => Some("-"),
            ToolbarAction::Thicker => Some("+"),
            ToolbarAction::Clear => Some("Clear"),
            ToolbarAction::Export => Some("Save"),
        }
    }
}

/// Left-to-right toolbar layout in window pixels.
pub fn toolbar_layout(palette: &[u32]) -> Vec<(ToolbarAction, Rect)> {
    let mut out = Vec::new();
    let mut x = MARGIN;
    let mut push = |action: ToolbarAction, width: f32| {
        out.push((action, Rect::new(x, MARGIN, width, BUTTON_H)));
        x += width + GAP;
    };

    for tool in Tool::ALL {
        push(ToolbarAction::Tool(tool), BUTTON_W);
    }
    for &rgb in palette {
        push(ToolbarAction::Color(rgb), SWATCH_W);
    }
    push(ToolbarAction::Thinner, SWATCH_W);
    push(ToolbarAction::Thicker, SWATCH_W);
    push(ToolbarAction::Clear, BUTTON_W);
    push(ToolbarAction::Export, BUTTON_W);
    out
}

// ════════════════════════════════════════════════════════════════════════════
// Text prompt
// ════════════════════════════════════════════════════════════════════════════

/// Reads one line from the terminal. An empty line cancels.
pub struct StdinPrompt;

impl TextPrompt for StdinPrompt {
    fn request_text(&mut self) -> Option<String> {
        print!("\n  Text to place: ");
        io::stdout().flush().ok();
        let mut buf = String::new();
        io::stdin().read_line(&mut buf).ok()?;
        let text = buf.trim().to_string();
        if text.is_empty() { None } else { Some(text) }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Session
// ════════════════════════════════════════════════════════════════════════════

/// Everything one tick produced, for rendering and tests.
#[derive(Clone, Debug)]
pub struct TickReport {
    pub frame: TrackedFrame,
    pub events: InteractionEvents<ToolbarAction>,
    pub draw: TickOutcome,
}

pub struct Session {
    config: Config,
    tracker: HandTracker,
    interaction: InteractionDetector<ToolbarAction>,
    engine: DrawingEngine,
    toolbar: Vec<(ToolbarAction, Rect)>,
    export_dir: PathBuf,
    status: Option<String>,
    caption: Option<String>,
    show_skeleton: bool,
    /// The primary hand's pinch closed over the toolbar and has not opened yet.
    toolbar_pinch: bool,
}

impl Session {
    /// File name used for canvas exports.
    pub const EXPORT_FILE: &'static str = "vision-flow-art.png";

    pub fn new(config: Config, export_dir: PathBuf) -> Self {
        Self {
            tracker: HandTracker::new(&config.tracking),
            interaction: InteractionDetector::new(),
            engine: DrawingEngine::new(&config.drawing),
            toolbar: toolbar_layout(&config.drawing.palette),
            export_dir,
            status: None,
            caption: None,
            show_skeleton: false,
            toolbar_pinch: false,
            config,
        }
    }

    pub fn engine(&self) -> &DrawingEngine {
        &self.engine
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    /// Latest vision caption to show under the canvas.
    pub fn set_caption(&mut self, caption: String) {
        self.caption = Some(caption);
    }

    /// Show or hide the landmark wireframe of every tracked hand.
    pub fn toggle_skeleton(&mut self) {
        self.show_skeleton = !self.show_skeleton;
        info!(on = self.show_skeleton, "hand skeleton");
    }

    /// Run one frame. `viewport` is the window size the cursors map onto.
    pub fn tick(
        &mut self,
        fresh: Option<ObservationSet>,
        viewport: Size,
        prompt: &mut dyn TextPrompt,
    ) -> TickReport {
        let frame = self.tracker.tick(fresh);

        let padding = self.config.interaction.hit_padding;
        for (action, rect) in &self.toolbar {
            self.interaction.register(*action, *rect, padding);
        }
        let events = self.interaction.poll(&frame.snapshot, viewport);
        for action in &events.activated {
            self.apply(*action);
        }

        let canvas_h = (viewport.height - TOOLBAR_HEIGHT).max(0.0);
        if viewport.width >= 1.0 && canvas_h >= 1.0 {
            self.engine.attach(viewport.width as usize, canvas_h as usize);
            self.engine.set_placement(viewport, Point::new(0.0, TOOLBAR_HEIGHT));
        }

        let primary = frame.snapshot.primary();
        if !primary.is_some_and(|h| h.is_pinching) {
            self.toolbar_pinch = false;
        } else if !self.engine.session().is_drawing()
            && primary.is_some_and(|h| h.cursor.y * viewport.height < TOOLBAR_HEIGHT)
        {
            self.toolbar_pinch = true;
        }
        let draw = if self.toolbar_pinch && self.engine.canvas().is_some() {
            TickOutcome::Idle
        } else {
            self.engine.tick(&frame.snapshot, prompt)
        };

        TickReport { frame, events, draw }
    }

    fn apply(&mut self, action: ToolbarAction) {
        let step = self.config.drawing.stroke_step as i32;
        match action {
            ToolbarAction::Tool(tool) => self.engine.set_tool(tool),
            ToolbarAction::Color(rgb) => self.engine.set_color(rgb),
            ToolbarAction::Thinner => {
                self.engine.adjust_stroke_width(-step);
            }
            ToolbarAction::Thicker => {
                self.engine.adjust_stroke_width(step);
            }
            ToolbarAction::Clear => self.engine.clear(),
            ToolbarAction::Export => self.export(),
        }
        info!(?action, "toolbar");
    }

    fn export(&mut self) {
        let Some(canvas) = self.engine.canvas() else { return };
        let path = self.export_dir.join(Self::EXPORT_FILE);
        self.status = Some(match canvas.export_png(&path) {
            Ok(()) => format!("Saved {}", path.display()),
            Err(e) => {
                warn!(error = %e, "export failed");
                "Export failed".to_string()
            }
        });
    }

    /// Paint canvas, toolbar, cursors and status into `fb`.
    pub fn render(&self, fb: &mut FrameBuffer, report: &TickReport) {
        fb.fill(0x0010_1014);
        if let Some(canvas) = self.engine.canvas() {
            canvas.composite_onto(fb, 0, TOOLBAR_HEIGHT as i32);
        }
        self.render_toolbar(fb, &report.events);

        let viewport = Size::new(fb.width as f32, fb.height as f32);
        if self.show_skeleton {
            for hand in &report.frame.snapshot.hands {
                skeleton::draw_hand(fb, hand, viewport);
            }
        }
        for hand in &report.frame.snapshot.hands {
            let p = Point::new(hand.cursor.x * viewport.width, hand.cursor.y * viewport.height);
            let radius = (self.engine.session().stroke_width as f32 * 0.5).max(6.0);
            if hand.is_pinching {
                raster::fill_disc(fb, p, radius, 0x00ff_ffff);
            } else {
                raster::draw_ring(fb, p, radius + 4.0, 2.0, 0x00ff_ffff);
            }
            let label = hand.label.to_string().to_ascii_uppercase();
            let x = p.x as i32 - raster::text_width(&label, 1) / 2;
            let y = (p.y - radius - 13.0) as i32 - raster::GLYPH_H;
            raster::draw_text_shadowed(fb, x, y, &label, 1, skeleton::hand_color(hand.label));
        }

        let status = if report.frame.snapshot.frame_id == 0 {
            "WAITING FOR HANDS".to_string()
        } else if report.frame.stale {
            "TRACKING STALLED".to_string()
        } else if report.frame.snapshot.is_empty() {
            "NO HANDS".to_string()
        } else {
            format!("{} HAND(S)", report.frame.snapshot.hands.len())
        };
        let session = self.engine.session();
        let hud = format!("{} | {} | SIZE {}", status, session.tool.name(), session.stroke_width);
        let bottom = fb.height as i32 - 20;
        raster::draw_text_shadowed(fb, 12, bottom, &hud, 2, 0x00ff_ffff);

        let mut line = bottom - 20;
        for msg in [self.status.as_deref(), self.caption.as_deref()].into_iter().flatten() {
            raster::draw_text_shadowed(fb, 12, line, msg, 2, 0x00cc_ddff);
            line -= 20;
        }
    }

    fn render_toolbar(&self, fb: &mut FrameBuffer, events: &InteractionEvents<ToolbarAction>) {
        let session = self.engine.session();
        for (action, rect) in &self.toolbar {
            let selected = match action {
                ToolbarAction::Tool(tool) => *tool == session.tool,
                ToolbarAction::Color(rgb) => *rgb == session.color,
                _ => false,
            };
            let face = match action {
                ToolbarAction::Color(rgb) => *rgb,
                _ if events.is_pressed(action) => 0x0060_6070,
                _ if events.is_hovered(action) => 0x0040_4050,
                _ => 0x0028_2830,
            };
            let a = Point::new(rect.x, rect.y);
            let b = Point::new(rect.right(), rect.bottom());
            raster::fill_rect(fb, a, b, face);
            if selected || events.is_hovered(action) {
                raster::stroke_rect(fb, a, b, 2.0, 0x00ff_ffff, None);
            }
            if let Some(label) = action.label() {
                let w = raster::text_width(label, 1);
                let x = (rect.x + rect.width * 0.5) as i32 - w / 2;
                let y = (rect.y + rect.height * 0.5) as i32 - raster::GLYPH_H / 2;
                raster::draw_text(fb, x, y, label, 1, 0x00ff_ffff);
            }
        }
        // current brush swatch at the far right
        let x = fb.width as f32 - MARGIN - BUTTON_H * 0.5;
        let radius = (session.stroke_width as f32 * 0.5).min(BUTTON_H * 0.5);
        raster::fill_disc(fb, Point::new(x, MARGIN + BUTTON_H * 0.5), radius, session.color);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::SimulatedHand;
    use crate::types::HandLabel;

    const VIEW: Size = Size::new(1000.0, 600.0);

    fn session(dir: &std::path::Path) -> Session {
        Session::new(Config::default(), dir.to_path_buf())
    }

    fn center_of(session: &Session, action: ToolbarAction) -> Point {
        let (_, rect) = session.toolbar.iter().find(|(a, _)| *a == action).unwrap();
        Point::new(rect.x + rect.width * 0.5, rect.y + rect.height * 0.5)
    }

    fn hand_at(p: Point, pinching: bool) -> ObservationSet {
        let sim = SimulatedHand::new(HandLabel::Right, Config::default().tracking.active_margin);
        vec![sim.observe(Point::new(p.x / VIEW.width, p.y / VIEW.height), pinching)]
    }

    /// Feed the same position enough times for the smoother to settle.
    fn settle(s: &mut Session, p: Point, pinching: bool) -> TickReport {
        let mut prompt = || None::<String>;
        let mut report = s.tick(Some(hand_at(p, pinching)), VIEW, &mut prompt);
        for _ in 0..60 {
            report = s.tick(Some(hand_at(p, pinching)), VIEW, &mut prompt);
        }
        report
    }

    #[test]
    fn toolbar_buttons_do_not_overlap() {
        let layout = toolbar_layout(&Config::default().drawing.palette);
        assert_eq!(layout.len(), 6 + 5 + 4);
        for pair in layout.windows(2) {
            assert!(pair[0].1.right() < pair[1].1.x);
        }
        assert!(layout.iter().all(|(_, r)| r.bottom() < TOOLBAR_HEIGHT));
    }

    #[test]
    fn pinching_a_tool_button_selects_it() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path());
        let target = center_of(&s, ToolbarAction::Tool(Tool::Rectangle));
        settle(&mut s, target, false);
        let mut prompt = || None::<String>;
        let report = s.tick(Some(hand_at(target, true)), VIEW, &mut prompt);
        assert_eq!(report.events.activated, vec![ToolbarAction::Tool(Tool::Rectangle)]);
        assert_eq!(s.engine().session().tool, Tool::Rectangle);
    }

    #[test]
    fn stale_ticks_do_not_refire() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path());
        let target = center_of(&s, ToolbarAction::Thicker);
        settle(&mut s, target, false);
        let mut prompt = || None::<String>;
        s.tick(Some(hand_at(target, true)), VIEW, &mut prompt);
        assert_eq!(s.engine().session().stroke_width, 14);

        for _ in 0..3 {
            let report = s.tick(None, VIEW, &mut prompt);
            assert!(report.frame.stale);
            assert!(report.events.activated.is_empty());
        }
        assert_eq!(s.engine().session().stroke_width, 14);
    }

    #[test]
    fn export_button_writes_png() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path());
        let target = center_of(&s, ToolbarAction::Export);
        settle(&mut s, target, false);
        let mut prompt = || None::<String>;
        s.tick(Some(hand_at(target, true)), VIEW, &mut prompt);
        assert!(dir.path().join(Session::EXPORT_FILE).exists());
        assert!(s.status().unwrap().starts_with("Saved"));
    }

    #[test]
    fn canvas_sits_below_toolbar() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path());
        let mut prompt = || None::<String>;
        s.tick(Some(Vec::new()), VIEW, &mut prompt);
        let canvas = s.engine().canvas().unwrap();
        assert_eq!(canvas.size(), (1000, 536));
    }

    #[test]
    fn toolbar_pinch_never_reaches_the_canvas() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path());
        let target = center_of(&s, ToolbarAction::Tool(Tool::Text));
        settle(&mut s, target, false);

        let mut calls = 0;
        let mut prompt = || {
            calls += 1;
            Some("HI".to_string())
        };
        let report = s.tick(Some(hand_at(target, true)), VIEW, &mut prompt);
        assert_eq!(report.events.activated, vec![ToolbarAction::Tool(Tool::Text)]);
        assert_eq!(report.draw, TickOutcome::Idle);

        // drag the held pinch down over the canvas, then let go there
        let below = Point::new(target.x, 300.0);
        for _ in 0..30 {
            let report = s.tick(Some(hand_at(below, true)), VIEW, &mut prompt);
            assert_eq!(report.draw, TickOutcome::Idle);
        }
        let report = s.tick(Some(hand_at(below, false)), VIEW, &mut prompt);
        assert_eq!(report.draw, TickOutcome::Idle);

        // a fresh pinch on the canvas draws again
        let report = s.tick(Some(hand_at(below, true)), VIEW, &mut prompt);
        assert_eq!(report.draw, TickOutcome::Drawing);
        drop(prompt);

        assert_eq!(calls, 0);
        assert!(s.engine().canvas().unwrap().persistent.is_blank());
        assert_eq!(s.engine().session().tool, Tool::Text);
    }

    fn px(fb: &FrameBuffer, x: usize, y: usize) -> u32 {
        fb.pixels[y * fb.width + x]
    }

    #[test]
    fn cursor_is_labelled_with_its_hand() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path());
        let report = settle(&mut s, Point::new(500.0, 300.0), false);
        let mut fb = FrameBuffer::new(1000, 600);
        s.render(&mut fb, &report);

        // "RIGHT" in the right hand's blue, just above the ring
        let inked = (270..290)
            .flat_map(|y| (480..520).map(move |x| (x, y)))
            .filter(|&(x, y)| px(&fb, x, y) == skeleton::hand_color(HandLabel::Right))
            .count();
        assert!(inked > 0);
    }

    #[test]
    fn skeleton_overlay_toggles() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path());
        let report = settle(&mut s, Point::new(500.0, 300.0), false);
        let mut fb = FrameBuffer::new(1000, 600);

        // the wrist sits 0.12 below the middle knuckle in camera space
        s.render(&mut fb, &report);
        assert_eq!(px(&fb, 500, 372), 0x0010_1014);

        s.toggle_skeleton();
        s.render(&mut fb, &report);
        assert_eq!(px(&fb, 500, 372), skeleton::hand_color(HandLabel::Right));

        s.toggle_skeleton();
        s.render(&mut fb, &report);
        assert_eq!(px(&fb, 500, 372), 0x0010_1014);
    }

    #[test]
    fn render_draws_without_panicking_on_tiny_windows() {
        let dir = tempfile::tempdir().unwrap();
        let mut s = session(dir.path());
        let mut prompt = || None::<String>;
        let report = s.tick(Some(hand_at(Point::new(5.0, 5.0), true)), Size::new(20.0, 10.0), &mut prompt);
        assert_eq!(report.draw, TickOutcome::Skipped);
        let mut fb = FrameBuffer::new(20, 10);
        s.render(&mut fb, &report);
    }
}
