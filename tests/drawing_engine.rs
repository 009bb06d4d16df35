// Drawing engine driven by hand snapshots, the way the app tick drives it.

use pinch_canvas::canvas::{CLEAR, opaque};
use pinch_canvas::config::DrawingConfig;
use pinch_canvas::drawing::TickOutcome;
use pinch_canvas::types::{FrameSnapshot, HandSnapshot, Landmark, Point};
use pinch_canvas::{DrawingEngine, HandLabel, Tool};

const W: usize = 200;
const H: usize = 120;
const BLUE: u32 = 0x3b82f6;

fn engine_with(tool: Tool) -> DrawingEngine {
    let mut engine = DrawingEngine::new(&DrawingConfig::default());
    engine.attach(W, H);
    engine.set_tool(tool);
    engine
}

fn hand(x: f32, y: f32, pinching: bool) -> FrameSnapshot {
    FrameSnapshot {
        frame_id: 1,
        hands: vec![HandSnapshot {
            label: HandLabel::Left,
            landmarks: [Landmark::default(); 21],
            cursor: Point::new(x / W as f32, y / H as f32),
            is_pinching: pinching,
            pinch_distance: 0.0,
        }],
    }
}

fn no_hands() -> FrameSnapshot {
    FrameSnapshot { frame_id: 2, hands: Vec::new() }
}

fn cancel() -> impl FnMut() -> Option<String> {
    || None
}

fn persistent(engine: &DrawingEngine, x: usize, y: usize) -> u32 {
    engine.canvas().unwrap().persistent.pixel(x, y).unwrap()
}

#[test]
fn rectangle_previews_while_dragging_and_commits_on_release() {
    let mut engine = engine_with(Tool::Rectangle);
    let mut prompt = cancel();

    assert_eq!(engine.tick(&hand(10.0, 10.0, true), &mut prompt), TickOutcome::Drawing);
    for step in 1..=10 {
        let t = step as f32 / 10.0;
        engine.tick(&hand(10.0 + 100.0 * t, 10.0 + 70.0 * t, true), &mut prompt);
    }
    let canvas = engine.canvas().unwrap();
    assert!(canvas.persistent.is_blank());
    assert!(!canvas.preview.is_blank());

    assert_eq!(engine.tick(&hand(110.0, 80.0, false), &mut prompt), TickOutcome::Finalized);
    let canvas = engine.canvas().unwrap();
    assert!(canvas.preview.is_blank());
    for (x, y) in [(10, 10), (60, 10), (110, 45), (60, 80), (10, 45), (110, 80)] {
        assert_eq!(persistent(&engine, x, y), opaque(BLUE), "edge pixel ({x},{y})");
    }
    assert_eq!(persistent(&engine, 60, 45), CLEAR);
}

#[test]
fn committed_outline_is_solid_but_preview_is_dashed() {
    let mut engine = engine_with(Tool::Line);
    let mut prompt = cancel();
    engine.tick(&hand(10.0, 60.0, true), &mut prompt);
    engine.tick(&hand(190.0, 60.0, true), &mut prompt);

    let preview = &engine.canvas().unwrap().preview;
    let inked = (10..190).filter(|&x| preview.pixel(x, 60).unwrap() != CLEAR).count();
    let gaps = 180 - inked;
    assert!(gaps > 0, "preview should have gaps");

    engine.tick(&hand(190.0, 60.0, false), &mut prompt);
    assert!((10..190).all(|x| persistent(&engine, x, 60) == opaque(BLUE)));
}

#[test]
fn vanishing_hand_finalizes_and_next_stroke_is_disconnected() {
    let mut engine = engine_with(Tool::Freehand);
    engine.adjust_stroke_width(-8);
    let mut prompt = cancel();

    engine.tick(&hand(20.0, 20.0, true), &mut prompt);
    engine.tick(&hand(60.0, 20.0, true), &mut prompt);
    assert_eq!(engine.tick(&no_hands(), &mut prompt), TickOutcome::Finalized);
    assert!(!engine.session().is_drawing());

    engine.tick(&hand(20.0, 100.0, true), &mut prompt);
    engine.tick(&hand(60.0, 100.0, true), &mut prompt);

    assert_eq!(persistent(&engine, 40, 20), opaque(BLUE));
    assert_eq!(persistent(&engine, 40, 100), opaque(BLUE));
    // nothing bridges the end of the first stroke to the start of the second
    assert_eq!(persistent(&engine, 40, 60), CLEAR);
}

#[test]
fn vanishing_hand_commits_shape_at_last_point() {
    let mut engine = engine_with(Tool::Rectangle);
    let mut prompt = cancel();
    engine.tick(&hand(20.0, 20.0, true), &mut prompt);
    engine.tick(&hand(80.0, 60.0, true), &mut prompt);
    engine.tick(&no_hands(), &mut prompt);

    assert!(engine.canvas().unwrap().preview.is_blank());
    assert_eq!(persistent(&engine, 80, 40), opaque(BLUE));
}

#[test]
fn text_prompt_runs_once_per_release() {
    let mut engine = engine_with(Tool::Text);
    let mut calls = 0;
    let mut prompt = || {
        calls += 1;
        Some("OK".to_string())
    };
    engine.tick(&hand(30.0, 90.0, true), &mut prompt);
    engine.tick(&hand(35.0, 90.0, true), &mut prompt);
    engine.tick(&hand(35.0, 90.0, false), &mut prompt);
    engine.tick(&hand(35.0, 90.0, false), &mut prompt);
    drop(prompt);
    assert_eq!(calls, 1);
    assert!(!engine.canvas().unwrap().persistent.is_blank());
}

#[test]
fn color_change_applies_to_next_stroke() {
    let mut engine = engine_with(Tool::Freehand);
    engine.set_color(0xef4444);
    let mut prompt = cancel();
    engine.tick(&hand(20.0, 20.0, true), &mut prompt);
    engine.tick(&hand(40.0, 20.0, false), &mut prompt);
    assert_eq!(persistent(&engine, 20, 20), opaque(0xef4444));
}

#[test]
fn detached_engine_skips_until_reattached() {
    let mut engine = engine_with(Tool::Freehand);
    let mut prompt = cancel();
    engine.tick(&hand(20.0, 20.0, true), &mut prompt);
    assert!(engine.detach().is_some());
    assert_eq!(engine.tick(&hand(40.0, 20.0, true), &mut prompt), TickOutcome::Skipped);

    engine.attach(W, H);
    assert_eq!(engine.tick(&hand(40.0, 20.0, true), &mut prompt), TickOutcome::Drawing);
    assert!(engine.canvas().unwrap().persistent.pixel(20, 20) == Some(CLEAR));
}
