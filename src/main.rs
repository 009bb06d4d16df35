// What you SEE:
// • A toolbar strip on top, the drawing canvas below it.
// • One ring per tracked hand, labelled LEFT / RIGHT; it fills in while the hand pinches.
// • H toggles the landmark skeleton of every tracked hand.
// • Pinch a toolbar button to pick a tool, color or size. Pinch on the canvas to draw.
// • Without --provider-cmd the mouse is a right hand: hold LMB to pinch.
// • ESC quits.

use std::time::{Duration, Instant};

use minifb::Key;
use pinch_canvas::app::{Session, StdinPrompt};
use pinch_canvas::cli::Cli;
use pinch_canvas::config::Config;
use pinch_canvas::error::Error;
use pinch_canvas::provider::{CommandProvider, ObservationMailbox, SimulatedHand, spawn_provider};
use pinch_canvas::types::{FrameBuffer, HandLabel, Point, Size};
use pinch_canvas::vision::VisionScanner;
use pinch_canvas::window::AppWindow;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Error> {
    let cli = Cli::parse_args();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if cli.dump_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    /* --- Hand input ---
       Either a helper process on its own thread, or the mouse polled each tick. */
    let mailbox: Option<ObservationMailbox> = match &cli.provider_cmd {
        Some(cmd) => {
            let (mailbox, _worker) = spawn_provider(CommandProvider::from_command_line(cmd)?);
            Some(mailbox)
        }
        None => {
            info!("no provider command; the mouse drives a simulated right hand");
            None
        }
    };
    let mouse_hand = SimulatedHand::new(HandLabel::Right, config.tracking.active_margin);

    let scanner = start_vision(&cli, &config);

    let mut window = AppWindow::new("Pinch Canvas", cli.width, cli.height)?;
    let mut screen = FrameBuffer::new(cli.width, cli.height);
    let mut session = Session::new(config, cli.export_dir.clone());
    let mut prompt = StdinPrompt;

    let mut last_fps_time = Instant::now();
    let mut frames_this_second: u32 = 0;

    /* ------------------------------ Main loop ------------------------------ */
    while window.is_open() && !window.esc_pressed() {
        // 1) Follow window resizes (canvas resizes itself inside the tick).
        let (w, h) = window.size();
        if w > 0 && h > 0 && (w, h) != (screen.width, screen.height) {
            screen = FrameBuffer::new(w, h);
        }
        let viewport = Size::new(screen.width as f32, screen.height as f32);

        // 2) Whatever the provider produced since last frame.
        let fresh = match &mailbox {
            Some(mailbox) => mailbox.take(),
            None => Some(match window.mouse_pos() {
                Some(p) => {
                    let screen_pos = Point::new(p.x / viewport.width, p.y / viewport.height);
                    vec![mouse_hand.observe(screen_pos, window.left_mouse_down())]
                }
                None => Vec::new(),
            }),
        };

        if window.pressed_once(Key::H) {
            session.toggle_skeleton();
        }

        // 3) Tracker, toolbar, drawing.
        let report = session.tick(fresh, viewport, &mut prompt);

        if let Some(caption) = scanner.as_ref().and_then(VisionScanner::poll_latest) {
            session.set_caption(caption);
        }

        // 4) Paint and present.
        session.render(&mut screen, &report);
        window.present(&screen)?;

        frames_this_second += 1;
        let now = Instant::now();
        if now.duration_since(last_fps_time) >= Duration::from_secs(1) {
            let fps = frames_this_second as f32 / now.duration_since(last_fps_time).as_secs_f32();
            debug!("render rate {fps:.1} fps");
            frames_this_second = 0;
            last_fps_time = now;
        }
    }

    if let Some(mailbox) = mailbox {
        mailbox.close();
    }
    info!("bye");
    Ok(())
}

#[cfg(feature = "camera")]
fn start_vision(cli: &Cli, config: &Config) -> Option<VisionScanner> {
    use pinch_canvas::camera::CameraFeed;
    use pinch_canvas::vision::GeminiAnalyzer;
    use tracing::warn;

    if !cli.vision {
        return None;
    }
    let analyzer = match GeminiAnalyzer::from_env(&config.vision) {
        Ok(a) => a,
        Err(e) => {
            warn!(error = %e, "vision scanner disabled");
            return None;
        }
    };
    let feed = match CameraFeed::spawn(cli.camera_index, 640, 480) {
        Ok(feed) => feed,
        Err(e) => {
            warn!(error = %e, "vision scanner disabled");
            return None;
        }
    };
    Some(VisionScanner::spawn(feed, analyzer, &config.vision))
}

#[cfg(not(feature = "camera"))]
fn start_vision(cli: &Cli, _config: &Config) -> Option<VisionScanner> {
    if cli.vision {
        tracing::warn!("built without the `camera` feature; --vision ignored");
    }
    None
}
