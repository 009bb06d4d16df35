//! # pinch-canvas
//!
//! Turns a noisy per-frame stream of hand landmarks into stable pointer input
//! (one smoothed cursor and one debounced pinch per hand) and feeds it to two
//! consumers: pinch-to-activate buttons and an air-drawing canvas.
//!
//! ```text
//! LandmarkProvider ──▶ ObservationMailbox ──▶ HandTracker ──▶ Arc<FrameSnapshot>
//!   (own thread)         (latest wins)     normalize+smooth     │
//!                                             +pinch            ├──▶ InteractionDetector
//!                                                               └──▶ DrawingEngine
//! ```
//!
//! Everything downstream of the mailbox runs once per display tick on one
//! thread. [`app::Session`] is that tick.

pub mod app;
#[cfg(feature = "camera")]
pub mod camera;
pub mod canvas;
pub mod cli;
pub mod config;
pub mod drawing;
pub mod error;
pub mod interaction;
pub mod normalize;
pub mod pinch;
pub mod provider;
pub mod raster;
pub mod skeleton;
pub mod smoothing;
pub mod tracking;
pub mod types;
pub mod vision;
pub mod window;

pub use config::Config;
pub use drawing::{DrawingEngine, TextPrompt, Tool};
pub use error::{Error, Result};
pub use interaction::{InteractionDetector, InteractionEvents};
pub use provider::{LandmarkProvider, ObservationMailbox};
pub use tracking::HandTracker;
pub use types::{FrameSnapshot, HandLabel, HandSnapshot, RawHandObservation, TrackedFrame};
