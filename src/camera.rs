//! Live camera stills for the vision scanner.
//!
//! The camera is opened and read on its own thread; the newest decoded frame
//! sits in a shared slot that `CameraFeed::grab` clones out. Older frames are
//! simply overwritten.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex};
use std::thread;

use image::RgbImage;
use nokhwa::{
    Camera,
    pixel_format::RgbFormat,
    utils::{CameraFormat, CameraIndex, FrameFormat, RequestedFormat, RequestedFormatType, Resolution},
};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::vision::FrameSource;

struct Slot {
    latest: Mutex<Option<RgbImage>>,
    stop: AtomicBool,
}

/// Handle to the capture thread's latest frame. Closing it ends the capture
/// thread and releases the camera.
pub struct CameraFeed {
    slot: Arc<Slot>,
}

impl CameraFeed {
    /// Open camera `index` near the requested resolution and start streaming.
    /// Returns once the stream is open (or failed to open).
    pub fn spawn(index: u32, width: u32, height: u32) -> Result<Self> {
        let slot = Arc::new(Slot { latest: Mutex::new(None), stop: AtomicBool::new(false) });
        let (ready_tx, ready_rx) = mpsc::channel();

        let worker_slot = slot.clone();
        thread::Builder::new()
            .name("camera".into())
            .spawn(move || {
                let mut cam = match open(index, width, height) {
                    Ok(cam) => {
                        let res = cam.resolution();
                        let _ = ready_tx.send(Ok((res.width(), res.height())));
                        cam
                    }
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                while !worker_slot.stop.load(Ordering::Relaxed) {
                    match next_frame(&mut cam) {
                        Ok(img) => {
                            if let Ok(mut latest) = worker_slot.latest.lock() {
                                *latest = Some(img);
                            }
                        }
                        Err(e) => warn!(error = %e, "camera frame dropped"),
                    }
                }
                let _ = cam.stop_stream();
            })?;

        let resolution = ready_rx
            .recv()
            .map_err(|_| Error::CameraInit("capture thread exited early".into()))??;
        info!(index, width = resolution.0, height = resolution.1, "camera streaming");
        Ok(Self { slot })
    }
}

impl FrameSource for CameraFeed {
    fn grab(&mut self) -> Result<RgbImage> {
        let latest = self
            .slot
            .latest
            .lock()
            .map_err(|_| Error::CameraFrame("frame slot poisoned".into()))?;
        latest
            .clone()
            .ok_or_else(|| Error::CameraFrame("no frame captured yet".into()))
    }

    fn close(&mut self) {
        self.slot.stop.store(true, Ordering::Relaxed);
        info!("camera released");
    }
}

fn open(index: u32, width: u32, height: u32) -> Result<Camera> {
    // YUYV is uncompressed and cheap to turn into RGB
    let fmt = CameraFormat::new(Resolution::new(width, height), FrameFormat::YUYV, 30);
    let req = RequestedFormat::new::<RgbFormat>(RequestedFormatType::Closest(fmt));

    let mut cam = Camera::new(CameraIndex::Index(index), req)
        .map_err(|e| Error::CameraInit(format!("Create camera: {e}")))?;
    cam.open_stream()
        .map_err(|e| Error::CameraInit(format!("Open stream: {e}")))?;
    Ok(cam)
}

fn next_frame(cam: &mut Camera) -> Result<RgbImage> {
    let frame = cam
        .frame()
        .map_err(|e| Error::CameraFrame(format!("Fetch frame: {e}")))?;
    frame
        .decode_image::<RgbFormat>()
        .map_err(|e| Error::CameraFrame(format!("Decode RGB: {e}")))
}
