//! Still-frame captioning for the vision lens.
//!
//! A worker thread grabs a camera frame every few seconds, mirrors it to match
//! the selfie view, shrinks it, encodes JPEG and asks the captioning service
//! for a one-line description. The render loop only ever polls a channel, so a
//! slow or dead network never stalls a tick.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread;
use std::time::{Duration, Instant};

use base64::Engine;
use image::RgbImage;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::{self, FilterType};
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::config::VisionConfig;
use crate::error::{Error, Result};

/// Shown in place of a caption whenever analysis fails.
pub const ERROR_PLACEHOLDER: &str = "Error analyzing visual feed. Please check your connection.";

/// Frames are scaled to this size before encoding.
pub const SCAN_WIDTH: u32 = 640;
pub const SCAN_HEIGHT: u32 = 360;

/// Something that turns a JPEG plus an instruction into text.
pub trait VisionAnalyzer: Send + 'static {
    fn analyze(&self, jpeg: &[u8], instruction: &str) -> Result<String>;
}

/// Something that can hand over the latest camera still.
pub trait FrameSource: Send + 'static {
    fn grab(&mut self) -> Result<RgbImage>;

    /// Release the device. The scanner calls this once, when its worker exits.
    fn close(&mut self) {}
}

/// Mirror, downscale and JPEG-encode one frame.
pub fn encode_jpeg(frame: &RgbImage, quality: u8) -> Result<Vec<u8>> {
    let mirrored = imageops::flip_horizontal(frame);
    let scaled = imageops::resize(&mirrored, SCAN_WIDTH, SCAN_HEIGHT, FilterType::Triangle);
    let mut out = Vec::new();
    JpegEncoder::new_with_quality(&mut out, quality.clamp(1, 100)).encode_image(&scaled)?;
    Ok(out)
}

/// Caption one frame. Never fails: any error is logged and replaced by
/// [`ERROR_PLACEHOLDER`].
pub fn describe_frame(analyzer: &dyn VisionAnalyzer, frame: &RgbImage, instruction: &str, quality: u8) -> String {
    let result = encode_jpeg(frame, quality).and_then(|jpeg| analyzer.analyze(&jpeg, instruction));
    match result {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "vision analysis failed");
            ERROR_PLACEHOLDER.to_string()
        }
    }
}

/// Client for the Gemini `generateContent` REST endpoint.
pub struct GeminiAnalyzer {
    client: reqwest::blocking::Client,
    url: String,
    api_key: String,
}

impl GeminiAnalyzer {
    pub fn new(config: &VisionConfig, api_key: impl Into<String>) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Vision(format!("Build HTTP client: {e}")))?;
        Ok(Self {
            client,
            url: format!("{}/{}:generateContent", config.endpoint.trim_end_matches('/'), config.model),
            api_key: api_key.into(),
        })
    }

    /// Build from config, reading the key from the configured env var.
    pub fn from_env(config: &VisionConfig) -> Result<Self> {
        let key = std::env::var(&config.api_key_env)
            .map_err(|_| Error::Vision(format!("{} is not set", config.api_key_env)))?;
        Self::new(config, key)
    }
}

/// Request body: inline JPEG followed by the instruction.
pub fn build_request(jpeg: &[u8], instruction: &str) -> serde_json::Value {
    let data = base64::engine::general_purpose::STANDARD.encode(jpeg);
    serde_json::json!({
        "contents": [{
            "parts": [
                { "inlineData": { "mimeType": "image/jpeg", "data": data } },
                { "text": instruction }
            ]
        }],
        "generationConfig": {
            "temperature": 0.7,
            "topP": 0.95
        }
    })
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

/// Concatenated text parts of the first candidate.
pub fn parse_response(body: &str) -> Result<String> {
    let resp: GenerateResponse = serde_json::from_str(body)?;
    let text: String = resp
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    let text = text.trim();
    if text.is_empty() {
        return Err(Error::Vision("response carried no text".into()));
    }
    Ok(text.to_string())
}

impl VisionAnalyzer for GeminiAnalyzer {
    fn analyze(&self, jpeg: &[u8], instruction: &str) -> Result<String> {
        let resp = self
            .client
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(&build_request(jpeg, instruction))
            .send()
            .map_err(|e| Error::Vision(format!("Send request: {e}")))?;

        let status = resp.status();
        let body = resp.text().map_err(|e| Error::Vision(format!("Read body: {e}")))?;
        if !status.is_success() {
            return Err(Error::Vision(format!("HTTP {status}")));
        }
        parse_response(&body)
    }
}

/// Fixed-interval trigger measured from the end of the previous scan.
/// The very first check is always due.
#[derive(Clone, Debug)]
pub struct ScanTimer {
    interval: Duration,
    last: Option<Instant>,
}

impl ScanTimer {
    pub fn new(interval: Duration) -> Self {
        Self { interval, last: None }
    }

    pub fn due(&self, now: Instant) -> bool {
        match self.last {
            None => true,
            Some(last) => now.duration_since(last) > self.interval,
        }
    }

    pub fn mark(&mut self, now: Instant) {
        self.last = Some(now);
    }
}

/// Handle to the background scanner. Dropping it stops the worker after its
/// current request, and the worker then closes its frame source.
pub struct VisionScanner {
    results: Receiver<String>,
    stop: Arc<AtomicBool>,
}

impl VisionScanner {
    pub fn spawn<S: FrameSource, A: VisionAnalyzer>(source: S, analyzer: A, config: &VisionConfig) -> Self {
        let (tx, rx) = mpsc::channel();
        let stop = Arc::new(AtomicBool::new(false));
        let worker = ScanWorker {
            source,
            analyzer,
            tx,
            stop: stop.clone(),
            timer: ScanTimer::new(Duration::from_secs(config.scan_interval_secs)),
            instruction: config.instruction.clone(),
            quality: config.jpeg_quality,
        };
        if let Err(e) = thread::Builder::new()
            .name("vision-scanner".into())
            .spawn(move || worker.run())
        {
            warn!(error = %e, "could not start vision scanner thread");
        }
        Self { results: rx, stop }
    }

    /// Most recent caption produced since the last poll, if any.
    pub fn poll_latest(&self) -> Option<String> {
        self.results.try_iter().last()
    }
}

impl Drop for VisionScanner {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
    }
}

struct ScanWorker<S, A> {
    source: S,
    analyzer: A,
    tx: Sender<String>,
    stop: Arc<AtomicBool>,
    timer: ScanTimer,
    instruction: String,
    quality: u8,
}

impl<S: FrameSource, A: VisionAnalyzer> ScanWorker<S, A> {
    const IDLE: Duration = Duration::from_millis(50);

    fn run(mut self) {
        info!("vision scanner started");
        while !self.stop.load(Ordering::Relaxed) {
            if !self.timer.due(Instant::now()) {
                thread::sleep(Self::IDLE);
                continue;
            }
            let caption = match self.source.grab() {
                Ok(frame) => describe_frame(&self.analyzer, &frame, &self.instruction, self.quality),
                Err(e) => {
                    warn!(error = %e, "vision scanner could not grab a frame");
                    ERROR_PLACEHOLDER.to_string()
                }
            };
            self.timer.mark(Instant::now());
            debug!(%caption, "scan complete");
            if self.tx.send(caption).is_err() {
                break;
            }
        }
        self.source.close();
        info!("vision scanner stopped");
    }
}
