//! Fixtures shared by the gateway and server tests.

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::time::Duration;

use image::{DynamicImage, ImageFormat, Rgba, RgbaImage};
use textgate_core::{EngineError, LineRecord, RecognitionEngine, RecognitionResult};

pub(crate) fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    encode(width, height, ImageFormat::Png)
}

pub(crate) fn gif_bytes() -> Vec<u8> {
    encode(4, 4, ImageFormat::Gif)
}

fn encode(width: u32, height: u32, format: ImageFormat) -> Vec<u8> {
    let img = DynamicImage::ImageRgba8(RgbaImage::from_pixel(width, height, Rgba([255; 4])));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, format).unwrap();
    out.into_inner()
}

/// A latch that blocks engine calls until opened.
#[derive(Clone, Default)]
pub(crate) struct Gate(Arc<(Mutex<bool>, Condvar)>);

impl Gate {
    pub(crate) fn open(&self) {
        let (lock, cvar) = &*self.0;
        *lock.lock().unwrap() = true;
        cvar.notify_all();
    }

    fn pass(&self) {
        let (lock, cvar) = &*self.0;
        let mut open = lock.lock().unwrap();
        while !*open {
            open = cvar.wait(open).unwrap();
        }
    }
}

enum Script {
    Line(String),
    Fail(String),
    Panic,
}

/// An engine with scripted behavior that counts what it is asked to do.
pub(crate) struct ScriptedEngine {
    script: Script,
    gate: Option<Gate>,
    hold: Duration,
    calls: AtomicUsize,
    completed: AtomicUsize,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl ScriptedEngine {
    pub(crate) fn line(text: &str) -> Self {
        Self::with_script(Script::Line(text.to_string()))
    }

    pub(crate) fn failing(reason: &str) -> Self {
        Self::with_script(Script::Fail(reason.to_string()))
    }

    pub(crate) fn panicking() -> Self {
        Self::with_script(Script::Panic)
    }

    fn with_script(script: Script) -> Self {
        Self {
            script,
            gate: None,
            hold: Duration::ZERO,
            calls: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
        }
    }

    pub(crate) fn gated(mut self, gate: &Gate) -> Self {
        self.gate = Some(gate.clone());
        self
    }

    pub(crate) fn holding(mut self, hold: Duration) -> Self {
        self.hold = hold;
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub(crate) fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }

    pub(crate) fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }
}

struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl RecognitionEngine for ScriptedEngine {
    fn name(&self) -> &str {
        "scripted"
    }

    fn recognize(&self, _image: &[u8]) -> Result<RecognitionResult, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        let _in_flight = InFlight(&self.in_flight);

        if let Some(gate) = &self.gate {
            gate.pass();
        }
        if !self.hold.is_zero() {
            std::thread::sleep(self.hold);
        }

        let result = match &self.script {
            Script::Line(text) => Ok(RecognitionResult::from_lines(vec![LineRecord::new(
                text.as_str(),
                0.9731,
                [[4.0, 4.0], [60.0, 4.0], [60.0, 20.0], [4.0, 20.0]],
            )])),
            Script::Fail(reason) => Err(EngineError::Recognition(reason.clone())),
            Script::Panic => panic!("scripted engine panic"),
        };
        self.completed.fetch_add(1, Ordering::SeqCst);
        result
    }
}

/// Poll `cond` until it holds or two seconds pass.
pub(crate) async fn until(mut cond: impl FnMut() -> bool) {
    for _ in 0..400 {
        if cond() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached within 2s");
}
