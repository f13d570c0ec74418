use crate::error::{LocateError, LocateResult};
use crate::frame::{Frame, FrameMessage};
use crate::gate::FrameGate;
use crate::locator::{Localization, LocalizationResult, ObjectLocator};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

const IMAGE_EXTENSIONS: [&str; 10] = ["png", "jpg", "jpeg", "bmp", "gif", "tif", "tiff", "pgm", "ppm", "webp"];

/// Something that delivers frames, one at a time, until exhausted
pub trait FrameSource: Send {
    fn next_message(&mut self) -> Option<FrameMessage>;
}

/// Image files of a directory in name order, read as encoded payloads
#[derive(Debug, Clone)]
pub struct DirectorySource {
    paths: Vec<PathBuf>,
    next: usize,
}

impl DirectorySource {
    pub fn open<P: AsRef<Path>>(dir: P) -> LocateResult<Self> {
        let mut paths = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            let is_image = path
                .extension()
                .and_then(|e| e.to_str())
                .map(|e| IMAGE_EXTENSIONS.contains(&e.to_ascii_lowercase().as_str()))
                .unwrap_or(false);
            if path.is_file() && is_image {
                paths.push(path);
            }
        }
        paths.sort();
        Ok(Self { paths, next: 0 })
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

impl FrameSource for DirectorySource {
    fn next_message(&mut self) -> Option<FrameMessage> {
        while let Some(path) = self.paths.get(self.next) {
            self.next += 1;
            match std::fs::read(path) {
                Ok(bytes) => return Some(FrameMessage::encoded(path.display().to_string(), bytes)),
                Err(err) => tracing::warn!(path = %path.display(), %err, "skipping unreadable frame"),
            }
        }
        None
    }
}

impl<I> FrameSource for I
where
    I: Iterator<Item = FrameMessage> + Send,
{
    fn next_message(&mut self) -> Option<FrameMessage> {
        self.next()
    }
}

/// Interval between events at `hz` per second
pub fn period_from_hz(hz: f64) -> LocateResult<Duration> {
    if !(hz > 0.0) || !hz.is_finite() {
        return Err(LocateError::InvalidConfig(format!("rate must be > 0, got {}", hz)));
    }
    Duration::try_from_secs_f64(1.0 / hz)
        .map_err(|err| LocateError::InvalidConfig(format!("rate {} Hz has no usable period: {}", hz, err)))
}

/// A frame that went through the pipeline
#[derive(Debug, Clone)]
pub struct Processed {
    pub source: String,
    pub frame: Frame,
    pub localization: Localization,
}

/// Counters over one run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NodeStats {
    pub ticks: usize,
    pub received: usize,
    pub processed: usize,
    /// Frames replaced in the gate before a tick reached them
    pub dropped: usize,
    pub found: usize,
    pub not_found: usize,
    pub failed: usize,
}

impl std::fmt::Display for NodeStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "ticks={} received={} processed={} dropped={} found={} not_found={} failed={}",
            self.ticks, self.received, self.processed, self.dropped, self.found, self.not_found, self.failed
        )
    }
}

/// Polls a frame gate at a fixed rate and localizes whatever is pending
pub struct Node {
    locator: ObjectLocator,
    gate: FrameGate<FrameMessage>,
    period: Duration,
}

impl Node {
    pub fn new(locator: ObjectLocator, tick_hz: f64) -> LocateResult<Self> {
        Ok(Self {
            locator,
            gate: FrameGate::new(),
            period: period_from_hz(tick_hz)?,
        })
    }

    pub fn locator(&self) -> &ObjectLocator {
        &self.locator
    }

    pub fn gate(&self) -> &FrameGate<FrameMessage> {
        &self.gate
    }

    /// Producer side: buffer `msg`, returning the frame it replaced
    pub fn arrive(&self, msg: FrameMessage) -> Option<FrameMessage> {
        self.gate.arrive(msg)
    }

    /// Consumer side: decode and localize the pending frame, if any
    pub fn tick(&self) -> Option<LocateResult<Processed>> {
        self.gate.tick(|msg| -> LocateResult<Processed> {
            let frame = msg.decode()?;
            let localization = self.locator.locate_frame(&frame)?;
            Ok(Processed { source: msg.source, frame, localization })
        })
    }

    /// Replay `source` on a producer thread, one frame per `frame_interval`,
    /// while ticking on the calling thread until the source is exhausted
    /// and the gate drained.
    pub fn run<S, F>(&self, mut source: S, frame_interval: Duration, mut on_processed: F) -> NodeStats
    where
        S: FrameSource,
        F: FnMut(&Processed),
    {
        let finished = AtomicBool::new(false);
        let received = AtomicUsize::new(0);
        let dropped = AtomicUsize::new(0);
        let mut stats = NodeStats::default();

        std::thread::scope(|scope| {
            scope.spawn(|| {
                while let Some(msg) = source.next_message() {
                    received.fetch_add(1, Ordering::Relaxed);
                    if let Some(old) = self.arrive(msg) {
                        dropped.fetch_add(1, Ordering::Relaxed);
                        tracing::debug!(source = %old.source, "frame superseded before processing");
                    }
                    if !frame_interval.is_zero() {
                        std::thread::sleep(frame_interval);
                    }
                }
                finished.store(true, Ordering::Release);
            });

            loop {
                let started = Instant::now();
                let done = finished.load(Ordering::Acquire);

                stats.ticks += 1;
                match self.tick() {
                    None if done => break,
                    None => {}
                    Some(Ok(processed)) => {
                        stats.processed += 1;
                        match &processed.localization.result {
                            LocalizationResult::Found(location) => {
                                stats.found += 1;
                                tracing::info!(
                                    source = %processed.source,
                                    corners = ?location.corners,
                                    inliers = location.inliers,
                                    "object found"
                                );
                            }
                            LocalizationResult::NotFound(reason) => {
                                stats.not_found += 1;
                                tracing::info!(source = %processed.source, %reason, "object not found");
                            }
                        }
                        on_processed(&processed);
                    }
                    Some(Err(err)) => {
                        stats.failed += 1;
                        tracing::warn!(%err, "frame skipped");
                    }
                }

                // Overruns start the next tick immediately
                if let Some(rest) = self.period.checked_sub(started.elapsed()) {
                    std::thread::sleep(rest);
                }
            }
        });

        stats.received = received.load(Ordering::Relaxed);
        stats.dropped = dropped.load(Ordering::Relaxed);
        stats
    }
}
