use std::{
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
    thread,
    time::{Duration, Instant},
};

use frame_snap::{
    capture::{delivery, AlphaMode, Coverage, FrameSource, PixelLayout, RawFrame},
    lens, AcquireError, CaptureEngine, CaptureError, CaptureFrameSpec, MonitorDetails, MonitorId,
    PixelRect,
};

fn monitor() -> MonitorDetails {
    MonitorDetails {
        id: MonitorId(1),
        bounds: PixelRect::new(1920, 0, 64, 48).unwrap(),
    }
}

/// Solid full-monitor frame, padded rows like a GPU row pitch.
fn full_monitor(bounds: &PixelRect, blue: u8) -> RawFrame {
    let width = bounds.width() as u32;
    let height = bounds.height() as u32;
    let stride = width as usize * 4 + 32;
    let mut data = vec![0; stride * height as usize];
    for row in data.chunks_exact_mut(stride) {
        for px in row[..width as usize * 4].chunks_exact_mut(4) {
            px.copy_from_slice(&[blue, 0, 0, 255]);
        }
    }
    RawFrame {
        width,
        height,
        stride,
        layout: PixelLayout::Bgra8,
        alpha: AlphaMode::Premultiplied,
        coverage: Coverage::FullMonitor,
        data,
    }
}

fn region(rect: &PixelRect, red: u8) -> RawFrame {
    let width = rect.width() as u32;
    let height = rect.height() as u32;
    let data = [red, 0, 0, 255].repeat(width as usize * height as usize);
    RawFrame {
        width,
        height,
        stride: width as usize * 4,
        layout: PixelLayout::Rgba8,
        alpha: AlphaMode::Straight,
        coverage: Coverage::Region,
        data,
    }
}

#[derive(Default)]
struct Accelerated {
    calls: AtomicUsize,
}

impl FrameSource for Accelerated {
    fn name(&self) -> &'static str {
        "fake-accelerated"
    }

    fn acquire(
        &self,
        _rect: &PixelRect,
        monitor: &MonitorDetails,
    ) -> Result<RawFrame, AcquireError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(full_monitor(&monitor.bounds, 200))
    }
}

/// Opens a delivery slot that is never resolved and waits on it.
struct Stalled {
    timeout: Duration,
}

impl FrameSource for Stalled {
    fn name(&self) -> &'static str {
        "fake-stalled"
    }

    fn acquire(
        &self,
        _rect: &PixelRect,
        _monitor: &MonitorDetails,
    ) -> Result<RawFrame, AcquireError> {
        let (sender, receiver) = delivery::channel();
        let result = receiver.wait(self.timeout);
        drop(sender);
        result
    }
}

struct Failing(AcquireError);

impl FrameSource for Failing {
    fn name(&self) -> &'static str {
        "fake-failing"
    }

    fn acquire(
        &self,
        _rect: &PixelRect,
        _monitor: &MonitorDetails,
    ) -> Result<RawFrame, AcquireError> {
        Err(self.0.clone())
    }
}

#[derive(Default)]
struct Legacy {
    calls: Arc<AtomicUsize>,
}

impl FrameSource for Legacy {
    fn name(&self) -> &'static str {
        "fake-legacy"
    }

    fn acquire(
        &self,
        rect: &PixelRect,
        _monitor: &MonitorDetails,
    ) -> Result<RawFrame, AcquireError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(region(rect, 100))
    }
}

#[test]
fn accelerated_frame_is_cropped_to_the_rectangle() {
    let legacy = Legacy::default();
    let legacy_calls = Arc::clone(&legacy.calls);
    let engine = CaptureEngine::with_sources(Accelerated::default(), legacy);
    let monitor = monitor();
    let spec = CaptureFrameSpec::ratio(1, 1).unwrap();
    let rect = lens::compute(&spec, 1950, 20, &monitor.bounds);
    assert_eq!(rect, PixelRect::new(1940, 10, 20, 20).unwrap());

    let image = engine.capture_region(&rect, &monitor).unwrap();
    assert_eq!(image.width() as i32, rect.width());
    assert_eq!(image.height() as i32, rect.height());
    assert_eq!(image.pixel(0, 0), Some([200, 0, 0, 255]));
    assert_eq!(legacy_calls.load(Ordering::SeqCst), 0);
}

#[test]
fn timeout_falls_back_to_legacy_within_the_call() {
    let legacy = Legacy::default();
    let legacy_calls = Arc::clone(&legacy.calls);
    let engine = CaptureEngine::with_sources(
        Stalled {
            timeout: Duration::from_millis(50),
        },
        legacy,
    );
    let monitor = monitor();
    let rect = PixelRect::new(1930, 10, 12, 8).unwrap();

    let started = Instant::now();
    let image = engine.capture_region(&rect, &monitor).unwrap();
    assert!(started.elapsed() >= Duration::from_millis(50));
    assert_eq!((image.width(), image.height()), (12, 8));
    // Legacy RGBA red comes out as BGRA.
    assert_eq!(image.pixel(11, 7), Some([0, 0, 100, 255]));
    assert_eq!(legacy_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn accelerated_error_falls_back_to_legacy() {
    for error in [
        AcquireError::unavailable("not supported"),
        AcquireError::platform("device lost"),
        AcquireError::Closed,
    ] {
        let engine = CaptureEngine::with_sources(Failing(error), Legacy::default());
        let rect = PixelRect::new(1920, 0, 5, 5).unwrap();
        let image = engine.capture_region(&rect, &monitor()).unwrap();
        assert_eq!((image.width(), image.height()), (5, 5));
    }
}

#[test]
fn both_paths_failing_is_one_capture_error() {
    let engine = CaptureEngine::with_sources(
        Failing(AcquireError::Timeout { ms: 2000 }),
        Failing(AcquireError::platform("BitBlt failed")),
    );
    let rect = PixelRect::new(1920, 0, 5, 5).unwrap();

    let err = engine.capture_region(&rect, &monitor()).unwrap_err();
    assert_eq!(
        err,
        CaptureError::Failed {
            accelerated: AcquireError::Timeout { ms: 2000 },
            legacy: AcquireError::platform("BitBlt failed"),
        }
    );
    assert!(err.to_string().contains("BitBlt failed"));
}

#[test]
fn overlapping_captures_do_not_interfere() {
    let engine = Arc::new(CaptureEngine::with_sources(
        Accelerated::default(),
        Legacy::default(),
    ));
    let monitor = monitor();

    let handles: Vec<_> = [(4, 4), (10, 6)]
        .into_iter()
        .map(|(w, h)| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                let rect = PixelRect::new(1925, 5, w, h).unwrap();
                (0..20)
                    .map(|_| engine.capture_region(&rect, &monitor).unwrap())
                    .all(|image| image.width() as i32 == w && image.height() as i32 == h)
            })
        })
        .collect();

    for handle in handles {
        assert!(handle.join().unwrap());
    }
}
