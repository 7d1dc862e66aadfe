use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use image::{Rgba, RgbaImage};
use kanal::AsyncReceiver;
use quizlens_core::error::Unsupported;
use quizlens_core::fingerprint::{CaptureFingerprint, ChangeDetector};
use quizlens_core::frame::CapturedImage;
use quizlens_core::scanner::{ArtifactSink, ChangeScanner, Fingerprinter, FrameSource};
use quizlens_types::{AppEvent, CaptureRegion, StatusLevel};
use tokio::sync::RwLock;
use tokio::time::timeout;
use tokio_util::sync::CancellationToken;

use crate::scan::scan_loop;
use crate::status::ScanStatus;

#[derive(Clone)]
enum Step {
    Missing,
    Fail(&'static str),
    Read(&'static str, usize),
}

struct BlankSource;

impl FrameSource for BlankSource {
    fn capture(&mut self) -> anyhow::Result<CapturedImage> {
        Ok(CapturedImage::new(
            CaptureRegion {
                x: 0,
                y: 0,
                width: 4,
                height: 4,
            },
            RgbaImage::from_pixel(4, 4, Rgba([255, 255, 255, 255])),
        ))
    }
}

/// Plays its steps in order, then repeats the last one
struct ScriptedFingerprinter {
    steps: Mutex<VecDeque<Step>>,
    last: Mutex<Option<Step>>,
}

impl Fingerprinter for ScriptedFingerprinter {
    fn fingerprint(&self, _image: &CapturedImage) -> anyhow::Result<CaptureFingerprint> {
        let mut last = self.last.lock().unwrap();
        if let Some(step) = self.steps.lock().unwrap().pop_front() {
            *last = Some(step);
        }

        match last.clone().expect("empty script") {
            Step::Missing => Err(Unsupported("OCR engine not available".into()).into()),
            Step::Fail(message) => Err(anyhow::anyhow!(message)),
            Step::Read(text, markers) => Ok(CaptureFingerprint::new(text, markers)),
        }
    }
}

#[derive(Clone, Default)]
struct CountingSink(Arc<Mutex<usize>>);

impl ArtifactSink for CountingSink {
    fn persist(&mut self, _image: &CapturedImage) -> anyhow::Result<()> {
        *self.0.lock().unwrap() += 1;
        Ok(())
    }
}

struct ScanHarness {
    from_scan: AsyncReceiver<AppEvent>,
    status: Arc<RwLock<ScanStatus>>,
    saved: CountingSink,
    cancel: CancellationToken,
    task: tokio::task::JoinHandle<anyhow::Result<()>>,
}

impl ScanHarness {
    fn start(steps: Vec<Step>) -> Self {
        let saved = CountingSink::default();
        let scanner = ChangeScanner::new(
            Box::new(BlankSource),
            Box::new(ScriptedFingerprinter {
                steps: Mutex::new(steps.into()),
                last: Mutex::new(None),
            }),
            Box::new(saved.clone()),
            ChangeDetector::exact(),
        );

        let (tx, from_scan) = kanal::bounded_async(256);
        let status = Arc::new(RwLock::new(ScanStatus::default()));
        let cancel = CancellationToken::new();
        let task = tokio::spawn(scan_loop(
            scanner,
            Duration::from_millis(5),
            status.clone(),
            tx,
            cancel.clone(),
        ));

        Self {
            from_scan,
            status,
            saved,
            cancel,
            task,
        }
    }

    async fn next(&self) -> AppEvent {
        match timeout(Duration::from_secs(2), self.from_scan.recv()).await {
            Ok(Ok(event)) => event,
            Ok(Err(e)) => panic!("Channel error: {}", e),
            Err(_) => panic!("Timeout - no event from the scan loop"),
        }
    }

    async fn stop(self) -> ScanStatus {
        self.cancel.cancel();
        let result = timeout(Duration::from_secs(2), self.task)
            .await
            .expect("scan loop did not stop")
            .expect("scan loop panicked");
        assert!(result.is_ok());
        self.status.read().await.clone()
    }
}

#[tokio::test]
async fn failed_tick_does_not_stop_scanning() {
    let scan = ScanHarness::start(vec![
        Step::Fail("ocr down"),
        Step::Fail("ocr down"),
        Step::Read("What is 2+2?", 4),
    ]);

    // the repeated error is shown once
    assert_eq!(
        scan.next().await,
        AppEvent::StatusUpdate {
            message: "Scan failed: ocr down".into(),
            level: StatusLevel::Warning,
        }
    );
    assert_eq!(
        scan.next().await,
        AppEvent::ScanReport {
            changed: true,
            recognized_text: "What is 2+2?".into(),
            marker_count: 4,
        }
    );
    assert_eq!(
        scan.next().await,
        AppEvent::ScanReport {
            changed: false,
            recognized_text: "What is 2+2?".into(),
            marker_count: 4,
        }
    );

    let saved = scan.saved.clone();
    let status = scan.stop().await;
    assert_eq!(status.errors, 2);
    assert_eq!(status.changes, 1);
    assert!(status.scans >= 2);
    assert!(status.last_error.is_none());
    assert_eq!(*saved.0.lock().unwrap(), 1);
}

#[tokio::test]
async fn missing_engine_is_reported_as_error_once() {
    let scan = ScanHarness::start(vec![Step::Missing]);

    assert_eq!(
        scan.next().await,
        AppEvent::StatusUpdate {
            message: "Scan failed: OCR engine not available".into(),
            level: StatusLevel::Error,
        }
    );

    // keeps ticking without repeating the notice
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(scan.from_scan.is_empty());

    let status = scan.stop().await;
    assert!(status.errors > 1);
    assert_eq!(status.scans, 0);
}

#[tokio::test]
async fn new_error_after_recovery_is_shown_again() {
    let scan = ScanHarness::start(vec![
        Step::Fail("ocr down"),
        Step::Read("Q1", 3),
        Step::Fail("ocr down"),
        Step::Read("Q2", 3),
    ]);

    assert!(matches!(scan.next().await, AppEvent::StatusUpdate { .. }));
    assert!(matches!(scan.next().await, AppEvent::ScanReport { changed: true, .. }));
    assert!(matches!(scan.next().await, AppEvent::StatusUpdate { .. }));
    assert_eq!(
        scan.next().await,
        AppEvent::ScanReport {
            changed: true,
            recognized_text: "Q2".into(),
            marker_count: 3,
        }
    );

    let status = scan.stop().await;
    assert_eq!(status.changes, 2);
}
