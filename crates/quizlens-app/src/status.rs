use std::sync::Arc;
use std::time::SystemTime;

use tokio::sync::RwLock;

/// Scan loop counters
#[derive(Clone, Debug, Default)]
pub struct ScanStatus {
    pub scans: u64,
    pub changes: u64,
    pub errors: u64,
    pub last_scan_time: Option<SystemTime>,
    pub last_error: Option<String>,
}

impl ScanStatus {
    pub fn record_scan(&mut self, changed: bool) {
        self.scans += 1;
        if changed {
            self.changes += 1;
        }
        self.last_scan_time = Some(SystemTime::now());
        self.last_error = None;
    }

    /// Returns true when this error differs from the previous one
    pub fn record_error(&mut self, message: &str) -> bool {
        self.errors += 1;
        self.last_scan_time = Some(SystemTime::now());
        let is_new = self.last_error.as_deref() != Some(message);
        self.last_error = Some(message.to_string());
        is_new
    }
}

/// Application status
pub struct AppStatus {
    pub scan: Arc<RwLock<ScanStatus>>,
}

impl AppStatus {
    pub fn new() -> Self {
        Self {
            scan: Arc::new(RwLock::new(ScanStatus::default())),
        }
    }
}

impl Default for AppStatus {
    fn default() -> Self {
        Self::new()
    }
}
