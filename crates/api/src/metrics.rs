use extract::ExtractionResult;
use serde::Serialize;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

pub struct Metrics {
    // Counters
    total_requests: AtomicUsize,
    successful_requests: AtomicUsize,
    failed_requests: AtomicUsize,

    // Timing (in microseconds)
    total_extract_time_us: AtomicU64,
    total_translate_time_us: AtomicU64,

    // Counts
    total_extractions: AtomicUsize,
    total_translations: AtomicUsize,

    // How often each field was found
    disease_name_found: AtomicUsize,
    disease_icd_code_found: AtomicUsize,
    medicine_name_found: AtomicUsize,
}

impl Metrics {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            total_requests: AtomicUsize::new(0),
            successful_requests: AtomicUsize::new(0),
            failed_requests: AtomicUsize::new(0),
            total_extract_time_us: AtomicU64::new(0),
            total_translate_time_us: AtomicU64::new(0),
            total_extractions: AtomicUsize::new(0),
            total_translations: AtomicUsize::new(0),
            disease_name_found: AtomicUsize::new(0),
            disease_icd_code_found: AtomicUsize::new(0),
            medicine_name_found: AtomicUsize::new(0),
        })
    }

    pub fn record_request(&self, success: bool) {
        self.total_requests.fetch_add(1, Ordering::Relaxed);
        if success {
            self.successful_requests.fetch_add(1, Ordering::Relaxed);
        } else {
            self.failed_requests.fetch_add(1, Ordering::Relaxed);
        }
    }

    pub fn record_extraction(&self, duration: Duration, fields: &ExtractionResult) {
        self.total_extract_time_us.fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        self.total_extractions.fetch_add(1, Ordering::Relaxed);

        for (found, counter) in [
            (fields.disease_name.is_some(), &self.disease_name_found),
            (fields.disease_icd_code.is_some(), &self.disease_icd_code_found),
            (fields.medicine_name.is_some(), &self.medicine_name_found),
        ] {
            if found {
                counter.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    pub fn record_translation(&self, duration: Duration) {
        self.total_translate_time_us.fetch_add(duration.as_micros() as u64, Ordering::Relaxed);
        self.total_translations.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            successful_requests: self.successful_requests.load(Ordering::Relaxed),
            failed_requests: self.failed_requests.load(Ordering::Relaxed),
            total_extractions: self.total_extractions.load(Ordering::Relaxed),
            total_translations: self.total_translations.load(Ordering::Relaxed),
            avg_extract_time_ms: avg_time_ms(&self.total_extract_time_us, &self.total_extractions),
            avg_translate_time_ms: avg_time_ms(&self.total_translate_time_us, &self.total_translations),
            fields_found: FieldCounts {
                disease_name: self.disease_name_found.load(Ordering::Relaxed),
                disease_icd_code: self.disease_icd_code_found.load(Ordering::Relaxed),
                medicine_name: self.medicine_name_found.load(Ordering::Relaxed),
            },
        }
    }
}

fn avg_time_ms(total_us: &AtomicU64, count: &AtomicUsize) -> f64 {
    let total = total_us.load(Ordering::Relaxed) as f64;
    let cnt = count.load(Ordering::Relaxed) as f64;
    if cnt > 0.0 {
        total / cnt / 1000.0 // Convert to ms
    } else {
        0.0
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub total_requests: usize,
    pub successful_requests: usize,
    pub failed_requests: usize,
    pub total_extractions: usize,
    pub total_translations: usize,
    pub avg_extract_time_ms: f64,
    pub avg_translate_time_ms: f64,
    pub fields_found: FieldCounts,
}

#[derive(Debug, Clone, Serialize)]
pub struct FieldCounts {
    pub disease_name: usize,
    pub disease_icd_code: usize,
    pub medicine_name: usize,
}

pub struct TimedOperation {
    start: Instant,
}

impl TimedOperation {
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}
