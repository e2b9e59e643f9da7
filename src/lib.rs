//! NeuroScan: patient and brain-MRI scan tracking with a learned tumor
//! classifier.
//!
//! The crate has two load-bearing halves: the relational access layer for
//! patients and scans (`db`), and the classification pipeline (`classify`)
//! that turns a raw image into a labeled, confidence-scored prediction,
//! including the placeholder fallback that keeps the engine answering when
//! the trained artifact cannot be loaded. The tumor reference bundle
//! (`reference`) and the PDF report generator (`report`) are downstream
//! consumers of repository output.

pub mod classify;
pub mod config;
pub mod db;
pub mod models;
pub mod reference;
pub mod report;

pub use classify::{ClassificationEngine, ClassifyError, Prediction};
pub use db::{DatabaseError, PatientRepository, ScanRepository};
pub use models::{NewPatient, NewScan, Patient, Scan, TumorType};
pub use reference::{TumorInfo, TumorReference};

use tracing_subscriber::EnvFilter;

/// Initialize tracing for binaries embedding this crate.
///
/// Honors `RUST_LOG` when set; falls back to the application default
/// filter otherwise. Call at most once per process.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("{} starting v{}", config::APP_NAME, config::APP_VERSION);
}
