use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::enums::TumorType;

/// A single MRI image submission tied to one patient.
///
/// The store owns only the image locator, never the image bytes.
/// `doctor_notes` is the only field that may change after creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scan {
    pub id: i64,
    pub patient_id: i64,
    pub image_path: String,
    pub tumor_type: Option<TumorType>,
    /// Classifier probability for `tumor_type`, in [0, 1] when present.
    pub confidence: Option<f64>,
    pub scan_date: NaiveDate,
    pub doctor_notes: Option<String>,
}

/// Fields supplied by the caller when recording a scan.
///
/// `patient_id` must reference an existing patient; the store enforces the
/// foreign key and the insert fails if it does not hold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewScan {
    pub patient_id: i64,
    pub image_path: String,
    pub tumor_type: Option<TumorType>,
    pub confidence: Option<f64>,
    pub doctor_notes: Option<String>,
}

impl NewScan {
    /// Unclassified scan: just the owning patient and the image locator.
    pub fn new(patient_id: i64, image_path: impl Into<String>) -> Self {
        Self {
            patient_id,
            image_path: image_path.into(),
            tumor_type: None,
            confidence: None,
            doctor_notes: None,
        }
    }

    /// Attach a classification result to the scan being recorded.
    pub fn with_result(mut self, tumor_type: TumorType, confidence: f64) -> Self {
        self.tumor_type = Some(tumor_type);
        self.confidence = Some(confidence);
        self
    }
}
