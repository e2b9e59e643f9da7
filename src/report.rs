//! PDF scan report: one patient, one scan, optional tumor reference text.
//!
//! Formatting only; the repositories guarantee the shape of the data
//! handed in; the single validation here is that the scan actually belongs
//! to the patient.

use std::io::BufWriter;

use chrono::Local;
use printpdf::*;
use thiserror::Error;

use crate::models::{Patient, Scan};
use crate::reference::TumorInfo;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Scan {scan_id} does not belong to patient {patient_id}")]
    MismatchedScan { scan_id: i64, patient_id: i64 },

    #[error("PDF generation failed: {0}")]
    Pdf(String),
}

/// Generate a scan report PDF. Returns the PDF bytes.
pub fn generate_scan_report(
    patient: &Patient,
    scan: &Scan,
    tumor_info: Option<&TumorInfo>,
) -> Result<Vec<u8>, ReportError> {
    if scan.patient_id != patient.id {
        return Err(ReportError::MismatchedScan {
            scan_id: scan.id,
            patient_id: patient.id,
        });
    }

    let (doc, page1, layer1) =
        PdfDocument::new("Brain Tumor Analysis Report", Mm(210.0), Mm(297.0), "Layer 1");
    let layer = doc.get_page(page1).get_layer(layer1);
    let font = doc
        .add_builtin_font(BuiltinFont::Helvetica)
        .map_err(|e| ReportError::Pdf(format!("font error: {e}")))?;
    let bold = doc
        .add_builtin_font(BuiltinFont::HelveticaBold)
        .map_err(|e| ReportError::Pdf(format!("font error: {e}")))?;

    let mut y = Mm(280.0);

    // Title and report date
    layer.use_text("Brain Tumor Analysis Report", 14.0, Mm(20.0), y, &bold);
    y -= Mm(8.0);
    let report_date = Local::now().format("%B %d, %Y").to_string();
    layer.use_text(format!("Report Date: {report_date}"), 9.0, Mm(20.0), y, &font);
    y -= Mm(10.0);

    // Patient information
    layer.use_text("PATIENT INFORMATION", 11.0, Mm(20.0), y, &bold);
    y -= Mm(6.0);
    let patient_lines = [
        format!("Name: {}", patient.name),
        format!("Patient ID: {}", patient.id),
        format!("Age: {}", patient.age),
        format!("Gender: {}", patient.gender),
        format!("Contact: {}", patient.contact.as_deref().unwrap_or("N/A")),
        format!("Registration Date: {}", patient.registration_date),
    ];
    for line in &patient_lines {
        layer.use_text(line, 9.0, Mm(25.0), y, &font);
        y -= Mm(4.5);
    }
    y -= Mm(3.0);

    if let Some(history) = &patient.medical_history {
        layer.use_text("Medical History:", 10.0, Mm(20.0), y, &bold);
        y -= Mm(5.0);
        for line in wrap_text(history, 90) {
            layer.use_text(&line, 9.0, Mm(25.0), y, &font);
            y -= Mm(4.5);
        }
        y -= Mm(3.0);
    }

    // Scan information
    layer.use_text("SCAN INFORMATION", 11.0, Mm(20.0), y, &bold);
    y -= Mm(6.0);
    let tumor_label = scan
        .tumor_type
        .map(|t| t.as_str().to_string())
        .unwrap_or_else(|| "N/A".into());
    let confidence_label = scan
        .confidence
        .map(|c| format!("{:.2}%", c * 100.0))
        .unwrap_or_else(|| "N/A".into());
    let scan_lines = [
        format!("Scan ID: {}", scan.id),
        format!("Scan Date: {}", scan.scan_date),
        format!("Image: {}", scan.image_path),
        format!("Detected Tumor Type: {tumor_label}"),
        format!("Confidence: {confidence_label}"),
    ];
    for line in &scan_lines {
        layer.use_text(line, 9.0, Mm(25.0), y, &font);
        y -= Mm(4.5);
    }
    y -= Mm(3.0);

    if let Some(notes) = &scan.doctor_notes {
        layer.use_text("Doctor's Notes:", 10.0, Mm(20.0), y, &bold);
        y -= Mm(5.0);
        for line in wrap_text(notes, 90) {
            layer.use_text(&line, 9.0, Mm(25.0), y, &font);
            y -= Mm(4.5);
        }
        y -= Mm(3.0);
    }

    // Tumor reference
    if let Some(info) = tumor_info {
        layer.use_text("TUMOR INFORMATION", 11.0, Mm(20.0), y, &bold);
        y -= Mm(6.0);

        layer.use_text(format!("{} ({})", info.name, info.origin), 10.0, Mm(25.0), y, &bold);
        y -= Mm(5.0);
        for line in wrap_text(&info.description, 90) {
            layer.use_text(&line, 9.0, Mm(25.0), y, &font);
            y -= Mm(4.5);
        }
        y -= Mm(2.0);

        layer.use_text("Common Symptoms:", 10.0, Mm(25.0), y, &bold);
        y -= Mm(5.0);
        for symptom in &info.common_symptoms {
            layer.use_text(format!("  · {symptom}"), 9.0, Mm(25.0), y, &font);
            y -= Mm(4.5);
        }
        y -= Mm(2.0);

        layer.use_text("Treatment Options:", 10.0, Mm(25.0), y, &bold);
        y -= Mm(5.0);
        for treatment in &info.treatment_options {
            layer.use_text(format!("  · {treatment}"), 9.0, Mm(25.0), y, &font);
            y -= Mm(4.5);
        }
        y -= Mm(2.0);

        layer.use_text("Prognosis:", 10.0, Mm(25.0), y, &bold);
        y -= Mm(5.0);
        for line in wrap_text(&info.prognosis, 90) {
            layer.use_text(&line, 9.0, Mm(25.0), y, &font);
            y -= Mm(4.5);
        }
        y -= Mm(3.0);
    }

    // Disclaimer
    y -= Mm(5.0);
    let disclaimer = "Disclaimer: this report is generated from machine learning analysis \
         and must be reviewed by a qualified medical professional. It is not a substitute \
         for professional medical advice, diagnosis, or treatment.";
    for line in wrap_text(disclaimer, 95) {
        layer.use_text(&line, 8.0, Mm(20.0), y, &font);
        y -= Mm(4.0);
    }

    let mut buf = BufWriter::new(Vec::new());
    doc.save(&mut buf)
        .map_err(|e| ReportError::Pdf(format!("save error: {e}")))?;
    buf.into_inner()
        .map_err(|e| ReportError::Pdf(format!("buffer error: {e}")))
}

fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.len() + word.len() + 1 > max_chars && !current.is_empty() {
            lines.push(current.clone());
            current.clear();
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}
