use std::path::PathBuf;
use std::str::FromStr;

use chrono::{Local, NaiveDate};
use rusqlite::{params, Connection};

use crate::db::{open_database, DatabaseError};
use crate::models::{NewScan, Scan, TumorType};

const SCAN_COLUMNS: &str =
    "id, patient_id, image_path, tumor_type, confidence, scan_date, doctor_notes";

/// Insert a scan row and return its store-assigned id.
///
/// The foreign key to `patients` is enforced by the store: inserting for a
/// non-existent patient fails and creates no row. `scan_date` is a
/// parameter so tests can pin it; production callers pass the current day.
pub fn insert_scan(
    conn: &Connection,
    scan: &NewScan,
    scan_date: NaiveDate,
) -> Result<i64, DatabaseError> {
    if let Some(confidence) = scan.confidence {
        if !(0.0..=1.0).contains(&confidence) {
            return Err(DatabaseError::ConstraintViolation(format!(
                "confidence {confidence} outside [0, 1]"
            )));
        }
    }
    conn.execute(
        "INSERT INTO scans (patient_id, image_path, tumor_type, confidence, scan_date, doctor_notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            scan.patient_id,
            scan.image_path,
            scan.tumor_type.map(|t| t.as_str()),
            scan.confidence,
            scan_date.format("%Y-%m-%d").to_string(),
            scan.doctor_notes,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_scan(conn: &Connection, id: i64) -> Result<Option<Scan>, DatabaseError> {
    let mut stmt = conn.prepare(&format!("SELECT {SCAN_COLUMNS} FROM scans WHERE id = ?1"))?;

    let result = stmt.query_row(params![id], scan_row_from_rusqlite);

    match result {
        Ok(row) => Ok(Some(scan_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// All scans for one patient, most recent first.
///
/// Ordered by `scan_date` descending; same-day scans tie-break on `id`
/// descending, i.e. most recently inserted first.
pub fn scans_for_patient(conn: &Connection, patient_id: i64) -> Result<Vec<Scan>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {SCAN_COLUMNS} FROM scans
         WHERE patient_id = ?1
         ORDER BY scan_date DESC, id DESC"
    ))?;

    let rows = stmt.query_map(params![patient_id], |row| Ok(scan_row_from_rusqlite(row)))?;

    let mut scans = Vec::new();
    for row in rows {
        scans.push(scan_from_row(row??)?);
    }
    Ok(scans)
}

/// Replace the doctor notes on an existing scan, the only supported
/// post-creation mutation. Returns whether a row was actually updated.
pub fn update_scan_notes(
    conn: &Connection,
    id: i64,
    doctor_notes: Option<&str>,
) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE scans SET doctor_notes = ?1 WHERE id = ?2",
        params![doctor_notes, id],
    )?;
    Ok(changed > 0)
}

// Internal row type for Scan mapping
struct ScanRow {
    id: i64,
    patient_id: i64,
    image_path: String,
    tumor_type: Option<String>,
    confidence: Option<f64>,
    scan_date: String,
    doctor_notes: Option<String>,
}

fn scan_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<ScanRow, rusqlite::Error> {
    Ok(ScanRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        image_path: row.get(2)?,
        tumor_type: row.get(3)?,
        confidence: row.get(4)?,
        scan_date: row.get(5)?,
        doctor_notes: row.get(6)?,
    })
}

fn scan_from_row(row: ScanRow) -> Result<Scan, DatabaseError> {
    Ok(Scan {
        id: row.id,
        patient_id: row.patient_id,
        image_path: row.image_path,
        tumor_type: row
            .tumor_type
            .as_deref()
            .map(TumorType::from_str)
            .transpose()?,
        confidence: row.confidence,
        scan_date: NaiveDate::parse_from_str(&row.scan_date, "%Y-%m-%d")
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
        doctor_notes: row.doctor_notes,
    })
}

// ─── Repository facade ────────────────────────────────────────────────────────

/// Scan access with the "absence over exception" contract.
///
/// Same policy as `PatientRepository`: one connection per call, storage
/// faults logged and collapsed into absent/empty/false results.
#[derive(Debug, Clone)]
pub struct ScanRepository {
    db_path: PathBuf,
}

impl ScanRepository {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    /// Repository over the default application database location.
    pub fn open_default() -> Self {
        Self::new(crate::config::database_path())
    }

    fn connect(&self) -> Result<Connection, DatabaseError> {
        open_database(&self.db_path)
    }

    /// Record a scan; `scan_date` is set to today, once. The caller should
    /// have verified `patient_id` exists; the store enforces the foreign
    /// key regardless, and a violation yields `None` with no row created.
    pub fn create(&self, scan: &NewScan) -> Option<i64> {
        let today = Local::now().date_naive();
        match self
            .connect()
            .and_then(|conn| insert_scan(&conn, scan, today))
        {
            Ok(id) => {
                tracing::info!(
                    "Added scan for patient {} with scan ID {id}",
                    scan.patient_id
                );
                Some(id)
            }
            Err(e) => {
                tracing::error!("Error adding scan: {e}");
                None
            }
        }
    }

    pub fn get(&self, id: i64) -> Option<Scan> {
        match self.connect().and_then(|conn| get_scan(&conn, id)) {
            Ok(scan) => scan,
            Err(e) => {
                tracing::error!("Error getting scan {id}: {e}");
                None
            }
        }
    }

    /// All scans for a patient, scan_date descending.
    pub fn list_for_patient(&self, patient_id: i64) -> Vec<Scan> {
        match self
            .connect()
            .and_then(|conn| scans_for_patient(&conn, patient_id))
        {
            Ok(scans) => scans,
            Err(e) => {
                tracing::error!("Error getting scans for patient {patient_id}: {e}");
                Vec::new()
            }
        }
    }

    /// Update doctor notes on an existing scan. False when the scan does
    /// not exist or the store is unreachable (logged).
    pub fn update_notes(&self, id: i64, doctor_notes: Option<&str>) -> bool {
        match self
            .connect()
            .and_then(|conn| update_scan_notes(&conn, id, doctor_notes))
        {
            Ok(updated) => {
                if updated {
                    tracing::info!("Updated scan {id}");
                }
                updated
            }
            Err(e) => {
                tracing::error!("Error updating scan {id}: {e}");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::open_memory_database;
    use crate::db::repository::patient::{insert_patient, PatientRepository};
    use crate::models::NewPatient;

    fn setup_patient(conn: &Connection) -> i64 {
        let date = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        insert_patient(conn, &NewPatient::new("Jane Doe", 34, "F"), date).unwrap()
    }

    #[test]
    fn insert_then_get_roundtrips_every_field() {
        let conn = open_memory_database().unwrap();
        let patient_id = setup_patient(&conn);
        let date = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();

        let new = NewScan {
            patient_id,
            image_path: "scan01.png".into(),
            tumor_type: Some(TumorType::Meningioma),
            confidence: Some(0.87),
            doctor_notes: Some("Review at next visit".into()),
        };
        let id = insert_scan(&conn, &new, date).unwrap();

        let scan = get_scan(&conn, id).unwrap().unwrap();
        assert_eq!(scan.id, id);
        assert_eq!(scan.patient_id, patient_id);
        assert_eq!(scan.image_path, "scan01.png");
        assert_eq!(scan.tumor_type, Some(TumorType::Meningioma));
        assert_eq!(scan.confidence, Some(0.87));
        assert_eq!(scan.scan_date, date);
        assert_eq!(scan.doctor_notes.as_deref(), Some("Review at next visit"));
    }

    #[test]
    fn insert_with_unknown_patient_fails_and_creates_no_row() {
        let conn = open_memory_database().unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();

        let result = insert_scan(&conn, &NewScan::new(999, "scan01.png"), date);
        assert!(result.is_err());

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM scans", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn insert_rejects_out_of_range_confidence() {
        let conn = open_memory_database().unwrap();
        let patient_id = setup_patient(&conn);
        let date = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();

        let mut new = NewScan::new(patient_id, "scan01.png");
        new.confidence = Some(1.2);
        assert!(insert_scan(&conn, &new, date).is_err());

        new.confidence = Some(-0.1);
        assert!(insert_scan(&conn, &new, date).is_err());
    }

    #[test]
    fn list_orders_by_date_desc_then_insertion_desc() {
        let conn = open_memory_database().unwrap();
        let patient_id = setup_patient(&conn);

        let feb = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        let may = NaiveDate::from_ymd_opt(2026, 5, 1).unwrap();

        let first_feb = insert_scan(&conn, &NewScan::new(patient_id, "a.png"), feb).unwrap();
        let only_may = insert_scan(&conn, &NewScan::new(patient_id, "b.png"), may).unwrap();
        let second_feb = insert_scan(&conn, &NewScan::new(patient_id, "c.png"), feb).unwrap();

        let ids: Vec<i64> = scans_for_patient(&conn, patient_id)
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        // May first, then the two February scans most-recently-inserted first
        assert_eq!(ids, vec![only_may, second_feb, first_feb]);
    }

    #[test]
    fn list_is_scoped_to_one_patient() {
        let conn = open_memory_database().unwrap();
        let date = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();
        let first = setup_patient(&conn);
        let second =
            insert_patient(&conn, &NewPatient::new("Sam Poe", 41, "M"), date).unwrap();

        insert_scan(&conn, &NewScan::new(first, "a.png"), date).unwrap();
        insert_scan(&conn, &NewScan::new(second, "b.png"), date).unwrap();

        let scans = scans_for_patient(&conn, first).unwrap();
        assert_eq!(scans.len(), 1);
        assert_eq!(scans[0].image_path, "a.png");
    }

    #[test]
    fn update_notes_changes_only_doctor_notes() {
        let conn = open_memory_database().unwrap();
        let patient_id = setup_patient(&conn);
        let date = NaiveDate::from_ymd_opt(2026, 8, 7).unwrap();

        let new = NewScan::new(patient_id, "scan01.png")
            .with_result(TumorType::Glioma, 0.91);
        let id = insert_scan(&conn, &new, date).unwrap();
        let before = get_scan(&conn, id).unwrap().unwrap();

        assert!(update_scan_notes(&conn, id, Some("Stable, follow up in 6 months")).unwrap());

        let after = get_scan(&conn, id).unwrap().unwrap();
        assert_eq!(
            after.doctor_notes.as_deref(),
            Some("Stable, follow up in 6 months")
        );
        assert_eq!(
            Scan {
                doctor_notes: before.doctor_notes.clone(),
                ..after.clone()
            },
            before
        );
    }

    #[test]
    fn update_notes_on_missing_scan_is_false() {
        let conn = open_memory_database().unwrap();
        assert!(!update_scan_notes(&conn, 123, Some("nope")).unwrap());
    }

    #[test]
    fn facade_fk_violation_yields_none() {
        let dir = tempfile::tempdir().unwrap();
        let repo = ScanRepository::new(dir.path().join("patients.db"));
        assert_eq!(repo.create(&NewScan::new(77, "scan01.png")), None);
        assert!(repo.list_for_patient(77).is_empty());
    }

    // Example scenario: register, classify, record, retrieve.
    #[test]
    fn scenario_patient_scan_classified_and_listed() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("patients.db");
        let patients = PatientRepository::new(&db_path);
        let scans = ScanRepository::new(&db_path);

        let patient_id = patients
            .create(&NewPatient::new("Jane Doe", 34, "F"))
            .unwrap();
        assert_eq!(patient_id, 1);

        let scan = NewScan::new(patient_id, "scan01.png")
            .with_result(TumorType::Meningioma, 0.87);
        let scan_id = scans.create(&scan).unwrap();

        let listed = scans.list_for_patient(patient_id);
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, scan_id);
        assert_eq!(listed[0].tumor_type, Some(TumorType::Meningioma));
        assert_eq!(listed[0].confidence, Some(0.87));
    }
}
