use std::path::PathBuf;

use chrono::{Local, NaiveDate};
use rusqlite::{params, Connection};

use crate::db::{open_database, DatabaseError};
use crate::models::{NewPatient, Patient};

const PATIENT_COLUMNS: &str = "id, name, age, gender, contact, email, address, \
     medical_history, registration_date";

/// Insert a patient row and return its store-assigned id.
///
/// `registration_date` is a parameter so tests can pin it; production
/// callers pass the current day (see `PatientRepository::create`).
pub fn insert_patient(
    conn: &Connection,
    patient: &NewPatient,
    registration_date: NaiveDate,
) -> Result<i64, DatabaseError> {
    if patient.name.trim().is_empty() {
        return Err(DatabaseError::ConstraintViolation(
            "patient name must be non-empty".into(),
        ));
    }
    conn.execute(
        "INSERT INTO patients (name, age, gender, contact, email, address, medical_history, registration_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            patient.name,
            patient.age,
            patient.gender,
            patient.contact,
            patient.email,
            patient.address,
            patient.medical_history,
            registration_date.format("%Y-%m-%d").to_string(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_patient(conn: &Connection, id: i64) -> Result<Option<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?1"
    ))?;

    let result = stmt.query_row(params![id], patient_row_from_rusqlite);

    match result {
        Ok(row) => Ok(Some(patient_from_row(row)?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// All patients, name ascending.
pub fn list_patients(conn: &Connection) -> Result<Vec<Patient>, DatabaseError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PATIENT_COLUMNS} FROM patients ORDER BY name"
    ))?;

    let rows = stmt.query_map([], |row| Ok(patient_row_from_rusqlite(row)))?;

    let mut patients = Vec::new();
    for row in rows {
        patients.push(patient_from_row(row??)?);
    }
    Ok(patients)
}

/// Case-insensitive substring search over name, contact and email.
///
/// An empty query matches every patient (substring of everything); the
/// caller decides whether to treat that as "list all".
pub fn search_patients(conn: &Connection, query: &str) -> Result<Vec<Patient>, DatabaseError> {
    let pattern = format!("%{query}%");
    let mut stmt = conn.prepare(&format!(
        "SELECT {PATIENT_COLUMNS} FROM patients
         WHERE LOWER(name) LIKE LOWER(?1)
            OR LOWER(contact) LIKE LOWER(?1)
            OR LOWER(email) LIKE LOWER(?1)
         ORDER BY name"
    ))?;

    let rows = stmt.query_map(params![pattern], |row| Ok(patient_row_from_rusqlite(row)))?;

    let mut patients = Vec::new();
    for row in rows {
        patients.push(patient_from_row(row??)?);
    }
    Ok(patients)
}

// Internal row type for Patient mapping
struct PatientRow {
    id: i64,
    name: String,
    age: i64,
    gender: String,
    contact: Option<String>,
    email: Option<String>,
    address: Option<String>,
    medical_history: Option<String>,
    registration_date: String,
}

fn patient_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<PatientRow, rusqlite::Error> {
    Ok(PatientRow {
        id: row.get(0)?,
        name: row.get(1)?,
        age: row.get(2)?,
        gender: row.get(3)?,
        contact: row.get(4)?,
        email: row.get(5)?,
        address: row.get(6)?,
        medical_history: row.get(7)?,
        registration_date: row.get(8)?,
    })
}

fn patient_from_row(row: PatientRow) -> Result<Patient, DatabaseError> {
    Ok(Patient {
        id: row.id,
        name: row.name,
        age: row.age,
        gender: row.gender,
        contact: row.contact,
        email: row.email,
        address: row.address,
        medical_history: row.medical_history,
        registration_date: NaiveDate::parse_from_str(&row.registration_date, "%Y-%m-%d")
            .map_err(|e| DatabaseError::ConstraintViolation(e.to_string()))?,
    })
}

// ─── Repository facade ────────────────────────────────────────────────────────

/// Patient access with the "absence over exception" contract.
///
/// Each operation opens one connection, uses it and releases it. Storage
/// faults are logged and collapsed into `None` / empty results, so
/// callers only ever see missing-data signals from this layer. The structured
/// error detail stays available on the connection-level functions above.
#[derive(Debug, Clone)]
pub struct PatientRepository {
    db_path: PathBuf,
}

impl PatientRepository {
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

    /// Register a patient; `registration_date` is set to today, once.
    /// Returns the new id, or `None` on any storage fault or invalid input.
    pub fn create(&self, patient: &NewPatient) -> Option<i64> {
        let today = Local::now().date_naive();
        match self
            .connect()
            .and_then(|conn| insert_patient(&conn, patient, today))
        {
            Ok(id) => {
                tracing::info!("Added patient {} with ID {id}", patient.name);
                Some(id)
            }
            Err(e) => {
                tracing::error!("Error adding patient: {e}");
                None
            }
        }
    }

    /// Absent is an expected outcome, not an error.
    pub fn get(&self, id: i64) -> Option<Patient> {
        match self.connect().and_then(|conn| get_patient(&conn, id)) {
            Ok(patient) => patient,
            Err(e) => {
                tracing::error!("Error getting patient {id}: {e}");
                None
            }
        }
    }

    /// All patients, sorted by name ascending.
    pub fn list_all(&self) -> Vec<Patient> {
        match self.connect().and_then(|conn| list_patients(&conn)) {
            Ok(patients) => patients,
            Err(e) => {
                tracing::error!("Error getting all patients: {e}");
                Vec::new()
            }
        }
    }

    /// Search by name, contact or email. Empty query matches everything.
    pub fn search(&self, query: &str) -> Vec<Patient> {
        match self
            .connect()
            .and_then(|conn| search_patients(&conn, query))
        {
            Ok(patients) => patients,
            Err(e) => {
                tracing::error!("Error searching patients: {e}");
                Vec::new()
            }
        }
    }
}
