use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A registered patient.
///
/// `id` is assigned by the store on insert and immutable thereafter.
/// `registration_date` is set exactly once, to the day of registration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Patient {
    pub id: i64,
    pub name: String,
    pub age: i64,
    pub gender: String,
    pub contact: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub medical_history: Option<String>,
    pub registration_date: NaiveDate,
}

/// Fields supplied by the caller when registering a patient.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewPatient {
    pub name: String,
    pub age: i64,
    pub gender: String,
    pub contact: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
    pub medical_history: Option<String>,
}

impl NewPatient {
    /// Minimal constructor; optional fields default to absent.
    pub fn new(name: impl Into<String>, age: i64, gender: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            age,
            gender: gender.into(),
            ..Default::default()
        }
    }
}
