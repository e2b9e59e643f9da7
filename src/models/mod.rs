pub mod enums;
pub mod patient;
pub mod scan;

pub use enums::TumorType;
pub use patient::{NewPatient, Patient};
pub use scan::{NewScan, Scan};
