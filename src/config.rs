use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "NeuroScan";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Canonical file name of the trained classifier artifact.
pub const MODEL_FILE: &str = "brain_tumor_classifier.onnx";

/// Get the application data directory
/// ~/NeuroScan/ on all platforms (user-visible, per design requirement)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("NeuroScan")
}

/// Get the database directory
pub fn database_dir() -> PathBuf {
    app_data_dir().join("database")
}

/// Path of the patient/scan database file
pub fn database_path() -> PathBuf {
    database_dir().join("patients.db")
}

/// Get the models directory (trained classifier artifacts)
pub fn models_dir() -> PathBuf {
    app_data_dir().join("models")
}

/// Canonical location of the trained classifier artifact
pub fn model_path() -> PathBuf {
    models_dir().join(MODEL_FILE)
}

/// Alternative locations checked when the canonical artifact is missing,
/// in order. First loadable artifact wins.
pub fn alternative_model_paths() -> Vec<PathBuf> {
    vec![PathBuf::from(MODEL_FILE), app_data_dir().join(MODEL_FILE)]
}

/// Default tracing filter when RUST_LOG is unset
pub fn default_log_filter() -> String {
    format!("info,{}=debug", env!("CARGO_PKG_NAME"))
}
