use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use super::model::{PlaceholderModel, TumorModel, NUM_CLASSES};
use super::preprocess;
use super::ClassifyError;
use crate::config;
use crate::models::TumorType;

/// Ordered label set of the classifier, part of the external contract
/// together with the 150x150x3 input canvas. Must not change silently
/// between model versions.
pub const CLASS_LABELS: [&str; NUM_CLASSES] = ["glioma", "meningioma", "notumor", "pituitary"];

/// Where to look for the trained artifact: one canonical location, then a
/// fixed ordered list of alternatives.
#[derive(Debug, Clone)]
pub struct ModelLocations {
    pub primary: PathBuf,
    pub alternatives: Vec<PathBuf>,
}

impl Default for ModelLocations {
    fn default() -> Self {
        Self {
            primary: config::model_path(),
            alternatives: config::alternative_model_paths(),
        }
    }
}

// Acquisition outcome. Collapsed into the unified engine before exposure;
// callers never learn which branch was taken, only the log does.
enum AcquiredModel {
    Loaded(Box<dyn TumorModel>),
    Fallback(Box<dyn TumorModel>),
}

/// One classification result. Not persisted; the caller decides whether
/// to record it on a scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prediction {
    pub predicted_class: TumorType,
    /// Probability mass of `predicted_class`.
    pub confidence: f32,
    /// Probability per label, over the full closed label set.
    pub class_confidences: HashMap<String, f32>,
    /// The ordered label set used by the engine (`CLASS_LABELS`).
    pub class_labels: Vec<String>,
}

impl Prediction {
    fn from_probabilities(probs: &[f32]) -> Result<Self, ClassifyError> {
        if probs.len() != NUM_CLASSES {
            return Err(ClassifyError::BadOutput {
                expected: NUM_CLASSES,
                got: probs.len(),
            });
        }

        // Arg-max, first maximum wins
        let mut best = 0;
        for (i, &p) in probs.iter().enumerate() {
            if p > probs[best] {
                best = i;
            }
        }

        let predicted_class = TumorType::from_index(best).ok_or(ClassifyError::BadOutput {
            expected: NUM_CLASSES,
            got: probs.len(),
        })?;

        let class_confidences = TumorType::ALL
            .iter()
            .zip(probs.iter())
            .map(|(t, &p)| (t.as_str().to_string(), p))
            .collect();

        Ok(Self {
            predicted_class,
            confidence: probs[best],
            class_confidences,
            class_labels: CLASS_LABELS.iter().map(|l| l.to_string()).collect(),
        })
    }
}

/// The classification engine: owns the model for the process lifetime.
///
/// Construction runs the model acquisition state machine exactly once and
/// always terminates in a ready engine: a failed artifact load degrades
/// to the placeholder instead of erroring. The engine is read-only after
/// initialization, so concurrent `classify` calls are safe.
pub struct ClassificationEngine {
    model: Box<dyn TumorModel>,
}

impl ClassificationEngine {
    /// Acquire a model from the given locations and build the engine.
    /// Never fails; the terminal recovery state is the placeholder model.
    pub fn initialize(locations: &ModelLocations) -> Self {
        let model = match Self::acquire(locations) {
            AcquiredModel::Loaded(model) => {
                tracing::info!("Classification engine ready (trained model)");
                model
            }
            AcquiredModel::Fallback(model) => {
                tracing::warn!(
                    "Classification engine ready (placeholder model; predictions are not diagnostic)"
                );
                model
            }
        };
        Self { model }
    }

    /// Build an engine around an explicit model (tests, custom runtimes).
    pub fn with_model(model: Box<dyn TumorModel>) -> Self {
        Self { model }
    }

    /// Process-wide engine, initialized on first use from the default
    /// locations. Subsequent callers share the same read-only instance.
    pub fn global() -> &'static ClassificationEngine {
        static ENGINE: OnceLock<ClassificationEngine> = OnceLock::new();
        ENGINE.get_or_init(|| Self::initialize(&ModelLocations::default()))
    }

    fn acquire(locations: &ModelLocations) -> AcquiredModel {
        #[cfg(feature = "onnx-model")]
        {
            use super::model::OnnxModel;

            let mut candidates = vec![locations.primary.clone()];
            candidates.extend(locations.alternatives.iter().cloned());

            for path in &candidates {
                if !path.exists() {
                    tracing::debug!("No model artifact at {}", path.display());
                    continue;
                }
                match OnnxModel::load(path) {
                    Ok(model) => return AcquiredModel::Loaded(Box::new(model)),
                    Err(e) => {
                        tracing::warn!(
                            "Failed to load model artifact from {}: {e}",
                            path.display()
                        );
                    }
                }
            }
        }
        #[cfg(not(feature = "onnx-model"))]
        {
            let _ = locations;
            tracing::debug!("Built without the onnx-model feature; artifact lookup skipped");
        }

        tracing::warn!("No loadable classifier artifact; constructing a placeholder model");
        AcquiredModel::Fallback(Box::new(PlaceholderModel::new()))
    }

    /// Classify one image file.
    ///
    /// Per-call faults (unreadable path, corrupt image, inference error)
    /// are contained in the returned error; the engine stays usable for
    /// subsequent calls.
    pub fn classify(&self, image_path: &Path) -> Result<Prediction, ClassifyError> {
        let tensor = preprocess::preprocess_file(image_path)?;
        let probs = self.model.predict(&tensor)?;
        Prediction::from_probabilities(&probs)
    }

    /// Classify an in-memory image (e.g. an upload not yet written out).
    pub fn classify_bytes(&self, image_bytes: &[u8]) -> Result<Prediction, ClassifyError> {
        let tensor = preprocess::preprocess_bytes(image_bytes)?;
        let probs = self.model.predict(&tensor)?;
        Prediction::from_probabilities(&probs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, RgbImage};
    use std::io::Cursor;
    use std::io::Write;

    fn sample_png() -> Vec<u8> {
        let rgb = RgbImage::from_fn(200, 160, |x, y| {
            image::Rgb([(x % 256) as u8, (y % 256) as u8, ((x * y) % 256) as u8])
        });
        let mut buf = Vec::new();
        DynamicImage::ImageRgb8(rgb)
            .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
            .unwrap();
        buf
    }

    fn unreachable_locations() -> ModelLocations {
        ModelLocations {
            primary: PathBuf::from("/nonexistent/brain_tumor_classifier.onnx"),
            alternatives: vec![PathBuf::from("/also/nonexistent.onnx")],
        }
    }

    #[test]
    fn fallback_keeps_engine_alive() {
        // No artifact anywhere. The engine must still answer, via the
        // placeholder, with a well-formed prediction.
        let engine = ClassificationEngine::initialize(&unreachable_locations());
        let prediction = engine.classify_bytes(&sample_png()).unwrap();
        assert!(CLASS_LABELS.contains(&prediction.predicted_class.as_str()));
    }

    #[test]
    fn confidences_are_bounded_and_sum_to_one() {
        let engine = ClassificationEngine::initialize(&unreachable_locations());
        let prediction = engine.classify_bytes(&sample_png()).unwrap();

        assert_eq!(prediction.class_confidences.len(), NUM_CLASSES);
        let mut sum = 0.0f32;
        for label in CLASS_LABELS {
            let p = prediction.class_confidences[label];
            assert!((0.0..=1.0).contains(&p));
            sum += p;
        }
        assert!((sum - 1.0).abs() < 1e-3, "confidences sum to {sum}");
        assert_eq!(prediction.class_labels, CLASS_LABELS.to_vec());
    }

    #[test]
    fn confidence_equals_predicted_class_mass() {
        let engine = ClassificationEngine::initialize(&unreachable_locations());
        let prediction = engine.classify_bytes(&sample_png()).unwrap();
        assert_eq!(
            prediction.confidence,
            prediction.class_confidences[prediction.predicted_class.as_str()]
        );
    }

    #[test]
    fn classify_reads_from_file() {
        let engine = ClassificationEngine::initialize(&unreachable_locations());

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&sample_png()).unwrap();
        file.flush().unwrap();

        assert!(engine.classify(file.path()).is_ok());
    }

    #[test]
    fn per_call_faults_do_not_poison_the_engine() {
        let engine = ClassificationEngine::initialize(&unreachable_locations());

        assert!(engine.classify(Path::new("/no/such/image.png")).is_err());
        assert!(engine.classify_bytes(&[0u8; 512]).is_err());

        // Still answers after failed calls
        assert!(engine.classify_bytes(&sample_png()).is_ok());
    }

    #[test]
    fn global_engine_is_a_singleton() {
        let a = ClassificationEngine::global();
        let b = ClassificationEngine::global();
        assert!(std::ptr::eq(a, b));
    }

    #[test]
    fn prediction_rejects_wrong_width_output() {
        assert!(Prediction::from_probabilities(&[0.5, 0.5]).is_err());
    }

    #[test]
    fn argmax_takes_first_maximum() {
        let prediction = Prediction::from_probabilities(&[0.4, 0.4, 0.1, 0.1]).unwrap();
        assert_eq!(prediction.predicted_class, TumorType::Glioma);
        assert_eq!(prediction.confidence, 0.4);
    }
}
