use ndarray::{Array4, Axis};

use super::preprocess::{INPUT_CHANNELS, INPUT_SIZE};
use super::ClassifyError;

/// Size of the classifier output vector (glioma, meningioma, notumor,
/// pituitary).
pub const NUM_CLASSES: usize = 4;

/// Forward-pass abstraction over the trained artifact and the placeholder.
///
/// Implementations are read-only after construction and safe to call from
/// concurrent threads.
pub trait TumorModel: Send + Sync {
    /// Run the forward pass on a `(1, 150, 150, 3)` tensor and return the
    /// 4-way probability vector.
    fn predict(&self, input: &Array4<f32>) -> Result<Vec<f32>, ClassifyError>;

    /// Short tag for diagnostics ("onnx" / "placeholder").
    fn source(&self) -> &'static str;
}

/// Allow `Box<dyn TumorModel>` to be used as `&impl TumorModel`.
impl TumorModel for Box<dyn TumorModel> {
    fn predict(&self, input: &Array4<f32>) -> Result<Vec<f32>, ClassifyError> {
        (**self).predict(input)
    }

    fn source(&self) -> &'static str {
        (**self).source()
    }
}

fn check_input_shape(input: &Array4<f32>) -> Result<(), ClassifyError> {
    let expected = [1, INPUT_SIZE as usize, INPUT_SIZE as usize, INPUT_CHANNELS];
    if input.shape() != expected {
        return Err(ClassifyError::Inference(format!(
            "unexpected input shape {:?}, expected {expected:?}",
            input.shape()
        )));
    }
    Ok(())
}

/// Numerically stable softmax over a logit slice.
pub(crate) fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&l| (l - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / sum).collect()
}

// ═══════════════════════════════════════════════════════════
// ONNX classifier (behind the `onnx-model` feature)
// ═══════════════════════════════════════════════════════════

#[cfg(feature = "onnx-model")]
mod onnx {
    use std::path::Path;
    use std::sync::Mutex;

    use ndarray::Array4;
    use ort::session::Session;

    use super::{check_input_shape, TumorModel, NUM_CLASSES};
    use crate::classify::ClassifyError;

    /// Trained tumor classifier running on ONNX Runtime.
    ///
    /// Uses interior mutability (Mutex) because ort::Session::run requires
    /// `&mut self` but our TumorModel trait exposes `&self` for ergonomic
    /// shared usage.
    pub struct OnnxModel {
        session: Mutex<Session>,
    }

    impl OnnxModel {
        /// Load the classifier artifact from a file.
        pub fn load(model_path: &Path) -> Result<Self, ClassifyError> {
            if !model_path.exists() {
                return Err(ClassifyError::ModelNotFound(model_path.to_path_buf()));
            }

            let session = Session::builder()
                .map_err(|e: ort::Error| ClassifyError::ModelInit(e.to_string()))?
                .with_intra_threads(2)
                .map_err(|e: ort::Error| ClassifyError::ModelInit(e.to_string()))?
                .commit_from_file(model_path)
                .map_err(|e: ort::Error| {
                    ClassifyError::ModelInit(format!("ONNX load failed: {e}"))
                })?;

            tracing::info!("ONNX classifier loaded from {}", model_path.display());

            Ok(Self {
                session: Mutex::new(session),
            })
        }
    }

    impl TumorModel for OnnxModel {
        fn predict(&self, input: &Array4<f32>) -> Result<Vec<f32>, ClassifyError> {
            use ort::value::TensorRef;

            check_input_shape(input)?;

            let tensor = TensorRef::from_array_view(input)
                .map_err(|e| ClassifyError::Inference(e.to_string()))?;

            let mut session = self
                .session
                .lock()
                .map_err(|_| ClassifyError::Inference("Session lock poisoned".to_string()))?;

            let outputs = session
                .run(ort::inputs![tensor])
                .map_err(|e| ClassifyError::Inference(format!("ONNX inference failed: {e}")))?;

            // Output shape: [1, NUM_CLASSES] softmax probabilities
            let (_, output_data) = outputs[0]
                .try_extract_tensor::<f32>()
                .map_err(|e| ClassifyError::Inference(format!("Output extraction: {e}")))?;

            if output_data.len() != NUM_CLASSES {
                return Err(ClassifyError::BadOutput {
                    expected: NUM_CLASSES,
                    got: output_data.len(),
                });
            }

            Ok(output_data.to_vec())
        }

        fn source(&self) -> &'static str {
            "onnx"
        }
    }
}

#[cfg(feature = "onnx-model")]
pub use onnx::OnnxModel;

// ═══════════════════════════════════════════════════════════
// Placeholder classifier
// ═══════════════════════════════════════════════════════════

/// Untrained but shape-compatible fallback classifier.
///
/// Accepts the same 150x150x3 input and emits the same 4-way categorical
/// output as the trained artifact, using fixed pseudo-weights: each pixel
/// intensity is routed into one of the four logit buckets by index
/// arithmetic, so equal inputs always produce equal outputs. Predictions
/// carry no diagnostic value; the point is that the engine stays callable.
pub struct PlaceholderModel;

impl PlaceholderModel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for PlaceholderModel {
    fn default() -> Self {
        Self::new()
    }
}

impl TumorModel for PlaceholderModel {
    fn predict(&self, input: &Array4<f32>) -> Result<Vec<f32>, ClassifyError> {
        check_input_shape(input)?;

        let image = input.index_axis(Axis(0), 0);
        let mut sums = [0.0f32; NUM_CLASSES];
        let mut counts = [0.0f32; NUM_CLASSES];

        for ((y, x, c), &value) in image.indexed_iter() {
            let bucket = (3 * y + 5 * x + 7 * c) % NUM_CLASSES;
            sums[bucket] += value;
            counts[bucket] += 1.0;
        }

        // Mean intensity per bucket, spread so the softmax is not flat.
        let logits: Vec<f32> = sums
            .iter()
            .zip(counts.iter())
            .map(|(s, n)| if *n > 0.0 { s / n * 10.0 } else { 0.0 })
            .collect();

        Ok(softmax(&logits))
    }

    fn source(&self) -> &'static str {
        "placeholder"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_tensor() -> Array4<f32> {
        Array4::from_shape_fn((1, 150, 150, 3), |(_, y, x, c)| {
            ((y + 2 * x + 31 * c) % 256) as f32 / 255.0
        })
    }

    fn inverted_gradient_tensor() -> Array4<f32> {
        gradient_tensor().mapv(|v| 1.0 - v)
    }

    #[test]
    fn placeholder_output_is_a_probability_vector() {
        let probs = PlaceholderModel::new().predict(&gradient_tensor()).unwrap();
        assert_eq!(probs.len(), NUM_CLASSES);
        assert!(probs.iter().all(|&p| (0.0..=1.0).contains(&p)));
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-3, "probabilities sum to {sum}");
    }

    #[test]
    fn placeholder_is_deterministic() {
        let model = PlaceholderModel::new();
        let a = model.predict(&gradient_tensor()).unwrap();
        let b = model.predict(&gradient_tensor()).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn placeholder_output_depends_on_input() {
        let model = PlaceholderModel::new();
        let a = model.predict(&gradient_tensor()).unwrap();
        let b = model.predict(&inverted_gradient_tensor()).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn placeholder_rejects_wrong_shape() {
        let bad = Array4::<f32>::zeros((1, 10, 10, 3));
        assert!(PlaceholderModel::new().predict(&bad).is_err());
    }

    #[test]
    fn softmax_normalizes_and_orders() {
        let probs = softmax(&[1.0, 3.0, 2.0, 0.5]);
        let sum: f32 = probs.iter().sum();
        assert!((sum - 1.0).abs() < 1e-6);
        assert!(probs[1] > probs[2]);
        assert!(probs[2] > probs[0]);
        assert!(probs[0] > probs[3]);
    }
}
