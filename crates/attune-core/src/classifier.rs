//! Facial emotion classifier (48×48 grayscale FER model) via ONNX Runtime.

use crate::emotion::Emotion;
use crate::face::{DetectorError, FaceDetector};
use crate::imaging;
use crate::types::BoundingBox;
use image::imageops::{self, FilterType};
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use thiserror::Error;

const FER_INPUT_SIZE: u32 = 48;
const FER_NUM_CLASSES: usize = 7;

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("model file not found: {0} — place the emotion model in the model directory")]
    ModelNotFound(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("face box lies outside the frame")]
    EmptyCrop,
    #[error("detector: {0}")]
    Detector(#[from] DetectorError),
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// Classifies a single face crop into one of the seven emotions.
pub struct EmotionClassifier {
    session: Session,
}

impl EmotionClassifier {
    pub fn load(model_path: &str) -> Result<Self, ClassifierError> {
        if !Path::new(model_path).exists() {
            return Err(ClassifierError::ModelNotFound(model_path.to_string()));
        }

        let session = Session::builder()?
            .with_intra_threads(2)?
            .commit_from_file(model_path)?;

        tracing::info!(
            path = model_path,
            inputs = ?session.inputs().iter().map(|i| (i.name(), i.dtype())).collect::<Vec<_>>(),
            outputs = ?session.outputs().iter().map(|o| o.name()).collect::<Vec<_>>(),
            "loaded emotion model"
        );

        Ok(Self { session })
    }

    /// Classify the face inside `face` on a grayscale frame.
    pub fn classify(
        &mut self,
        gray: &[u8],
        width: u32,
        height: u32,
        face: &BoundingBox,
    ) -> Result<Emotion, ClassifierError> {
        let input = preprocess(gray, width, height, face)?;

        let outputs = self.session.run(ort::inputs![TensorRef::from_array_view(input.view())?])?;
        let (_, probs) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| ClassifierError::InferenceFailed(format!("probabilities: {e}")))?;

        if probs.len() != FER_NUM_CLASSES {
            return Err(ClassifierError::InferenceFailed(format!(
                "expected {FER_NUM_CLASSES} class scores, got {}",
                probs.len()
            )));
        }

        imaging::argmax(probs)
            .and_then(Emotion::from_index)
            .ok_or_else(|| ClassifierError::InferenceFailed("empty class scores".into()))
    }
}

/// Crop the face region, resize to 48×48 and lay it out as NHWC with raw
/// 0–255 pixel values (the model was trained without normalization).
fn preprocess(
    gray: &[u8],
    width: u32,
    height: u32,
    face: &BoundingBox,
) -> Result<Array4<f32>, ClassifierError> {
    let (x, y, w, h) = face.clamp_to(width, height).ok_or(ClassifierError::EmptyCrop)?;
    let img = imaging::gray_image(gray, width, height).ok_or(ClassifierError::EmptyCrop)?;

    let crop = imageops::crop_imm(&img, x, y, w, h).to_image();
    let roi = imageops::resize(&crop, FER_INPUT_SIZE, FER_INPUT_SIZE, FilterType::Triangle);

    let size = FER_INPUT_SIZE as usize;
    let mut tensor = Array4::<f32>::zeros((1, size, size, 1));
    for (px, py, p) in roi.enumerate_pixels() {
        tensor[[0, py as usize, px as usize, 0]] = p[0] as f32;
    }
    Ok(tensor)
}

/// Face detection followed by per-face emotion classification.
pub struct MoodDetector {
    faces: FaceDetector,
    classifier: EmotionClassifier,
}

impl MoodDetector {
    pub fn new(faces: FaceDetector, classifier: EmotionClassifier) -> Self {
        Self { faces, classifier }
    }

    /// One emotion per detected face, most confident face first.
    pub fn detect_emotions(
        &mut self,
        rgb: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<Emotion>, ClassifierError> {
        let boxes = self.faces.detect(rgb, width, height)?;
        if boxes.is_empty() {
            return Ok(Vec::new());
        }

        let gray = imaging::rgb_to_luma(rgb);
        let mut emotions = Vec::with_capacity(boxes.len());
        for face in &boxes {
            match self.classifier.classify(&gray, width, height, face) {
                Ok(emotion) => {
                    tracing::debug!(%emotion, confidence = face.confidence, "face classified");
                    emotions.push(emotion);
                }
                Err(ClassifierError::EmptyCrop) => {
                    tracing::debug!(?face, "skipping face outside frame");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(emotions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn face(x: f32, y: f32, w: f32, h: f32) -> BoundingBox {
        BoundingBox { x, y, width: w, height: h, confidence: 0.9 }
    }

    #[test]
    fn test_preprocess_shape() {
        let gray = vec![0u8; 100 * 80];
        let tensor = preprocess(&gray, 100, 80, &face(10.0, 10.0, 50.0, 50.0)).unwrap();
        assert_eq!(tensor.shape(), &[1, 48, 48, 1]);
    }

    #[test]
    fn test_preprocess_keeps_raw_pixel_range() {
        // Left half of the frame dark, right half bright; crop only the bright part.
        let (w, h) = (100u32, 100u32);
        let gray: Vec<u8> = (0..w * h).map(|i| if i % w < 50 { 10 } else { 200 }).collect();
        let tensor = preprocess(&gray, w, h, &face(60.0, 10.0, 30.0, 30.0)).unwrap();
        assert!(tensor.iter().all(|&v| (v - 200.0).abs() < 1e-3));
    }

    #[test]
    fn test_preprocess_rejects_face_outside_frame() {
        let gray = vec![0u8; 10 * 10];
        let result = preprocess(&gray, 10, 10, &face(20.0, 20.0, 5.0, 5.0));
        assert!(matches!(result, Err(ClassifierError::EmptyCrop)));
    }
}
