//! Ultra-Light face detector (RFB-320) via ONNX Runtime.
//!
//! Locates faces for the emotion classifier. The model predicts a fixed set
//! of prior boxes with normalized corner coordinates; we threshold, map to
//! frame pixels and run NMS.

use crate::imaging;
use crate::types::BoundingBox;
use image::imageops::{self, FilterType};
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use thiserror::Error;

// --- Named constants (no magic numbers) ---
const ULTRAFACE_INPUT_WIDTH: u32 = 320;
const ULTRAFACE_INPUT_HEIGHT: u32 = 240;
const ULTRAFACE_MEAN: f32 = 127.0;
const ULTRAFACE_STD: f32 = 128.0;
const ULTRAFACE_CONFIDENCE_THRESHOLD: f32 = 0.7;
const ULTRAFACE_NMS_THRESHOLD: f32 = 0.3;

#[derive(Error, Debug)]
pub enum DetectorError {
    #[error("model file not found: {0} — place the face detector model in the model directory")]
    ModelNotFound(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("frame buffer does not match {width}x{height} RGB")]
    BadFrame { width: u32, height: u32 },
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// Ultra-Light face detector.
pub struct FaceDetector {
    session: Session,
    /// Output indices (scores, boxes), discovered by name at load time.
    output_indices: (usize, usize),
}

impl FaceDetector {
    /// Load the detector ONNX model from the given path.
    pub fn load(model_path: &str) -> Result<Self, DetectorError> {
        if !Path::new(model_path).exists() {
            return Err(DetectorError::ModelNotFound(model_path.to_string()));
        }

        let session = Session::builder()?
            .with_intra_threads(2)?
            .commit_from_file(model_path)?;

        let output_names: Vec<String> =
            session.outputs().iter().map(|o| o.name().to_string()).collect();

        tracing::info!(
            path = model_path,
            inputs = ?session.inputs().iter().map(|i| (i.name(), i.dtype())).collect::<Vec<_>>(),
            outputs = ?output_names,
            "loaded face detector model"
        );

        if output_names.len() < 2 {
            return Err(DetectorError::InferenceFailed(format!(
                "face detector requires 2 outputs (scores, boxes), got {}",
                output_names.len()
            )));
        }

        let output_indices = discover_output_indices(&output_names);
        Ok(Self {
            session,
            output_indices,
        })
    }

    /// Detect faces in an RGB frame, returning boxes sorted by confidence.
    pub fn detect(
        &mut self,
        rgb: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Vec<BoundingBox>, DetectorError> {
        let input = preprocess(rgb, width, height)?;

        let outputs = self.session.run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let (scores_idx, boxes_idx) = self.output_indices;
        let (_, scores) = outputs[scores_idx]
            .try_extract_tensor::<f32>()
            .map_err(|e| DetectorError::InferenceFailed(format!("scores: {e}")))?;
        let (_, boxes) = outputs[boxes_idx]
            .try_extract_tensor::<f32>()
            .map_err(|e| DetectorError::InferenceFailed(format!("boxes: {e}")))?;

        let detections = decode(scores, boxes, width, height, ULTRAFACE_CONFIDENCE_THRESHOLD);
        let mut result = nms(detections, ULTRAFACE_NMS_THRESHOLD);
        result.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        tracing::debug!(faces = result.len(), "face detection complete");
        Ok(result)
    }
}

/// Stretch-resize the frame to the model input and normalize into NCHW.
fn preprocess(rgb: &[u8], width: u32, height: u32) -> Result<Array4<f32>, DetectorError> {
    let img = imaging::rgb_image(rgb, width, height)
        .ok_or(DetectorError::BadFrame { width, height })?;
    let resized = imageops::resize(
        &img,
        ULTRAFACE_INPUT_WIDTH,
        ULTRAFACE_INPUT_HEIGHT,
        FilterType::Triangle,
    );

    let (w, h) = (ULTRAFACE_INPUT_WIDTH as usize, ULTRAFACE_INPUT_HEIGHT as usize);
    let mut tensor = Array4::<f32>::zeros((1, 3, h, w));
    for (x, y, px) in resized.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, c, y as usize, x as usize]] = (px[c] as f32 - ULTRAFACE_MEAN) / ULTRAFACE_STD;
        }
    }
    Ok(tensor)
}

/// Find the `scores` and `boxes` outputs by name, falling back to (0, 1).
fn discover_output_indices(names: &[String]) -> (usize, usize) {
    let scores = names.iter().position(|n| n == "scores");
    let boxes = names.iter().position(|n| n == "boxes");

    match (scores, boxes) {
        (Some(s), Some(b)) => (s, b),
        _ => {
            tracing::info!(?names, "face detector output names not recognized, using positional mapping");
            (0, 1)
        }
    }
}

/// Turn per-prior scores (`[bg, face]` pairs) and normalized corner boxes
/// into frame-space detections above `threshold`.
fn decode(
    scores: &[f32],
    boxes: &[f32],
    frame_width: u32,
    frame_height: u32,
    threshold: f32,
) -> Vec<BoundingBox> {
    let priors = (scores.len() / 2).min(boxes.len() / 4);
    let fw = frame_width as f32;
    let fh = frame_height as f32;

    let mut detections = Vec::new();
    for i in 0..priors {
        let confidence = scores[i * 2 + 1];
        if confidence <= threshold {
            continue;
        }

        let x1 = boxes[i * 4].clamp(0.0, 1.0) * fw;
        let y1 = boxes[i * 4 + 1].clamp(0.0, 1.0) * fh;
        let x2 = boxes[i * 4 + 2].clamp(0.0, 1.0) * fw;
        let y2 = boxes[i * 4 + 3].clamp(0.0, 1.0) * fh;
        if x2 <= x1 || y2 <= y1 {
            continue;
        }

        detections.push(BoundingBox {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
            confidence,
        });
    }
    detections
}

/// Non-Maximum Suppression: remove overlapping detections.
fn nms(mut detections: Vec<BoundingBox>, iou_threshold: f32) -> Vec<BoundingBox> {
    detections.sort_by(|a, b| {
        b.confidence
            .partial_cmp(&a.confidence)
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut keep: Vec<BoundingBox> = Vec::new();
    for det in detections {
        if keep.iter().all(|k| iou(k, &det) <= iou_threshold) {
            keep.push(det);
        }
    }
    keep
}

/// Intersection-over-Union between two boxes.
fn iou(a: &BoundingBox, b: &BoundingBox) -> f32 {
    let x1 = a.x.max(b.x);
    let y1 = a.y.max(b.y);
    let x2 = (a.x + a.width).min(b.x + b.width);
    let y2 = (a.y + a.height).min(b.y + b.height);

    let inter = (x2 - x1).max(0.0) * (y2 - y1).max(0.0);
    let union = a.width * a.height + b.width * b.height - inter;

    if union > 0.0 {
        inter / union
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_bbox(x: f32, y: f32, w: f32, h: f32, conf: f32) -> BoundingBox {
        BoundingBox { x, y, width: w, height: h, confidence: conf }
    }

    #[test]
    fn test_iou_identical() {
        let a = make_bbox(0.0, 0.0, 100.0, 100.0, 1.0);
        assert!((iou(&a, &a) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_iou_partial() {
        let a = make_bbox(0.0, 0.0, 10.0, 10.0, 1.0);
        let b = make_bbox(5.0, 0.0, 10.0, 10.0, 1.0);
        assert!((iou(&a, &b) - 50.0 / 150.0).abs() < 1e-6);
    }

    #[test]
    fn test_nms_keeps_best_of_overlapping() {
        let detections = vec![
            make_bbox(5.0, 5.0, 100.0, 100.0, 0.8),
            make_bbox(0.0, 0.0, 100.0, 100.0, 0.9),
            make_bbox(200.0, 200.0, 50.0, 50.0, 0.75),
        ];
        let result = nms(detections, ULTRAFACE_NMS_THRESHOLD);
        assert_eq!(result.len(), 2);
        assert!((result[0].confidence - 0.9).abs() < 1e-6);
        assert!((result[1].confidence - 0.75).abs() < 1e-6);
    }

    #[test]
    fn test_decode_thresholds_and_scales() {
        // Three priors: background, confident face, borderline face.
        let scores = [0.9, 0.1, 0.05, 0.95, 0.3, 0.7];
        let boxes = [
            0.0, 0.0, 1.0, 1.0,
            0.25, 0.5, 0.75, 1.0,
            0.0, 0.0, 0.5, 0.5,
        ];
        let dets = decode(&scores, &boxes, 640, 480, ULTRAFACE_CONFIDENCE_THRESHOLD);
        assert_eq!(dets.len(), 1);
        let d = dets[0];
        assert!((d.x - 160.0).abs() < 1e-3);
        assert!((d.y - 240.0).abs() < 1e-3);
        assert!((d.width - 320.0).abs() < 1e-3);
        assert!((d.height - 240.0).abs() < 1e-3);
        assert!((d.confidence - 0.95).abs() < 1e-6);
    }

    #[test]
    fn test_decode_skips_degenerate_boxes() {
        let scores = [0.0, 0.99];
        let boxes = [0.5, 0.5, 0.5, 0.9];
        assert!(decode(&scores, &boxes, 100, 100, 0.7).is_empty());
    }

    #[test]
    fn test_discover_output_indices() {
        let named: Vec<String> = ["boxes", "scores"].iter().map(|s| s.to_string()).collect();
        assert_eq!(discover_output_indices(&named), (1, 0));

        let generic: Vec<String> = ["out0", "out1"].iter().map(|s| s.to_string()).collect();
        assert_eq!(discover_output_indices(&generic), (0, 1));
    }

    #[test]
    fn test_preprocess_shape_and_normalization() {
        let rgb = vec![127u8; 64 * 48 * 3];
        let tensor = preprocess(&rgb, 64, 48).unwrap();
        assert_eq!(tensor.shape(), &[1, 3, 240, 320]);
        assert!(tensor.iter().all(|v| v.abs() < 1e-6));
    }

    #[test]
    fn test_preprocess_rejects_short_buffer() {
        assert!(matches!(
            preprocess(&[0u8; 10], 64, 48),
            Err(DetectorError::BadFrame { .. })
        ));
    }
}
