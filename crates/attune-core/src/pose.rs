//! BlazePose landmark model via ONNX Runtime.
//!
//! Runs the full-body landmark network on a letterboxed 256×256 frame and
//! returns the 33 body landmarks with visibility probabilities.

use crate::imaging::{self, Letterbox};
use crate::types::{Landmark, PoseLandmark};
use ndarray::Array4;
use ort::session::Session;
use ort::value::TensorRef;
use std::path::Path;
use thiserror::Error;

const BLAZEPOSE_INPUT_SIZE: u32 = 256;
/// 33 body + 6 auxiliary points, each (x, y, z, visibility, presence).
const BLAZEPOSE_POINTS: usize = 39;
const BLAZEPOSE_VALUES_PER_POINT: usize = 5;
const BLAZEPOSE_PRESENCE_THRESHOLD: f32 = 0.5;

#[derive(Error, Debug)]
pub enum EstimatorError {
    #[error("model file not found: {0} — place the pose landmark model in the model directory")]
    ModelNotFound(String),
    #[error("inference failed: {0}")]
    InferenceFailed(String),
    #[error("frame buffer does not match {width}x{height} RGB")]
    BadFrame { width: u32, height: u32 },
    #[error("ort: {0}")]
    Ort(#[from] ort::Error),
}

/// Full-body landmark estimator.
pub struct PoseEstimator {
    session: Session,
    /// Output indices (landmarks, presence flag).
    output_indices: (usize, usize),
}

impl PoseEstimator {
    pub fn load(model_path: &str) -> Result<Self, EstimatorError> {
        if !Path::new(model_path).exists() {
            return Err(EstimatorError::ModelNotFound(model_path.to_string()));
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
            "loaded pose landmark model"
        );

        if output_names.len() < 2 {
            return Err(EstimatorError::InferenceFailed(format!(
                "pose model requires landmark and presence outputs, got {}",
                output_names.len()
            )));
        }

        let output_indices = discover_output_indices(&output_names);
        Ok(Self {
            session,
            output_indices,
        })
    }

    /// Estimate body landmarks in an RGB frame.
    ///
    /// Returns `None` when the model reports no body in view.
    pub fn estimate(
        &mut self,
        rgb: &[u8],
        width: u32,
        height: u32,
    ) -> Result<Option<Vec<Landmark>>, EstimatorError> {
        let (input, letterbox) = preprocess(rgb, width, height)?;

        let outputs = self.session.run(ort::inputs![TensorRef::from_array_view(input.view())?])?;

        let (landmarks_idx, presence_idx) = self.output_indices;
        let (_, raw) = outputs[landmarks_idx]
            .try_extract_tensor::<f32>()
            .map_err(|e| EstimatorError::InferenceFailed(format!("landmarks: {e}")))?;
        let (_, flag) = outputs[presence_idx]
            .try_extract_tensor::<f32>()
            .map_err(|e| EstimatorError::InferenceFailed(format!("presence: {e}")))?;

        let presence = flag.first().copied().unwrap_or(0.0);
        if presence < BLAZEPOSE_PRESENCE_THRESHOLD {
            tracing::trace!(presence, "no body in frame");
            return Ok(None);
        }

        decode(raw, &letterbox, width, height).map(Some)
    }
}

fn preprocess(
    rgb: &[u8],
    width: u32,
    height: u32,
) -> Result<(Array4<f32>, Letterbox), EstimatorError> {
    let img = imaging::rgb_image(rgb, width, height)
        .ok_or(EstimatorError::BadFrame { width, height })?;
    let (canvas, letterbox) = imaging::letterbox(&img, BLAZEPOSE_INPUT_SIZE);

    let size = BLAZEPOSE_INPUT_SIZE as usize;
    let mut tensor = Array4::<f32>::zeros((1, size, size, 3));
    for (x, y, px) in canvas.enumerate_pixels() {
        for c in 0..3 {
            tensor[[0, y as usize, x as usize, c]] = px[c] as f32 / 255.0;
        }
    }
    Ok((tensor, letterbox))
}

fn discover_output_indices(names: &[String]) -> (usize, usize) {
    let landmarks = names.iter().position(|n| n == "Identity" || n == "ld_3d");
    let presence = names.iter().position(|n| n == "Identity_1" || n == "output_poseflag");

    match (landmarks, presence) {
        (Some(l), Some(p)) => (l, p),
        _ => {
            tracing::info!(?names, "pose output names not recognized, using positional mapping");
            (0, 1)
        }
    }
}

/// Convert raw model output into 33 frame-normalized landmarks.
fn decode(
    raw: &[f32],
    letterbox: &Letterbox,
    width: u32,
    height: u32,
) -> Result<Vec<Landmark>, EstimatorError> {
    let expected = BLAZEPOSE_POINTS * BLAZEPOSE_VALUES_PER_POINT;
    if raw.len() < expected {
        return Err(EstimatorError::InferenceFailed(format!(
            "expected {expected} landmark values, got {}",
            raw.len()
        )));
    }

    let landmarks = raw
        .chunks_exact(BLAZEPOSE_VALUES_PER_POINT)
        .take(PoseLandmark::COUNT)
        .map(|v| {
            let (fx, fy) = letterbox.unmap(v[0], v[1]);
            Landmark {
                x: fx / width as f32,
                y: fy / height as f32,
                z: v[2] / (BLAZEPOSE_INPUT_SIZE as f32 * letterbox.scale),
                visibility: imaging::sigmoid(v[3]),
            }
        })
        .collect();

    Ok(landmarks)
}
