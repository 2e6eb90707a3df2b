//! Landmark visibility scoring against a pose configuration.

use crate::catalog::PoseConfig;
use crate::types::{Landmark, PoseLandmark};
use serde::Serialize;

/// A landmark counts as visible strictly above this confidence.
pub const VISIBILITY_THRESHOLD: f32 = 0.5;

/// Feedback when every required landmark is visible.
pub const GOOD_FORM: &str = "Good form!";

/// Per-frame scoring result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PoseAnalysis {
    /// Percentage of required landmarks visible, 0.0–100.0.
    pub accuracy: f32,
    /// Period-joined hints, "Good form!", or empty when no body was found.
    pub feedback: String,
}

impl PoseAnalysis {
    /// Result for a frame in which the model found no body.
    pub fn none() -> Self {
        Self {
            accuracy: 0.0,
            feedback: String::new(),
        }
    }
}

/// Score detected landmarks against the pose's required landmarks.
///
/// Names that are not part of the body topology are skipped with a warning
/// but still count toward the total.
pub fn analyze_pose(landmarks: &[Landmark], config: &PoseConfig) -> PoseAnalysis {
    let required = &config.required_landmarks;
    let mut visible = 0usize;
    let mut hints = Vec::new();

    for name in required {
        let Some(point) = PoseLandmark::from_name(name) else {
            tracing::warn!(landmark = %name, "invalid landmark in pose config");
            continue;
        };

        let is_visible = landmarks
            .get(point.index())
            .is_some_and(|lm| lm.visibility > VISIBILITY_THRESHOLD);

        if is_visible {
            visible += 1;
        } else {
            hints.push(format!("Adjust your {}", humanize(name)));
        }
    }

    let accuracy = if required.is_empty() {
        0.0
    } else {
        visible as f32 / required.len() as f32 * 100.0
    };

    let feedback = if hints.is_empty() {
        GOOD_FORM.to_string()
    } else {
        hints.join(". ")
    };

    PoseAnalysis { accuracy, feedback }
}

/// "LEFT_SHOULDER" → "left shoulder".
fn humanize(name: &str) -> String {
    name.replace('_', " ").to_lowercase()
}
