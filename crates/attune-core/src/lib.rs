//! attune-core — Mood playlists and yoga pose scoring.
//!
//! Emotion → playlist lookup, pose catalog and landmark configurations,
//! visibility scoring, practice sessions, and the ONNX Runtime wrappers for
//! the face detector, emotion classifier and pose landmark models.

pub mod cache;
pub mod catalog;
pub mod classifier;
pub mod emotion;
pub mod face;
pub mod imaging;
pub mod pose;
pub mod scoring;
pub mod session;
pub mod types;

pub use cache::MemoCache;
pub use catalog::{CatalogError, PoseConfig, PoseConfigStore, PoseInfo, POSES};
pub use classifier::{ClassifierError, EmotionClassifier, MoodDetector};
pub use emotion::{recommend, Emotion, PlaylistTable, Recommendation};
pub use face::{DetectorError, FaceDetector};
pub use pose::{EstimatorError, PoseEstimator};
pub use scoring::{analyze_pose, PoseAnalysis};
pub use session::{PracticeSession, Progress, ProgressReport, SessionSummary};
pub use types::{BoundingBox, Landmark, PoseLandmark};

use std::path::PathBuf;

/// Face detector model file name inside the model directory.
pub const FACE_MODEL_FILE: &str = "version-RFB-320.onnx";
/// Emotion classifier model file name.
pub const EMOTION_MODEL_FILE: &str = "emotion_fer48.onnx";
/// Pose landmark model file name.
pub const POSE_MODEL_FILE: &str = "pose_landmark_full.onnx";

/// Default model directory: `$XDG_DATA_HOME/attune/models`
/// (falling back to `~/.local/share/attune/models`).
pub fn default_model_dir() -> PathBuf {
    std::env::var("XDG_DATA_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| "/tmp".to_string());
            PathBuf::from(home).join(".local/share")
        })
        .join("attune/models")
}
