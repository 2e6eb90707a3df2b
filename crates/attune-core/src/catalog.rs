//! Supported yoga poses and their landmark configurations.
//!
//! Pose metadata (display name, description, reference image, narration) is
//! compiled in. The landmark requirements live in one JSON file per pose,
//! loaded on first use and cached for the life of the process.

use crate::cache::MemoCache;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

const FALLBACK_NARRATION: &str = "This is a yoga pose. Follow the on-screen guidance.";

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Pose configuration not found: {0}")]
    NotFound(String),
    #[error("Invalid JSON in pose configuration: {pose} ({reason})")]
    Invalid { pose: String, reason: String },
    #[error("failed to read pose configuration {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
}

/// Static description of a supported pose.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct PoseInfo {
    /// Configuration key, also the JSON file stem.
    pub key: &'static str,
    pub name: &'static str,
    pub description: &'static str,
    pub image_url: &'static str,
    /// Narration spoken once when practice starts.
    pub spoken: &'static str,
}

pub const POSES: [PoseInfo; 6] = [
    PoseInfo {
        key: "tadasana",
        name: "Tadasana (Mountain Pose)",
        description: "The foundation of all standing poses, Tadasana improves posture, strengthens thighs and ankles, and reduces flat feet.",
        image_url: "https://www.yogaclassplan.com/wp-content/uploads/2021/06/mountain.jpg",
        spoken: "Tadasana or Mountain Pose is the foundation of all standing poses. \
                 It improves posture, strengthens thighs and ankles, and reduces flat feet. \
                 Stand tall with feet together, shoulders relaxed, and arms by your sides.",
    },
    PoseInfo {
        key: "vrikshasana",
        name: "Vrikshasana (Tree Pose)",
        description: "This balancing pose strengthens legs, improves focus, and helps develop balance and stability in the legs.",
        image_url: "https://www.yogaclassplan.com/wp-content/uploads/2021/01/34-treepose.jpg",
        spoken: "Vrikshasana or Tree Pose improves balance and focus. \
                 Stand on one leg, place the other foot on your inner thigh or calf, \
                 and bring your hands to prayer position at your chest.",
    },
    PoseInfo {
        key: "adho_mukha_svanasana",
        name: "Adho Mukha Svanasana (Downward Dog)",
        description: "A rejuvenating pose that stretches hamstrings, calves, and spine while strengthening arms and legs.",
        image_url: "https://www.yogaclassplan.com/wp-content/uploads/2021/06/downward-facingdog.png",
        spoken: "Adho Mukha Svanasana or Downward Dog stretches the hamstrings, \
                 calves, and spine while strengthening arms and legs. \
                 Form an inverted V-shape with your body, hands and feet on the mat.",
    },
    PoseInfo {
        key: "bhujangasana",
        name: "Bhujangasana (Cobra Pose)",
        description: "This gentle backbend strengthens the spine, opens the chest and shoulders, and helps relieve stress and fatigue.",
        image_url: "https://www.yogaclassplan.com/wp-content/uploads/2021/06/Bhujangasana-Cobra-Pose.png",
        spoken: "Bhujangasana or Cobra Pose strengthens the spine and opens the chest. \
                 Lie on your stomach, place hands under shoulders, and lift your chest \
                 while keeping hips on the mat.",
    },
    PoseInfo {
        key: "trikonasana",
        name: "Trikonasana (Triangle Pose)",
        description: "This standing pose stretches legs, hips and spine while stimulating abdominal organs and improving digestion.",
        image_url: "https://www.yogaclassplan.com/wp-content/uploads/2021/01/27-triangle.jpg",
        spoken: "Trikonasana or Triangle Pose stretches legs, hips and spine. \
                 Stand with legs wide apart, reach one hand to your foot and the other to the sky, \
                 creating a straight line from hand to hand.",
    },
    PoseInfo {
        key: "virabhadrasana_ii",
        name: "Virabhadrasana II (Warrior II)",
        description: "A powerful standing pose that strengthens legs and arms, increases stamina, and improves balance and concentration.",
        image_url: "https://www.yogaclassplan.com/wp-content/uploads/2021/01/31-warrior-2.jpg",
        spoken: "Virabhadrasana II or Warrior II builds stamina and concentration. \
                 Stand with legs wide apart, turn one foot out, bend the front knee, \
                 and stretch arms parallel to the floor.",
    },
];

pub fn pose_info(key: &str) -> Option<&'static PoseInfo> {
    POSES.iter().find(|p| p.key == key)
}

/// Narration for a pose, with a generic line for unknown keys.
pub fn spoken_description(key: &str) -> &'static str {
    pose_info(key).map(|p| p.spoken).unwrap_or(FALLBACK_NARRATION)
}

/// Landmark requirements for one pose.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PoseConfig {
    #[serde(default)]
    pub required_landmarks: Vec<String>,
}

impl PoseConfig {
    pub fn new<I, S>(landmarks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            required_landmarks: landmarks.into_iter().map(Into::into).collect(),
        }
    }
}

/// Loads `<dir>/<pose>.json` and caches each config after its first load.
pub struct PoseConfigStore {
    dir: PathBuf,
    cache: MemoCache<String, Arc<PoseConfig>>,
}

impl PoseConfigStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            cache: MemoCache::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Number of configurations loaded so far.
    pub fn cached(&self) -> usize {
        self.cache.len()
    }

    pub fn load(&mut self, pose: &str) -> Result<Arc<PoseConfig>, CatalogError> {
        let dir = &self.dir;
        self.cache
            .get_or_try_insert_with(pose.to_string(), || read_config(dir, pose).map(Arc::new))
            .cloned()
    }
}

fn read_config(dir: &Path, pose: &str) -> Result<PoseConfig, CatalogError> {
    if pose.is_empty() || pose.contains(['/', '\\']) || pose.starts_with('.') {
        return Err(CatalogError::NotFound(pose.to_string()));
    }

    let path = dir.join(format!("{pose}.json"));
    let contents = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(CatalogError::NotFound(pose.to_string()));
        }
        Err(source) => {
            return Err(CatalogError::Io {
                path: path.display().to_string(),
                source,
            });
        }
    };

    let config: PoseConfig =
        serde_json::from_str(&contents).map_err(|e| CatalogError::Invalid {
            pose: pose.to_string(),
            reason: e.to_string(),
        })?;

    tracing::info!(
        pose,
        path = %path.display(),
        landmarks = config.required_landmarks.len(),
        "loaded pose configuration"
    );
    Ok(config)
}
