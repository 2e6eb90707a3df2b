use crate::engine::{EngineError, EngineHandle};
use attune_core::POSES;
use serde::Serialize;
use std::path::PathBuf;
use zbus::interface;

/// D-Bus interface for the Attune daemon.
///
/// Bus name: org.freedesktop.Attune1
/// Object path: /org/freedesktop/Attune1
///
/// Every method returns a JSON document.
pub struct AttuneService {
    pub engine: EngineHandle,
}

fn to_json<T: Serialize>(value: &T) -> zbus::fdo::Result<String> {
    serde_json::to_string(value).map_err(|e| zbus::fdo::Error::Failed(e.to_string()))
}

fn failed(e: EngineError) -> zbus::fdo::Error {
    zbus::fdo::Error::Failed(e.to_string())
}

fn optional_path(path: &str) -> Option<PathBuf> {
    let path = path.trim();
    (!path.is_empty()).then(|| PathBuf::from(path))
}

#[interface(name = "org.freedesktop.Attune1")]
impl AttuneService {
    /// Detect facial emotion in an image file and recommend a playlist.
    async fn detect_emotion(&self, path: &str) -> zbus::fdo::Result<String> {
        tracing::info!(path, "detect_emotion requested");
        let report = self
            .engine
            .detect_emotion(PathBuf::from(path))
            .await
            .map_err(failed)?;
        to_json(&report)
    }

    /// Capture one webcam frame and recommend a playlist.
    async fn scan_emotion(&self) -> zbus::fdo::Result<String> {
        tracing::info!("scan_emotion requested");
        let report = self.engine.scan_emotion().await.map_err(failed)?;
        to_json(&report)
    }

    /// Supported poses with descriptions and reference images.
    async fn list_poses(&self) -> zbus::fdo::Result<String> {
        to_json(&POSES)
    }

    /// Start practising `pose` against the webcam, or a video file when
    /// `video_path` is non-empty.
    async fn start_practice(&self, pose: &str, video_path: &str) -> zbus::fdo::Result<String> {
        tracing::info!(pose, video_path, "start_practice requested");
        let started = self
            .engine
            .start_practice(pose.to_string(), optional_path(video_path))
            .await
            .map_err(failed)?;
        to_json(&started)
    }

    /// Stop practice and save the session.
    async fn stop_practice(&self) -> zbus::fdo::Result<String> {
        tracing::info!("stop_practice requested");
        let summary = self.engine.stop_practice().await.map_err(failed)?;
        to_json(&summary)
    }

    async fn practice_status(&self) -> zbus::fdo::Result<String> {
        let status = self.engine.practice_status().await.map_err(failed)?;
        to_json(&status)
    }

    /// Coins, sessions, time per pose and the accuracy trend.
    async fn progress(&self) -> zbus::fdo::Result<String> {
        let report = self.engine.progress().await.map_err(failed)?;
        to_json(&report)
    }

    /// Return daemon status information.
    async fn status(&self) -> zbus::fdo::Result<String> {
        let status = self.engine.status().await.map_err(failed)?;
        Ok(serde_json::json!({
            "version": env!("CARGO_PKG_VERSION"),
            "engine": status,
        })
        .to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_optional_path() {
        assert_eq!(optional_path(""), None);
        assert_eq!(optional_path("  "), None);
        assert_eq!(optional_path("/tmp/a.mp4"), Some(PathBuf::from("/tmp/a.mp4")));
    }

    #[test]
    fn test_poses_serialize() {
        let json = to_json(&POSES).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.as_array().unwrap().len(), 6);
        assert_eq!(parsed[0]["key"], "tadasana");
    }
}
