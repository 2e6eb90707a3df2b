use attune_hw::SpeechConfig;
use std::path::PathBuf;
use std::time::Duration;

/// Daemon configuration, loaded from environment variables.
pub struct Config {
    /// V4L2 device path (default: /dev/video0).
    pub camera_device: String,
    /// Directory containing ONNX model files.
    pub model_dir: PathBuf,
    /// Directory holding one `<pose>.json` landmark configuration per pose.
    pub pose_dir: PathBuf,
    /// Optional TOML file overriding the emotion → playlist table.
    pub playlists_path: Option<PathBuf>,
    /// Sleep between practice frames.
    pub tick_ms: u64,
    /// Pause after the start narration before the first frame.
    pub settle_secs: u64,
    /// Spoken feedback is given below this accuracy.
    pub feedback_threshold: f32,
    pub speech_enabled: bool,
    pub tts_command: String,
    pub audio_player: String,
    pub speech_dir: PathBuf,
    pub spotify_client_id: Option<String>,
    pub spotify_client_secret: Option<String>,
}

impl Config {
    /// Load configuration from `ATTUNE_*` environment variables with defaults.
    pub fn from_env() -> Self {
        let model_dir = std::env::var("ATTUNE_MODEL_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| attune_core::default_model_dir());

        let speech_dir = std::env::var("ATTUNE_SPEECH_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| std::env::temp_dir().join("attune-speech"));

        Self {
            camera_device: std::env::var("ATTUNE_CAMERA_DEVICE")
                .unwrap_or_else(|_| "/dev/video0".to_string()),
            model_dir,
            pose_dir: std::env::var("ATTUNE_POSE_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("contrib/poses")),
            playlists_path: env_nonempty("ATTUNE_PLAYLISTS").map(PathBuf::from),
            tick_ms: env_u64("ATTUNE_TICK_MS", 100),
            settle_secs: env_u64("ATTUNE_SETTLE_SECS", 5),
            feedback_threshold: env_f32("ATTUNE_FEEDBACK_THRESHOLD", 70.0),
            speech_enabled: std::env::var("ATTUNE_SPEECH_ENABLED")
                .map(|v| v != "0")
                .unwrap_or(true),
            tts_command: std::env::var("ATTUNE_TTS_COMMAND")
                .unwrap_or_else(|_| "espeak-ng".to_string()),
            audio_player: std::env::var("ATTUNE_AUDIO_PLAYER")
                .unwrap_or_else(|_| "aplay".to_string()),
            speech_dir,
            spotify_client_id: env_nonempty("ATTUNE_SPOTIFY_CLIENT_ID"),
            spotify_client_secret: env_nonempty("ATTUNE_SPOTIFY_CLIENT_SECRET"),
        }
    }

    /// Path to the Ultra-Light face detection model.
    pub fn face_model_path(&self) -> String {
        self.model_path(attune_core::FACE_MODEL_FILE)
    }

    /// Path to the FER emotion model.
    pub fn emotion_model_path(&self) -> String {
        self.model_path(attune_core::EMOTION_MODEL_FILE)
    }

    /// Path to the BlazePose landmark model.
    pub fn pose_model_path(&self) -> String {
        self.model_path(attune_core::POSE_MODEL_FILE)
    }

    fn model_path(&self, file: &str) -> String {
        self.model_dir.join(file).to_string_lossy().into_owned()
    }

    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms)
    }

    pub fn settle(&self) -> Duration {
        Duration::from_secs(self.settle_secs)
    }

    pub fn speech(&self) -> SpeechConfig {
        SpeechConfig {
            enabled: self.speech_enabled,
            synth_command: self.tts_command.clone(),
            player_command: self.audio_player.clone(),
            dir: self.speech_dir.clone(),
        }
    }
}

fn env_nonempty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_f32(key: &str, default: f32) -> f32 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
