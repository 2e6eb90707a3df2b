//! Spoken narration and form feedback.
//!
//! Text is rendered to a WAV file by an external synthesizer and played by an
//! external audio player. Rendered files are cached by exact text, so a hint
//! repeated every tick is only synthesized once.

use attune_core::MemoCache;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SpeechError {
    #[error("failed to create speech directory {path}: {source}")]
    Dir {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("failed to run '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("'{command}' exited with {status}")]
    Failed { command: String, status: String },
    #[error("synthesizer produced no audio file at {0}")]
    NoOutput(String),
}

/// Speech output settings.
#[derive(Debug, Clone)]
pub struct SpeechConfig {
    pub enabled: bool,
    /// Invoked as `<synth> -v en -w <file> <text>`.
    pub synth_command: String,
    /// Invoked as `<player> -q <file>`.
    pub player_command: String,
    /// Where rendered audio files are kept.
    pub dir: PathBuf,
}

pub struct SpeechOutput {
    config: SpeechConfig,
    rendered: MemoCache<String, PathBuf>,
}

impl SpeechOutput {
    pub fn new(config: SpeechConfig) -> Self {
        tracing::info!(
            enabled = config.enabled,
            synth = %config.synth_command,
            player = %config.player_command,
            dir = %config.dir.display(),
            "speech output configured"
        );
        Self {
            config,
            rendered: MemoCache::new(),
        }
    }

    pub fn enabled(&self) -> bool {
        self.config.enabled
    }

    /// Number of distinct texts rendered so far.
    pub fn cached(&self) -> usize {
        self.rendered.len()
    }

    /// Speak `text`, blocking until playback finishes.
    ///
    /// Failures are logged and swallowed: callers keep the text feedback.
    pub fn speak(&mut self, text: &str) {
        if !self.config.enabled || text.trim().is_empty() {
            return;
        }
        if let Err(e) = self.try_speak(text) {
            tracing::warn!(error = %e, "speech output failed, continuing without audio");
        }
    }

    fn try_speak(&mut self, text: &str) -> Result<(), SpeechError> {
        let file = self.synthesize(text)?;
        self.play(&file)
    }

    /// Render `text` to an audio file, reusing an earlier rendering.
    pub fn synthesize(&mut self, text: &str) -> Result<PathBuf, SpeechError> {
        let config = &self.config;
        let path = self
            .rendered
            .get_or_try_insert_with(text.to_string(), || render(config, text))?;
        Ok(path.clone())
    }

    pub fn play(&self, file: &Path) -> Result<(), SpeechError> {
        let player = &self.config.player_command;
        let status = Command::new(player)
            .arg("-q")
            .arg(file)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|source| SpeechError::Spawn {
                command: player.clone(),
                source,
            })?;

        if !status.success() {
            return Err(SpeechError::Failed {
                command: player.clone(),
                status: status.to_string(),
            });
        }
        Ok(())
    }
}

fn render(config: &SpeechConfig, text: &str) -> Result<PathBuf, SpeechError> {
    std::fs::create_dir_all(&config.dir).map_err(|source| SpeechError::Dir {
        path: config.dir.display().to_string(),
        source,
    })?;

    let path = config.dir.join(format!("{}.wav", uuid::Uuid::new_v4()));
    let synth = &config.synth_command;
    let status = Command::new(synth)
        .args(["-v", "en", "-w"])
        .arg(&path)
        .arg(text)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map_err(|source| SpeechError::Spawn {
            command: synth.clone(),
            source,
        })?;

    if !status.success() {
        return Err(SpeechError::Failed {
            command: synth.clone(),
            status: status.to_string(),
        });
    }
    if !path.exists() {
        return Err(SpeechError::NoOutput(path.display().to_string()));
    }

    tracing::debug!(file = %path.display(), chars = text.len(), "speech rendered");
    Ok(path)
}
