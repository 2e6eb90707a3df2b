//! Frame sources for practice: the live camera, a video file, or a still image.
//!
//! Video files are decoded by an `ffmpeg` child process that writes raw
//! RGB24 frames at a fixed resolution to its stdout.

use crate::camera::CameraError;
use crate::frame::Frame;
use std::io::{self, Read};
use std::path::Path;
use std::process::{Child, ChildStdout, Command, Stdio};
use thiserror::Error;

/// Accepted still-image extensions (lower-case, without dot).
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "png", "jpeg"];
/// Accepted video extensions.
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov"];

/// Frames decoded from video files are scaled to this size.
pub const VIDEO_WIDTH: u32 = 640;
pub const VIDEO_HEIGHT: u32 = 480;

const DECODER_COMMAND: &str = "ffmpeg";

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("unsupported file type: {path} (expected one of {expected})")]
    UnsupportedExtension { path: String, expected: String },
    #[error("camera: {0}")]
    Camera(#[from] CameraError),
    #[error("failed to start video decoder '{command}': {source}")]
    DecoderSpawn {
        command: String,
        #[source]
        source: io::Error,
    },
    #[error("video read failed: {0}")]
    Read(#[from] io::Error),
    #[error("image decode failed: {0}")]
    Image(#[from] image::ImageError),
}

/// Anything the practice loop can pull frames from.
pub trait FrameSource: Send {
    /// Next frame, or `Ok(None)` once the source is exhausted.
    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError>;

    /// Short human-readable label for logs.
    fn describe(&self) -> String;
}

/// Check that `path` ends in one of `allowed` (case-insensitive).
pub fn check_extension(path: &Path, allowed: &[&str]) -> Result<(), SourceError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());

    match ext {
        Some(ext) if allowed.contains(&ext.as_str()) => Ok(()),
        _ => Err(SourceError::UnsupportedExtension {
            path: path.display().to_string(),
            expected: allowed.join(", "),
        }),
    }
}

/// Load a still image from disk as an RGB frame.
pub fn load_image(path: &Path) -> Result<Frame, SourceError> {
    check_extension(path, IMAGE_EXTENSIONS)?;
    if !path.exists() {
        return Err(SourceError::NotFound(path.display().to_string()));
    }
    let img = image::open(path)?.to_rgb8();
    tracing::debug!(path = %path.display(), width = img.width(), height = img.height(), "loaded image");
    Ok(Frame::from_rgb_image(img))
}

/// A video file decoded frame by frame through ffmpeg.
pub struct VideoFile {
    child: Child,
    stdout: ChildStdout,
    path: String,
    sequence: u32,
}

impl VideoFile {
    pub fn open(path: &Path) -> Result<Self, SourceError> {
        Self::open_with(DECODER_COMMAND, path)
    }

    /// Open using a specific decoder binary.
    pub fn open_with(decoder: &str, path: &Path) -> Result<Self, SourceError> {
        check_extension(path, VIDEO_EXTENSIONS)?;
        if !path.exists() {
            return Err(SourceError::NotFound(path.display().to_string()));
        }

        let scale = format!("scale={VIDEO_WIDTH}:{VIDEO_HEIGHT}");
        let mut child = Command::new(decoder)
            .args(["-loglevel", "error", "-nostdin"])
            .arg("-i")
            .arg(path)
            .args(["-f", "rawvideo", "-pix_fmt", "rgb24", "-vf", &scale, "-"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| SourceError::DecoderSpawn {
                command: decoder.to_string(),
                source,
            })?;

        let stdout = child.stdout.take().ok_or_else(|| {
            SourceError::Read(io::Error::new(io::ErrorKind::BrokenPipe, "decoder stdout missing"))
        })?;

        tracing::info!(path = %path.display(), pid = child.id(), "video decoder started");

        Ok(Self {
            child,
            stdout,
            path: path.display().to_string(),
            sequence: 0,
        })
    }
}

impl FrameSource for VideoFile {
    fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
        let frame_len = (VIDEO_WIDTH * VIDEO_HEIGHT * 3) as usize;
        match read_frame(&mut self.stdout, frame_len)? {
            Some(data) => {
                self.sequence += 1;
                Ok(Some(Frame::new(data, VIDEO_WIDTH, VIDEO_HEIGHT, self.sequence)))
            }
            None => {
                tracing::info!(path = %self.path, frames = self.sequence, "video stream ended");
                Ok(None)
            }
        }
    }

    fn describe(&self) -> String {
        format!("video {}", self.path)
    }
}

impl Drop for VideoFile {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

/// Read exactly one frame. A clean EOF before any byte, or a truncated
/// trailing frame, ends the stream.
fn read_frame<R: Read>(reader: &mut R, frame_len: usize) -> Result<Option<Vec<u8>>, SourceError> {
    let mut buf = vec![0u8; frame_len];
    let mut filled = 0;
    while filled < frame_len {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    if filled < frame_len {
        if filled > 0 {
            tracing::debug!(filled, frame_len, "dropping truncated trailing frame");
        }
        return Ok(None);
    }
    Ok(Some(buf))
}
