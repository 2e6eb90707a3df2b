//! attune-hw — Frame sources and speech output.
//!
//! V4L2 camera capture, ffmpeg-backed video file decoding, still-image
//! loading, and text-to-speech through external synthesizer/player commands.

pub mod camera;
pub mod frame;
pub mod source;
pub mod speech;

pub use camera::{Camera, CameraError, CameraStream, PixelFormat};
pub use frame::Frame;
pub use source::{load_image, FrameSource, SourceError, VideoFile};
pub use speech::{SpeechConfig, SpeechError, SpeechOutput};
