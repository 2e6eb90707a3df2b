use attune_core::{
    analyze_pose, catalog, emotion, ClassifierError, CatalogError, DetectorError, EmotionClassifier,
    EstimatorError, FaceDetector, Landmark, MoodDetector, PlaylistTable, PoseAnalysis, PoseConfig,
    PoseConfigStore, PoseEstimator, PracticeSession, Progress, ProgressReport, Recommendation,
    SessionSummary,
};
use attune_hw::{Camera, CameraError, Frame, FrameSource, SourceError, SpeechOutput, VideoFile};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::sync::mpsc::error::TryRecvError;
use tokio::sync::{mpsc, oneshot};

use crate::config::Config;

const STREAM_ENDED: &str = "video stream ended";

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("camera error: {0}")]
    Camera(#[from] CameraError),
    #[error("{0}")]
    Source(#[from] SourceError),
    #[error("{0}")]
    Catalog(#[from] CatalogError),
    #[error("detector error: {0}")]
    Detector(#[from] DetectorError),
    #[error("classifier error: {0}")]
    Classifier(#[from] ClassifierError),
    #[error("pose estimator error: {0}")]
    Estimator(#[from] EstimatorError),
    #[error("practice already running for {0}")]
    PracticeActive(String),
    #[error("no practice session to stop")]
    NoPractice,
    #[error("camera is in use by the running practice session")]
    CameraInUse,
    #[error("engine thread exited")]
    ChannelClosed,
}

/// Result of an emotion scan.
#[derive(Debug, Clone, Serialize)]
pub struct MoodReport {
    pub faces: usize,
    /// `None` when no face was detected.
    pub recommendation: Option<Recommendation>,
}

/// Acknowledgement of a started practice.
#[derive(Debug, Clone, Serialize)]
pub struct PracticeStarted {
    pub session_id: String,
    pub pose: String,
    pub source: String,
    pub required_landmarks: usize,
    pub settle_secs: u64,
}

/// Live view of the current practice.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PracticeStatus {
    /// Frames are being processed (or the settle wait is running).
    pub active: bool,
    /// A session exists that has not been finalised with StopPractice.
    pub pending: bool,
    pub pose: Option<String>,
    pub elapsed_secs: f64,
    pub settling: bool,
    pub accuracy: f32,
    pub feedback: String,
    pub samples: usize,
    /// "video stream ended" or "error processing video: ..." once frames stop.
    pub message: Option<String>,
}

impl PracticeStatus {
    fn idle() -> Self {
        Self {
            active: false,
            pending: false,
            pose: None,
            elapsed_secs: 0.0,
            settling: false,
            accuracy: 0.0,
            feedback: String::new(),
            samples: 0,
            message: None,
        }
    }
}

/// Daemon-level status.
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub camera_device: String,
    pub pose_dir: String,
    pub poses_cached: usize,
    pub speech_enabled: bool,
    pub practice: PracticeStatus,
    pub sessions: usize,
    pub coins: u32,
}

/// Messages sent from D-Bus handlers to the engine thread.
enum EngineRequest {
    DetectEmotion {
        path: PathBuf,
        reply: oneshot::Sender<Result<MoodReport, EngineError>>,
    },
    ScanEmotion {
        reply: oneshot::Sender<Result<MoodReport, EngineError>>,
    },
    StartPractice {
        pose: String,
        video: Option<PathBuf>,
        reply: oneshot::Sender<Result<PracticeStarted, EngineError>>,
    },
    StopPractice {
        reply: oneshot::Sender<Result<SessionSummary, EngineError>>,
    },
    PracticeStatus {
        reply: oneshot::Sender<PracticeStatus>,
    },
    Progress {
        reply: oneshot::Sender<ProgressReport>,
    },
    Status {
        reply: oneshot::Sender<EngineStatus>,
    },
}

/// Clone-safe handle to the engine thread.
#[derive(Clone)]
pub struct EngineHandle {
    tx: mpsc::Sender<EngineRequest>,
}

impl EngineHandle {
    async fn request<T>(
        &self,
        build: impl FnOnce(oneshot::Sender<T>) -> EngineRequest,
    ) -> Result<T, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build(reply_tx))
            .await
            .map_err(|_| EngineError::ChannelClosed)?;
        reply_rx.await.map_err(|_| EngineError::ChannelClosed)
    }

    /// Detect emotions in an image file and recommend a playlist.
    pub async fn detect_emotion(&self, path: PathBuf) -> Result<MoodReport, EngineError> {
        self.request(|reply| EngineRequest::DetectEmotion { path, reply })
            .await?
    }

    /// Grab one webcam frame and recommend a playlist.
    pub async fn scan_emotion(&self) -> Result<MoodReport, EngineError> {
        self.request(|reply| EngineRequest::ScanEmotion { reply }).await?
    }

    pub async fn start_practice(
        &self,
        pose: String,
        video: Option<PathBuf>,
    ) -> Result<PracticeStarted, EngineError> {
        self.request(|reply| EngineRequest::StartPractice { pose, video, reply })
            .await?
    }

    pub async fn stop_practice(&self) -> Result<SessionSummary, EngineError> {
        self.request(|reply| EngineRequest::StopPractice { reply }).await?
    }

    pub async fn practice_status(&self) -> Result<PracticeStatus, EngineError> {
        self.request(|reply| EngineRequest::PracticeStatus { reply }).await
    }

    pub async fn progress(&self) -> Result<ProgressReport, EngineError> {
        self.request(|reply| EngineRequest::Progress { reply }).await
    }

    pub async fn status(&self) -> Result<EngineStatus, EngineError> {
        self.request(|reply| EngineRequest::Status { reply }).await
    }
}

/// Engine-side settings copied out of the daemon config.
struct Settings {
    camera_device: String,
    tick: Duration,
    settle: Duration,
    feedback_threshold: f32,
}

/// A practice attempt and the frame source feeding it.
struct Practice {
    key: String,
    config: Arc<PoseConfig>,
    session: PracticeSession,
    started: Instant,
    settle: Duration,
    resume_at: Instant,
    /// Dropped (and thereby released) when frames stop.
    source: Option<Box<dyn FrameSource>>,
    uses_camera: bool,
    last: PoseAnalysis,
    message: Option<String>,
}

/// What one processing tick produced.
#[derive(Debug, PartialEq)]
enum Step {
    Settling,
    Idle,
    /// Frame scored; carries the text to speak, if any.
    Scored(Option<String>),
    Ended,
    Failed,
}

impl Practice {
    fn new(
        key: String,
        name: String,
        config: Arc<PoseConfig>,
        source: Box<dyn FrameSource>,
        uses_camera: bool,
        settle: Duration,
    ) -> Self {
        let started = Instant::now();
        Self {
            key,
            config,
            session: PracticeSession::start(name),
            started,
            settle,
            resume_at: started + settle,
            source: Some(source),
            uses_camera,
            last: PoseAnalysis::none(),
            message: None,
        }
    }

    fn is_running(&self) -> bool {
        self.source.is_some()
    }

    /// Restart the settle wait from now, once the start narration has played.
    fn begin_settle(&mut self) {
        self.resume_at = Instant::now() + self.settle;
    }

    /// Read, mirror, estimate, score and record one frame.
    fn step<F>(&mut self, feedback_threshold: f32, estimate: F) -> Step
    where
        F: FnOnce(&Frame) -> Result<Option<Vec<Landmark>>, EngineError>,
    {
        let Some(source) = self.source.as_mut() else {
            return Step::Idle;
        };
        if Instant::now() < self.resume_at {
            return Step::Settling;
        }

        let analysis = source
            .next_frame()
            .map_err(EngineError::from)
            .and_then(|frame| match frame {
                Some(frame) => estimate(&frame.mirrored()).map(Some),
                None => Ok(None),
            });

        match analysis {
            Ok(Some(landmarks)) => {
                let analysis = match landmarks {
                    Some(lms) => analyze_pose(&lms, &self.config),
                    None => PoseAnalysis::none(),
                };
                self.session.record(self.started.elapsed(), analysis.accuracy);

                let speak = (analysis.accuracy < feedback_threshold
                    && !analysis.feedback.is_empty())
                .then(|| analysis.feedback.clone());
                self.last = analysis;
                Step::Scored(speak)
            }
            Ok(None) => {
                tracing::info!(pose = %self.key, samples = self.session.samples().len(), "video stream ended");
                self.release(STREAM_ENDED.to_string());
                Step::Ended
            }
            Err(e) => {
                tracing::error!(pose = %self.key, error = %e, "frame processing failed");
                self.release(format!("error processing video: {e}"));
                Step::Failed
            }
        }
    }

    fn release(&mut self, message: String) {
        self.source = None;
        self.message = Some(message);
    }

    fn status(&self) -> PracticeStatus {
        PracticeStatus {
            active: self.is_running(),
            pending: true,
            pose: Some(self.session.pose.clone()),
            elapsed_secs: self.started.elapsed().as_secs_f64(),
            settling: self.is_running() && Instant::now() < self.resume_at,
            accuracy: self.last.accuracy,
            feedback: self.last.feedback.clone(),
            samples: self.session.samples().len(),
            message: self.message.clone(),
        }
    }

    fn finish(self) -> SessionSummary {
        let duration = self.started.elapsed();
        self.session.finish(duration)
    }
}

/// The current practice, if any, and the sessions finished so far.
#[derive(Default)]
struct Studio {
    practice: Option<Practice>,
    progress: Progress,
}

impl Studio {
    fn is_running(&self) -> bool {
        self.practice.as_ref().is_some_and(Practice::is_running)
    }

    fn camera_busy(&self) -> bool {
        self.practice
            .as_ref()
            .is_some_and(|p| p.is_running() && p.uses_camera)
    }

    fn check_idle(&self) -> Result<(), EngineError> {
        match self.practice.as_ref().filter(|p| p.is_running()) {
            Some(current) => Err(EngineError::PracticeActive(current.session.pose.clone())),
            None => Ok(()),
        }
    }

    /// Install a new practice. An ended-but-unstopped session is saved
    /// before it is replaced.
    fn begin(&mut self, practice: Practice) -> Result<(), EngineError> {
        self.check_idle()?;
        if let Some(previous) = self.practice.take() {
            tracing::info!(pose = %previous.key, "finalising previous session");
            self.progress.record(previous.finish());
        }
        self.practice = Some(practice);
        Ok(())
    }

    fn begin_settle(&mut self) {
        if let Some(practice) = self.practice.as_mut() {
            practice.begin_settle();
        }
    }

    fn stop(&mut self) -> Result<SessionSummary, EngineError> {
        let practice = self.practice.take().ok_or(EngineError::NoPractice)?;
        let summary = practice.finish();
        self.progress.record(summary.clone());
        Ok(summary)
    }

    fn status(&self) -> PracticeStatus {
        self.practice
            .as_ref()
            .map(Practice::status)
            .unwrap_or_else(PracticeStatus::idle)
    }
}

/// All application state, owned by the engine thread.
struct Engine {
    settings: Settings,
    mood: MoodDetector,
    estimator: PoseEstimator,
    poses: PoseConfigStore,
    playlists: PlaylistTable,
    speech: SpeechOutput,
    studio: Studio,
}

impl Engine {
    fn run(mut self, mut rx: mpsc::Receiver<EngineRequest>) {
        loop {
            if self.studio.is_running() {
                self.tick();
                loop {
                    match rx.try_recv() {
                        Ok(req) => self.handle(req),
                        Err(TryRecvError::Empty) => break,
                        Err(TryRecvError::Disconnected) => return,
                    }
                }
                std::thread::sleep(self.settings.tick);
            } else {
                match rx.blocking_recv() {
                    Some(req) => self.handle(req),
                    None => return,
                }
            }
        }
    }

    fn tick(&mut self) {
        let Some(practice) = self.studio.practice.as_mut() else {
            return;
        };
        let estimator = &mut self.estimator;
        let step = practice.step(self.settings.feedback_threshold, |frame| {
            Ok(estimator.estimate(&frame.data, frame.width, frame.height)?)
        });
        if let Step::Scored(Some(feedback)) = step {
            self.speech.speak(&feedback);
        }
    }

    fn handle(&mut self, req: EngineRequest) {
        match req {
            EngineRequest::DetectEmotion { path, reply } => {
                let _ = reply.send(self.detect_emotion(&path));
            }
            EngineRequest::ScanEmotion { reply } => {
                let _ = reply.send(self.scan_emotion());
            }
            EngineRequest::StartPractice { pose, video, reply } => {
                match self.start_practice(&pose, video) {
                    Ok((started, narration)) => {
                        let _ = reply.send(Ok(started));
                        self.speech.speak(narration);
                        self.studio.begin_settle();
                    }
                    Err(e) => {
                        tracing::warn!(pose = %pose, error = %e, "practice start failed");
                        let _ = reply.send(Err(e));
                    }
                }
            }
            EngineRequest::StopPractice { reply } => {
                let _ = reply.send(self.studio.stop());
            }
            EngineRequest::PracticeStatus { reply } => {
                let _ = reply.send(self.studio.status());
            }
            EngineRequest::Progress { reply } => {
                let _ = reply.send(self.studio.progress.report());
            }
            EngineRequest::Status { reply } => {
                let _ = reply.send(EngineStatus {
                    camera_device: self.settings.camera_device.clone(),
                    pose_dir: self.poses.dir().display().to_string(),
                    poses_cached: self.poses.cached(),
                    speech_enabled: self.speech.enabled(),
                    practice: self.studio.status(),
                    sessions: self.studio.progress.sessions().len(),
                    coins: self.studio.progress.coins(),
                });
            }
        }
    }

    fn detect_emotion(&mut self, path: &std::path::Path) -> Result<MoodReport, EngineError> {
        let frame = attune_hw::load_image(path)?;
        tracing::info!(path = %path.display(), "detecting emotion in image");
        self.recommend(&frame)
    }

    fn scan_emotion(&mut self) -> Result<MoodReport, EngineError> {
        if self.studio.camera_busy() {
            return Err(EngineError::CameraInUse);
        }
        // Scoped: the device is released before classification.
        let frame = {
            let mut camera = Camera::open(&self.settings.camera_device)?;
            camera.capture_frame()?
        };
        tracing::info!(device = %self.settings.camera_device, "scanning emotion from camera");
        self.recommend(&frame)
    }

    fn recommend(&mut self, frame: &Frame) -> Result<MoodReport, EngineError> {
        let detected = self
            .mood
            .detect_emotions(&frame.data, frame.width, frame.height)?;
        let recommendation = emotion::recommend(&detected, &self.playlists);

        match &recommendation {
            Some(r) => tracing::info!(emotion = %r.emotion, faces = detected.len(), playlist = %r.playlist_id, "mood detected"),
            None => tracing::info!("no face detected"),
        }

        Ok(MoodReport {
            faces: detected.len(),
            recommendation,
        })
    }

    /// Returns the acknowledgement and the narration to speak after replying.
    fn start_practice(
        &mut self,
        pose: &str,
        video: Option<PathBuf>,
    ) -> Result<(PracticeStarted, &'static str), EngineError> {
        self.studio.check_idle()?;

        let config = self.poses.load(pose)?;

        let (source, uses_camera): (Box<dyn FrameSource>, bool) = match &video {
            Some(path) => (Box::new(VideoFile::open(path)?), false),
            None => (
                Box::new(Camera::open(&self.settings.camera_device)?.into_stream()?),
                true,
            ),
        };

        let name = catalog::pose_info(pose)
            .map(|info| info.name.to_string())
            .unwrap_or_else(|| pose.to_string());

        let practice = Practice::new(
            pose.to_string(),
            name.clone(),
            Arc::clone(&config),
            source,
            uses_camera,
            self.settings.settle,
        );

        let started = PracticeStarted {
            session_id: practice.session.id.to_string(),
            pose: name,
            source: practice
                .source
                .as_ref()
                .map(|s| s.describe())
                .unwrap_or_default(),
            required_landmarks: config.required_landmarks.len(),
            settle_secs: self.settings.settle.as_secs(),
        };

        tracing::info!(
            pose,
            session = %started.session_id,
            source = %started.source,
            required = started.required_landmarks,
            "practice started"
        );

        self.studio.begin(practice)?;
        Ok((started, catalog::spoken_description(pose)))
    }
}

/// Spawn the engine on a dedicated OS thread.
///
/// Loads all three ONNX models synchronously (fail-fast), then enters the
/// request loop. Camera and video sources are opened per operation.
pub fn spawn_engine(
    config: &Config,
    playlists: PlaylistTable,
) -> Result<EngineHandle, EngineError> {
    let face_path = config.face_model_path();
    let faces = FaceDetector::load(&face_path)?;
    tracing::info!(path = %face_path, "face detector loaded");

    let emotion_path = config.emotion_model_path();
    let classifier = EmotionClassifier::load(&emotion_path)?;
    tracing::info!(path = %emotion_path, "emotion classifier loaded");

    let pose_path = config.pose_model_path();
    let estimator = PoseEstimator::load(&pose_path)?;
    tracing::info!(path = %pose_path, "pose estimator loaded");

    let engine = Engine {
        settings: Settings {
            camera_device: config.camera_device.clone(),
            tick: config.tick(),
            settle: config.settle(),
            feedback_threshold: config.feedback_threshold,
        },
        mood: MoodDetector::new(faces, classifier),
        estimator,
        poses: PoseConfigStore::new(config.pose_dir.clone()),
        playlists,
        speech: SpeechOutput::new(config.speech()),
        studio: Studio::default(),
    };

    let (tx, rx) = mpsc::channel::<EngineRequest>(8);

    std::thread::Builder::new()
        .name("attune-engine".into())
        .spawn(move || {
            tracing::info!("engine thread started");
            engine.run(rx);
            tracing::info!("engine thread exiting");
        })
        .expect("failed to spawn engine thread");

    Ok(EngineHandle { tx })
}

#[cfg(test)]
mod tests {
    use super::*;
    use attune_core::PoseLandmark;

    /// Yields `frames` blank frames, then either ends or fails.
    struct FakeSource {
        frames: usize,
        fail_at_end: bool,
    }

    impl FrameSource for FakeSource {
        fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
            if self.frames == 0 {
                if self.fail_at_end {
                    return Err(SourceError::Read(std::io::Error::new(
                        std::io::ErrorKind::UnexpectedEof,
                        "decoder died",
                    )));
                }
                return Ok(None);
            }
            self.frames -= 1;
            Ok(Some(Frame::new(vec![0; 2 * 2 * 3], 2, 2, 0)))
        }

        fn describe(&self) -> String {
            "fake".into()
        }
    }

    fn practice(frames: usize, fail_at_end: bool) -> Practice {
        Practice::new(
            "tadasana".into(),
            "Tadasana (Mountain Pose)".into(),
            Arc::new(PoseConfig::new(["LEFT_SHOULDER", "RIGHT_SHOULDER"])),
            Box::new(FakeSource { frames, fail_at_end }),
            false,
            Duration::ZERO,
        )
    }

    fn body(left: f32, right: f32) -> Vec<Landmark> {
        let mut lms = vec![Landmark::new(0.5, 0.5, 0.0, 0.0); PoseLandmark::COUNT];
        lms[PoseLandmark::LeftShoulder.index()].visibility = left;
        lms[PoseLandmark::RightShoulder.index()].visibility = right;
        lms
    }

    #[test]
    fn test_step_scores_and_records() {
        let mut p = practice(2, false);

        let step = p.step(70.0, |_| Ok(Some(body(0.9, 0.9))));
        assert_eq!(step, Step::Scored(None));
        assert_eq!(p.last.feedback, "Good form!");

        let step = p.step(70.0, |_| Ok(Some(body(0.9, 0.1))));
        assert_eq!(step, Step::Scored(Some("Adjust your right shoulder".into())));
        assert!((p.last.accuracy - 50.0).abs() < 1e-4);
        assert_eq!(p.session.samples().len(), 2);
    }

    #[test]
    fn test_no_body_records_zero_without_speech() {
        let mut p = practice(1, false);
        assert_eq!(p.step(70.0, |_| Ok(None)), Step::Scored(None));
        assert_eq!(p.session.samples()[0].accuracy, 0.0);
    }

    #[test]
    fn test_frames_are_mirrored_before_estimation() {
        let mut p = practice(0, false);
        p.source = Some(Box::new(MirrorCheck));
        p.step(70.0, |frame| {
            assert_eq!(&frame.data[..3], &[2, 2, 2]);
            Ok(None)
        });
    }

    struct MirrorCheck;

    impl FrameSource for MirrorCheck {
        fn next_frame(&mut self) -> Result<Option<Frame>, SourceError> {
            Ok(Some(Frame::new(vec![1, 1, 1, 2, 2, 2], 2, 1, 0)))
        }

        fn describe(&self) -> String {
            "mirror check".into()
        }
    }

    #[test]
    fn test_stream_end_releases_source_and_keeps_session() {
        let mut p = practice(1, false);
        p.step(70.0, |_| Ok(Some(body(0.9, 0.9))));
        assert_eq!(p.step(70.0, |_| Ok(None)), Step::Ended);

        assert!(!p.is_running());
        let status = p.status();
        assert!(!status.active);
        assert!(status.pending);
        assert_eq!(status.message.as_deref(), Some(STREAM_ENDED));

        let summary = p.finish();
        assert_eq!(summary.samples, 1);
        assert!((summary.average_accuracy - 100.0).abs() < 1e-4);
    }

    #[test]
    fn test_source_error_surfaces_message() {
        let mut p = practice(0, true);
        assert_eq!(p.step(70.0, |_| Ok(None)), Step::Failed);
        assert!(!p.is_running());
        let message = p.status().message.unwrap();
        assert!(message.starts_with("error processing video: "), "{message}");
    }

    #[test]
    fn test_estimator_error_surfaces_message() {
        let mut p = practice(3, false);
        let step = p.step(70.0, |_| {
            Err(EstimatorError::InferenceFailed("bad output".into()).into())
        });
        assert_eq!(step, Step::Failed);
        assert_eq!(
            p.status().message.as_deref(),
            Some("error processing video: pose estimator error: inference failed: bad output")
        );
    }

    #[test]
    fn test_settling_skips_frames() {
        let mut p = Practice::new(
            "tadasana".into(),
            "Tadasana".into(),
            Arc::new(PoseConfig::new(["NOSE"])),
            Box::new(FakeSource { frames: 5, fail_at_end: false }),
            false,
            Duration::from_secs(60),
        );
        assert_eq!(p.step(70.0, |_| Ok(None)), Step::Settling);
        assert!(p.status().settling);
        assert!(p.session.samples().is_empty());
    }

    #[test]
    fn test_idle_status() {
        let status = PracticeStatus::idle();
        assert!(!status.active && !status.pending);
        assert!(status.pose.is_none());
    }

    #[test]
    fn test_settle_counts_from_end_of_narration() {
        let mut p = Practice::new(
            "tadasana".into(),
            "Tadasana".into(),
            Arc::new(PoseConfig::new(["NOSE"])),
            Box::new(FakeSource { frames: 5, fail_at_end: false }),
            false,
            Duration::from_millis(300),
        );
        // Narration outlasts the settle interval.
        std::thread::sleep(Duration::from_millis(400));
        p.begin_settle();

        assert_eq!(p.step(70.0, |_| Ok(None)), Step::Settling);
        assert!(p.session.samples().is_empty());
    }

    #[test]
    fn test_studio_stop_finalises_into_progress() {
        let mut studio = Studio::default();
        assert!(matches!(studio.stop(), Err(EngineError::NoPractice)));

        studio.begin(practice(3, false)).unwrap();
        assert!(studio.is_running());
        studio.practice.as_mut().unwrap().step(70.0, |_| Ok(Some(body(0.9, 0.1))));

        let summary = studio.stop().unwrap();
        assert_eq!(summary.pose, "Tadasana (Mountain Pose)");
        assert_eq!(summary.samples, 1);
        assert!(!studio.is_running());
        assert_eq!(studio.progress.sessions().len(), 1);
        assert_eq!(studio.status(), PracticeStatus::idle());
        assert!(matches!(studio.stop(), Err(EngineError::NoPractice)));
    }

    #[test]
    fn test_studio_rejects_start_while_running() {
        let mut studio = Studio::default();
        studio.begin(practice(3, false)).unwrap();

        assert!(matches!(
            studio.check_idle(),
            Err(EngineError::PracticeActive(ref pose)) if pose == "Tadasana (Mountain Pose)"
        ));
        assert!(matches!(
            studio.begin(practice(3, false)),
            Err(EngineError::PracticeActive(_))
        ));
        assert!(studio.progress.sessions().is_empty());
    }

    #[test]
    fn test_studio_saves_pending_session_on_new_start() {
        let mut studio = Studio::default();
        studio.begin(practice(0, false)).unwrap();
        // Stream ends: frames stop, session stays pending.
        studio.practice.as_mut().unwrap().step(70.0, |_| Ok(None));
        assert!(!studio.is_running());
        assert!(studio.status().pending);
        assert!(studio.check_idle().is_ok());

        studio.begin(practice(3, false)).unwrap();
        assert_eq!(studio.progress.sessions().len(), 1);
        assert!(studio.is_running());
    }

    #[test]
    fn test_studio_camera_busy_only_for_running_camera() {
        let mut studio = Studio::default();
        assert!(!studio.camera_busy());

        studio.begin(practice(3, false)).unwrap();
        assert!(!studio.camera_busy());
        studio.stop().unwrap();

        let mut cam = practice(0, false);
        cam.uses_camera = true;
        studio.begin(cam).unwrap();
        assert!(studio.camera_busy());
        studio.practice.as_mut().unwrap().step(70.0, |_| Ok(None));
        assert!(!studio.camera_busy());
    }
}
