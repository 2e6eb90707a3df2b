//! Practice sessions, coin rewards, and the progress dashboard.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

const SECS_PER_COIN: u64 = 60;

/// One accuracy reading taken while practice is active.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccuracySample {
    /// Seconds since the session started.
    pub elapsed_secs: f64,
    pub accuracy: f32,
}

/// A practice attempt in progress.
#[derive(Debug, Clone)]
pub struct PracticeSession {
    pub id: Uuid,
    /// Display name of the pose.
    pub pose: String,
    pub started_at: DateTime<Utc>,
    samples: Vec<AccuracySample>,
}

impl PracticeSession {
    pub fn start(pose: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            pose: pose.into(),
            started_at: Utc::now(),
            samples: Vec::new(),
        }
    }

    pub fn record(&mut self, elapsed: Duration, accuracy: f32) {
        self.samples.push(AccuracySample {
            elapsed_secs: elapsed.as_secs_f64(),
            accuracy,
        });
    }

    pub fn samples(&self) -> &[AccuracySample] {
        &self.samples
    }

    /// Close the session after `duration` of wall-clock practice.
    pub fn finish(self, duration: Duration) -> SessionSummary {
        SessionSummary {
            id: self.id,
            pose: self.pose,
            duration_secs: duration.as_secs_f64(),
            average_accuracy: average_accuracy(&self.samples),
            coins_earned: coins_for(duration),
            samples: self.samples.len(),
            date: Utc::now(),
        }
    }
}

/// Finalized record of one practice session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub pose: String,
    pub duration_secs: f64,
    pub average_accuracy: f32,
    pub coins_earned: u32,
    pub samples: usize,
    pub date: DateTime<Utc>,
}

/// Arithmetic mean of sample accuracies; 0 when there are none.
pub fn average_accuracy(samples: &[AccuracySample]) -> f32 {
    if samples.is_empty() {
        return 0.0;
    }
    let sum: f64 = samples.iter().map(|s| s.accuracy as f64).sum();
    (sum / samples.len() as f64) as f32
}

/// One coin per full minute.
pub fn coins_for(duration: Duration) -> u32 {
    (duration.as_secs() / SECS_PER_COIN) as u32
}

/// Accumulated coins and finished sessions for the life of the process.
#[derive(Debug, Clone, Default)]
pub struct Progress {
    coins: u32,
    sessions: Vec<SessionSummary>,
}

impl Progress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, summary: SessionSummary) {
        self.coins += summary.coins_earned;
        tracing::info!(
            pose = %summary.pose,
            duration_secs = summary.duration_secs,
            accuracy = summary.average_accuracy,
            coins = summary.coins_earned,
            total_coins = self.coins,
            "session recorded"
        );
        self.sessions.push(summary);
    }

    pub fn coins(&self) -> u32 {
        self.coins
    }

    pub fn sessions(&self) -> &[SessionSummary] {
        &self.sessions
    }

    /// Dashboard view: totals, time per pose, and the accuracy trend.
    pub fn report(&self) -> ProgressReport {
        let mut time_per_pose: Vec<PoseTime> = Vec::new();
        for s in &self.sessions {
            match time_per_pose.iter_mut().find(|t| t.pose == s.pose) {
                Some(t) => t.duration_secs += s.duration_secs,
                None => time_per_pose.push(PoseTime {
                    pose: s.pose.clone(),
                    duration_secs: s.duration_secs,
                }),
            }
        }

        let total_secs: f64 = self.sessions.iter().map(|s| s.duration_secs).sum();

        ProgressReport {
            total_coins: self.coins,
            total_sessions: self.sessions.len(),
            total_minutes: total_secs / 60.0,
            time_per_pose,
            accuracy_trend: self
                .sessions
                .iter()
                .map(|s| TrendPoint {
                    date: s.date,
                    pose: s.pose.clone(),
                    accuracy: s.average_accuracy,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseTime {
    pub pose: String,
    pub duration_secs: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub date: DateTime<Utc>,
    pub pose: String,
    pub accuracy: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressReport {
    pub total_coins: u32,
    pub total_sessions: usize,
    pub total_minutes: f64,
    /// Summed duration per pose, in first-practised order.
    pub time_per_pose: Vec<PoseTime>,
    pub accuracy_trend: Vec<TrendPoint>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: f64) -> Duration {
        Duration::from_secs_f64(s)
    }

    #[test]
    fn test_coins_floor_minutes() {
        assert_eq!(coins_for(secs(0.0)), 0);
        assert_eq!(coins_for(secs(59.9)), 0);
        assert_eq!(coins_for(secs(60.0)), 1);
        assert_eq!(coins_for(secs(119.99)), 1);
        assert_eq!(coins_for(secs(600.5)), 10);
    }

    #[test]
    fn test_average_accuracy_empty() {
        assert_eq!(average_accuracy(&[]), 0.0);
    }

    #[test]
    fn test_average_accuracy_mean() {
        let mut session = PracticeSession::start("Tree");
        session.record(secs(0.1), 100.0);
        session.record(secs(0.2), 50.0);
        session.record(secs(0.3), 0.0);
        assert!((average_accuracy(session.samples()) - 50.0).abs() < 1e-4);
    }

    #[test]
    fn test_samples_keep_order() {
        let mut session = PracticeSession::start("Tree");
        session.record(secs(1.0), 10.0);
        session.record(secs(2.0), 20.0);
        let elapsed: Vec<f64> = session.samples().iter().map(|s| s.elapsed_secs).collect();
        assert_eq!(elapsed, vec![1.0, 2.0]);
    }

    #[test]
    fn test_finish_summarizes() {
        let mut session = PracticeSession::start("Warrior II");
        let id = session.id;
        session.record(secs(0.5), 80.0);
        session.record(secs(1.0), 60.0);

        let summary = session.finish(secs(125.0));
        assert_eq!(summary.id, id);
        assert_eq!(summary.pose, "Warrior II");
        assert_eq!(summary.coins_earned, 2);
        assert_eq!(summary.samples, 2);
        assert!((summary.average_accuracy - 70.0).abs() < 1e-4);
        assert!((summary.duration_secs - 125.0).abs() < 1e-9);
    }

    #[test]
    fn test_short_session_earns_nothing() {
        let summary = PracticeSession::start("Cobra").finish(secs(42.0));
        assert_eq!(summary.coins_earned, 0);
        assert_eq!(summary.average_accuracy, 0.0);
    }

    #[test]
    fn test_progress_report() {
        let mut progress = Progress::new();
        assert_eq!(progress.report().total_sessions, 0);

        progress.record(PracticeSession::start("Tree").finish(secs(90.0)));
        progress.record(PracticeSession::start("Cobra").finish(secs(30.0)));
        progress.record(PracticeSession::start("Tree").finish(secs(150.0)));

        let report = progress.report();
        assert_eq!(report.total_coins, 1 + 0 + 2);
        assert_eq!(progress.coins(), 3);
        assert_eq!(report.total_sessions, 3);
        assert!((report.total_minutes - 4.5).abs() < 1e-9);
        assert_eq!(
            report.time_per_pose,
            vec![
                PoseTime { pose: "Tree".into(), duration_secs: 240.0 },
                PoseTime { pose: "Cobra".into(), duration_secs: 30.0 },
            ]
        );
        assert_eq!(report.accuracy_trend.len(), 3);
        assert_eq!(report.accuracy_trend[1].pose, "Cobra");
    }
}
