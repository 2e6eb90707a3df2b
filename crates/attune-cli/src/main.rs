use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "attune", about = "Mood playlists and yoga practice coaching")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect your mood and recommend a playlist
    Mood {
        /// Image file (jpg, jpeg, png)
        #[arg(short, long, conflicts_with = "camera")]
        image: Option<PathBuf>,
        /// Take a snapshot from the webcam instead
        #[arg(short, long)]
        camera: bool,
    },
    /// List supported yoga poses
    Poses,
    /// Yoga practice sessions
    Practice {
        #[command(subcommand)]
        action: PracticeAction,
    },
    /// Show coins, sessions and accuracy trend
    Progress,
    /// Show daemon status
    Status,
}

#[derive(Subcommand)]
enum PracticeAction {
    /// Start practising a pose (webcam unless --video is given)
    Start {
        /// Pose key, e.g. "tadasana"
        pose: String,
        /// Practice against a video file (mp4, mov)
        #[arg(short, long)]
        video: Option<PathBuf>,
    },
    /// Stop practice and save the session
    Stop,
    /// Show live accuracy and feedback
    Status {
        /// Keep polling until frames stop
        #[arg(short, long)]
        watch: bool,
    },
}

#[zbus::proxy(
    interface = "org.freedesktop.Attune1",
    default_service = "org.freedesktop.Attune1",
    default_path = "/org/freedesktop/Attune1"
)]
trait Attune {
    async fn detect_emotion(&self, path: &str) -> zbus::Result<String>;
    async fn scan_emotion(&self) -> zbus::Result<String>;
    async fn list_poses(&self) -> zbus::Result<String>;
    async fn start_practice(&self, pose: &str, video_path: &str) -> zbus::Result<String>;
    async fn stop_practice(&self) -> zbus::Result<String>;
    async fn practice_status(&self) -> zbus::Result<String>;
    async fn progress(&self) -> zbus::Result<String>;
    async fn status(&self) -> zbus::Result<String>;
}

/// The daemon resolves paths against its own working directory.
fn absolute(path: &Path) -> String {
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .to_string_lossy()
        .into_owned()
}

fn print_json(raw: &str) -> Result<Value> {
    let value: Value = serde_json::from_str(raw).context("daemon returned invalid JSON")?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(value)
}

fn print_mood(raw: &str) -> Result<()> {
    let value = print_json(raw)?;
    match value.get("recommendation").filter(|r| !r.is_null()) {
        Some(rec) => {
            println!("Detected emotion: {}", rec["emotion"].as_str().unwrap_or("?"));
            println!("Playlist: {}", rec["embed_url"].as_str().unwrap_or("?"));
        }
        None => println!("No face detected. Try again with a clearer image."),
    }
    Ok(())
}

fn status_line(value: &Value) -> String {
    let elapsed = value["elapsed_secs"].as_f64().unwrap_or(0.0);
    let accuracy = value["accuracy"].as_f64().unwrap_or(0.0);
    let feedback = value["feedback"].as_str().unwrap_or("");
    if value["settling"].as_bool().unwrap_or(false) {
        return format!("{:>4}s  get into position...", elapsed as u64);
    }
    format!("{:>4}s  {accuracy:5.1}%  {feedback}", elapsed as u64)
}

async fn watch_practice(proxy: &AttuneProxy<'_>) -> Result<()> {
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    loop {
        ticker.tick().await;
        let value: Value = serde_json::from_str(&proxy.practice_status().await?)?;
        if !value["pending"].as_bool().unwrap_or(false) {
            println!("No practice session.");
            return Ok(());
        }
        println!("{}", status_line(&value));
        if !value["active"].as_bool().unwrap_or(false) {
            if let Some(message) = value["message"].as_str() {
                println!("{message}");
            }
            println!("Run `attune practice stop` to save the session.");
            return Ok(());
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let conn = zbus::Connection::session()
        .await
        .context("connecting to the session bus")?;
    let proxy = AttuneProxy::new(&conn).await?;

    match cli.command {
        Commands::Mood { image, camera } => {
            let raw = match (image, camera) {
                (Some(path), _) => proxy.detect_emotion(&absolute(&path)).await?,
                (None, true) => proxy.scan_emotion().await?,
                (None, false) => bail!("pass --image <path> or --camera"),
            };
            print_mood(&raw)?;
        }
        Commands::Poses => {
            print_json(&proxy.list_poses().await?)?;
        }
        Commands::Practice { action } => match action {
            PracticeAction::Start { pose, video } => {
                let video = video.as_deref().map(absolute).unwrap_or_default();
                print_json(&proxy.start_practice(&pose, &video).await?)?;
            }
            PracticeAction::Stop => {
                let value = print_json(&proxy.stop_practice().await?)?;
                println!(
                    "Session completed! You earned {} coins.",
                    value["coins_earned"].as_u64().unwrap_or(0)
                );
            }
            PracticeAction::Status { watch: false } => {
                print_json(&proxy.practice_status().await?)?;
            }
            PracticeAction::Status { watch: true } => {
                watch_practice(&proxy).await?;
            }
        },
        Commands::Progress => {
            let value = print_json(&proxy.progress().await?)?;
            if value["total_sessions"].as_u64() == Some(0) {
                println!("No sessions yet. Start practicing!");
            }
        }
        Commands::Status => {
            print_json(&proxy.status().await?)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_practice_start_with_video() {
        let cli = Cli::try_parse_from(["attune", "practice", "start", "tadasana", "--video", "a.mp4"])
            .unwrap();
        match cli.command {
            Commands::Practice {
                action: PracticeAction::Start { pose, video },
            } => {
                assert_eq!(pose, "tadasana");
                assert_eq!(video, Some(PathBuf::from("a.mp4")));
            }
            _ => panic!("wrong command"),
        }
    }

    #[test]
    fn test_mood_image_conflicts_with_camera() {
        assert!(Cli::try_parse_from(["attune", "mood", "--image", "x.png", "--camera"]).is_err());
    }

    #[test]
    fn test_status_line() {
        let value = serde_json::json!({
            "elapsed_secs": 12.7, "accuracy": 50.0,
            "feedback": "Adjust your right shoulder", "settling": false
        });
        assert_eq!(status_line(&value), "  12s   50.0%  Adjust your right shoulder");

        let settling = serde_json::json!({ "elapsed_secs": 2.0, "settling": true });
        assert!(status_line(&settling).contains("get into position"));
    }
}
