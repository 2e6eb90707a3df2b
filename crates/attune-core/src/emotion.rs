//! Emotion labels and the mood → playlist table.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Playlist used for any label the table does not map.
pub const DEFAULT_PLAYLIST_ID: &str = "37i9dQZF1DX4WYpdgoIcn6";

const CALM_VIBES: &str = "37i9dQZF1DX3rxVfibe1L0";
const HAPPY_HITS: &str = "37i9dQZF1DXdPec7aLTmlC";
const CHILL_HITS: &str = "37i9dQZF1DX4WYpdgoIcn6";

const EMBED_BASE_URL: &str = "https://open.spotify.com/embed/playlist";

#[derive(Error, Debug)]
pub enum PlaylistError {
    #[error("failed to read playlist table {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("invalid playlist table: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("unknown emotion in playlist table: {0}")]
    UnknownEmotion(String),
    #[error("empty playlist id for {0}")]
    EmptyId(String),
}

/// Facial emotion classes, in classifier output order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Emotion {
    Angry,
    Disgust,
    Fear,
    Happy,
    Neutral,
    Sad,
    Surprised,
}

impl Emotion {
    pub const ALL: [Emotion; 7] = [
        Emotion::Angry,
        Emotion::Disgust,
        Emotion::Fear,
        Emotion::Happy,
        Emotion::Neutral,
        Emotion::Sad,
        Emotion::Surprised,
    ];

    /// Map a classifier output index to its label.
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    pub fn label(self) -> &'static str {
        match self {
            Emotion::Angry => "Angry",
            Emotion::Disgust => "Disgust",
            Emotion::Fear => "Fear",
            Emotion::Happy => "Happy",
            Emotion::Neutral => "Neutral",
            Emotion::Sad => "Sad",
            Emotion::Surprised => "Surprised",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Emotion {
    type Err = PlaylistError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|e| e.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| PlaylistError::UnknownEmotion(s.to_string()))
    }
}

/// On-disk override format:
///
/// ```toml
/// default = "37i9dQZF1DX4WYpdgoIcn6"
///
/// [playlists]
/// Happy = "37i9dQZF1DXdPec7aLTmlC"
/// ```
#[derive(Debug, Deserialize)]
struct PlaylistFile {
    default: Option<String>,
    #[serde(default)]
    playlists: HashMap<String, String>,
}

/// Emotion → playlist id lookup with a configurable fallback.
#[derive(Debug, Clone)]
pub struct PlaylistTable {
    entries: HashMap<Emotion, String>,
    default_id: String,
}

impl Default for PlaylistTable {
    fn default() -> Self {
        let entries = [
            (Emotion::Angry, CALM_VIBES),
            (Emotion::Disgust, CALM_VIBES),
            (Emotion::Fear, CALM_VIBES),
            (Emotion::Happy, HAPPY_HITS),
            (Emotion::Neutral, CHILL_HITS),
            (Emotion::Sad, CALM_VIBES),
            (Emotion::Surprised, HAPPY_HITS),
        ]
        .into_iter()
        .map(|(e, id)| (e, id.to_string()))
        .collect();

        Self {
            entries,
            default_id: DEFAULT_PLAYLIST_ID.to_string(),
        }
    }
}

impl PlaylistTable {
    /// Built-in table with entries (and optionally the default) overridden
    /// by a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, PlaylistError> {
        let file: PlaylistFile = toml::from_str(s)?;
        let mut table = Self::default();

        for (key, id) in file.playlists {
            let emotion: Emotion = key.parse()?;
            if id.trim().is_empty() {
                return Err(PlaylistError::EmptyId(key));
            }
            table.entries.insert(emotion, id.trim().to_string());
        }

        if let Some(default_id) = file.default {
            if default_id.trim().is_empty() {
                return Err(PlaylistError::EmptyId("default".into()));
            }
            table.default_id = default_id.trim().to_string();
        }

        Ok(table)
    }

    pub fn from_file(path: &Path) -> Result<Self, PlaylistError> {
        let contents = std::fs::read_to_string(path).map_err(|source| PlaylistError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let table = Self::from_toml_str(&contents)?;
        tracing::info!(path = %path.display(), default = %table.default_id, "loaded playlist table");
        Ok(table)
    }

    /// Playlist for a classifier label, or the default for unmapped labels.
    pub fn lookup(&self, label: &str) -> &str {
        label
            .parse::<Emotion>()
            .ok()
            .and_then(|e| self.entries.get(&e))
            .map(String::as_str)
            .unwrap_or(self.default_id.as_str())
    }

    pub fn playlist_for(&self, emotion: Emotion) -> &str {
        self.entries
            .get(&emotion)
            .map(String::as_str)
            .unwrap_or(self.default_id.as_str())
    }

    pub fn default_id(&self) -> &str {
        &self.default_id
    }
}

/// Embeddable player URL for a playlist id.
pub fn embed_url(playlist_id: &str) -> String {
    format!("{EMBED_BASE_URL}/{playlist_id}?utm_source=generator")
}

/// Iframe snippet for embedding the playlist player in a page.
pub fn embed_html(playlist_id: &str) -> String {
    format!(
        r#"<iframe style="border-radius: 12px" src="{}" width="100%" height="380" frameBorder="0" allowfullscreen="" allow="autoplay; clipboard-write; encrypted-media; fullscreen; picture-in-picture" loading="lazy"></iframe>"#,
        embed_url(playlist_id)
    )
}

/// Playlist recommendation for a detected mood.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    /// Emotion the recommendation is based on (first detected face).
    pub emotion: Emotion,
    /// Emotions for every detected face, in detection order.
    pub detected: Vec<Emotion>,
    pub playlist_id: String,
    pub embed_url: String,
    pub embed_html: String,
}

/// Recommend a playlist from per-face emotions; `None` when no face was found.
pub fn recommend(detected: &[Emotion], table: &PlaylistTable) -> Option<Recommendation> {
    let emotion = *detected.first()?;
    let playlist_id = table.playlist_for(emotion).to_string();

    Some(Recommendation {
        emotion,
        detected: detected.to_vec(),
        embed_url: embed_url(&playlist_id),
        embed_html: embed_html(&playlist_id),
        playlist_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_index_order() {
        assert_eq!(Emotion::from_index(0), Some(Emotion::Angry));
        assert_eq!(Emotion::from_index(3), Some(Emotion::Happy));
        assert_eq!(Emotion::from_index(6), Some(Emotion::Surprised));
        assert_eq!(Emotion::from_index(7), None);
    }

    #[test]
    fn test_parse_is_case_insensitive() {
        assert_eq!("happy".parse::<Emotion>().unwrap(), Emotion::Happy);
        assert_eq!(" SAD ".parse::<Emotion>().unwrap(), Emotion::Sad);
        assert!("bored".parse::<Emotion>().is_err());
    }

    #[test]
    fn test_lookup_known_labels() {
        let table = PlaylistTable::default();
        assert_eq!(table.lookup("Angry"), CALM_VIBES);
        assert_eq!(table.lookup("Disgust"), CALM_VIBES);
        assert_eq!(table.lookup("Fear"), CALM_VIBES);
        assert_eq!(table.lookup("Happy"), HAPPY_HITS);
        assert_eq!(table.lookup("Neutral"), CHILL_HITS);
        assert_eq!(table.lookup("Sad"), CALM_VIBES);
        assert_eq!(table.lookup("Surprised"), HAPPY_HITS);
    }

    #[test]
    fn test_lookup_unknown_label_uses_default() {
        let table = PlaylistTable::default();
        assert_eq!(table.lookup("Contempt"), DEFAULT_PLAYLIST_ID);
        assert_eq!(table.lookup(""), DEFAULT_PLAYLIST_ID);
    }

    #[test]
    fn test_toml_overrides_entry_and_default() {
        let table = PlaylistTable::from_toml_str(
            r#"
            default = "fallback123"

            [playlists]
            Happy = "upbeat456"
            "#,
        )
        .unwrap();

        assert_eq!(table.lookup("Happy"), "upbeat456");
        assert_eq!(table.lookup("Sad"), CALM_VIBES);
        assert_eq!(table.lookup("unknown"), "fallback123");
        assert_eq!(table.default_id(), "fallback123");
    }

    #[test]
    fn test_toml_rejects_unknown_emotion() {
        let err = PlaylistTable::from_toml_str("[playlists]\nBored = \"x\"\n").unwrap_err();
        assert!(matches!(err, PlaylistError::UnknownEmotion(ref k) if k == "Bored"));
    }

    #[test]
    fn test_toml_rejects_empty_id() {
        let err = PlaylistTable::from_toml_str("default = \"  \"\n").unwrap_err();
        assert!(matches!(err, PlaylistError::EmptyId(_)));
    }

    #[test]
    fn test_embed_url() {
        assert_eq!(
            embed_url("abc"),
            "https://open.spotify.com/embed/playlist/abc?utm_source=generator"
        );
        assert!(embed_html("abc").contains(r#"src="https://open.spotify.com/embed/playlist/abc?utm_source=generator""#));
    }

    #[test]
    fn test_recommend_uses_first_face() {
        let table = PlaylistTable::default();
        let rec = recommend(&[Emotion::Happy, Emotion::Sad], &table).unwrap();
        assert_eq!(rec.emotion, Emotion::Happy);
        assert_eq!(rec.playlist_id, HAPPY_HITS);
        assert_eq!(rec.detected, vec![Emotion::Happy, Emotion::Sad]);
        assert_eq!(rec.embed_url, embed_url(HAPPY_HITS));
    }

    #[test]
    fn test_recommend_without_faces() {
        assert!(recommend(&[], &PlaylistTable::default()).is_none());
    }
}
