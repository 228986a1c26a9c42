//! Records consumed and produced by the replay pipeline
//!
//! [`BeatmapRecord`] and [`ScoreRecord`] are the typed forms of the metadata
//! the remote API returns. [`ReplayRecord`] is the finished binary replay.

use crate::error::ReplayError;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Game mode a beatmap or score belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    Osu,
    Taiko,
    Catch,
    Mania,
}

impl GameMode {
    /// Numeric identifier used by the API and the replay format
    pub fn as_u8(self) -> u8 {
        match self {
            GameMode::Osu => 0,
            GameMode::Taiko => 1,
            GameMode::Catch => 2,
            GameMode::Mania => 3,
        }
    }
}

impl TryFrom<i64> for GameMode {
    type Error = ReplayError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(GameMode::Osu),
            1 => Ok(GameMode::Taiko),
            2 => Ok(GameMode::Catch),
            3 => Ok(GameMode::Mania),
            _ => Err(ReplayError::MalformedField {
                field: "mode",
                value: value.to_string(),
            }),
        }
    }
}

impl FromStr for GameMode {
    type Err = ReplayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "0" | "osu" | "std" | "standard" => Ok(GameMode::Osu),
            "1" | "taiko" => Ok(GameMode::Taiko),
            "2" | "catch" | "fruits" | "ctb" => Ok(GameMode::Catch),
            "3" | "mania" => Ok(GameMode::Mania),
            _ => Err(ReplayError::MalformedField {
                field: "mode",
                value: s.to_owned(),
            }),
        }
    }
}

impl fmt::Display for GameMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GameMode::Osu => "osu",
            GameMode::Taiko => "taiko",
            GameMode::Catch => "catch",
            GameMode::Mania => "mania",
        };
        f.write_str(name)
    }
}

/// Beatmap metadata
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BeatmapRecord {
    pub beatmap_id: u64,
    pub beatmapset_id: u64,
    /// MD5 of the .osu file, 32 hex characters
    pub checksum: String,
    /// Mode the beatmap was authored for
    pub mode: GameMode,
    pub artist: String,
    pub title: String,
    /// Difficulty name
    pub version: String,
}

/// Judgement counts of a play
///
/// The meaning of each count depends on the game mode; the names follow the
/// osu!standard judgements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct HitCounts {
    pub count300: i64,
    pub count100: i64,
    pub count50: i64,
    pub count_geki: i64,
    pub count_katu: i64,
    pub count_miss: i64,
}

/// Score metadata for one play of one beatmap by one user
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreRecord {
    pub score_id: u64,
    pub beatmap_id: u64,
    pub user_id: u64,
    pub user_name: String,
    pub rank: Option<String>,
    pub hit_counts: Option<HitCounts>,
    pub total_score: i64,
    pub max_combo: i64,
    pub perfect: bool,
    /// Enabled mods bitmask
    pub mods: i64,
    /// Submission time as `YYYY-MM-DD HH:MM:SS`, UTC
    pub date: Option<String>,
    pub pp: Option<f64>,
}

/// A finished replay file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplayRecord {
    pub user_name: String,
    pub score_id: u64,
    data: Bytes,
}

impl ReplayRecord {
    pub(crate) fn new(user_name: String, score_id: u64, data: Bytes) -> Self {
        ReplayRecord {
            user_name,
            score_id,
            data,
        }
    }

    /// The encoded replay bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn into_bytes(self) -> Bytes {
        self.data
    }
}

impl AsRef<[u8]> for ReplayRecord {
    fn as_ref(&self) -> &[u8] {
        &self.data
    }
}
