//! osu! API v1 payloads
//!
//! The API encodes every number as a JSON string and reports failures as an
//! object with a single `error` member instead of the expected data:
//!
//! ```json
//! { "error": "Replay not available." }
//! ```
//!
//! The types here mirror the raw payloads and convert them into the typed
//! records of the core library.

use crate::error::{ClientError, Result};
use replaycrab::{BeatmapRecord, GameMode, HitCounts, ScoreRecord};
use serde::Deserialize;
use std::str::FromStr;

/// Either the expected payload or the API's error object
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ApiResponse<T> {
    Error { error: String },
    Data(T),
}

impl<T> ApiResponse<T> {
    pub fn into_result(self) -> Result<T> {
        match self {
            ApiResponse::Error { error } => Err(ClientError::Api(error)),
            ApiResponse::Data(data) => Ok(data),
        }
    }
}

/// Response of `/api/get_replay`
#[derive(Debug, Deserialize)]
pub struct ApiReplay {
    /// Base64 of the LZMA replay stream
    pub content: String,
    #[serde(default)]
    pub encoding: Option<String>,
}

/// Entry of `/api/get_beatmaps`
#[derive(Debug, Deserialize)]
pub struct ApiBeatmap {
    pub beatmap_id: String,
    pub beatmapset_id: String,
    pub file_md5: String,
    pub mode: String,
    #[serde(default)]
    pub artist: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub version: String,
}

impl TryFrom<ApiBeatmap> for BeatmapRecord {
    type Error = ClientError;

    fn try_from(raw: ApiBeatmap) -> Result<Self> {
        let mode: i64 = parse("mode", &raw.mode)?;
        Ok(BeatmapRecord {
            beatmap_id: parse("beatmap_id", &raw.beatmap_id)?,
            beatmapset_id: parse("beatmapset_id", &raw.beatmapset_id)?,
            checksum: raw.file_md5,
            mode: GameMode::try_from(mode).map_err(|_| ClientError::InvalidField {
                field: "mode",
                value: raw.mode.clone(),
            })?,
            artist: raw.artist,
            title: raw.title,
            version: raw.version,
        })
    }
}

/// Entry of `/api/get_scores`
///
/// The endpoint does not echo the beatmap id, so conversion takes it from the
/// query that produced the entry.
#[derive(Debug, Deserialize)]
pub struct ApiScore {
    pub score_id: String,
    pub score: String,
    pub username: String,
    #[serde(default)]
    pub user_id: Option<String>,
    pub count300: Option<String>,
    pub count100: Option<String>,
    pub count50: Option<String>,
    pub countmiss: Option<String>,
    pub countkatu: Option<String>,
    pub countgeki: Option<String>,
    pub maxcombo: String,
    pub perfect: String,
    pub enabled_mods: String,
    pub date: Option<String>,
    pub rank: Option<String>,
    #[serde(default)]
    pub pp: Option<String>,
}

impl ApiScore {
    pub fn into_record(self, beatmap_id: u64) -> Result<ScoreRecord> {
        let hit_counts = self.hit_counts()?;
        let user_id = match &self.user_id {
            Some(id) => parse("user_id", id)?,
            None => 0,
        };
        let pp = match &self.pp {
            Some(pp) => Some(parse("pp", pp)?),
            None => None,
        };

        Ok(ScoreRecord {
            score_id: parse("score_id", &self.score_id)?,
            beatmap_id,
            user_id,
            user_name: self.username,
            rank: self.rank,
            hit_counts,
            total_score: parse("score", &self.score)?,
            max_combo: parse("maxcombo", &self.maxcombo)?,
            perfect: parse::<u8>("perfect", &self.perfect)? != 0,
            mods: parse("enabled_mods", &self.enabled_mods)?,
            date: self.date,
            pp,
        })
    }

    /// All six counts, or `None` if any is absent
    fn hit_counts(&self) -> Result<Option<HitCounts>> {
        let (
            Some(count300),
            Some(count100),
            Some(count50),
            Some(count_geki),
            Some(count_katu),
            Some(count_miss),
        ) = (
            &self.count300,
            &self.count100,
            &self.count50,
            &self.countgeki,
            &self.countkatu,
            &self.countmiss,
        )
        else {
            return Ok(None);
        };

        Ok(Some(HitCounts {
            count300: parse("count300", count300)?,
            count100: parse("count100", count100)?,
            count50: parse("count50", count50)?,
            count_geki: parse("countgeki", count_geki)?,
            count_katu: parse("countkatu", count_katu)?,
            count_miss: parse("countmiss", count_miss)?,
        }))
    }
}

fn parse<T: FromStr>(field: &'static str, value: &str) -> Result<T> {
    value.trim().parse().map_err(|_| ClientError::InvalidField {
        field,
        value: value.to_owned(),
    })
}
