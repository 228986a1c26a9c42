//! Binary replay encoder
//!
//! Merges a [`BeatmapRecord`], a [`ScoreRecord`] and the compressed replay
//! stream into one osu! replay record.
//!
//! # Layout
//!
//! All integers are little-endian. Strings are written as their raw UTF-8
//! bytes between two zero bytes.
//!
//! | field             | width           |
//! |-------------------|-----------------|
//! | game mode         | i8              |
//! | format version    | i32             |
//! | beatmap checksum  | 0x00, str, 0x00 |
//! | user name         | 0x00, str, 0x00 |
//! | replay hash       | 0x00, str, 0x00 |
//! | count 300         | i16             |
//! | count 100         | i16             |
//! | count 50          | i16             |
//! | count geki        | i16             |
//! | count katu        | i16             |
//! | count miss        | i16             |
//! | total score       | i32             |
//! | max combo         | i16             |
//! | perfect           | u8 (0 or 1)     |
//! | mods              | i32             |
//! | life bar graph    | 0x00, 0x00      |
//! | timestamp         | i64 (unix secs) |
//! | replay length     | u32             |
//! | replay data       | [u8; length]    |
//! | score id          | i64             |

use super::records::{BeatmapRecord, GameMode, HitCounts, ScoreRecord};
use crate::error::{ReplayError, Result};
use bytes::{BufMut, Bytes, BytesMut};
use chrono::NaiveDateTime;


/// Format version written when the caller has no specific one
pub const DEFAULT_FORMAT_VERSION: i32 = 0;

/// Tag mixed into the replay hash
const HASH_TAG: &str = "osu";

/// Textual form of score timestamps
const DATE_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Every byte that does not depend on string or blob lengths:
/// mode and version, six string delimiters, the score block,
/// the empty life bar graph, timestamp and length, and the score id.
const FIXED_LEN: usize = (1 + 4) + (3 * 2) + (6 * 2 + 4 + 2 + 1 + 4) + 2 + (8 + 4) + 8;

/// Length of a hex-encoded MD5 digest
const HASH_LEN: usize = 32;

/// Exact size of the record [`encode`] produces for these inputs
pub fn encoded_len(beatmap: &BeatmapRecord, score: &ScoreRecord, replay_len: usize) -> usize {
    FIXED_LEN + beatmap.checksum.len() + score.user_name.len() + HASH_LEN + replay_len
}

/// Hash correlating a replay with its score
///
/// MD5 over `max_combo`, the literal `osu`, the user name, the beatmap
/// checksum, the total score and the rank, concatenated without separators.
pub fn replay_hash(
    max_combo: i64,
    user_name: &str,
    beatmap_checksum: &str,
    total_score: i64,
    rank: &str,
) -> String {
    let input = format!("{max_combo}{HASH_TAG}{user_name}{beatmap_checksum}{total_score}{rank}");
    format!("{:x}", md5::compute(input.as_bytes()))
}

/// Convert a `YYYY-MM-DD HH:MM:SS` UTC timestamp into Unix seconds
pub fn parse_score_date(date: &str) -> Result<i64> {
    NaiveDateTime::parse_from_str(date.trim(), DATE_FORMAT)
        .map(|dt| dt.and_utc().timestamp())
        .map_err(|_| ReplayError::MalformedField {
            field: "date",
            value: date.to_owned(),
        })
}

/// Build a replay record from its three sources
///
/// # Errors
///
/// - [`ReplayError::MissingField`]: rank, hit counts or date are absent
/// - [`ReplayError::InconsistentRecord`]: the score belongs to another
///   beatmap, or the beatmap cannot be played in `mode`
/// - [`ReplayError::EncodingRange`]: a value does not fit its field
/// - [`ReplayError::MalformedField`]: the date cannot be parsed
///
/// Validation happens before anything is written, so an error never leaves a
/// partial record behind.
pub fn encode(
    beatmap: &BeatmapRecord,
    score: &ScoreRecord,
    replay: &[u8],
    mode: GameMode,
    format_version: i32,
) -> Result<Bytes> {
    check_consistency(beatmap, score, mode)?;

    let rank = score.rank.as_deref().ok_or(ReplayError::MissingField("rank"))?;
    let counts = score
        .hit_counts
        .as_ref()
        .ok_or(ReplayError::MissingField("hit counts"))?;
    let date = score.date.as_deref().ok_or(ReplayError::MissingField("date"))?;

    let fields = ScoreFields::from_score(score, counts)?;
    let timestamp = parse_score_date(date)?;
    let replay_len = narrow::<u32>("replay length", replay.len() as i128)?;

    let hash = replay_hash(
        score.max_combo,
        &score.user_name,
        &beatmap.checksum,
        score.total_score,
        rank,
    );

    let mut buffer = BytesMut::with_capacity(encoded_len(beatmap, score, replay.len()));

    buffer.put_i8(mode.as_u8() as i8);
    buffer.put_i32_le(format_version);
    put_framed(&mut buffer, &beatmap.checksum);
    put_framed(&mut buffer, &score.user_name);
    put_framed(&mut buffer, &hash);

    buffer.put_i16_le(fields.count300);
    buffer.put_i16_le(fields.count100);
    buffer.put_i16_le(fields.count50);
    buffer.put_i16_le(fields.count_geki);
    buffer.put_i16_le(fields.count_katu);
    buffer.put_i16_le(fields.count_miss);
    buffer.put_i32_le(fields.total_score);
    buffer.put_i16_le(fields.max_combo);
    buffer.put_u8(u8::from(score.perfect));
    buffer.put_i32_le(fields.mods);

    // Life bar graph is never populated
    put_framed(&mut buffer, "");

    buffer.put_i64_le(timestamp);
    buffer.put_u32_le(replay_len);
    buffer.put_slice(replay);
    buffer.put_i64_le(fields.score_id);

    debug_assert_eq!(buffer.len(), encoded_len(beatmap, score, replay.len()));
    Ok(buffer.freeze())
}

fn check_consistency(beatmap: &BeatmapRecord, score: &ScoreRecord, mode: GameMode) -> Result<()> {
    if beatmap.beatmap_id != score.beatmap_id {
        return Err(ReplayError::InconsistentRecord(format!(
            "score {} is for beatmap {}, not {}",
            score.score_id, score.beatmap_id, beatmap.beatmap_id
        )));
    }

    // Standard maps convert to every other mode
    if beatmap.mode != mode && beatmap.mode != GameMode::Osu {
        return Err(ReplayError::InconsistentRecord(format!(
            "beatmap {} is a {} map and cannot be played as {}",
            beatmap.beatmap_id, beatmap.mode, mode
        )));
    }

    Ok(())
}

/// Zero byte, raw string bytes, zero byte
fn put_framed(buffer: &mut BytesMut, value: &str) {
    buffer.put_u8(0);
    buffer.put_slice(value.as_bytes());
    buffer.put_u8(0);
}

/// Score fields narrowed to their on-disk widths
struct ScoreFields {
    count300: i16,
    count100: i16,
    count50: i16,
    count_geki: i16,
    count_katu: i16,
    count_miss: i16,
    total_score: i32,
    max_combo: i16,
    mods: i32,
    score_id: i64,
}

impl ScoreFields {
    fn from_score(score: &ScoreRecord, counts: &HitCounts) -> Result<Self> {
        Ok(ScoreFields {
            count300: narrow("count300", counts.count300.into())?,
            count100: narrow("count100", counts.count100.into())?,
            count50: narrow("count50", counts.count50.into())?,
            count_geki: narrow("countgeki", counts.count_geki.into())?,
            count_katu: narrow("countkatu", counts.count_katu.into())?,
            count_miss: narrow("countmiss", counts.count_miss.into())?,
            total_score: narrow("score", score.total_score.into())?,
            max_combo: narrow("maxcombo", score.max_combo.into())?,
            mods: narrow("enabled_mods", score.mods.into())?,
            score_id: narrow("score_id", score.score_id.into())?,
        })
    }
}

fn narrow<T: TryFrom<i128>>(field: &'static str, value: i128) -> Result<T> {
    T::try_from(value).map_err(|_| ReplayError::EncodingRange { field, value })
}
