//! # ReplayCrab
//!
//! Rebuilds osu! replay files (`.osr`) from the three pieces the osu! API v1
//! serves separately: beatmap metadata, score metadata and the compressed
//! replay stream.
//!
//! ## Overview
//!
//! - **[`RateGovernor`]**: keeps each remote operation under its own minimum
//!   call interval, shared across every caller of that operation
//! - **[`encode`]**: merges the three records into one byte-exact,
//!   little-endian replay record with its derived replay hash
//! - **[`ReplayAggregator`]**: walks a beatmap leaderboard and builds one
//!   replay per entry, sequentially
//!
//! The network side is abstracted behind the [`Fetcher`] trait. Wrap any
//! fetcher in [`Governed`] to throttle it.
//!
//! ## Quick Start
//!
//! ```ignore
//! use replaycrab::{GameMode, Governed, RateGovernor, ReplayAggregator, ThrottlePolicy};
//! use std::sync::Arc;
//!
//! let governor = Arc::new(RateGovernor::new());
//! let fetcher = Governed::new(api_client, governor, ThrottlePolicy::default());
//! let aggregator = ReplayAggregator::new(fetcher);
//!
//! let replays = aggregator
//!     .collect_replays(2323855, GameMode::Mania, Some(0), |index, total, user| {
//!         println!("({index}/{total}) Getting replay for {user}");
//!     })
//!     .await?;
//! ```
//!
//! ## Encoding a Replay Directly
//!
//! ```
//! use replaycrab::{BeatmapRecord, GameMode, HitCounts, ScoreRecord, encode, encoded_len};
//!
//! let beatmap = BeatmapRecord {
//!     beatmap_id: 2323855,
//!     beatmapset_id: 1116124,
//!     checksum: "a5b99395a42bd55bc5eb1d2411cbdf8b".to_string(),
//!     mode: GameMode::Mania,
//!     artist: String::new(),
//!     title: String::new(),
//!     version: String::new(),
//! };
//! let score = ScoreRecord {
//!     score_id: 1,
//!     beatmap_id: 2323855,
//!     user_id: 2,
//!     user_name: "abraker".to_string(),
//!     rank: Some("S".to_string()),
//!     hit_counts: Some(HitCounts::default()),
//!     total_score: 987654,
//!     max_combo: 1234,
//!     perfect: true,
//!     mods: 0,
//!     date: Some("2020-03-14 15:09:26".to_string()),
//!     pp: None,
//! };
//!
//! let replay_stream = [0x5d, 0x00, 0x00];
//! let record = encode(&beatmap, &score, &replay_stream, GameMode::Mania, 0)?;
//! assert_eq!(record.len(), encoded_len(&beatmap, &score, replay_stream.len()));
//! # Ok::<(), replaycrab::ReplayError>(())
//! ```

pub mod core;
pub mod error;

pub use crate::core::{
    BeatmapLookup, BeatmapRecord, DEFAULT_FORMAT_VERSION, Fetcher, GET_BEATMAPS, GET_REPLAY,
    GET_SCORES, GameMode, Governed, HitCounts, Permit, RateGovernor, ReplayAggregator,
    ReplayRecord, ScoreQuery, ScoreRecord, ThrottlePolicy, ThrottleState, encode, encoded_len,
    replay_hash,
};
pub use error::{ReplayError, Result};
