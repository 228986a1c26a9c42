//! Core components of the replaycrab library
//!
//! This module contains the fundamental building blocks:
//! - [`governor`]: Per-operation call-rate governor
//! - [`encoder`]: Binary replay record encoder
//! - [`aggregator`]: Leaderboard-wide replay reconstruction
//! - [`fetch`]: The fetch collaborator interface and its governed wrapper
//! - [`records`]: Beatmap, score and replay records

pub mod aggregator;
pub mod encoder;
pub mod fetch;
pub mod governor;
pub mod records;

#[cfg(test)]
mod mock;

pub use aggregator::ReplayAggregator;
pub use encoder::{DEFAULT_FORMAT_VERSION, encode, encoded_len, replay_hash};
pub use fetch::{
    BeatmapLookup, Fetcher, GET_BEATMAPS, GET_REPLAY, GET_SCORES, Governed, ScoreQuery,
    ThrottlePolicy,
};
pub use governor::{Permit, RateGovernor, ThrottleState};
pub use records::{BeatmapRecord, GameMode, HitCounts, ReplayRecord, ScoreRecord};
