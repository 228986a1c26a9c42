//! Fetch collaborator interface
//!
//! The core never talks to the network itself. It consumes a [`Fetcher`]
//! and, when rate limiting is wanted, wraps it in a [`Governed`] fetcher that
//! routes every call through a shared [`RateGovernor`].

use super::governor::RateGovernor;
use super::records::{BeatmapRecord, GameMode, ScoreRecord};
use crate::error::Result;
use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;
use std::time::Duration;

/// Operation identity of the replay stream fetch
pub const GET_REPLAY: &str = "get_replay";
/// Operation identity of the beatmap metadata fetch
pub const GET_BEATMAPS: &str = "get_beatmaps";
/// Operation identity of the score metadata fetch
pub const GET_SCORES: &str = "get_scores";

/// How a beatmap is looked up
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BeatmapLookup {
    Id(u64),
    /// MD5 of the .osu file
    Checksum(String),
}

/// Filter for a score lookup
///
/// Only `beatmap_id` is required; without a user the query returns the
/// beatmap's leaderboard.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScoreQuery {
    pub beatmap_id: u64,
    pub user_name: Option<String>,
    pub mode: Option<GameMode>,
    pub mods: Option<u32>,
}

impl ScoreQuery {
    pub fn new(beatmap_id: u64) -> Self {
        ScoreQuery {
            beatmap_id,
            ..Default::default()
        }
    }

    pub fn user(mut self, user_name: impl Into<String>) -> Self {
        self.user_name = Some(user_name.into());
        self
    }

    pub fn mode(mut self, mode: GameMode) -> Self {
        self.mode = Some(mode);
        self
    }

    pub fn mods(mut self, mods: Option<u32>) -> Self {
        self.mods = mods;
        self
    }
}

/// Source of beatmap, score and replay data
#[async_trait]
pub trait Fetcher: Send + Sync {
    /// Compressed replay stream of `user_name`'s play on a beatmap
    ///
    /// This is the LZMA stream only, not a full replay file.
    async fn fetch_replay_blob(
        &self,
        beatmap_id: u64,
        user_name: &str,
        mode: GameMode,
    ) -> Result<Bytes>;

    /// Beatmap metadata, `None` if the beatmap does not exist
    async fn fetch_beatmap(&self, lookup: &BeatmapLookup) -> Result<Option<BeatmapRecord>>;

    /// Scores matching the query, best first; empty if none match
    async fn fetch_scores(&self, query: &ScoreQuery) -> Result<Vec<ScoreRecord>>;
}

#[async_trait]
impl<F: Fetcher + ?Sized> Fetcher for Arc<F> {
    async fn fetch_replay_blob(
        &self,
        beatmap_id: u64,
        user_name: &str,
        mode: GameMode,
    ) -> Result<Bytes> {
        (**self).fetch_replay_blob(beatmap_id, user_name, mode).await
    }

    async fn fetch_beatmap(&self, lookup: &BeatmapLookup) -> Result<Option<BeatmapRecord>> {
        (**self).fetch_beatmap(lookup).await
    }

    async fn fetch_scores(&self, query: &ScoreQuery) -> Result<Vec<ScoreRecord>> {
        (**self).fetch_scores(query).await
    }
}

/// Minimum interval between calls of each fetch operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottlePolicy {
    pub replay: Duration,
    pub beatmaps: Duration,
    pub scores: Duration,
}

impl ThrottlePolicy {
    /// The replay endpoint has a much stricter quota than the metadata ones
    pub const DEFAULT_REPLAY_INTERVAL: Duration = Duration::from_secs(10);
    pub const DEFAULT_METADATA_INTERVAL: Duration = Duration::from_millis(100);
}

impl Default for ThrottlePolicy {
    fn default() -> Self {
        ThrottlePolicy {
            replay: Self::DEFAULT_REPLAY_INTERVAL,
            beatmaps: Self::DEFAULT_METADATA_INTERVAL,
            scores: Self::DEFAULT_METADATA_INTERVAL,
        }
    }
}

/// A [`Fetcher`] whose calls pass through a [`RateGovernor`] first
///
/// The governor is shared, so several `Governed` fetchers built from the same
/// `Arc<RateGovernor>` respect one schedule per operation.
pub struct Governed<F> {
    inner: F,
    governor: Arc<RateGovernor>,
    policy: ThrottlePolicy,
}

impl<F: Fetcher> Governed<F> {
    pub fn new(inner: F, governor: Arc<RateGovernor>, policy: ThrottlePolicy) -> Self {
        Governed {
            inner,
            governor,
            policy,
        }
    }

    pub fn governor(&self) -> &Arc<RateGovernor> {
        &self.governor
    }

    pub fn policy(&self) -> ThrottlePolicy {
        self.policy
    }

    pub fn into_inner(self) -> F {
        self.inner
    }
}

#[async_trait]
impl<F: Fetcher> Fetcher for Governed<F> {
    async fn fetch_replay_blob(
        &self,
        beatmap_id: u64,
        user_name: &str,
        mode: GameMode,
    ) -> Result<Bytes> {
        self.governor.throttle(GET_REPLAY, self.policy.replay).await;
        self.inner.fetch_replay_blob(beatmap_id, user_name, mode).await
    }

    async fn fetch_beatmap(&self, lookup: &BeatmapLookup) -> Result<Option<BeatmapRecord>> {
        self.governor
            .throttle(GET_BEATMAPS, self.policy.beatmaps)
            .await;
        self.inner.fetch_beatmap(lookup).await
    }

    async fn fetch_scores(&self, query: &ScoreQuery) -> Result<Vec<ScoreRecord>> {
        self.governor.throttle(GET_SCORES, self.policy.scores).await;
        self.inner.fetch_scores(query).await
    }
}
