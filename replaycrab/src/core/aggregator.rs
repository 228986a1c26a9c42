//! Replay reconstruction across a leaderboard
//!
//! [`ReplayAggregator`] drives a [`Fetcher`] through the three lookups a
//! replay needs and hands the results to the encoder. Entries are processed
//! strictly one after another; the throttle intervals of the remote API are
//! calibrated for sequential use.

use super::encoder::{self, DEFAULT_FORMAT_VERSION};
use super::fetch::{BeatmapLookup, Fetcher, ScoreQuery};
use super::records::{GameMode, ReplayRecord};
use crate::error::{ReplayError, Result};


/// Builds replay records from fetched data
pub struct ReplayAggregator<F> {
    fetcher: F,
    format_version: i32,
}

impl<F: Fetcher> ReplayAggregator<F> {
    pub fn new(fetcher: F) -> Self {
        ReplayAggregator {
            fetcher,
            format_version: DEFAULT_FORMAT_VERSION,
        }
    }

    /// Format version written into every record
    pub fn with_format_version(mut self, format_version: i32) -> Self {
        self.format_version = format_version;
        self
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Fetch and encode the replay of one user's play on a beatmap
    ///
    /// # Errors
    ///
    /// Remote errors are returned as-is. A missing beatmap or score is
    /// [`ReplayError::MissingField`]; a score that belongs to another user is
    /// [`ReplayError::InconsistentRecord`]. Encoder errors propagate unchanged.
    pub async fn fetch_replay_file(
        &self,
        beatmap_id: u64,
        user_name: &str,
        mode: GameMode,
        mods: Option<u32>,
    ) -> Result<ReplayRecord> {
        let replay = self
            .fetcher
            .fetch_replay_blob(beatmap_id, user_name, mode)
            .await?;
        tracing::debug!(beatmap_id, user_name, bytes = replay.len(), "fetched replay stream");

        let beatmap = self
            .fetcher
            .fetch_beatmap(&BeatmapLookup::Id(beatmap_id))
            .await?
            .ok_or(ReplayError::MissingField("beatmap"))?;

        let query = ScoreQuery::new(beatmap_id)
            .user(user_name)
            .mode(mode)
            .mods(mods);
        let score = self
            .fetcher
            .fetch_scores(&query)
            .await?
            .into_iter()
            .next()
            .ok_or(ReplayError::MissingField("score"))?;

        if !score.user_name.eq_ignore_ascii_case(user_name) {
            return Err(ReplayError::InconsistentRecord(format!(
                "requested score of {user_name}, got score of {}",
                score.user_name
            )));
        }

        let data = encoder::encode(&beatmap, &score, &replay, mode, self.format_version)?;
        Ok(ReplayRecord::new(score.user_name, score.score_id, data))
    }

    /// Build the replay of every entry on a beatmap's leaderboard
    ///
    /// `progress(index, total, user_name)` is called before each entry is
    /// fetched. Records come back in leaderboard order. The first failing
    /// entry aborts the whole run.
    pub async fn collect_replays<P>(
        &self,
        beatmap_id: u64,
        mode: GameMode,
        mods: Option<u32>,
        mut progress: P,
    ) -> Result<Vec<ReplayRecord>>
    where
        P: FnMut(usize, usize, &str),
    {
        let query = ScoreQuery::new(beatmap_id).mode(mode).mods(mods);
        let leaderboard = self.fetcher.fetch_scores(&query).await?;

        let total = leaderboard.len();
        tracing::info!(beatmap_id, %mode, total, "collecting replays");

        let mut replays = Vec::with_capacity(total);
        for (index, entry) in leaderboard.iter().enumerate() {
            progress(index, total, &entry.user_name);
            tracing::info!(index, total, user = %entry.user_name, "fetching replay");

            let replay = self
                .fetch_replay_file(beatmap_id, &entry.user_name, mode, mods)
                .await?;
            replays.push(replay);
        }

        Ok(replays)
    }
}
