//! In-memory fetcher for tests

use super::fetch::{BeatmapLookup, Fetcher, ScoreQuery};
use super::records::{BeatmapRecord, GameMode, HitCounts, ScoreRecord};
use crate::error::{ReplayError, Result};
use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;
use tokio::time::Instant;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Replay { beatmap_id: u64, user_name: String },
    Beatmap(BeatmapLookup),
    Scores(ScoreQuery),
}

#[derive(Default)]
pub struct MockFetcher {
    pub beatmaps: Vec<BeatmapRecord>,
    pub scores: Vec<ScoreRecord>,
    /// Users whose replay the remote refuses to serve
    pub unavailable: Vec<String>,
    /// Answer user score lookups with the whole leaderboard
    pub ignore_user_filter: bool,
    calls: Mutex<Vec<(Call, Instant)>>,
}

impl MockFetcher {
    pub fn new(beatmaps: Vec<BeatmapRecord>, scores: Vec<ScoreRecord>) -> Self {
        MockFetcher {
            beatmaps,
            scores,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().iter().map(|(call, _)| call.clone()).collect()
    }

    pub fn timed_calls(&self) -> Vec<(Call, Instant)> {
        self.calls.lock().clone()
    }

    fn record(&self, call: Call) {
        self.calls.lock().push((call, Instant::now()));
    }
}

#[async_trait]
impl Fetcher for MockFetcher {
    async fn fetch_replay_blob(
        &self,
        beatmap_id: u64,
        user_name: &str,
        _mode: GameMode,
    ) -> Result<Bytes> {
        self.record(Call::Replay {
            beatmap_id,
            user_name: user_name.to_owned(),
        });

        if self.unavailable.iter().any(|u| u == user_name) {
            return Err(ReplayError::RemoteRejection(
                "Replay not available.".to_owned(),
            ));
        }
        Ok(Bytes::from(format!("lzma:{beatmap_id}:{user_name}")))
    }

    async fn fetch_beatmap(&self, lookup: &BeatmapLookup) -> Result<Option<BeatmapRecord>> {
        self.record(Call::Beatmap(lookup.clone()));

        Ok(self
            .beatmaps
            .iter()
            .find(|b| match lookup {
                BeatmapLookup::Id(id) => b.beatmap_id == *id,
                BeatmapLookup::Checksum(md5) => &b.checksum == md5,
            })
            .cloned())
    }

    async fn fetch_scores(&self, query: &ScoreQuery) -> Result<Vec<ScoreRecord>> {
        self.record(Call::Scores(query.clone()));

        Ok(self
            .scores
            .iter()
            .filter(|s| s.beatmap_id == query.beatmap_id)
            .filter(|s| {
                self.ignore_user_filter
                    || query
                        .user_name
                        .as_ref()
                        .is_none_or(|u| s.user_name.eq_ignore_ascii_case(u))
            })
            .cloned()
            .collect())
    }
}

pub fn beatmap(beatmap_id: u64) -> BeatmapRecord {
    BeatmapRecord {
        beatmap_id,
        beatmapset_id: 1116124,
        checksum: format!("{:032x}", beatmap_id),
        mode: GameMode::Mania,
        artist: "Camellia".to_owned(),
        title: "Exit This Earth's Atomosphere".to_owned(),
        version: "Insane".to_owned(),
    }
}

pub fn score(beatmap_id: u64, score_id: u64, user_name: &str) -> ScoreRecord {
    ScoreRecord {
        score_id,
        beatmap_id,
        user_id: score_id * 7,
        user_name: user_name.to_owned(),
        rank: Some("A".to_owned()),
        hit_counts: Some(HitCounts {
            count300: 500,
            count100: 20,
            count50: 1,
            count_geki: 300,
            count_katu: 15,
            count_miss: 4,
        }),
        total_score: 850_000,
        max_combo: 700,
        perfect: false,
        mods: 0,
        date: Some("2021-06-01 12:00:00".to_owned()),
        pp: None,
    }
}
