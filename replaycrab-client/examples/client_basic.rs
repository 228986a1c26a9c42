//! Basic example of using the replaycrab client
//!
//! ```bash
//! OSU_API_KEY=... cargo run -p replaycrab-client --example client_basic -- 2323855 abraker
//! ```

use std::sync::Arc;
use std::time::Duration;

use replaycrab::{
    BeatmapLookup, GameMode, Governed, RateGovernor, ReplayAggregator, ScoreQuery, ThrottlePolicy,
};
use replaycrab_client::OsuApiClient;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("replaycrab=debug,replaycrab_client=debug")
        .init();

    let mut args = std::env::args().skip(1);
    let beatmap_id: u64 = args.next().unwrap_or_else(|| "2323855".into()).parse()?;
    let user = args.next().unwrap_or_else(|| "abraker".into());
    let api_key = std::env::var("OSU_API_KEY")?;

    let client = OsuApiClient::builder()
        .api_key(api_key)
        .request_timeout(Duration::from_secs(10))
        .build()?;

    // Example 1: Beatmap metadata
    println!("=== Beatmap ===");
    let beatmaps = client.get_beatmaps(&BeatmapLookup::Id(beatmap_id)).await?;
    for beatmap in &beatmaps {
        println!(
            "{} - {} [{}] ({}, {})",
            beatmap.artist, beatmap.title, beatmap.version, beatmap.mode, beatmap.checksum
        );
    }
    let mode = beatmaps.first().map_or(GameMode::Osu, |beatmap| beatmap.mode);

    // Example 2: Top of the leaderboard
    println!("\n=== Leaderboard ===");
    let scores = client
        .get_scores(&ScoreQuery::new(beatmap_id).mode(mode))
        .await?;
    for (rank, score) in scores.iter().take(5).enumerate() {
        println!(
            "#{} {} {} ({}x)",
            rank + 1,
            score.user_name,
            score.total_score,
            score.max_combo
        );
    }

    // Example 3: A full replay file, throttled to the API's quotas
    println!("\n=== Replay ===");
    let fetcher = Governed::new(
        client,
        Arc::new(RateGovernor::new()),
        ThrottlePolicy::default(),
    );
    let aggregator = ReplayAggregator::new(fetcher);
    let replay = aggregator
        .fetch_replay_file(beatmap_id, &user, mode, None)
        .await?;
    println!(
        "{} (score {}): {} bytes",
        replay.user_name,
        replay.score_id,
        replay.len()
    );

    Ok(())
}
