mod config;
mod output;

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use replaycrab::{Governed, RateGovernor, ReplayAggregator};
use replaycrab_client::OsuApiClient;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse configuration from environment variables and CLI arguments
    let config = Config::from_env_and_args()?;

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(format!("replaycrab={}", config.log_level).parse()?)
                .add_directive(format!("replaycrab_client={}", config.log_level).parse()?),
        )
        .init();

    let client = OsuApiClient::builder()
        .api_key(&config.api.api_key)
        .base_url(&config.api.base_url)
        .request_timeout(Duration::from_secs(config.api.request_timeout))
        .build()?;

    let governor = Arc::new(RateGovernor::new());
    let fetcher = Governed::new(client, governor, config.throttle.policy());
    let aggregator =
        ReplayAggregator::new(fetcher).with_format_version(config.job.format_version);

    let job = &config.job;
    tracing::info!(
        beatmap_id = job.beatmap_id,
        mode = %job.mode,
        output_dir = %job.output_dir.display(),
        "ReplayCrab started"
    );

    let replays = match &job.user {
        Some(user) => vec![
            aggregator
                .fetch_replay_file(job.beatmap_id, user, job.mode, job.mods)
                .await?,
        ],
        None => {
            aggregator
                .collect_replays(job.beatmap_id, job.mode, job.mods, |index, total, user| {
                    println!("({}/{}) {}", index + 1, total, user);
                })
                .await?
        }
    };

    if replays.is_empty() {
        tracing::warn!(beatmap_id = job.beatmap_id, "no scores found");
        return Ok(());
    }

    for replay in &replays {
        let path = output::write_replay(&job.output_dir, job.beatmap_id, replay).await?;
        println!("{}", path.display());
    }

    tracing::info!(count = replays.len(), "done");
    Ok(())
}
