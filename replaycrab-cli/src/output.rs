//! Writing reconstructed replays to disk

use anyhow::{Context, Result};
use replaycrab::ReplayRecord;
use std::path::{Path, PathBuf};

/// File name for a replay: `<beatmap_id>_<user>_<score_id>.osr`
///
/// Characters that are not safe in file names are replaced with `_`.
pub fn replay_file_name(beatmap_id: u64, replay: &ReplayRecord) -> String {
    let user: String = replay
        .user_name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();

    format!("{beatmap_id}_{user}_{}.osr", replay.score_id)
}

/// Write a replay into `dir`, creating the directory if needed
pub async fn write_replay(dir: &Path, beatmap_id: u64, replay: &ReplayRecord) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("failed to create {}", dir.display()))?;

    let path = dir.join(replay_file_name(beatmap_id, replay));
    tokio::fs::write(&path, replay.as_bytes())
        .await
        .with_context(|| format!("failed to write {}", path.display()))?;

    tracing::debug!(path = %path.display(), bytes = replay.len(), "wrote replay");
    Ok(path)
}
