use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use bytes::Bytes;
use replaycrab::{
    BeatmapLookup, BeatmapRecord, Fetcher, GameMode, ReplayError, ScoreQuery, ScoreRecord,
};
use serde::de::DeserializeOwned;

use crate::error::{ClientError, Result};
use crate::protocol::{ApiBeatmap, ApiReplay, ApiResponse, ApiScore};

/// Public osu! API host
pub const DEFAULT_BASE_URL: &str = "https://osu.ppy.sh";

/// Makes the API read `u` as a name even when it is all digits
const USER_NAME_TYPE: &str = "string";

/// Builder for creating an OsuApiClient
pub struct ClientBuilder {
    api_key: Option<String>,
    base_url: String,
    request_timeout: Duration,
    user_agent: String,
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(5),
            user_agent: concat!("replaycrab/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientBuilder {
    /// Create a new client builder
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the API key sent with every request
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the API host (useful for mirrors and tests)
    pub fn base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Set request timeout
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Set the User-Agent header
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Build the client
    pub fn build(self) -> Result<OsuApiClient> {
        let api_key = self
            .api_key
            .filter(|key| !key.is_empty())
            .ok_or(ClientError::MissingApiKey)?;

        let http = reqwest::Client::builder()
            .timeout(self.request_timeout)
            .user_agent(self.user_agent)
            .build()?;

        Ok(OsuApiClient {
            http,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            api_key,
        })
    }
}

/// Client for the osu! API v1
///
/// Performs no throttling of its own; wrap it in [`replaycrab::Governed`]
/// to respect the API's quotas.
#[derive(Clone)]
pub struct OsuApiClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl OsuApiClient {
    /// Create a new client with default configuration
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        ClientBuilder::new().api_key(api_key).build()
    }

    /// Create a new client builder for advanced configuration
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Fetch the LZMA replay stream of a play, not a full replay file
    pub async fn get_replay(
        &self,
        beatmap_id: u64,
        user_name: &str,
        mode: GameMode,
    ) -> Result<Bytes> {
        let params = [
            ("m", mode.as_u8().to_string()),
            ("b", beatmap_id.to_string()),
            ("u", user_name.to_string()),
            ("type", USER_NAME_TYPE.to_string()),
        ];

        let replay: ApiReplay = self.get("get_replay", &params).await?;
        let data = STANDARD.decode(replay.content.trim())?;
        Ok(Bytes::from(data))
    }

    /// Fetch beatmap metadata by id or by .osu file checksum
    pub async fn get_beatmaps(&self, lookup: &BeatmapLookup) -> Result<Vec<BeatmapRecord>> {
        let params = match lookup {
            BeatmapLookup::Id(id) => [("b", id.to_string())],
            BeatmapLookup::Checksum(md5) => [("h", md5.clone())],
        };

        let beatmaps: Vec<ApiBeatmap> = self.get("get_beatmaps", &params).await?;
        beatmaps.into_iter().map(BeatmapRecord::try_from).collect()
    }

    /// Fetch scores on a beatmap, best first
    pub async fn get_scores(&self, query: &ScoreQuery) -> Result<Vec<ScoreRecord>> {
        let mut params = vec![("b", query.beatmap_id.to_string())];
        if let Some(user_name) = &query.user_name {
            params.push(("u", user_name.clone()));
            params.push(("type", USER_NAME_TYPE.to_string()));
        }
        if let Some(mode) = query.mode {
            params.push(("m", mode.as_u8().to_string()));
        }
        if let Some(mods) = query.mods {
            params.push(("mods", mods.to_string()));
        }

        let scores: Vec<ApiScore> = self.get("get_scores", &params).await?;
        scores
            .into_iter()
            .map(|score| score.into_record(query.beatmap_id))
            .collect()
    }

    async fn get<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, String)],
    ) -> Result<T> {
        let url = format!("{}/api/{}", self.base_url, endpoint);
        tracing::debug!(endpoint, "requesting");

        let response = self
            .http
            .get(&url)
            .query(&[("k", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;
        let status = response.status();
        let body = response.bytes().await?;

        // Error statuses still carry a JSON error object when the API itself answered
        let response: ApiResponse<T> = match serde_json::from_slice(&body) {
            Ok(response) => response,
            Err(_) if !status.is_success() => {
                tracing::warn!(endpoint, %status, "API unavailable");
                return Err(ClientError::Status(status));
            }
            Err(err) => return Err(err.into()),
        };
        response.into_result().inspect_err(|err| {
            tracing::warn!(endpoint, %err, "API returned an error");
        })
    }
}

#[async_trait]
impl Fetcher for OsuApiClient {
    async fn fetch_replay_blob(
        &self,
        beatmap_id: u64,
        user_name: &str,
        mode: GameMode,
    ) -> replaycrab::Result<Bytes> {
        Ok(self.get_replay(beatmap_id, user_name, mode).await?)
    }

    async fn fetch_beatmap(
        &self,
        lookup: &BeatmapLookup,
    ) -> replaycrab::Result<Option<BeatmapRecord>> {
        Ok(self.get_beatmaps(lookup).await?.into_iter().next())
    }

    async fn fetch_scores(&self, query: &ScoreQuery) -> replaycrab::Result<Vec<ScoreRecord>> {
        self.get_scores(query).await.map_err(ReplayError::from)
    }
}
