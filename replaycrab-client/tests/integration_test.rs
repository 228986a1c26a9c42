use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{Html, Json};
use axum::{Router, routing::get};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use replaycrab::{
    BeatmapLookup, Fetcher, GET_BEATMAPS, GET_REPLAY, GET_SCORES, GameMode, Governed,
    RateGovernor, ReplayAggregator, ReplayError, ScoreQuery, ThrottlePolicy,
};
use replaycrab_client::{ClientError, OsuApiClient};
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_test::assert_err;

const API_KEY: &str = "test-key";
const MAP: u64 = 2323855;
const CHECKSUM: &str = "a5b99395a42bd55bc5eb1d2411cbdf8b";

type Params = HashMap<String, String>;

#[derive(Default)]
struct MockApi {
    requests: Mutex<Vec<(String, Params)>>,
}

impl MockApi {
    fn record(&self, endpoint: &str, params: &Params) -> Option<Value> {
        self.requests
            .lock()
            .unwrap()
            .push((endpoint.to_string(), params.clone()));

        if params.get("k").map(String::as_str) != Some(API_KEY) {
            return Some(json!({ "error": "Please provide a valid API key." }));
        }
        None
    }

    fn requests(&self, endpoint: &str) -> Vec<Params> {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|(e, _)| e == endpoint)
            .map(|(_, p)| p.clone())
            .collect()
    }
}

fn replay_stream(user: &str) -> Vec<u8> {
    let mut data = vec![0x5d, 0x00, 0x00, 0x20, 0x00];
    data.extend_from_slice(user.as_bytes());
    data
}

fn score_json(score_id: u64, user: &str, score: u64) -> Value {
    json!({
        "score_id": score_id.to_string(),
        "score": score.to_string(),
        "username": user,
        "count300": "812",
        "count100": "45",
        "count50": "3",
        "countmiss": "2",
        "maxcombo": "1234",
        "countkatu": "30",
        "countgeki": "120",
        "perfect": "0",
        "enabled_mods": "0",
        "user_id": "1234567",
        "date": "2020-03-14 15:09:26",
        "rank": "S",
        "pp": "301.5",
        "replay_available": "1"
    })
}

async fn get_replay(State(api): State<Arc<MockApi>>, Query(params): Query<Params>) -> Json<Value> {
    if let Some(error) = api.record("get_replay", &params) {
        return Json(error);
    }

    let user = params.get("u").cloned().unwrap_or_default();
    if params.get("b").map(String::as_str) == Some("2323855") && user != "nobody" {
        Json(json!({
            "content": STANDARD.encode(replay_stream(&user)),
            "encoding": "base64"
        }))
    } else {
        Json(json!({ "error": "Replay not available." }))
    }
}

async fn get_beatmaps(
    State(api): State<Arc<MockApi>>,
    Query(params): Query<Params>,
) -> Json<Value> {
    if let Some(error) = api.record("get_beatmaps", &params) {
        return Json(error);
    }

    let by_id = params.get("b").map(String::as_str) == Some("2323855");
    let by_hash = params.get("h").map(String::as_str) == Some(CHECKSUM);
    if by_id || by_hash {
        Json(json!([{
            "beatmapset_id": "1116124",
            "beatmap_id": "2323855",
            "approved": "1",
            "version": "Insane",
            "file_md5": CHECKSUM,
            "mode": "3",
            "artist": "Camellia",
            "title": "Exit This Earth's Atomosphere"
        }]))
    } else {
        Json(json!([]))
    }
}

async fn get_scores(State(api): State<Arc<MockApi>>, Query(params): Query<Params>) -> Json<Value> {
    if let Some(error) = api.record("get_scores", &params) {
        return Json(error);
    }

    if params.get("b").map(String::as_str) != Some("2323855") {
        return Json(json!([]));
    }

    let board = vec![
        score_json(11, "alpha", 990_000),
        score_json(12, "bravo", 950_000),
        score_json(13, "charlie", 900_000),
    ];
    let filtered: Vec<Value> = match params.get("u") {
        Some(user) => board
            .into_iter()
            .filter(|s| s["username"] == user.as_str())
            .collect(),
        None => board,
    };
    Json(Value::Array(filtered))
}

async fn start_mock_api() -> (String, Arc<MockApi>) {
    let api = Arc::new(MockApi::default());
    let app = Router::new()
        .route("/api/get_replay", get(get_replay))
        .route("/api/get_beatmaps", get(get_beatmaps))
        .route("/api/get_scores", get(get_scores))
        .with_state(Arc::clone(&api));

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (format!("http://{addr}"), api)
}

fn client(base_url: &str) -> OsuApiClient {
    OsuApiClient::builder()
        .api_key(API_KEY)
        .base_url(base_url)
        .request_timeout(Duration::from_secs(2))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_get_beatmaps() {
    let (base_url, _api) = start_mock_api().await;
    let client = client(&base_url);

    let by_id = client.get_beatmaps(&BeatmapLookup::Id(MAP)).await.unwrap();
    assert_eq!(by_id.len(), 1);
    assert_eq!(by_id[0].checksum, CHECKSUM);
    assert_eq!(by_id[0].mode, GameMode::Mania);

    let by_hash = client
        .get_beatmaps(&BeatmapLookup::Checksum(CHECKSUM.to_string()))
        .await
        .unwrap();
    assert_eq!(by_hash, by_id);

    // Unknown beatmaps come back as an empty list
    let missing = client.fetch_beatmap(&BeatmapLookup::Id(0)).await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_get_replay() {
    let (base_url, _api) = start_mock_api().await;
    let client = client(&base_url);

    let replay = client
        .get_replay(MAP, "alpha", GameMode::Mania)
        .await
        .unwrap();
    assert_eq!(replay.as_ref(), replay_stream("alpha").as_slice());
}

#[tokio::test]
async fn test_replay_unavailable() {
    let (base_url, _api) = start_mock_api().await;
    let client = client(&base_url);

    let err = assert_err!(client.get_replay(767046, "abraker", GameMode::Mania).await);
    assert!(matches!(err, ClientError::Api(ref msg) if msg == "Replay not available."));

    let err = assert_err!(
        client
            .fetch_replay_blob(767046, "abraker", GameMode::Mania)
            .await
    );
    assert!(matches!(err, ReplayError::RemoteRejection(_)));
}

#[tokio::test]
async fn test_invalid_api_key() {
    let (base_url, _api) = start_mock_api().await;
    let client = OsuApiClient::builder()
        .api_key("wrong")
        .base_url(&base_url)
        .build()
        .unwrap();

    let err = assert_err!(client.get_scores(&ScoreQuery::new(MAP)).await);
    assert!(matches!(err, ClientError::Api(_)));
}

#[tokio::test]
async fn test_missing_api_key() {
    assert!(matches!(
        OsuApiClient::builder().build(),
        Err(ClientError::MissingApiKey)
    ));
    assert!(matches!(
        OsuApiClient::new(""),
        Err(ClientError::MissingApiKey)
    ));
}

#[tokio::test]
async fn test_score_query_parameters() {
    let (base_url, api) = start_mock_api().await;
    let client = client(&base_url);

    let query = ScoreQuery::new(MAP)
        .user("bravo")
        .mode(GameMode::Mania)
        .mods(Some(64));
    let scores = client.get_scores(&query).await.unwrap();
    assert_eq!(scores.len(), 1);
    assert_eq!(scores[0].user_name, "bravo");
    assert_eq!(scores[0].beatmap_id, MAP);

    let requests = api.requests("get_scores");
    let params = &requests[0];
    assert_eq!(params["k"], API_KEY);
    assert_eq!(params["b"], "2323855");
    assert_eq!(params["u"], "bravo");
    assert_eq!(params["m"], "3");
    assert_eq!(params["mods"], "64");
    assert_eq!(params["type"], "string");

    // Optional filters are left out entirely
    client.get_scores(&ScoreQuery::new(MAP)).await.unwrap();
    let requests = api.requests("get_scores");
    assert!(!requests[1].contains_key("u"));
    assert!(!requests[1].contains_key("m"));
    assert!(!requests[1].contains_key("mods"));
    assert!(!requests[1].contains_key("type"));
}

#[tokio::test]
async fn test_numeric_user_name_is_sent_as_name() {
    let (base_url, api) = start_mock_api().await;
    let client = client(&base_url);

    client
        .get_replay(MAP, "1234", GameMode::Mania)
        .await
        .unwrap();
    client
        .get_scores(&ScoreQuery::new(MAP).user("1234"))
        .await
        .unwrap();

    for endpoint in ["get_replay", "get_scores"] {
        let params = &api.requests(endpoint)[0];
        assert_eq!(params["u"], "1234");
        assert_eq!(params["type"], "string", "{endpoint}");
    }
}

#[tokio::test]
async fn test_unreachable_host() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client(&format!("http://{addr}"));
    let err = assert_err!(client.fetch_scores(&ScoreQuery::new(MAP)).await);
    assert!(matches!(err, ReplayError::RemoteUnavailable(_)));
}

#[tokio::test]
async fn test_gateway_error_is_unavailable() {
    let app = Router::new().fallback(|| async {
        (
            StatusCode::BAD_GATEWAY,
            Html("<html><body>502 Bad Gateway</body></html>"),
        )
    });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = client(&format!("http://{addr}"));
    let err = assert_err!(client.get_scores(&ScoreQuery::new(MAP)).await);
    assert!(matches!(err, ClientError::Status(status) if status == StatusCode::BAD_GATEWAY));

    let err = assert_err!(client.fetch_beatmap(&BeatmapLookup::Id(MAP)).await);
    assert!(matches!(err, ReplayError::RemoteUnavailable(_)));
}

#[tokio::test]
async fn test_malformed_success_payload_is_rejection() {
    let app = Router::new().fallback(|| async { Html("not json") });
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let client = client(&format!("http://{addr}"));
    let err = assert_err!(client.fetch_scores(&ScoreQuery::new(MAP)).await);
    assert!(matches!(err, ReplayError::RemoteRejection(_)));
}

#[tokio::test]
async fn test_collect_replays_end_to_end() {
    let (base_url, api) = start_mock_api().await;
    let policy = ThrottlePolicy {
        replay: Duration::from_millis(50),
        beatmaps: Duration::from_millis(5),
        scores: Duration::from_millis(5),
    };
    let governor = Arc::new(RateGovernor::new());
    let fetcher = Governed::new(client(&base_url), Arc::clone(&governor), policy);
    let aggregator = ReplayAggregator::new(fetcher);

    let mut progress = Vec::new();
    let replays = aggregator
        .collect_replays(MAP, GameMode::Mania, Some(0), |index, total, user| {
            progress.push(format!("({index}/{total}) {user}"));
        })
        .await
        .unwrap();

    assert_eq!(progress, vec!["(0/3) alpha", "(1/3) bravo", "(2/3) charlie"]);
    assert_eq!(replays.len(), 3);

    for (replay, (user, score_id)) in replays
        .iter()
        .zip([("alpha", 11i64), ("bravo", 12), ("charlie", 13)])
    {
        let bytes = replay.as_bytes();
        let tail = bytes.len() - 8;
        assert_eq!(i64::from_le_bytes(bytes[tail..].try_into().unwrap()), score_id);

        let stream = replay_stream(user);
        assert_eq!(&bytes[tail - stream.len()..tail], stream.as_slice());
        assert_eq!(replay.user_name, user);
    }

    assert_eq!(api.requests("get_replay").len(), 3);
    assert_eq!(api.requests("get_beatmaps").len(), 3);
    // One leaderboard request plus one per entry
    assert_eq!(api.requests("get_scores").len(), 4);

    assert_eq!(
        governor.operations(),
        vec![GET_BEATMAPS, GET_REPLAY, GET_SCORES]
    );
}

#[tokio::test]
async fn test_collect_replays_unknown_map() {
    let (base_url, api) = start_mock_api().await;
    let aggregator = ReplayAggregator::new(client(&base_url));

    let replays = aggregator
        .collect_replays(0, GameMode::Mania, Some(0), |_, _, _| {})
        .await
        .unwrap();

    assert!(replays.is_empty());
    assert!(api.requests("get_replay").is_empty());
    assert!(api.requests("get_beatmaps").is_empty());
}
