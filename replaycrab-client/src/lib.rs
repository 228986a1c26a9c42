//! osu! API v1 client for replaycrab
//!
//! This crate provides [`OsuApiClient`], an async HTTP client for the
//! `get_replay`, `get_beatmaps` and `get_scores` endpoints. It implements
//! [`replaycrab::Fetcher`], so it plugs straight into
//! [`replaycrab::ReplayAggregator`].

pub mod client;
pub mod error;
pub mod protocol;

pub use client::{ClientBuilder, DEFAULT_BASE_URL, OsuApiClient};
pub use error::{ClientError, Result};
