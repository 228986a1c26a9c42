//! CLI configuration and argument parsing
//!
//! Every option can be given on the command line or through an environment
//! variable with the REPLAYCRAB_ prefix.
//!
//! # Configuration Priority
//!
//! 1. CLI arguments (highest priority)
//! 2. Environment variables
//! 3. Default values (lowest priority)
//!
//! # Example Usage
//!
//! ```bash
//! # Whole leaderboard of a mania map
//! export REPLAYCRAB_API_KEY=0123456789abcdef
//! replaycrab --beatmap-id 2323855 --mode mania --mods 0
//!
//! # A single player's replay
//! replaycrab --beatmap-id 2323855 --mode mania --user abraker --output-dir replays
//! ```

use anyhow::{Result, anyhow};
use clap::Parser;
use replaycrab::{DEFAULT_FORMAT_VERSION, GameMode, ThrottlePolicy};
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// osu! API access
    pub api: ApiConfig,
    /// Minimum intervals between API calls
    pub throttle: ThrottleConfig,
    /// What to download and where to put it
    pub job: JobConfig,
    /// Logging level (error, warn, info, debug, trace)
    pub log_level: String,
}

/// osu! API access configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub api_key: String,
    /// API host, e.g. "https://osu.ppy.sh"
    pub base_url: String,
    /// Per-request timeout (seconds)
    pub request_timeout: u64,
}

/// Throttle intervals in milliseconds
#[derive(Debug, Clone, Deserialize)]
pub struct ThrottleConfig {
    pub replay_interval_ms: u64,
    pub beatmaps_interval_ms: u64,
    pub scores_interval_ms: u64,
}

impl ThrottleConfig {
    pub fn policy(&self) -> ThrottlePolicy {
        ThrottlePolicy {
            replay: Duration::from_millis(self.replay_interval_ms),
            beatmaps: Duration::from_millis(self.beatmaps_interval_ms),
            scores: Duration::from_millis(self.scores_interval_ms),
        }
    }
}

/// Download job configuration
#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    pub beatmap_id: u64,
    pub mode: GameMode,
    /// Single player to fetch; the whole leaderboard when absent
    pub user: Option<String>,
    /// Mods bitmask filter
    pub mods: Option<u32>,
    pub output_dir: PathBuf,
    /// Version number written into each replay
    pub format_version: i32,
}

/// Command-line arguments
///
/// All arguments can also be set via environment variables with the
/// REPLAYCRAB_ prefix. CLI arguments take precedence over environment variables.
#[derive(Parser, Debug)]
#[command(
    name = "replaycrab",
    about = "Download osu! replays through the osu! API v1",
    long_about = "Rebuilds .osr replay files from osu! API v1 score data.\n\nWithout --user every replay on the beatmap's leaderboard is downloaded.\n\nEnvironment variables with REPLAYCRAB_ prefix are supported. CLI arguments take precedence over environment variables."
)]
pub struct Args {
    // Job
    #[arg(
        long,
        value_name = "ID",
        help = "Beatmap to download replays for",
        env = "REPLAYCRAB_BEATMAP_ID"
    )]
    pub beatmap_id: Option<u64>,
    #[arg(
        long,
        value_name = "MODE",
        help = "Game mode: osu, taiko, catch, mania",
        default_value = "osu",
        env = "REPLAYCRAB_MODE"
    )]
    pub mode: GameMode,
    #[arg(
        long,
        value_name = "NAME",
        help = "Only download this player's replay",
        env = "REPLAYCRAB_USER"
    )]
    pub user: Option<String>,
    #[arg(
        long,
        value_name = "BITMASK",
        help = "Only consider scores set with these mods",
        env = "REPLAYCRAB_MODS"
    )]
    pub mods: Option<u32>,
    #[arg(
        long,
        value_name = "DIR",
        help = "Directory the .osr files are written to",
        default_value = "replays",
        env = "REPLAYCRAB_OUTPUT_DIR"
    )]
    pub output_dir: PathBuf,
    #[arg(
        long,
        value_name = "N",
        help = "Version number written into each replay",
        default_value_t = DEFAULT_FORMAT_VERSION,
        env = "REPLAYCRAB_FORMAT_VERSION"
    )]
    pub format_version: i32,

    // API
    #[arg(
        long,
        value_name = "KEY",
        help = "osu! API v1 key",
        env = "REPLAYCRAB_API_KEY",
        hide_env_values = true
    )]
    pub api_key: Option<String>,
    #[arg(
        long,
        value_name = "URL",
        help = "osu! API host",
        default_value = replaycrab_client::DEFAULT_BASE_URL,
        env = "REPLAYCRAB_BASE_URL"
    )]
    pub base_url: String,
    #[arg(
        long,
        value_name = "SECS",
        help = "Per-request timeout (seconds)",
        default_value_t = 5,
        env = "REPLAYCRAB_REQUEST_TIMEOUT"
    )]
    pub request_timeout: u64,

    // Throttling
    #[arg(
        long,
        value_name = "MS",
        help = "Minimum interval between replay downloads (milliseconds)",
        default_value_t = 10_000,
        env = "REPLAYCRAB_REPLAY_INTERVAL_MS"
    )]
    pub replay_interval_ms: u64,
    #[arg(
        long,
        value_name = "MS",
        help = "Minimum interval between beatmap lookups (milliseconds)",
        default_value_t = 100,
        env = "REPLAYCRAB_BEATMAPS_INTERVAL_MS"
    )]
    pub beatmaps_interval_ms: u64,
    #[arg(
        long,
        value_name = "MS",
        help = "Minimum interval between score lookups (milliseconds)",
        default_value_t = 100,
        env = "REPLAYCRAB_SCORES_INTERVAL_MS"
    )]
    pub scores_interval_ms: u64,

    // General options
    #[arg(
        long,
        value_name = "LEVEL",
        help = "Log level: error, warn, info, debug, trace",
        default_value = "info",
        env = "REPLAYCRAB_LOG_LEVEL"
    )]
    pub log_level: String,

    // Utility options
    #[arg(
        long,
        help = "List all environment variables and exit",
        action = clap::ArgAction::SetTrue
    )]
    pub list_env_vars: bool,
}

impl Config {
    /// Build configuration from environment variables and CLI arguments
    ///
    /// # Errors
    ///
    /// Returns an error if the API key or beatmap id is missing, or if a
    /// value is out of range.
    pub fn from_env_and_args() -> Result<Self> {
        let args = Args::parse();

        if args.list_env_vars {
            Self::print_env_vars();
            std::process::exit(0);
        }

        Self::from_args(args)
    }

    fn from_args(args: Args) -> Result<Self> {
        let config = Config {
            api: ApiConfig {
                api_key: args.api_key.unwrap_or_default(),
                base_url: args.base_url,
                request_timeout: args.request_timeout,
            },
            throttle: ThrottleConfig {
                replay_interval_ms: args.replay_interval_ms,
                beatmaps_interval_ms: args.beatmaps_interval_ms,
                scores_interval_ms: args.scores_interval_ms,
            },
            job: JobConfig {
                beatmap_id: args.beatmap_id.unwrap_or_default(),
                mode: args.mode,
                user: args.user.filter(|user| !user.is_empty()),
                mods: args.mods,
                output_dir: args.output_dir,
                format_version: args.format_version,
            },
            log_level: args.log_level,
        };

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration
    fn validate(&self) -> Result<()> {
        if self.api.api_key.is_empty() {
            return Err(anyhow!(
                "An osu! API key is required.\n\n\
                Provide it with --api-key or the REPLAYCRAB_API_KEY environment variable.\n\
                Keys can be requested at https://osu.ppy.sh/p/api"
            ));
        }

        if self.job.beatmap_id == 0 {
            return Err(anyhow!(
                "A beatmap id is required.\n\n\
                Example:\n  \
                replaycrab --beatmap-id 2323855 --mode mania\n\n\
                For more information, try '--help'"
            ));
        }

        if self.api.request_timeout == 0 {
            return Err(anyhow!("--request-timeout must be at least 1 second"));
        }

        Ok(())
    }

    /// Print all available environment variables and their descriptions
    fn print_env_vars() {
        println!("ReplayCrab Environment Variables");
        println!("================================");
        println!();
        println!("All environment variables use the REPLAYCRAB_ prefix.");
        println!("CLI arguments take precedence over environment variables.");
        println!();

        println!("Job Configuration:");
        println!("  REPLAYCRAB_BEATMAP_ID=<id>            Beatmap to download replays for");
        println!(
            "  REPLAYCRAB_MODE=<mode>                Game mode: osu, taiko, catch, mania [default: osu]"
        );
        println!("  REPLAYCRAB_USER=<name>                Only download this player's replay");
        println!("  REPLAYCRAB_MODS=<bitmask>             Only consider scores with these mods");
        println!("  REPLAYCRAB_OUTPUT_DIR=<dir>           Output directory [default: replays]");
        println!("  REPLAYCRAB_FORMAT_VERSION=<n>         Replay version number [default: 0]");
        println!();

        println!("API Configuration:");
        println!("  REPLAYCRAB_API_KEY=<key>              osu! API v1 key (required)");
        println!(
            "  REPLAYCRAB_BASE_URL=<url>             API host [default: https://osu.ppy.sh]"
        );
        println!("  REPLAYCRAB_REQUEST_TIMEOUT=<secs>     Request timeout [default: 5]");
        println!();

        println!("Throttle Configuration:");
        println!(
            "  REPLAYCRAB_REPLAY_INTERVAL_MS=<ms>    Interval between replay downloads [default: 10000]"
        );
        println!(
            "  REPLAYCRAB_BEATMAPS_INTERVAL_MS=<ms>  Interval between beatmap lookups [default: 100]"
        );
        println!(
            "  REPLAYCRAB_SCORES_INTERVAL_MS=<ms>    Interval between score lookups [default: 100]"
        );
        println!();

        println!("General Configuration:");
        println!(
            "  REPLAYCRAB_LOG_LEVEL=<level>          Log level: error, warn, info, debug, trace [default: info]"
        );
    }
}
