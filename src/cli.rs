use crate::garmin::{ConnectConfig, DEFAULT_CONNECT_URL, DEFAULT_SSO_URL};
use crate::types::FileFormat;
use chrono::NaiveDate;
use clap::Parser;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(author, version, about = "Download activities from Garmin Connect", long_about = None)]
pub struct Cli {
    /// Garmin Connect username (email)
    #[arg(short, long, env = "GARMIN_USERNAME")]
    pub username: String,

    /// Garmin Connect password (prompted for if not provided)
    #[arg(short, long, env = "GARMIN_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,

    /// Output directory for downloaded files
    #[arg(short, long, default_value = "./garmin_activities")]
    pub output: PathBuf,

    /// Start date for activities (YYYY-MM-DD)
    #[arg(short, long, value_parser = parse_date)]
    pub start_date: Option<NaiveDate>,

    /// End date for activities (YYYY-MM-DD)
    #[arg(short, long, value_parser = parse_date)]
    pub end_date: Option<NaiveDate>,

    /// File format to download
    #[arg(short, long, value_enum, default_value_t = FileFormat::Gpx)]
    pub format: FileFormat,

    /// Maximum number of activities to download
    #[arg(short, long)]
    pub limit: Option<NonZeroUsize>,

    /// Disable the progress bar
    #[arg(long)]
    pub no_progress: bool,

    /// Garmin SSO base URL
    #[arg(long, env = "GARMIN_SSO_URL", default_value = DEFAULT_SSO_URL, hide = true)]
    pub sso_url: String,

    /// Garmin Connect base URL
    #[arg(long, env = "GARMIN_CONNECT_URL", default_value = DEFAULT_CONNECT_URL, hide = true)]
    pub connect_url: String,

    /// HTTP request timeout in seconds
    #[arg(long, env = "GARMIN_TIMEOUT_SECS", default_value = "30", hide = true)]
    pub timeout_secs: u64,
}

impl Cli {
    pub fn connect_config(&self) -> ConnectConfig {
        ConnectConfig {
            timeout: Duration::from_secs(self.timeout_secs),
            ..ConnectConfig::with_urls(&self.sso_url, &self.connect_url)
        }
    }
}

pub fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| format!("Invalid date format: {value}. Use YYYY-MM-DD"))
}
