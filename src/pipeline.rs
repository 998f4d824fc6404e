//! One batch run: log in, list, download, summarise.

use crate::client::Authenticator;
use crate::downloader::{prepare_output_dir, Downloader};
use crate::error::DownloaderError;
use crate::lister::list_activities;
use crate::types::{DateRange, DownloadSummary, FileFormat};
use colored::*;
use log::{error, info};
use secrecy::SecretString;
use std::num::NonZeroUsize;
use std::path::PathBuf;

pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

#[derive(Debug, Clone)]
pub struct RunRequest {
    pub output_dir: PathBuf,
    pub format: FileFormat,
    pub range: DateRange,
    pub limit: Option<NonZeroUsize>,
    pub show_progress: bool,
}

/// Where a run stopped. Setup failures are values here rather than errors:
/// they end the run cleanly with nothing downloaded.
#[derive(Debug)]
pub enum RunOutcome {
    LoginFailed(DownloaderError),
    ListingFailed(DownloaderError),
    NoActivities,
    Completed(DownloadSummary),
}

impl RunOutcome {
    pub fn is_success(&self) -> bool {
        match self {
            RunOutcome::LoginFailed(_) | RunOutcome::ListingFailed(_) => false,
            RunOutcome::NoActivities => true,
            RunOutcome::Completed(summary) => summary.errors == 0,
        }
    }
}

/// Only output directory creation can fail with an error; every later
/// failure is reported through [`RunOutcome`].
pub async fn run<A: Authenticator>(
    authenticator: &A,
    credentials: &Credentials,
    request: &RunRequest,
) -> Result<RunOutcome, DownloaderError> {
    let output_dir = prepare_output_dir(&request.output_dir).await?;

    println!("Logging into Garmin Connect as {}...", credentials.username);
    let session = match authenticator
        .login(&credentials.username, &credentials.password)
        .await
    {
        Ok(session) => {
            println!("{}\n", "Login successful!".green());
            session
        }
        Err(e) if e.is_auth() => {
            error!("Login rejected for {}: {}", credentials.username, e);
            println!("{}", e.to_string().red());
            println!("Please check your username and password.");
            return Ok(RunOutcome::LoginFailed(e));
        }
        Err(e) => {
            error!("Login error: {}", e);
            println!("{} {}", "Login error:".red(), e);
            return Ok(RunOutcome::LoginFailed(e));
        }
    };

    let range = request.range;
    println!("Fetching activities from {} to {}...", range.start, range.end);
    let listing = match list_activities(&session, range, request.limit).await {
        Ok(listing) => listing,
        Err(e) => {
            error!("Activity listing failed: {}", e);
            println!("{} {}", "Error fetching activities:".red(), e);
            return Ok(RunOutcome::ListingFailed(e));
        }
    };

    if listing.found == 0 {
        println!("No activities found in the specified date range.");
        return Ok(RunOutcome::NoActivities);
    }
    println!("Found {} activities to download.\n", listing.found);
    if listing.was_limited() {
        println!("Limiting download to {} activities.\n", listing.activities.len());
    }

    info!("Downloading {} activities as {}", listing.activities.len(), request.format);
    let downloader =
        Downloader::new(request.format, output_dir).with_progress(request.show_progress);
    let summary = downloader.download_all(&session, listing.activities).await;
    Ok(RunOutcome::Completed(summary))
}
