//! Bulk download of Garmin Connect activities into a local directory.

pub mod cli;
pub mod client;
pub mod downloader;
pub mod error;
pub mod garmin;
pub mod lister;
pub mod naming;
pub mod pipeline;
pub mod resolver;
pub mod types;

#[cfg(test)]
mod test_utils;

pub use client::{ActivitySession, Authenticator};
pub use error::DownloaderError;
pub use pipeline::{run, Credentials, RunOutcome, RunRequest};
