use anyhow::Context;
use clap::Parser;
use colored::*;
use garmin_downloader::cli::Cli;
use garmin_downloader::garmin::GarminConnect;
use garmin_downloader::types::{DateRange, DownloadStatus, DownloadSummary};
use garmin_downloader::{Credentials, RunOutcome, RunRequest};
use log::{error, info};
use secrecy::SecretString;
use std::process::ExitCode;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    env_logger::init();
    info!("Starting Garmin Connect downloader");

    let cli = Cli::parse();
    info!(
        "CLI arguments parsed: format={}, limit={:?}, output={}",
        cli.format,
        cli.limit,
        cli.output.display()
    );

    let password = match cli.password.clone() {
        Some(password) => password,
        None => {
            let prompt = format!("Enter password for {}: ", cli.username);
            tokio::task::block_in_place(|| rpassword::prompt_password(prompt))
                .context("Failed to read password")?
        }
    };
    let credentials = Credentials {
        username: cli.username.clone(),
        password: SecretString::new(password.into()),
    };

    let request = RunRequest {
        output_dir: cli.output.clone(),
        format: cli.format,
        range: DateRange::ending_today(cli.start_date, cli.end_date),
        limit: cli.limit,
        show_progress: !cli.no_progress,
    };

    let connect = GarminConnect::new(cli.connect_config());
    let outcome = garmin_downloader::run(&connect, &credentials, &request)
        .await
        .with_context(|| format!("Failed to create output directory {}", cli.output.display()))?;

    // Setup failures were already reported by the run itself.
    if let RunOutcome::Completed(summary) = &outcome {
        print_summary(summary);
        if summary.errors > 0 {
            error!(
                "{} of {} activities failed to download",
                summary.errors, summary.total_activities
            );
        }
    }

    Ok(if outcome.is_success() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn print_summary(summary: &DownloadSummary) {
    let rule = "=".repeat(60);
    println!("\n{rule}");
    println!("{}", "Download Summary:".bold());
    println!("  Total activities: {}", summary.total_activities);
    println!(
        "  Successfully downloaded: {}",
        summary.downloaded.to_string().green()
    );
    println!("  Skipped (already exist): {}", summary.skipped);
    println!("  Errors: {}", summary.errors.to_string().red());
    if summary.warnings > 0 {
        println!(
            "  Saved as archive (no FIT entry): {}",
            summary.warnings.to_string().yellow()
        );
    }
    println!("  Output directory: {}", summary.output_dir.display());
    println!("  Duration: {:.2?}", summary.total_duration);
    println!("{rule}");

    let downloaded: Vec<_> = summary
        .reports
        .iter()
        .filter(|r| r.status == DownloadStatus::Downloaded)
        .collect();
    if !downloaded.is_empty() {
        println!("\n{}", "Successful Downloads:".green().bold());
        for report in downloaded {
            println!(
                "✓ {} ({:.1} KB in {:.2?})",
                report.file_name.green(),
                report.bytes_written as f64 / 1024.0,
                report.duration
            );
        }
    }

    if summary.errors > 0 {
        println!("\n{}", "Failed Downloads:".red().bold());
        for report in summary.failed() {
            println!(
                "✗ {} ({}) - Error: {}",
                report.file_name.red(),
                report.activity_id,
                report.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
}
