//! cdn77-refresh - purge and prefetch a CDN77 resource from a sitemap
//!
//! Resolves the CDN resource of a site, optionally purges it, then queues
//! every URL of a sitemap for prefetch.

mod api;
mod cli;
mod config;
mod error;
mod output;
mod sitemap;

use std::process::ExitCode;

use clap::Parser;
use tracing::{debug, error, info};

use crate::cli::Cli;
use crate::config::Config;
use crate::output::Reporter;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    // Load .env file
    dotenvy::dotenv().ok();

    // Logging lives as long as this guard
    let _logging = output::init_logging();

    // Parse CLI arguments; a missing flag exits here, before any request
    let config = Config::from(Cli::parse());
    let report = Reporter::new(config.verbose);

    match cli::refresh::execute(&config, &report).await {
        Ok(summary) => {
            debug!(
                cdn_id = %summary.cdn_id,
                purged = summary.purged,
                prefetched = summary.prefetched,
                "run finished"
            );
            info!("End.");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("{}", err);
            ExitCode::from(err.exit_code())
        }
    }
}
