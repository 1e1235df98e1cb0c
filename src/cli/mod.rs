//! Command line interface

pub mod refresh;

use clap::Parser;

use crate::api::client::CDN77_API_BASE;

/// cdn77-refresh - purge and prefetch a CDN77 resource from a sitemap
#[derive(Parser, Debug)]
#[command(name = "cdn77-refresh")]
#[command(version)]
#[command(
    about = "Resolve a CDN77 resource, optionally purge it, and prefetch every URL of a sitemap",
    long_about = None
)]
pub struct Cli {
    /// Your login (email) to the CDN77 control panel
    #[arg(long, env = "CDN77_LOGIN")]
    pub login: String,

    /// Your API token, generated in the profile section on client.cdn77.com
    #[arg(long, env = "CDN77_TOKEN", hide_env_values = true)]
    pub token: String,

    /// Your website, aka 'CDN Resource' in CDN77
    #[arg(long)]
    pub site: String,

    /// sitemap.xml file OR URL beginning with http:// or https://
    #[arg(long)]
    pub sitemap: Option<String>,

    /// Remove (purge) existing HTTP content on CDN77 before prefetching
    #[arg(long)]
    pub purge_all: bool,

    /// Verbose output
    #[arg(long)]
    pub verbose: bool,

    /// CDN77 API base URL
    #[arg(long, env = "CDN77_API_URL", default_value = CDN77_API_BASE, hide = true)]
    pub api_url: String,
}
