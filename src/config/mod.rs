//! Configuration management

use crate::cli::Cli;

/// Run configuration, built once from the command line and read-only afterwards
#[derive(Debug, Clone)]
pub struct Config {
    /// Login (email) to the CDN77 control panel
    pub login: String,

    /// API token, sent as `passwd`
    pub token: String,

    /// Hostname of the CDN resource to refresh
    pub site: String,

    /// Sitemap file path or http(s) URL
    pub sitemap: Option<String>,

    /// Purge existing content before prefetching
    pub purge_all: bool,

    /// Append API descriptions and URL lists to log lines
    pub verbose: bool,

    /// Base URL of the CDN77 API
    pub api_url: String,
}

impl From<Cli> for Config {
    fn from(cli: Cli) -> Self {
        Self {
            login: cli.login,
            token: cli.token,
            site: cli.site,
            sitemap: cli.sitemap,
            purge_all: cli.purge_all,
            verbose: cli.verbose,
            api_url: cli.api_url,
        }
    }
}
