//! Error types and process exit codes

use thiserror::Error;

use crate::sitemap::SitemapError;

/// Reserved process exit codes, one per failure point
pub mod exit_code {
    pub const LIST_TRANSPORT: u8 = 0xe1;
    pub const LIST_BODY: u8 = 0xe2;
    pub const LIST_DECODE: u8 = 0xe3;
    pub const LIST_STATUS: u8 = 0xf0;

    pub const RESOURCE_NOT_FOUND: u8 = 0xa0;

    pub const PURGE_TRANSPORT: u8 = 0xb0;
    pub const PURGE_DECODE: u8 = 0xb1;
    pub const PURGE_STATUS: u8 = 0xb2;

    pub const SITEMAP_OPEN: u8 = 0xc0;
    pub const SITEMAP_READ: u8 = 0xc1;
    pub const SITEMAP_PARSE: u8 = 0xc2;

    pub const PREFETCH_TRANSPORT: u8 = 0xd0;
    pub const PREFETCH_DECODE: u8 = 0xd1;
    pub const PREFETCH_STATUS: u8 = 0xd2;

    /// Stage/failure combinations that cannot happen in a run
    pub const UNEXPECTED: u8 = 0x01;
}

/// Everything that can go wrong while talking to CDN77 or reading a sitemap
#[derive(Debug, Error)]
pub enum Error {
    /// Request could not be sent or the server refused it
    #[error("{0}")]
    Transport(#[source] reqwest::Error),

    /// Response arrived but its body could not be read
    #[error("{0}")]
    Body(#[source] reqwest::Error),

    #[error("{0}")]
    Open(#[source] std::io::Error),

    #[error("{0}")]
    Read(#[source] std::io::Error),

    #[error("{0}")]
    Decode(#[from] serde_json::Error),

    #[error("{0}")]
    Sitemap(#[from] SitemapError),

    /// CDN77 answered with a status other than "ok"
    #[error("{status}: {description}")]
    ApiStatus { status: String, description: String },

    #[error("not found")]
    NotFound,

    #[error("no sitemap given (use --sitemap)")]
    NoSitemap,
}

/// Pipeline step a failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    ResourceList,
    Resolve,
    PurgeAll,
    Sitemap,
    Prefetch,
}

/// A failure tagged with the step it happened in and the log text of that step
#[derive(Debug, Error)]
#[error("{head}{error}, aborting")]
pub struct StageError {
    pub stage: Stage,
    pub head: String,
    #[source]
    pub error: Error,
}

impl StageError {
    pub fn new(stage: Stage, head: impl Into<String>, error: Error) -> Self {
        Self {
            stage,
            head: head.into(),
            error,
        }
    }

    /// Exit code reserved for this stage and failure kind
    pub fn exit_code(&self) -> u8 {
        use exit_code::*;

        match (self.stage, &self.error) {
            (Stage::ResourceList, Error::Transport(_)) => LIST_TRANSPORT,
            (Stage::ResourceList, Error::Body(_)) => LIST_BODY,
            (Stage::ResourceList, Error::Decode(_)) => LIST_DECODE,
            (Stage::ResourceList, Error::ApiStatus { .. }) => LIST_STATUS,

            (Stage::Resolve, Error::NotFound) => RESOURCE_NOT_FOUND,

            (Stage::PurgeAll, Error::Transport(_)) => PURGE_TRANSPORT,
            (Stage::PurgeAll, Error::Body(_) | Error::Decode(_)) => PURGE_DECODE,
            (Stage::PurgeAll, Error::ApiStatus { .. }) => PURGE_STATUS,

            (Stage::Sitemap, Error::Transport(_) | Error::Open(_) | Error::NoSitemap) => {
                SITEMAP_OPEN
            }
            (Stage::Sitemap, Error::Body(_) | Error::Read(_)) => SITEMAP_READ,
            (Stage::Sitemap, Error::Sitemap(_)) => SITEMAP_PARSE,

            (Stage::Prefetch, Error::Transport(_)) => PREFETCH_TRANSPORT,
            (Stage::Prefetch, Error::Body(_) | Error::Decode(_)) => PREFETCH_DECODE,
            (Stage::Prefetch, Error::ApiStatus { .. }) => PREFETCH_STATUS,

            _ => UNEXPECTED,
        }
    }
}
