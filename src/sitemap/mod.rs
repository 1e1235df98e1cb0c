//! Sitemap loading and `urlset/url/loc` extraction

use std::path::{Path, PathBuf};

use quick_xml::events::Event;
use quick_xml::Reader;
use reqwest::Client;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::error::Error;

/// Why a document is not a usable sitemap
#[derive(Debug, Error)]
pub enum SitemapError {
    #[error("{0}")]
    Xml(#[from] quick_xml::Error),

    #[error("expected element type <urlset> but have <{0}>")]
    UnexpectedRoot(String),

    #[error("no <urlset> element found")]
    MissingRoot,

    #[error("unexpected end of document inside <{0}>")]
    Unclosed(String),
}

/// Where the sitemap comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SitemapSource {
    Remote(String),
    File(PathBuf),
}

impl SitemapSource {
    /// Classify a `--sitemap` value: http(s) URLs are fetched, anything else is a path
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        let lower = trimmed.to_lowercase();

        if lower.starts_with("http://") || lower.starts_with("https://") {
            Self::Remote(trimmed.to_string())
        } else {
            Self::File(PathBuf::from(raw))
        }
    }
}

/// Load a sitemap and return its locations in document order
pub async fn load_urls(http: &Client, source: &SitemapSource) -> Result<Vec<String>, Error> {
    let content = match source {
        SitemapSource::Remote(url) => fetch(http, url).await?,
        SitemapSource::File(path) => read_file(path).await?,
    };

    Ok(parse_urlset(&content)?)
}

async fn fetch(http: &Client, url: &str) -> Result<Vec<u8>, Error> {
    debug!("GET {}", url);

    let response = http.get(url).send().await.map_err(Error::Transport)?;

    // The status is not checked: an error page is parsed and fails as XML.
    let status = response.status();
    if !status.is_success() {
        debug!("GET {} answered {}", url, status);
    }

    let body = response.bytes().await.map_err(Error::Body)?;
    Ok(body.to_vec())
}

async fn read_file(path: &Path) -> Result<Vec<u8>, Error> {
    debug!("Reading {:?}", path);

    let mut file = File::open(path).await.map_err(Error::Open)?;
    let mut content = Vec::new();
    file.read_to_end(&mut content).await.map_err(Error::Read)?;

    Ok(content)
}

/// Extract the `loc` of every `url` directly under a `urlset` root.
///
/// A `url` without `loc` contributes an empty string. Element names are
/// matched by local name, so namespaced sitemaps work. Reading stops at the
/// end of the root element.
pub fn parse_urlset(xml: &[u8]) -> Result<Vec<String>, SitemapError> {
    let mut reader = Reader::from_reader(xml);
    let mut buf = Vec::new();

    let mut path: Vec<Vec<u8>> = Vec::new();
    let mut seen_root = false;
    let mut urls = Vec::new();
    // loc of the url being read, and the text of the loc being read
    let mut current: Option<String> = None;
    let mut text: Option<String> = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) => {
                let name = e.local_name().as_ref().to_vec();
                if path.is_empty() {
                    check_root(&name, &mut seen_root)?;
                }
                match path.len() {
                    1 if name == b"url" => current = Some(String::new()),
                    2 if name == b"loc" && current.is_some() => text = Some(String::new()),
                    _ => {}
                }
                path.push(name);
            }
            Event::Empty(e) => {
                let name = e.local_name().as_ref().to_vec();
                if path.is_empty() {
                    check_root(&name, &mut seen_root)?;
                    break;
                } else if path.len() == 1 && name == b"url" {
                    urls.push(String::new());
                } else if path.len() == 2 && name == b"loc" {
                    if let Some(loc) = current.as_mut() {
                        loc.clear();
                    }
                }
            }
            Event::Text(t) => {
                if let Some(buffer) = text.as_mut() {
                    buffer.push_str(&t.unescape()?);
                }
            }
            Event::CData(c) => {
                if let Some(buffer) = text.as_mut() {
                    buffer.push_str(&String::from_utf8_lossy(&c));
                }
            }
            Event::End(_) => {
                path.pop();
                match path.len() {
                    // Anything after the root element is not read
                    0 => break,
                    2 => {
                        if let (Some(done), Some(loc)) = (text.take(), current.as_mut()) {
                            *loc = done.trim().to_string();
                        }
                    }
                    1 => {
                        if let Some(loc) = current.take() {
                            urls.push(loc);
                        }
                    }
                    _ => {}
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    if let Some(open) = path.last() {
        return Err(SitemapError::Unclosed(
            String::from_utf8_lossy(open).into_owned(),
        ));
    }
    if !seen_root {
        return Err(SitemapError::MissingRoot);
    }

    Ok(urls)
}

fn check_root(name: &[u8], seen_root: &mut bool) -> Result<(), SitemapError> {
    if name != b"urlset" {
        return Err(SitemapError::UnexpectedRoot(
            String::from_utf8_lossy(name).into_owned(),
        ));
    }
    *seen_root = true;
    Ok(())
}
