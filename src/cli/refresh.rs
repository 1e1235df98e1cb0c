//! Refresh run: resolve, purge, load sitemap, prefetch

use reqwest::Client;

use crate::api::response::CdnResource;
use crate::api::{Cdn77Client, CdnApi};
use crate::config::Config;
use crate::error::{Error, Stage, StageError};
use crate::output::Reporter;
use crate::sitemap::{self, SitemapSource};

const LIST_HEAD: &str = "Reading resource list from CDN77 ... ";
const PURGE_HEAD: &str = "Starting 'purge-all' ... ";

/// What a successful run did
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Summary {
    pub cdn_id: String,
    pub purged: bool,
    pub prefetched: usize,
}

pub async fn execute(config: &Config, report: &Reporter) -> Result<Summary, StageError> {
    let client = Cdn77Client::new(config)
        .map_err(|e| StageError::new(Stage::ResourceList, LIST_HEAD, Error::Transport(e)))?;

    run(&client, client.http(), config, report).await
}

/// Drive one run against any CDN77 API implementation.
///
/// Stops at the first failure; earlier steps (a purge) stay applied.
pub async fn run<A: CdnApi>(
    api: &A,
    http: &Client,
    config: &Config,
    report: &Reporter,
) -> Result<Summary, StageError> {
    let resources = api
        .list_resources()
        .await
        .map_err(|e| StageError::new(Stage::ResourceList, LIST_HEAD, e))?;
    report.ok(LIST_HEAD);

    let head = format!("Searching for {} ... ", config.site);
    let cdn_id = resolve_id(&config.site, &resources)
        .ok_or_else(|| StageError::new(Stage::Resolve, head.as_str(), Error::NotFound))?;
    report.ok_with(&head, &format!("resource id #{}", cdn_id));

    if config.purge_all {
        let envelope = api
            .purge_all(&cdn_id)
            .await
            .map_err(|e| StageError::new(Stage::PurgeAll, PURGE_HEAD, e))?;
        report.ok_described(PURGE_HEAD, &envelope.description);
    }

    let head = format!(
        "Reading '{}' ... ",
        config.sitemap.as_deref().unwrap_or_default()
    );
    let urls = match config.sitemap.as_deref() {
        Some(raw) => sitemap::load_urls(http, &SitemapSource::parse(raw)).await,
        None => Err(Error::NoSitemap),
    }
    .map_err(|e| StageError::new(Stage::Sitemap, head.as_str(), e))?;
    report.ok(&head);

    let head = report.prefetch_head(&urls);
    let envelope = api
        .prefetch(&cdn_id, &urls)
        .await
        .map_err(|e| StageError::new(Stage::Prefetch, head.as_str(), e))?;
    report.ok_described(&head, &envelope.description);

    Ok(Summary {
        cdn_id,
        purged: config.purge_all,
        prefetched: urls.len(),
    })
}

/// Id of the first resource whose cname equals `site`, ignoring case
pub fn resolve_id(site: &str, resources: &[CdnResource]) -> Option<String> {
    let site = site.to_lowercase();

    resources
        .iter()
        .find(|r| r.cname.to_lowercase() == site)
        .map(|r| r.id.to_string())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;
    use crate::api::response::Envelope;
    use crate::error::exit_code;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        List,
        Purge(String),
        Prefetch(String, Vec<String>),
    }

    /// Records calls and answers from canned envelopes
    struct FakeApi {
        list: Envelope,
        resources: Vec<CdnResource>,
        purge: Envelope,
        prefetch: Envelope,
        calls: RefCell<Vec<Call>>,
    }

    fn ok(description: &str) -> Envelope {
        Envelope {
            status: "ok".into(),
            description: description.into(),
        }
    }

    fn failed(description: &str) -> Envelope {
        Envelope {
            status: "error".into(),
            description: description.into(),
        }
    }

    impl FakeApi {
        fn new(resources: Vec<CdnResource>) -> Self {
            Self {
                list: ok("Request was successful."),
                resources,
                purge: ok("purged"),
                prefetch: ok("queued"),
                calls: RefCell::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.borrow().clone()
        }
    }

    impl CdnApi for FakeApi {
        async fn list_resources(&self) -> Result<Vec<CdnResource>, Error> {
            self.calls.borrow_mut().push(Call::List);
            self.list.clone().into_checked()?;
            Ok(self.resources.clone())
        }

        async fn purge_all(&self, cdn_id: &str) -> Result<Envelope, Error> {
            self.calls.borrow_mut().push(Call::Purge(cdn_id.into()));
            self.purge.clone().into_checked()
        }

        async fn prefetch(&self, cdn_id: &str, urls: &[String]) -> Result<Envelope, Error> {
            self.calls
                .borrow_mut()
                .push(Call::Prefetch(cdn_id.into(), urls.to_vec()));
            self.prefetch.clone().into_checked()
        }
    }

    fn resource(id: i64, cname: &str) -> CdnResource {
        CdnResource {
            id,
            cname: cname.into(),
        }
    }

    fn sitemap_file(xml: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(xml.as_bytes()).unwrap();
        file
    }

    fn config(site: &str, sitemap: Option<&NamedTempFile>, purge_all: bool) -> Config {
        Config {
            login: "me@example.com".into(),
            token: "secret".into(),
            site: site.into(),
            sitemap: sitemap.map(|f| f.path().to_string_lossy().into_owned()),
            purge_all,
            verbose: false,
            api_url: "http://127.0.0.1:1".into(),
        }
    }

    const TWO_URLS: &str =
        "<urlset><url><loc>https://a.com/1</loc></url><url><loc>https://a.com/2</loc></url></urlset>";

    async fn run_fake(api: &FakeApi, config: &Config) -> Result<Summary, StageError> {
        run(api, &Client::new(), config, &Reporter::new(config.verbose)).await
    }

    #[test]
    fn resolve_ignores_case() {
        let resources = vec![resource(3, "other.example"), resource(5, "Site.Example")];

        assert_eq!(resolve_id("site.example", &resources), Some("5".into()));
        assert_eq!(resolve_id("SITE.EXAMPLE", &resources), Some("5".into()));
    }

    #[test]
    fn resolve_first_match_wins() {
        let resources = vec![resource(8, "site.example"), resource(9, "SITE.example")];

        assert_eq!(resolve_id("Site.Example", &resources), Some("8".into()));
    }

    #[test]
    fn resolve_without_match() {
        let resources = vec![resource(3, "other.example"), resource(4, "www.site.example")];

        assert_eq!(resolve_id("site.example", &resources), None);
        assert_eq!(resolve_id("site.example", &[]), None);
    }

    #[tokio::test]
    async fn end_to_end_without_purge() {
        let sitemap = sitemap_file(TWO_URLS);
        let api = FakeApi::new(vec![resource(5, "Site.Example")]);

        let summary = run_fake(&api, &config("site.example", Some(&sitemap), false))
            .await
            .unwrap();

        assert_eq!(
            summary,
            Summary {
                cdn_id: "5".into(),
                purged: false,
                prefetched: 2,
            }
        );
        assert_eq!(
            api.calls(),
            vec![
                Call::List,
                Call::Prefetch(
                    "5".into(),
                    vec!["https://a.com/1".into(), "https://a.com/2".into()]
                ),
            ]
        );
    }

    #[tokio::test]
    async fn purge_runs_before_prefetch() {
        let sitemap = sitemap_file(TWO_URLS);
        let api = FakeApi::new(vec![resource(5, "site.example")]);

        let summary = run_fake(&api, &config("site.example", Some(&sitemap), true))
            .await
            .unwrap();

        assert!(summary.purged);
        let calls = api.calls();
        assert_eq!(calls[1], Call::Purge("5".into()));
        assert!(matches!(calls[2], Call::Prefetch(..)));
    }

    #[tokio::test]
    async fn unknown_site_stops_the_run() {
        let sitemap = sitemap_file(TWO_URLS);
        let api = FakeApi::new(vec![resource(5, "other.example")]);

        let err = run_fake(&api, &config("site.example", Some(&sitemap), true))
            .await
            .unwrap_err();

        assert_eq!(err.stage, Stage::Resolve);
        assert_eq!(err.exit_code(), exit_code::RESOURCE_NOT_FOUND);
        assert_eq!(api.calls(), vec![Call::List]);
    }

    #[tokio::test]
    async fn list_status_error_stops_the_run() {
        let sitemap = sitemap_file(TWO_URLS);
        let mut api = FakeApi::new(vec![resource(5, "site.example")]);
        api.list = failed("Authentication failed.");

        let err = run_fake(&api, &config("site.example", Some(&sitemap), false))
            .await
            .unwrap_err();

        assert_eq!(err.exit_code(), exit_code::LIST_STATUS);
        assert_eq!(
            err.to_string(),
            "Reading resource list from CDN77 ... error: Authentication failed., aborting"
        );
    }

    #[tokio::test]
    async fn purge_failure_skips_prefetch() {
        let sitemap = sitemap_file(TWO_URLS);
        let mut api = FakeApi::new(vec![resource(5, "site.example")]);
        api.purge = failed("Purge limit reached");

        let err = run_fake(&api, &config("site.example", Some(&sitemap), true))
            .await
            .unwrap_err();

        assert_eq!(err.exit_code(), exit_code::PURGE_STATUS);
        assert_eq!(api.calls(), vec![Call::List, Call::Purge("5".into())]);
    }

    #[tokio::test]
    async fn prefetch_status_error_keeps_purge() {
        let sitemap = sitemap_file(TWO_URLS);
        let mut api = FakeApi::new(vec![resource(5, "site.example")]);
        api.prefetch = failed("Invalid URL");

        let err = run_fake(&api, &config("site.example", Some(&sitemap), true))
            .await
            .unwrap_err();

        assert_eq!(err.stage, Stage::Prefetch);
        assert_eq!(err.exit_code(), exit_code::PREFETCH_STATUS);
        assert!(matches!(
            &err.error,
            Error::ApiStatus { description, .. } if description == "Invalid URL"
        ));
        assert_eq!(api.calls().len(), 3);
    }

    #[tokio::test]
    async fn bad_sitemap_skips_prefetch() {
        let sitemap = sitemap_file("<sitemapindex></sitemapindex>");
        let api = FakeApi::new(vec![resource(5, "site.example")]);

        let err = run_fake(&api, &config("site.example", Some(&sitemap), false))
            .await
            .unwrap_err();

        assert_eq!(err.exit_code(), exit_code::SITEMAP_PARSE);
        assert_eq!(api.calls(), vec![Call::List]);
    }

    #[tokio::test]
    async fn missing_sitemap_flag() {
        let api = FakeApi::new(vec![resource(5, "site.example")]);

        let err = run_fake(&api, &config("site.example", None, false))
            .await
            .unwrap_err();

        assert_eq!(err.exit_code(), exit_code::SITEMAP_OPEN);
        assert_eq!(api.calls(), vec![Call::List]);
    }

    #[tokio::test]
    async fn empty_sitemap_still_prefetches() {
        let sitemap = sitemap_file("<urlset></urlset>");
        let api = FakeApi::new(vec![resource(5, "site.example")]);

        let summary = run_fake(&api, &config("site.example", Some(&sitemap), false))
            .await
            .unwrap();

        assert_eq!(summary.prefetched, 0);
        assert_eq!(
            api.calls().last(),
            Some(&Call::Prefetch("5".into(), Vec::new()))
        );
    }

    #[tokio::test]
    async fn unreachable_api_maps_to_list_transport() {
        let sitemap = sitemap_file(TWO_URLS);
        let config = config("site.example", Some(&sitemap), false);

        let err = execute(&config, &Reporter::new(false)).await.unwrap_err();

        assert_eq!(err.exit_code(), exit_code::LIST_TRANSPORT);
    }
}
