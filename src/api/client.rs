//! HTTP client for the CDN77 API

use reqwest::{Client, Method, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::{debug, trace};

use crate::api::response::{CdnResource, Envelope, ResourceList};
use crate::config::Config;
use crate::error::Error;

pub const CDN77_API_BASE: &str = "https://api.cdn77.com/v2.0";

/// The three CDN77 calls a refresh run needs
#[allow(async_fn_in_trait)]
pub trait CdnApi {
    /// List all CDN resources of the account
    async fn list_resources(&self) -> Result<Vec<CdnResource>, Error>;

    /// Purge every cached object of a resource
    async fn purge_all(&self, cdn_id: &str) -> Result<Envelope, Error>;

    /// Queue the given URLs for prefetch, in one request
    async fn prefetch(&self, cdn_id: &str, urls: &[String]) -> Result<Envelope, Error>;
}

/// CDN77 API client, authenticating with login/passwd request parameters
pub struct Cdn77Client {
    client: Client,
    base_url: String,
    login: String,
    token: String,
}

impl Cdn77Client {
    /// Create a new CDN77 API client
    pub fn new(config: &Config) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .user_agent(concat!("cdn77-refresh/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            login: config.login.clone(),
            token: config.token.clone(),
        })
    }

    /// Underlying HTTP client, reused for fetching remote sitemaps
    pub fn http(&self) -> &Client {
        &self.client
    }

    fn credentials(&self) -> Vec<(&str, &str)> {
        vec![("login", self.login.as_str()), ("passwd", self.token.as_str())]
    }

    /// Send a request and decode its JSON body.
    /// The HTTP status is not checked; the envelope decides.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, Error> {
        let response = request.send().await.map_err(Error::Transport)?;

        let status = response.status();
        let text = response.text().await.map_err(Error::Body)?;
        trace!("Response ({}): {}", status, text);

        Ok(serde_json::from_str(&text)?)
    }

    /// Make a GET request with query parameters
    pub async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, Error> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        self.send(self.client.request(Method::GET, &url).query(params))
            .await
    }

    /// Make a form-encoded POST request
    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        form: &[(&str, &str)],
    ) -> Result<T, Error> {
        let url = format!("{}{}", self.base_url, path);
        debug!("POST {} ({} fields)", url, form.len());

        self.send(self.client.request(Method::POST, &url).form(form))
            .await
    }
}

impl CdnApi for Cdn77Client {
    async fn list_resources(&self) -> Result<Vec<CdnResource>, Error> {
        let list: ResourceList = self
            .get("/cdn-resource/list", &self.credentials())
            .await?;

        list.envelope.into_checked()?;
        Ok(list.cdn_resources)
    }

    async fn purge_all(&self, cdn_id: &str) -> Result<Envelope, Error> {
        let mut form = self.credentials();
        form.push(("cdn_id", cdn_id));

        let envelope: Envelope = self.post("/data/purge-all", &form).await?;
        envelope.into_checked()
    }

    async fn prefetch(&self, cdn_id: &str, urls: &[String]) -> Result<Envelope, Error> {
        let mut form = self.credentials();
        form.push(("cdn_id", cdn_id));
        form.extend(urls.iter().map(|url| ("url[]", url.as_str())));

        let envelope: Envelope = self.post("/data/prefetch", &form).await?;
        envelope.into_checked()
    }
}
