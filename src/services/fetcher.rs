use std::time::Duration;

use futures_util::future::BoxFuture;
use reqwest::Method;

use crate::errors::{MirrorError, Result};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FetchMethod {
    /// Reachability check; the body is discarded.
    Head,
    Get,
}

#[derive(Clone, Copy, Debug)]
pub struct FetchOptions {
    pub method: FetchMethod,
    pub timeout: Duration,
}

impl FetchOptions {
    pub fn head(timeout: Duration) -> Self {
        Self {
            method: FetchMethod::Head,
            timeout,
        }
    }

    pub fn get(timeout: Duration) -> Self {
        Self {
            method: FetchMethod::Get,
            timeout,
        }
    }
}

#[derive(Clone, Debug)]
pub struct FetchResponse {
    pub status: u16,
    pub body: String,
}

impl FetchResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// The engine's only network capability. Probes and document fetches go
/// through this, so a diagnostics layer can wrap or short-circuit every
/// call without the engine knowing.
pub trait Fetch: Send + Sync {
    fn fetch<'a>(&'a self, url: &'a str, options: FetchOptions) -> BoxFuture<'a, Result<FetchResponse>>;
}

/// Production transport. Relative source locations are joined against the
/// site base URL; absolute URLs pass through untouched.
pub struct HttpFetcher {
    client: reqwest::Client,
    base_url: String,
}

impl HttpFetcher {
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .connect_timeout(Duration::from_secs(6))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());
        Self {
            client,
            base_url: base_url.to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn resolve_url(&self, location: &str) -> String {
        if location.contains("://") {
            return location.to_string();
        }
        format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            location.trim_start_matches(|ch| ch == '.' || ch == '/')
        )
    }
}

impl Fetch for HttpFetcher {
    fn fetch<'a>(&'a self, url: &'a str, options: FetchOptions) -> BoxFuture<'a, Result<FetchResponse>> {
        Box::pin(async move {
            let target = self.resolve_url(url);
            let method = match options.method {
                FetchMethod::Head => Method::HEAD,
                FetchMethod::Get => Method::GET,
            };
            let response = match self
                .client
                .request(method, &target)
                .timeout(options.timeout)
                .send()
                .await
            {
                Ok(response) => response,
                Err(err) if err.is_timeout() => return Err(MirrorError::Timeout(target)),
                Err(err) => return Err(MirrorError::Network(err)),
            };

            let status = response.status().as_u16();
            let body = match options.method {
                FetchMethod::Get => response.text().await.unwrap_or_default(),
                FetchMethod::Head => String::new(),
            };
            Ok(FetchResponse { status, body })
        })
    }
}

/// Diagnostics/interception mode: block everything that leaves the site's
/// own origin and let internal requests through. Wraps any transport.
pub struct InterceptFetcher<F> {
    inner: F,
    base_url: String,
}

impl<F: Fetch> InterceptFetcher<F> {
    pub fn new(inner: F, base_url: &str) -> Self {
        Self {
            inner,
            base_url: base_url.to_string(),
        }
    }
}

impl<F: Fetch> Fetch for InterceptFetcher<F> {
    fn fetch<'a>(&'a self, url: &'a str, options: FetchOptions) -> BoxFuture<'a, Result<FetchResponse>> {
        if is_external_url(url, &self.base_url) {
            tracing::warn!("interception mode: blocked external request to {}", url);
            return Box::pin(async move { Err(MirrorError::Blocked(url.to_string())) });
        }
        self.inner.fetch(url, options)
    }
}

/// `./`- and `/`-prefixed locations are internal; absolute URLs are
/// compared by origin; anything unparseable counts as external.
pub fn is_external_url(url: &str, base_url: &str) -> bool {
    if url.starts_with("./") || url.starts_with('/') {
        return false;
    }
    if url.contains("://") {
        let Some(base_origin) = origin_of(base_url) else {
            return true;
        };
        return origin_of(url)
            .map(|origin| origin != base_origin)
            .unwrap_or(true);
    }
    true
}

fn origin_of(url: &str) -> Option<String> {
    let parsed = reqwest::Url::parse(url).ok()?;
    let host = parsed.host_str()?.to_ascii_lowercase();
    let port = parsed.port_or_known_default().unwrap_or(0);
    Some(format!("{}://{}:{}", parsed.scheme(), host, port))
}
