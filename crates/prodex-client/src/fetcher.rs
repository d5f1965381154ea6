use std::net::IpAddr;
use std::time::Duration;

use prodex_core::error::AppError;
use prodex_core::models::SourceDocument;
use prodex_core::traits::Fetcher;
use reqwest::header::LOCATION;
use reqwest::redirect::Policy;
use reqwest::{Client, Response, StatusCode};
use url::Url;

const USER_AGENT: &str = "Prodex/0.1 (Product Extractor)";
const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(30);
const MAX_REDIRECTS: usize = 10;

/// HTTP fetcher using reqwest.
///
/// Downloads raw HTML with a fixed User-Agent and request timeout, following
/// redirects. Each call makes a single attempt; retries belong to the
/// pipeline's [`RetryPolicy`](prodex_core::RetryPolicy).
///
/// Requests to private or reserved addresses are allowed unless
/// [`block_private_urls`](Self::block_private_urls) is enabled, in which case
/// every redirect hop is checked before it is requested.
#[derive(Clone)]
pub struct ReqwestFetcher {
    client: Client,
    timeout: Duration,
    block_private_urls: bool,
    is_blocked: fn(IpAddr) -> bool,
}

impl ReqwestFetcher {
    pub fn new() -> Result<Self, AppError> {
        Self::with_timeout(DEFAULT_FETCH_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, AppError> {
        Ok(Self {
            client: build_client(timeout, Policy::default())?,
            timeout,
            block_private_urls: false,
            is_blocked: is_private_ip,
        })
    }

    /// Only fetch `http`/`https` URLs whose host, and the host of every
    /// redirect target, resolves to public addresses.
    pub fn block_private_urls(mut self, enabled: bool) -> Result<Self, AppError> {
        if enabled != self.block_private_urls {
            // Guarded fetches walk redirects themselves so each hop is checked.
            let redirects = if enabled { Policy::none() } else { Policy::default() };
            self.client = build_client(self.timeout, redirects)?;
            self.block_private_urls = enabled;
        }
        Ok(self)
    }

    #[cfg(test)]
    fn with_blocked_addresses(mut self, is_blocked: fn(IpAddr) -> bool) -> Self {
        self.is_blocked = is_blocked;
        self
    }

    /// Request `target`, following up to [`MAX_REDIRECTS`] hops manually and
    /// validating each one against the private-network guard.
    async fn send_guarded(&self, url: &str, mut target: Url) -> Result<Response, AppError> {
        for _ in 0..=MAX_REDIRECTS {
            self.validate_public(url, &target).await?;

            let response = self
                .client
                .get(target.as_str())
                .send()
                .await
                .map_err(|e| transport_error(url, e))?;

            if !response.status().is_redirection() {
                return Ok(response);
            }
            let Some(location) = response.headers().get(LOCATION) else {
                return Ok(response);
            };
            let location = location
                .to_str()
                .map_err(|_| fetch_error(url, "redirect Location header is not valid text", false))?;
            let next = target
                .join(location)
                .map_err(|e| fetch_error(url, format!("Invalid redirect target: {e}"), false))?;

            tracing::debug!(from = %target, to = %next, "Following redirect");
            target = next;
        }

        Err(fetch_error(
            url,
            format!("too many redirects (limit {MAX_REDIRECTS})"),
            false,
        ))
    }

    /// Reject URLs that could reach the host's own network.
    ///
    /// 1. Only allow `http` and `https` schemes.
    /// 2. Resolve the hostname via DNS.
    /// 3. Reject if any resolved IP is private/reserved.
    async fn validate_public(&self, url: &str, target: &Url) -> Result<(), AppError> {
        match target.scheme() {
            "http" | "https" => {}
            scheme => {
                return Err(fetch_error(
                    url,
                    format!("blocked: URL scheme '{scheme}' is not allowed (only http/https)"),
                    false,
                ));
            }
        }

        let host = target
            .host_str()
            .ok_or_else(|| fetch_error(url, "blocked: URL has no host", false))?;

        // IPv6 literals come back bracketed from host_str
        let bare_host = host.trim_start_matches('[').trim_end_matches(']');
        if let Ok(ip) = bare_host.parse::<IpAddr>() {
            if (self.is_blocked)(ip) {
                return Err(fetch_error(
                    url,
                    format!("blocked: {host} is a private/reserved address"),
                    false,
                ));
            }
            return Ok(());
        }

        let port = target.port_or_known_default().unwrap_or(80);
        let addrs: Vec<_> = tokio::net::lookup_host((host, port))
            .await
            .map_err(|e| fetch_error(url, format!("DNS resolution failed for {host}: {e}"), true))?
            .collect();

        if addrs.is_empty() {
            return Err(fetch_error(
                url,
                format!("DNS resolution returned no addresses for {host}"),
                false,
            ));
        }

        if let Some(addr) = addrs.iter().find(|addr| (self.is_blocked)(addr.ip())) {
            return Err(fetch_error(
                url,
                format!("blocked: {host} resolves to private/reserved address {}", addr.ip()),
                false,
            ));
        }

        Ok(())
    }
}

impl Fetcher for ReqwestFetcher {
    async fn fetch(&self, url: &str) -> Result<SourceDocument, AppError> {
        let parsed =
            Url::parse(url).map_err(|e| fetch_error(url, format!("Invalid URL: {e}"), false))?;

        let response = if self.block_private_urls {
            self.send_guarded(url, parsed).await?
        } else {
            self.client
                .get(parsed.as_str())
                .send()
                .await
                .map_err(|e| transport_error(url, e))?
        };

        let status = response.status();
        if !status.is_success() {
            return Err(fetch_error(
                url,
                format!("HTTP {}", status.as_u16()),
                is_retryable_status(status),
            ));
        }

        let html = response
            .text()
            .await
            .map_err(|e| fetch_error(url, format!("Failed to read response body: {e}"), e.is_timeout()))?;

        Ok(SourceDocument {
            url: url.to_string(),
            html,
        })
    }
}

fn build_client(timeout: Duration, redirects: Policy) -> Result<Client, AppError> {
    Client::builder()
        .user_agent(USER_AGENT)
        .timeout(timeout)
        .redirect(redirects)
        .build()
        .map_err(|e| AppError::ConfigError(format!("Failed to build HTTP client: {e}")))
}

fn fetch_error(url: &str, message: impl Into<String>, retryable: bool) -> AppError {
    AppError::FetchError {
        url: url.to_string(),
        message: message.into(),
        retryable,
    }
}

fn transport_error(url: &str, e: reqwest::Error) -> AppError {
    if e.is_timeout() {
        fetch_error(url, "request timed out", true)
    } else if e.is_connect() {
        fetch_error(url, format!("Connection failed: {e}"), true)
    } else {
        fetch_error(url, e.to_string(), false)
    }
}

fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Check if an IP address is in a private/reserved/link-local range.
fn is_private_ip(ip: IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local() // includes cloud metadata endpoints
                || v4.is_unspecified()
                || v4.is_broadcast()
                || v4.is_documentation()
                || v4.octets()[0] == 100 && (v4.octets()[1] & 0xC0) == 64 // 100.64.0.0/10 (CGN)
        }
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || v6.is_unspecified()
                || (v6.segments()[0] & 0xFFC0) == 0xFE80 // fe80::/10
                || (v6.segments()[0] & 0xFE00) == 0xFC00 // fc00::/7
                || v6
                    .to_ipv4_mapped()
                    .is_some_and(|v4| is_private_ip(IpAddr::V4(v4)))
        }
    }
}
