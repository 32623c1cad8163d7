use std::future::Future;
use std::time::Duration;

use log::{debug, warn};

use crate::error::{Error, Result, TransportError};

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Total attempts per URL, including the first one
pub const MAX_ATTEMPTS: u32 = 3;

const BASE_BACKOFF: Duration = Duration::from_millis(500);

/// A single HTTP GET returning the body as text
pub trait Transport {
    fn get_text(&self, url: &str) -> impl Future<Output = std::result::Result<String, TransportError>> + Send;
}

impl Transport for reqwest::Client {
    async fn get_text(&self, url: &str) -> std::result::Result<String, TransportError> {
        let resp = self
            .get(url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .map_err(|e| TransportError::Request(Box::new(e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(TransportError::Status(status.as_u16()));
        }

        resp.text().await.map_err(|e| TransportError::Request(Box::new(e)))
    }
}

/// Build the shared HTTP client, optionally routed through a forward proxy.
///
/// Certificate verification stays on for every hop. reqwest has no per-proxy TLS
/// setting, and `danger_accept_invalid_certs` would also disable it for the upstream
/// endpoints, so an `https://` proxy must present a trusted certificate.
/// `http://` and `socks5://` proxies carry no TLS of their own.
pub fn build_client(proxy: Option<&str>, timeout: Option<Duration>) -> Result<reqwest::Client> {
    let mut builder = reqwest::Client::builder();

    if let Some(proxy_url) = proxy {
        debug!("Routing requests through proxy {proxy_url}");
        let proxy =
            reqwest::Proxy::all(proxy_url).map_err(|e| Error::Config(format!("invalid proxy {proxy_url}: {e}")))?;
        builder = builder.proxy(proxy);
    }

    if let Some(timeout) = timeout {
        builder = builder.timeout(timeout);
    }

    builder
        .build()
        .map_err(|e| Error::Config(format!("failed to build HTTP client: {e}")))
}

/// Fetches URLs with a bounded retry on transport failures
pub struct Fetcher<T = reqwest::Client> {
    transport: T,
    backoff: Duration,
}

impl<T: Transport> Fetcher<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            backoff: BASE_BACKOFF,
        }
    }

    /// Base delay before the second attempt; doubled for each later one
    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub async fn fetch(&self, url: &str) -> Result<String> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            debug!("GET {url} (attempt {attempt}/{MAX_ATTEMPTS})");
            match self.transport.get_text(url).await {
                Ok(body) => return Ok(body),
                Err(e) if e.is_retryable() && attempt < MAX_ATTEMPTS => {
                    let delay = self.backoff * 2u32.pow(attempt - 1);
                    warn!("Attempt {attempt} for {url} failed: {e}, retrying in {delay:?}");
                    if !delay.is_zero() {
                        tokio::time::sleep(delay).await;
                    }
                }
                Err(TransportError::Status(status)) => {
                    return Err(Error::HttpStatus {
                        url: url.to_string(),
                        status,
                    });
                }
                Err(source) => {
                    return Err(Error::Network {
                        url: url.to_string(),
                        attempts: attempt,
                        source,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::collections::{HashMap, VecDeque};
    use std::sync::Mutex;

    /// Scripted transport: each URL answers with its queued responses in order
    #[derive(Default)]
    pub(crate) struct FakeTransport {
        responses: Mutex<HashMap<String, VecDeque<std::result::Result<String, TransportError>>>>,
        calls: Mutex<Vec<String>>,
    }

    impl FakeTransport {
        pub(crate) fn respond(self, url: &str, body: &str) -> Self {
            self.push(url, Ok(body.to_string()))
        }

        pub(crate) fn fail(self, url: &str, err: TransportError) -> Self {
            self.push(url, Err(err))
        }

        fn push(self, url: &str, resp: std::result::Result<String, TransportError>) -> Self {
            self.responses
                .lock()
                .unwrap()
                .entry(url.to_string())
                .or_default()
                .push_back(resp);
            self
        }

        pub(crate) fn calls_to(&self, url: &str) -> usize {
            self.calls.lock().unwrap().iter().filter(|u| *u == url).count()
        }
    }

    impl Transport for FakeTransport {
        async fn get_text(&self, url: &str) -> std::result::Result<String, TransportError> {
            self.calls.lock().unwrap().push(url.to_string());
            self.responses
                .lock()
                .unwrap()
                .get_mut(url)
                .and_then(|q| q.pop_front())
                .unwrap_or_else(|| Err(TransportError::Request(format!("no route to {url}").into())))
        }
    }

    pub(crate) fn refused() -> TransportError {
        TransportError::Request("connection refused".into())
    }

    const URL: &str = "https://example.test/page";

    #[tokio::test]
    async fn test_fetch_first_try() {
        let fetcher = Fetcher::new(FakeTransport::default().respond(URL, "body")).with_backoff(Duration::ZERO);
        assert_eq!(fetcher.fetch(URL).await.unwrap(), "body");
        assert_eq!(fetcher.transport.calls_to(URL), 1);
    }

    #[tokio::test]
    async fn test_fetch_recovers_on_third_attempt() {
        let transport = FakeTransport::default()
            .fail(URL, refused())
            .fail(URL, refused())
            .respond(URL, "finally");
        let fetcher = Fetcher::new(transport).with_backoff(Duration::ZERO);
        assert_eq!(fetcher.fetch(URL).await.unwrap(), "finally");
        assert_eq!(fetcher.transport.calls_to(URL), 3);
    }

    #[tokio::test]
    async fn test_fetch_gives_up_after_three_attempts() {
        let transport = FakeTransport::default()
            .fail(URL, refused())
            .fail(URL, refused())
            .fail(URL, refused())
            .respond(URL, "too late");
        let fetcher = Fetcher::new(transport).with_backoff(Duration::ZERO);
        match fetcher.fetch(URL).await {
            Err(Error::Network { url, attempts, source }) => {
                assert_eq!(url, URL);
                assert_eq!(attempts, MAX_ATTEMPTS);
                assert!(source.to_string().contains("connection refused"));
            }
            other => panic!("expected network error, got {other:?}"),
        }
        assert_eq!(fetcher.transport.calls_to(URL), 3);
    }

    #[tokio::test]
    async fn test_fetch_does_not_retry_http_status() {
        let transport = FakeTransport::default()
            .fail(URL, TransportError::Status(404))
            .respond(URL, "never reached");
        let fetcher = Fetcher::new(transport).with_backoff(Duration::ZERO);
        match fetcher.fetch(URL).await {
            Err(Error::HttpStatus { url, status }) => {
                assert_eq!(url, URL);
                assert_eq!(status, 404);
            }
            other => panic!("expected HTTP status error, got {other:?}"),
        }
        assert_eq!(fetcher.transport.calls_to(URL), 1);
    }

    #[test]
    fn test_build_client() {
        assert!(build_client(None, Some(Duration::from_secs(5))).is_ok());
        assert!(build_client(Some("socks5://127.0.0.1:1080"), None).is_ok());
        assert!(build_client(Some("http://127.0.0.1:801"), None).is_ok());
        assert!(build_client(Some("https://proxy.test:8443"), None).is_ok());
    }
}
