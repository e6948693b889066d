//! Page fetching with retries

use crate::error::Result;
use backoff::{future::retry, ExponentialBackoffBuilder};
use reqwest::{header::CONTENT_TYPE, Client, StatusCode};
use std::future::Future;
use std::time::Duration;
use tracing::{debug, warn};

const USER_AGENT: &str = "Mozilla/5.0 (compatible; LinkCrawler/1.0)";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Source of page bodies
pub trait PageSource {
    /// HTML body of `url`, or `None` when the page is not usable HTML
    fn fetch(&self, url: &str) -> impl Future<Output = Option<String>>;
}

/// Fetches pages over HTTP, retrying transport failures
pub struct HttpSource {
    client: Client,
    attempts: u32,
    initial_backoff: Duration,
}

impl HttpSource {
    pub fn new(attempts: u32) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            attempts: attempts.max(1),
            initial_backoff: Duration::from_secs(1),
        })
    }

    async fn fetch_once(&self, url: &str) -> reqwest::Result<Option<String>> {
        let response = self.client.get(url).send().await?;

        if response.status() != StatusCode::OK {
            debug!(url, status = %response.status(), "Skipping non-200 page");
            return Ok(None);
        }

        let is_html = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v.contains("text/html"));
        if !is_html {
            return Ok(None);
        }

        response.text().await.map(Some)
    }
}

impl PageSource for HttpSource {
    async fn fetch(&self, url: &str) -> Option<String> {
        // Waits 1s, 2s, 4s, ... between attempts
        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_backoff)
            .with_randomization_factor(0.0)
            .with_multiplier(2.0)
            .with_max_elapsed_time(None)
            .build();

        let mut attempt = 0;
        let result = retry(policy, || {
            attempt += 1;
            let last = attempt >= self.attempts;
            async move {
                self.fetch_once(url).await.map_err(|e| {
                    if last {
                        backoff::Error::permanent(e)
                    } else {
                        debug!(url, attempt, error = %e, "Fetch failed, retrying");
                        backoff::Error::transient(e)
                    }
                })
            }
        })
        .await;

        match result {
            Ok(body) => body,
            Err(e) => {
                warn!(url, attempts = self.attempts, error = %e, "Giving up on page");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn source(attempts: u32) -> HttpSource {
        let mut source = HttpSource::new(attempts).unwrap();
        source.initial_backoff = Duration::from_millis(10);
        source
    }

    /// Serve `response` verbatim to every connection
    async fn serve(response: &'static str) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            while let Ok((mut stream, _)) = listener.accept().await {
                let mut buf = [0u8; 1024];
                let _ = stream.read(&mut buf).await;
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            }
        });

        format!("http://{}/", addr)
    }

    #[tokio::test]
    async fn test_dropped_connections_retried_then_none() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let accepted = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&accepted);
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                counter.fetch_add(1, Ordering::SeqCst);
                drop(stream);
            }
        });

        let url = format!("http://{}/", addr);
        assert!(source(2).fetch(&url).await.is_none());
        assert!(accepted.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test]
    async fn test_html_page_returned() {
        let url = serve(
            "HTTP/1.1 200 OK\r\ncontent-type: text/html; charset=utf-8\r\ncontent-length: 13\r\nconnection: close\r\n\r\n<p>home</p>\r\n",
        )
        .await;

        assert_eq!(source(1).fetch(&url).await.as_deref(), Some("<p>home</p>\r\n"));
    }

    #[tokio::test]
    async fn test_non_html_and_non_200_skipped() {
        let json = serve(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: 2\r\nconnection: close\r\n\r\n{}",
        )
        .await;
        assert!(source(1).fetch(&json).await.is_none());

        let missing = serve(
            "HTTP/1.1 404 Not Found\r\ncontent-type: text/html\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
        )
        .await;
        assert!(source(1).fetch(&missing).await.is_none());
    }
}
