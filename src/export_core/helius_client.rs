//! Helius enhanced-transaction history client
//!
//! Endpoint: `{base}/v0/addresses/{address}/transactions?api-key=...`
//! Returns newest-first pages of enhanced transactions. The next page is
//! requested with `before=<last signature of the previous page>`; an empty
//! page ends the history.

use crate::export_core::config::RuntimeConfig;
use crate::export_core::error_handler::ExponentialBackoff;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("API returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("Invalid response body: {0}")]
    InvalidBody(#[from] serde_json::Error),
    #[error("Page has no record with a signature; cannot paginate")]
    MissingCursor,
    #[error("Giving up after {attempts} attempts: {last_error}")]
    RetriesExhausted { attempts: u32, last_error: String },
}

/// Page-by-page source of raw API records
#[async_trait]
pub trait TransactionSource: Send {
    /// Next batch of records, or `None` once the history is exhausted
    async fn next_page(&mut self) -> Result<Option<Vec<Value>>, FetchError>;
}

pub struct HeliusClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    backoff_initial: Duration,
    backoff_max: Duration,
    max_attempts: u32,
    page_delay: Duration,
}

impl HeliusClient {
    pub fn new(config: &RuntimeConfig) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self::with_http(http, config))
    }

    pub fn with_http(http: reqwest::Client, config: &RuntimeConfig) -> Self {
        Self {
            http,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            backoff_initial: config.backoff_initial,
            backoff_max: config.backoff_max,
            max_attempts: config.max_attempts,
            page_delay: config.page_delay,
        }
    }

    pub fn transactions_url(&self, address: &str) -> String {
        format!("{}/v0/addresses/{}/transactions", self.base_url, address)
    }

    /// Lazy, strictly ordered walk over the full history of `address`
    pub fn fetch_all<'a>(&'a self, address: &str) -> TransactionPager<'a> {
        TransactionPager {
            client: self,
            address: address.to_string(),
            before: None,
            until: None,
            pages_fetched: 0,
            done: false,
        }
    }

    /// Fetch one page, retrying rate limits, 5xx and transport errors with
    /// exponential backoff, at most `max_attempts` requests in total. Other
    /// HTTP errors are returned immediately.
    pub async fn fetch_page(
        &self,
        address: &str,
        before: Option<&str>,
        until: Option<&str>,
    ) -> Result<Vec<Value>, FetchError> {
        let url = self.transactions_url(address);
        let retries = self.max_attempts.saturating_sub(1);
        let mut backoff = ExponentialBackoff::new(self.backoff_initial, self.backoff_max, retries);

        loop {
            let mut request = self.http.get(&url).query(&[("api-key", self.api_key.as_str())]);
            if let Some(before) = before {
                request = request.query(&[("before", before)]);
            }
            if let Some(until) = until {
                request = request.query(&[("until", until)]);
            }

            let last_error = match request.send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let body = response.text().await?;
                        return Ok(serde_json::from_str::<Vec<Value>>(&body)?);
                    }

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        log::warn!("🚦 Rate limited by API");
                        format!("rate limited ({})", status)
                    } else if status.is_server_error() {
                        log::warn!("⚠️  API server error: {}", status);
                        format!("server error ({})", status)
                    } else {
                        let body = response.text().await.unwrap_or_default();
                        return Err(FetchError::Status {
                            status: status.as_u16(),
                            body,
                        });
                    }
                }
                Err(e) if e.is_timeout() || e.is_connect() || e.is_request() => {
                    log::warn!("⚠️  Request failed: {}", e);
                    e.to_string()
                }
                Err(e) => return Err(FetchError::Http(e)),
            };

            backoff.sleep().await.map_err(|exceeded| FetchError::RetriesExhausted {
                attempts: exceeded.attempts + 1,
                last_error,
            })?;
        }
    }
}

pub struct TransactionPager<'a> {
    client: &'a HeliusClient,
    address: String,
    before: Option<String>,
    until: Option<String>,
    pages_fetched: usize,
    done: bool,
}

impl<'a> TransactionPager<'a> {
    pub fn before(mut self, signature: Option<String>) -> Self {
        self.before = signature;
        self
    }

    pub fn until(mut self, signature: Option<String>) -> Self {
        self.until = signature;
        self
    }

}

#[async_trait]
impl<'a> TransactionSource for TransactionPager<'a> {
    async fn next_page(&mut self) -> Result<Option<Vec<Value>>, FetchError> {
        if self.done {
            return Ok(None);
        }

        if self.pages_fetched > 0 && !self.client.page_delay.is_zero() {
            tokio::time::sleep(self.client.page_delay).await;
        }

        let page = self
            .client
            .fetch_page(&self.address, self.before.as_deref(), self.until.as_deref())
            .await?;
        self.pages_fetched += 1;

        if page.is_empty() {
            log::debug!("Empty page after {} pages, history complete", self.pages_fetched - 1);
            self.done = true;
            return Ok(None);
        }

        // Unsigned records are skipped downstream; page from the last signed one
        let cursor = page
            .iter()
            .rev()
            .find_map(|tx| tx.get("signature").and_then(Value::as_str).filter(|sig| !sig.is_empty()))
            .ok_or(FetchError::MissingCursor)?;
        self.before = Some(cursor.to_string());

        log::debug!("📄 Page {}: {} transactions", self.pages_fetched, page.len());
        Ok(Some(page))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str) -> RuntimeConfig {
        RuntimeConfig {
            api_key: "test-key".to_string(),
            api_url: url.to_string(),
            request_timeout: Duration::from_secs(5),
            max_attempts: 3,
            backoff_initial: Duration::from_millis(1),
            backoff_max: Duration::from_millis(2),
            page_delay: Duration::ZERO,
        }
    }

    #[test]
    fn test_transactions_url() {
        let client = HeliusClient::new(&config("https://api.helius.xyz/")).unwrap();
        assert_eq!(
            client.transactions_url("9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM"),
            "https://api.helius.xyz/v0/addresses/9WzDXwBbmkg8ZTbNMqUxvQRAyrZzDsGYdLVL9zYtAWWM/transactions"
        );
    }

    #[tokio::test]
    async fn test_connection_refused_exhausts_retries() {
        // Bind then drop to get a port nothing listens on
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let http = reqwest::Client::builder().no_proxy().build().unwrap();
        let client = HeliusClient::with_http(http, &config(&format!("http://127.0.0.1:{}", port)));

        let err = client.fetch_page("addr", None, None).await.unwrap_err();
        assert!(matches!(err, FetchError::RetriesExhausted { attempts: 3, .. }));
    }
}
