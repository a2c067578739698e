use crate::{Error, ForgeryAttempt, ForgeryEngine, HashVariant, Result};

use futures::future::join_all;
use reqwest::StatusCode;

use std::time::Duration;

/// How hard to try before declaring the oracle unavailable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total number of requests made for one query, including the first.
    pub max_attempts: u32,
    /// Delay before the first retry; doubled for each later retry.
    pub initial_backoff: Duration,
    pub request_timeout: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff: Duration::from_millis(50),
            request_timeout: Duration::from_secs(2),
        }
    }
}

/// Client for the HTTP MAC oracle served by [`crate::server`].
///
/// Connection failures, timeouts and 5xx responses are retried; a rejected
/// MAC (401) is an answer, not a failure, and is never retried.
#[derive(Debug, Clone)]
pub struct RemoteMacOracle {
    address: String,
    client: reqwest::Client,
    retry: RetryPolicy,
}

impl RemoteMacOracle {
    pub fn new(address: impl Into<String>) -> Result<Self> {
        Self::with_retry_policy(address, RetryPolicy::default())
    }

    pub fn with_retry_policy(address: impl Into<String>, retry: RetryPolicy) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(retry.request_timeout)
            .build()
            .map_err(|e| Error::OracleUnavailable(format!("could not build HTTP client: {e}")))?;
        Ok(Self {
            address: address.into(),
            client,
            retry,
        })
    }

    /// Ask the oracle to MAC a message of our choosing.
    pub async fn mac_message<V: HashVariant>(&self, message: &[u8]) -> Result<V::Digest> {
        let uri = format!("{}/mac?message={}", self.address, hex::encode(message));
        let response = self.get_with_retry(&uri).await?;
        if response.status() != StatusCode::OK {
            return Err(Error::OracleUnavailable(format!(
                "unexpected status {} from /mac",
                response.status()
            )));
        }

        let body = response
            .text()
            .await
            .map_err(|e| Error::OracleUnavailable(e.to_string()))?;
        let mac = hex::decode(body.trim())
            .map_err(|e| Error::OracleUnavailable(format!("malformed MAC from oracle: {e}")))?;
        V::digest_from_bytes(&mac)
    }

    pub async fn check_mac(&self, message: &[u8], mac: &[u8]) -> Result<bool> {
        let uri = format!(
            "{}/verify?message={}&mac={}",
            self.address,
            hex::encode(message),
            hex::encode(mac)
        );
        let response = self.get_with_retry(&uri).await?;
        match response.status() {
            StatusCode::OK => Ok(true),
            StatusCode::UNAUTHORIZED => Ok(false),
            status => Err(Error::OracleUnavailable(format!(
                "unexpected status {status} from /verify"
            ))),
        }
    }

    async fn get_with_retry(&self, uri: &str) -> Result<reqwest::Response> {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut backoff = self.retry.initial_backoff;
        let mut attempt = 1;
        loop {
            let failure = match self.client.get(uri).send().await {
                Ok(response) if !response.status().is_server_error() => return Ok(response),
                Ok(response) => format!("server error {}", response.status()),
                Err(e) => e.to_string(),
            };
            if attempt >= max_attempts {
                return Err(Error::OracleUnavailable(format!(
                    "{failure} (gave up after {attempt} attempts)"
                )));
            }

            tracing::warn!(attempt, %failure, ?backoff, "MAC oracle request failed, retrying");
            tokio::time::sleep(backoff).await;
            backoff *= 2;
            attempt += 1;
        }
    }
}

/// Run the length extension attack against a remote oracle, checking
/// `n_workers` key length guesses concurrently. Within a batch the shortest
/// accepted key length wins.
///
/// An oracle that stays unavailable after retries ends the search with
/// [`Error::ForgeryExhausted`], counting only the guesses it answered.
pub async fn remote_length_extension_attack<V: HashVariant>(
    engine: &ForgeryEngine<V>,
    oracle: &RemoteMacOracle,
    known_message: &[u8],
    known_mac: &V::Digest,
    suffix: &[u8],
    n_workers: usize,
) -> Result<ForgeryAttempt<V>> {
    let mut attempts = engine.attempts(known_message, known_mac, suffix);
    loop {
        let batch: Vec<ForgeryAttempt<V>> = attempts.by_ref().take(n_workers.max(1)).collect();
        if batch.is_empty() {
            break;
        }
        tracing::debug!(
            hash = V::NAME,
            first_key_len = batch[0].key_len,
            n_guesses = batch.len(),
            "checking key length guesses"
        );

        let checks = batch
            .iter()
            .map(|attempt| oracle.check_mac(&attempt.message, attempt.mac.as_ref()));
        let results = join_all(checks).await;

        // An accepted guess anywhere in the batch beats an oracle failure on
        // a shorter one.
        let mut failure: Option<(usize, Error)> = None;
        for (attempt, result) in batch.into_iter().zip(results) {
            match result {
                Ok(true) => {
                    tracing::info!(
                        hash = V::NAME,
                        key_len = attempt.key_len,
                        mac = %hex::encode(attempt.mac),
                        "remote oracle accepted forgery"
                    );
                    return Ok(attempt);
                }
                Ok(false) => {}
                Err(e) if failure.is_none() => failure = Some((attempt.key_len, e)),
                Err(_) => {}
            }
        }

        if let Some((key_len, e)) = failure {
            tracing::warn!(error = %e, key_len, "abandoning forgery search");
            return Err(Error::ForgeryExhausted {
                tried: key_len as u32,
            });
        }
    }

    Err(Error::ForgeryExhausted {
        tried: engine.max_key_len(),
    })
}
