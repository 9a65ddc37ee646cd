//! Snapshot loading from a URL or a local file
//!
//! Remote snapshots are fetched with retry and exponential backoff. The body is
//! returned unparsed so the caller can cache exactly what was served.

use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

use crate::config::mask_source;
use crate::constants;

#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to build HTTP client: {0}")]
    Client(reqwest::Error),

    #[error("{url} returned status {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("Gave up on {url} after {attempts} attempts: {last_error}")]
    Exhausted {
        url: String,
        attempts: u32,
        last_error: String,
    },
}

/// Whether a source names a remote snapshot
pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Load the raw snapshot body from `source`
pub async fn fetch_snapshot(source: &str, retries: u32) -> Result<String, FetchError> {
    if is_remote(source) {
        fetch_remote(source, retries).await
    } else {
        read_local(Path::new(source)).await
    }
}

async fn read_local(path: &Path) -> Result<String, FetchError> {
    log::debug!("Reading snapshot from {}", path.display());
    tokio::fs::read_to_string(path)
        .await
        .map_err(|source| FetchError::Read {
            path: path.display().to_string(),
            source,
        })
}

async fn fetch_remote(url: &str, retries: u32) -> Result<String, FetchError> {
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(constants::FETCH_TIMEOUT_SECS))
        .user_agent(constants::USER_AGENT)
        .build()
        .map_err(FetchError::Client)?;

    let shown = mask_source(url);
    let max_retries = retries.max(1);
    let mut last_error = String::from("no attempt made");

    for attempt in 0..max_retries {
        if attempt > 0 {
            let delay = backoff_delay(attempt);
            log::debug!("Retrying {} in {:?} (attempt {})", shown, delay, attempt + 1);
            sleep(delay).await;
        }

        match client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
        {
            Ok(response) => {
                let status = response.status();
                if status.is_success() {
                    match response.text().await {
                        Ok(body) => return Ok(body),
                        Err(e) => last_error = format!("Body read error: {}", e.without_url()),
                    }
                } else if status.as_u16() == 429 || status.is_server_error() {
                    last_error = format!("Status {}", status);
                } else {
                    // Client errors will not fix themselves
                    return Err(FetchError::Status {
                        url: shown,
                        status,
                    });
                }
            }
            Err(e) => {
                last_error = format!("Request failed: {}", e.without_url());
            }
        }

        log::warn!("Attempt {} for {} failed: {}", attempt + 1, shown, last_error);
    }

    Err(FetchError::Exhausted {
        url: shown,
        attempts: max_retries,
        last_error,
    })
}

/// Exponential backoff before retry `attempt`, capped so a large retry
/// count cannot overflow
fn backoff_delay(attempt: u32) -> Duration {
    let secs = constants::RETRY_BASE_DELAY_SECS.saturating_mul(2u64.saturating_pow(attempt));
    Duration::from_secs(secs.min(constants::MAX_RETRY_DELAY_SECS))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://example.org/teams.json"));
        assert!(is_remote("http://localhost:8000/teams.json"));
        assert!(!is_remote("data/teams.json"));
        assert!(!is_remote("/tmp/https.json"));
    }

    #[test]
    fn test_backoff_doubles_then_caps() {
        assert_eq!(backoff_delay(1), Duration::from_secs(2));
        assert_eq!(backoff_delay(3), Duration::from_secs(8));
        assert_eq!(
            backoff_delay(64),
            Duration::from_secs(constants::MAX_RETRY_DELAY_SECS)
        );
        assert_eq!(
            backoff_delay(u32::MAX),
            Duration::from_secs(constants::MAX_RETRY_DELAY_SECS)
        );
    }

    #[tokio::test]
    async fn test_reads_local_file() {
        let path = std::env::temp_dir().join(format!("club-spend-fetch-{}.json", std::process::id()));
        std::fs::write(&path, r#"{"clubs": []}"#).unwrap();

        let body = fetch_snapshot(path.to_str().unwrap(), 1).await.unwrap();
        assert_eq!(body, r#"{"clubs": []}"#);

        std::fs::remove_file(&path).unwrap();
    }

    #[tokio::test]
    async fn test_missing_file_is_read_error() {
        let err = fetch_snapshot("definitely/not/here.json", 3)
            .await
            .unwrap_err();
        assert!(matches!(err, FetchError::Read { .. }));
        assert!(err.to_string().contains("definitely/not/here.json"));
    }
}
