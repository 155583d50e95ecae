use std::thread;
use std::time::Duration;

use tracing::{debug, warn};

const ERROR_BODY_PREVIEW_CHARS: usize = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    pub attempts: usize,
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(3),
            read_timeout: Duration::from_secs(6),
            attempts: 3,
            retry_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    /// Throttling, request timeouts and server errors are worth another attempt.
    pub(crate) fn should_retry(status: u16) -> bool {
        matches!(status, 408 | 429 | 500..=599)
    }

    fn max_attempts(&self) -> usize {
        self.attempts.max(1)
    }

    fn agent(&self) -> ureq::Agent {
        ureq::AgentBuilder::new()
            .timeout_connect(self.connect_timeout)
            .timeout_read(self.read_timeout)
            .timeout_write(self.read_timeout)
            .build()
    }
}

/// Outcome of one failed attempt.
#[derive(Debug)]
enum AttemptFailure {
    Transient(String),
    Final(String),
}

fn describe_status(status: u16, response: ureq::Response) -> String {
    let body = response.into_string().unwrap_or_default();
    let body = body.trim();
    if body.is_empty() {
        format!("HTTP status {status}")
    } else {
        let preview: String = body.chars().take(ERROR_BODY_PREVIEW_CHARS).collect();
        format!("HTTP status {status} ({preview})")
    }
}

fn get_once(
    agent: &ureq::Agent,
    url: &str,
    query: &[(String, String)],
) -> Result<String, AttemptFailure> {
    let request = query
        .iter()
        .fold(agent.get(url).set("Accept", "application/json"), |req, (key, value)| {
            req.query(key, value)
        });

    match request.call() {
        Ok(response) => response
            .into_string()
            .map_err(|err| AttemptFailure::Final(format!("response decode failed: {err}"))),
        Err(ureq::Error::Status(status, response)) => {
            let message = describe_status(status, response);
            if RetryPolicy::should_retry(status) {
                Err(AttemptFailure::Transient(message))
            } else {
                Err(AttemptFailure::Final(message))
            }
        }
        Err(ureq::Error::Transport(err)) => {
            Err(AttemptFailure::Transient(format!("transport error: {err}")))
        }
    }
}

/// GETs `url` as JSON text, retrying throttling, server errors and transport failures.
pub(crate) fn get_text_with_retries(
    url: &str,
    query: &[(String, String)],
    policy: &RetryPolicy,
) -> Result<String, String> {
    let attempts = policy.max_attempts();
    let agent = policy.agent();
    let mut attempt = 1;

    loop {
        debug!(url, attempt, "GET");
        match get_once(&agent, url, query) {
            Ok(body) => return Ok(body),
            Err(AttemptFailure::Final(message)) => {
                return Err(format!("request failed: {message}"));
            }
            Err(AttemptFailure::Transient(message)) if attempt >= attempts => {
                return Err(format!(
                    "request failed after {attempts} attempt(s): {message}"
                ));
            }
            Err(AttemptFailure::Transient(message)) => {
                warn!(url, attempt, error = %message, "retrying request");
                thread::sleep(policy.retry_delay);
                attempt += 1;
            }
        }
    }
}
