//! Outbound alert email.
//!
//! `AlertMailer` is the seam the ingestion workflow talks to. `HttpMailer`
//! posts to a transactional-mail HTTP relay with a bounded timeout;
//! `DisabledMailer` is used when no relay is configured.

use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::config::MailConfig;

pub const ALERT_SUBJECT: &str = "Blood pressure alert";

#[derive(Error, Debug)]
pub enum MailError {
    #[error("Mail relay not configured")]
    Disabled,

    #[error("Mail relay unreachable: {0}")]
    Connection(String),

    #[error("Mail relay timed out after {0}s")]
    Timeout(u64),

    #[error("Mail relay returned {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("HTTP client error: {0}")]
    HttpClient(String),
}

/// Sends one alert message to one recipient.
///
/// Implementations block; callers run them off the async executor.
pub trait AlertMailer: Send + Sync {
    fn send(&self, to: &str, message: &str) -> Result<(), MailError>;
}

/// Mailer used when no relay URL is configured. Every send fails, so no
/// alert record is written.
#[derive(Debug, Default)]
pub struct DisabledMailer;

impl AlertMailer for DisabledMailer {
    fn send(&self, _to: &str, _message: &str) -> Result<(), MailError> {
        Err(MailError::Disabled)
    }
}

/// Request body for the relay's send endpoint.
#[derive(Serialize)]
struct RelayMessage<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    text: &'a str,
}

/// JSON-over-HTTP mail relay client.
pub struct HttpMailer {
    api_url: String,
    api_key: Option<String>,
    from: String,
    client: reqwest::blocking::Client,
    timeout_secs: u64,
}

impl HttpMailer {
    pub fn new(
        api_url: &str,
        api_key: Option<String>,
        from: &str,
        timeout_secs: u64,
    ) -> Result<Self, MailError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| MailError::HttpClient(e.to_string()))?;

        Ok(Self {
            api_url: api_url.to_string(),
            api_key,
            from: from.to_string(),
            client,
            timeout_secs,
        })
    }
}

impl AlertMailer for HttpMailer {
    fn send(&self, to: &str, message: &str) -> Result<(), MailError> {
        let body = RelayMessage {
            from: &self.from,
            to,
            subject: ALERT_SUBJECT,
            text: message,
        };

        let mut request = self.client.post(&self.api_url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().map_err(|e| {
            if e.is_timeout() {
                MailError::Timeout(self.timeout_secs)
            } else if e.is_connect() {
                MailError::Connection(self.api_url.clone())
            } else {
                MailError::HttpClient(e.to_string())
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(MailError::Rejected {
                status: status.as_u16(),
                body,
            });
        }

        tracing::debug!(status = status.as_u16(), "Alert email accepted by relay");
        Ok(())
    }
}

/// Build the mailer for this configuration.
///
/// Must be called off the async executor: the blocking HTTP client owns
/// its own runtime.
pub fn mailer_from_config(
    mail: &MailConfig,
    timeout_secs: u64,
) -> Result<Box<dyn AlertMailer>, MailError> {
    match &mail.api_url {
        Some(url) => {
            tracing::info!(relay = %url, "Alert emails enabled");
            Ok(Box::new(HttpMailer::new(
                url,
                mail.api_key.clone(),
                &mail.from,
                timeout_secs,
            )?))
        }
        None => {
            tracing::warn!("MAIL_API_URL not set; abnormal readings will not be emailed");
            Ok(Box::new(DisabledMailer))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disabled_mailer_always_fails() {
        let result = DisabledMailer.send("a@example.com", "hello");
        assert!(matches!(result, Err(MailError::Disabled)));
    }

    #[test]
    fn unreachable_relay_reports_failure() {
        // Port 9 (discard) on localhost is closed in test environments
        let mailer = HttpMailer::new("http://127.0.0.1:9/send", None, "alerts@example.com", 2).unwrap();
        assert!(mailer.send("a@example.com", "hello").is_err());
    }

    #[test]
    fn config_without_url_builds_disabled_mailer() {
        let mail = MailConfig {
            api_url: None,
            api_key: None,
            from: "alerts@example.com".into(),
        };
        let mailer = mailer_from_config(&mail, 5).unwrap();
        assert!(matches!(mailer.send("a@example.com", "x"), Err(MailError::Disabled)));
    }
}
