//! Spreadsheet-published reading source.
//!
//! A paired device appends readings to a spreadsheet that is published as
//! plain CSV text. `SheetSource` fetches and parses the latest row.

pub mod format;

pub use format::{parse_sheet_text, SheetLayout};

use std::time::Duration;

use chrono::FixedOffset;
use serde::Serialize;
use thiserror::Error;

use crate::config::SheetConfig;

#[derive(Error, Debug)]
pub enum SheetError {
    /// Source missing, unreachable or answering non-2xx.
    #[error("No data found: {0}")]
    NoData(String),

    #[error("Malformed sheet row: {0}")]
    Malformed(String),
}

/// The latest reading as published by the sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SheetReading {
    /// RFC 3339 UTC.
    #[serde(rename = "date")]
    pub timestamp: String,
    pub systolic: i32,
    pub diastolic: i32,
    #[serde(rename = "pulseRate")]
    pub pulse: i32,
}

/// Blocking fetch of the latest reading.
pub trait SheetSource: Send + Sync {
    fn latest(&self) -> Result<SheetReading, SheetError>;
}

/// Used when no sheet URL is configured.
#[derive(Debug, Default)]
pub struct NoSheetSource;

impl SheetSource for NoSheetSource {
    fn latest(&self) -> Result<SheetReading, SheetError> {
        Err(SheetError::NoData("SHEET_URL not configured".into()))
    }
}

pub struct HttpSheetSource {
    url: String,
    layout: SheetLayout,
    offset: FixedOffset,
    client: reqwest::blocking::Client,
}

impl HttpSheetSource {
    pub fn new(
        url: &str,
        layout: SheetLayout,
        offset: FixedOffset,
        timeout_secs: u64,
    ) -> Result<Self, SheetError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| SheetError::NoData(format!("HTTP client: {e}")))?;
        Ok(Self {
            url: url.to_string(),
            layout,
            offset,
            client,
        })
    }

    fn fetch_text(&self) -> Result<String, SheetError> {
        let response = self.client.get(&self.url).send().map_err(|e| {
            if e.is_timeout() {
                SheetError::NoData("sheet request timed out".into())
            } else {
                SheetError::NoData(format!("sheet unreachable: {e}"))
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SheetError::NoData(format!("sheet returned {status}")));
        }
        response
            .text()
            .map_err(|e| SheetError::NoData(format!("sheet body: {e}")))
    }
}

impl SheetSource for HttpSheetSource {
    fn latest(&self) -> Result<SheetReading, SheetError> {
        let text = self.fetch_text()?;
        parse_sheet_text(&text, self.layout, self.offset)
    }
}

/// Build the sheet source for this configuration. Call off the async
/// executor.
pub fn source_from_config(
    sheet: &SheetConfig,
    timeout_secs: u64,
) -> Result<Box<dyn SheetSource>, SheetError> {
    match &sheet.url {
        Some(url) => {
            tracing::info!(layout = sheet.layout.as_str(), "Sheet source enabled");
            Ok(Box::new(HttpSheetSource::new(
                url,
                sheet.layout,
                sheet.utc_offset,
                timeout_secs,
            )?))
        }
        None => Ok(Box::new(NoSheetSource)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_with_public_field_names() {
        let r = SheetReading {
            timestamp: "2024-03-15T00:05:00.000Z".into(),
            systolic: 128,
            diastolic: 84,
            pulse: 72,
        };
        let json = serde_json::to_value(&r).unwrap();
        assert_eq!(json["date"], "2024-03-15T00:05:00.000Z");
        assert_eq!(json["pulseRate"], 72);
    }

    #[test]
    fn unconfigured_source_has_no_data() {
        assert!(matches!(NoSheetSource.latest(), Err(SheetError::NoData(_))));
    }

    #[test]
    fn unreachable_sheet_has_no_data() {
        let source = HttpSheetSource::new(
            "http://127.0.0.1:9/sheet.csv",
            SheetLayout::Split,
            FixedOffset::east_opt(0).unwrap(),
            2,
        )
        .unwrap();
        assert!(matches!(source.latest(), Err(SheetError::NoData(_))));
    }

    /// Serve fixed responses on an ephemeral local port.
    async fn serve_sheet() -> std::net::SocketAddr {
        use axum::http::StatusCode;
        use axum::routing::get;

        let app = axum::Router::new()
            .route("/ok.csv", get(|| async { "15/03/2024,08:05:00,128,84,72" }))
            .route(
                "/broken.csv",
                get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "15/03/2024,08:05:00,128,84,72") }),
            );
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    fn fetch(addr: std::net::SocketAddr, path: &str) -> tokio::task::JoinHandle<Result<SheetReading, SheetError>> {
        let url = format!("http://{addr}{path}");
        tokio::task::spawn_blocking(move || {
            HttpSheetSource::new(&url, SheetLayout::Split, FixedOffset::east_opt(8 * 3600).unwrap(), 2)
                .unwrap()
                .latest()
        })
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn non_success_status_has_no_data() {
        let addr = serve_sheet().await;

        let ok = fetch(addr, "/ok.csv").await.unwrap().unwrap();
        assert_eq!(ok.timestamp, "2024-03-15T00:05:00.000Z");

        // Body is a valid row but the status is not 2xx.
        let server_error = fetch(addr, "/broken.csv").await.unwrap();
        assert!(matches!(server_error, Err(SheetError::NoData(msg)) if msg.contains("500")));

        let missing = fetch(addr, "/missing.csv").await.unwrap();
        assert!(matches!(missing, Err(SheetError::NoData(msg)) if msg.contains("404")));
    }
}
