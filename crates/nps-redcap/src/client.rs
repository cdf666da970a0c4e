//! Blocking client for the records system's HTTP API.

use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{RedcapError, Result};

/// HTTP request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// One exported record: column name to raw encoded value.
pub type RawRecord = BTreeMap<String, String>;

/// Anything that can export records for a set of fields.
pub trait RecordsSource {
    fn fetch_records(&self, fields: &[String]) -> Result<Vec<RawRecord>>;
}

/// Connection settings for one project.
#[derive(Clone, Serialize, Deserialize)]
pub struct RedcapConfig {
    pub uri: String,
    pub token: String,
    /// Verify the server's TLS certificate.
    #[serde(default = "default_verify_tls")]
    pub verify_tls: bool,
}

fn default_verify_tls() -> bool {
    true
}

impl fmt::Debug for RedcapConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RedcapConfig")
            .field("uri", &self.uri)
            .field("token", &"<redacted>")
            .field("verify_tls", &self.verify_tls)
            .finish()
    }
}

/// Client for one project of the records system.
pub struct RedcapClient {
    client: Client,
    config: RedcapConfig,
}

impl RedcapClient {
    pub fn new(config: RedcapConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn uri(&self) -> &str {
        &self.config.uri
    }

    /// Import CSV rows, returning the number of records the server accepted.
    pub fn import_records(&self, csv: &str) -> Result<usize> {
        debug!(uri = %self.config.uri, bytes = csv.len(), "importing records");
        let params = [
            ("token", self.config.token.as_str()),
            ("content", "record"),
            ("format", "csv"),
            ("type", "flat"),
            ("overwriteBehavior", "normal"),
            ("data", csv),
            ("returnContent", "count"),
            ("returnFormat", "json"),
        ];
        let response = self.client.post(&self.config.uri).form(&params).send()?;
        let status = response.status().as_u16();
        let body = response.text()?;
        let count = import_outcome(status, &body)?;
        info!(uri = %self.config.uri, count, "records imported");
        Ok(count)
    }
}

impl RecordsSource for RedcapClient {
    fn fetch_records(&self, fields: &[String]) -> Result<Vec<RawRecord>> {
        debug!(uri = %self.config.uri, fields = fields.len(), "exporting records");
        let fields = fields.join(",");
        let params = [
            ("token", self.config.token.as_str()),
            ("content", "record"),
            ("format", "json"),
            ("type", "flat"),
            ("fields", fields.as_str()),
            ("rawOrLabel", "raw"),
            ("rawOrLabelHeaders", "raw"),
            ("exportCheckboxLabel", "false"),
            ("exportSurveyFields", "false"),
            ("exportDataAccessGroups", "false"),
            ("returnFormat", "json"),
        ];
        let response = self.client.post(&self.config.uri).form(&params).send()?;
        let status = response.status();
        let body = response.text()?;
        if !status.is_success() {
            return Err(RedcapError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }
        let records = decode_records(&body)?;
        info!(uri = %self.config.uri, records = records.len(), "records exported");
        Ok(records)
    }
}

/// Decode a JSON export into raw string records.
pub fn decode_records(body: &str) -> Result<Vec<RawRecord>> {
    let rows: Vec<BTreeMap<String, Value>> = serde_json::from_str(body)?;
    Ok(rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|(name, value)| (name, value_text(value)))
                .collect()
        })
        .collect())
}

fn value_text(value: Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text,
        other => other.to_string(),
    }
}

/// Interpret an import response: 200 carries a count, 400 an error payload.
pub fn import_outcome(status: u16, body: &str) -> Result<usize> {
    match status {
        200 => {
            let payload: Value = serde_json::from_str(body)?;
            let count = match payload.get("count") {
                Some(Value::Number(n)) => n.as_u64(),
                Some(Value::String(s)) => s.trim().parse().ok(),
                _ => None,
            };
            count
                .and_then(|n| usize::try_from(n).ok())
                .ok_or_else(|| RedcapError::Status {
                    status,
                    message: format!("import response has no count: {body}"),
                })
        }
        400 => Err(RedcapError::Rejected {
            message: error_message(body),
        }),
        _ => Err(RedcapError::Status {
            status,
            message: error_message(body),
        }),
    }
}

fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|payload| payload.get("error").and_then(Value::as_str).map(String::from))
        .unwrap_or_else(|| body.trim().to_string())
}
