//! Remote compliance-validation client.
//!
//! Posts generated XML to a network validation service and reports the
//! outcome. This is plain I/O outside the codec core: parse and
//! generate never call it, and timeout/retry policy belongs to the
//! caller.

use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Outcome of a remote validation run.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidationReport {
    /// Whether the document passed all checks.
    pub valid: bool,
    /// Rule violations, empty when `valid`.
    #[serde(default)]
    pub errors: Vec<String>,
    /// Non-fatal findings.
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Error from the validation service.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub enum ValidatorError {
    /// Network or HTTP error.
    Network(String),
    /// The service answered with a non-success status.
    Api(String),
    /// Failed to parse the service response.
    Parse(String),
}

impl fmt::Display for ValidatorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(e) => write!(f, "validator network error: {e}"),
            Self::Api(e) => write!(f, "validator API error: {e}"),
            Self::Parse(e) => write!(f, "validator parse error: {e}"),
        }
    }
}

impl std::error::Error for ValidatorError {}

/// Post document XML to a validation service.
///
/// `document_type` is the UBL root local name ("Invoice", "CreditNote",
/// "ApplicationResponse") and is passed as a query parameter so the
/// service can select its rule set.
///
/// # Errors
///
/// Returns `ValidatorError::Network` on connection issues,
/// `ValidatorError::Api` on non-success HTTP status,
/// `ValidatorError::Parse` on unexpected response formats.
pub async fn check_document(
    endpoint: &str,
    xml: &str,
    document_type: &str,
    timeout: Duration,
) -> Result<ValidationReport, ValidatorError> {
    let client = reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| ValidatorError::Network(e.to_string()))?;

    let resp = client
        .post(endpoint)
        .query(&[("type", document_type)])
        .header(reqwest::header::CONTENT_TYPE, "application/xml")
        .body(xml.to_string())
        .send()
        .await
        .map_err(|e| ValidatorError::Network(e.to_string()))?;

    let status = resp.status();
    let body = resp
        .text()
        .await
        .map_err(|e| ValidatorError::Network(e.to_string()))?;

    if !status.is_success() {
        return Err(ValidatorError::Api(format!("HTTP {status}: {body}")));
    }

    serde_json::from_str(&body).map_err(|e| ValidatorError::Parse(e.to_string()))
}
