//! HTTP utilities for OCI REST API calls

use super::auth::{http_date, OciCredentials};
use anyhow::{Context, Result};
use reqwest::header::{ACCEPT, AUTHORIZATION, DATE};
use reqwest::Client;
use serde_json::Value;
use std::sync::Arc;
use url::Url;

/// Maximum length of response body to log (to avoid logging sensitive data)
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Response header carrying the continuation token of a listing
pub const NEXT_PAGE_HEADER: &str = "opc-next-page";

/// Request header used by Oracle support to correlate a call
pub const REQUEST_ID_HEADER: &str = "opc-request-id";

/// Sanitize response body for logging.
/// Truncates long responses and strips control characters.
pub fn sanitize_for_log(body: &str) -> String {
    let truncated = if body.len() > MAX_LOG_BODY_LENGTH {
        let cut = (0..=MAX_LOG_BODY_LENGTH)
            .rev()
            .find(|i| body.is_char_boundary(*i))
            .unwrap_or(0);
        format!("{}... [truncated, {} bytes total]", &body[..cut], body.len())
    } else {
        body.to_string()
    };

    truncated.replace(|c: char| !c.is_ascii_graphic() && c != ' ', "")
}

/// One decoded response: the JSON body and the next-page token, if any
#[derive(Debug)]
pub struct OciResponse {
    pub body: Value,
    pub next_page: Option<String>,
}

/// Signed HTTP client for OCI API calls
#[derive(Clone)]
pub struct OciHttpClient {
    client: Client,
    credentials: Arc<OciCredentials>,
}

impl OciHttpClient {
    pub fn new(credentials: OciCredentials) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("oci-tf-bootstrap/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            credentials: Arc::new(credentials),
        })
    }

    /// Make a signed GET request
    pub async fn get(&self, url: &Url) -> Result<OciResponse> {
        let request_id = uuid::Uuid::new_v4().simple().to_string().to_uppercase();
        tracing::debug!("GET {} ({}={})", url, REQUEST_ID_HEADER, request_id);

        let date = http_date();
        let authorization = self.credentials.authorization("GET", url, &date)?;

        let response = self
            .client
            .get(url.clone())
            .header(DATE, &date)
            .header(AUTHORIZATION, authorization)
            .header(ACCEPT, "application/json")
            .header(REQUEST_ID_HEADER, &request_id)
            .send()
            .await
            .context("Failed to send request")?;

        let status = response.status();
        let next_page = response
            .headers()
            .get(NEXT_PAGE_HEADER)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.is_empty())
            .map(str::to_string);
        let body = response
            .text()
            .await
            .context("Failed to read response body")?;

        if !status.is_success() {
            // Only log sanitized/truncated error body to avoid leaking sensitive data
            tracing::debug!("API error: {} - {}", status, sanitize_for_log(&body));
            let code = serde_json::from_str::<Value>(&body)
                .ok()
                .and_then(|v| v.get("code").and_then(|c| c.as_str()).map(str::to_string));
            return Err(match code {
                Some(code) => anyhow::anyhow!(
                    "API request failed: {} {} (request id {})",
                    status,
                    code,
                    request_id
                ),
                None => anyhow::anyhow!(
                    "API request failed: {} (request id {})",
                    status,
                    request_id
                ),
            });
        }

        let body = serde_json::from_str(&body).context("Failed to parse response JSON")?;
        Ok(OciResponse { body, next_page })
    }
}

/// HTTP status named in an error produced by [`OciHttpClient::get`]
fn failed_status(error_str: &str) -> Option<u16> {
    error_str
        .split("API request failed: ")
        .nth(1)
        .and_then(|rest| rest.get(..3))
        .and_then(|code| code.parse().ok())
}

/// Format an OCI API error for display
pub fn format_oci_error(error: &anyhow::Error) -> String {
    let error_str = format!("{:#}", error);

    match failed_status(&error_str) {
        Some(401) => {
            return "Authentication failed. Check user, fingerprint and key_file in your OCI config."
                .to_string()
        }
        Some(403) | Some(404) => {
            return "Not authorized or not found. Check the IAM policies for your user."
                .to_string()
        }
        Some(429) => return "Rate limit exceeded. Please try again later.".to_string(),
        Some(400) => return "Invalid request. Check your region and tenancy OCID.".to_string(),
        Some(500..=599) => {
            return "OCI service temporarily unavailable. Please try again.".to_string()
        }
        _ => {}
    }
    if error_str.contains("Failed to send request") {
        return "Request failed. Check your network connection and region.".to_string();
    }

    let sanitized = error_str
        .chars()
        .filter(|c| c.is_ascii_graphic() || *c == ' ')
        .take(120)
        .collect::<String>();

    if sanitized.len() < error_str.len() {
        format!("{}...", sanitized)
    } else {
        sanitized
    }
}
