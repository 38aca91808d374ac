//! Client for reading the duty sheet through the Google Sheets v4 API.
//!
//! Authenticates with a service-account JSON key (the sheet must be shared
//! with the service account's `client_email`) and fetches the raw cell
//! values of one worksheet tab. Transient failures are retried with
//! exponential backoff within a single fetch cycle; auth and not-found
//! failures are surfaced immediately.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::SheetError;

/// Base URL for the Sheets values endpoint.
const SHEETS_BASE_URL: &str = "https://sheets.googleapis.com";

/// Read-only scope - this service never writes back to the sheet.
const SHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";

/// Per-attempt HTTP request timeout in seconds.
/// 30s allows for slow API responses while keeping a refresh cycle bounded.
const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Total attempts per fetch cycle for transient failures (timeouts, 429, 5xx).
const MAX_FETCH_ATTEMPTS: u32 = 3;

/// Initial backoff delay in milliseconds between retries.
const INITIAL_BACKOFF_MS: u64 = 1000;

/// Shape of the Sheets v4 values response. Cells arrive untyped; the
/// roster parser does all validation.
#[derive(Debug, Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

/// Sheets API client.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct SheetsClient {
    client: reqwest::Client,
    credentials_file: PathBuf,
    spreadsheet_id: String,
    base_url: Url,
    #[cfg(test)]
    test_token: Option<String>,
}

impl SheetsClient {
    pub fn new(sheet_url: &str, credentials_file: &Path) -> Result<Self, SheetError> {
        let spreadsheet_id = spreadsheet_id_from_url(sheet_url)?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| SheetError::InvalidResponse(e.to_string()))?;
        let base_url = Url::parse(SHEETS_BASE_URL)
            .map_err(|e| SheetError::InvalidResponse(e.to_string()))?;

        Ok(Self {
            client,
            credentials_file: credentials_file.to_path_buf(),
            spreadsheet_id,
            base_url,
            #[cfg(test)]
            test_token: None,
        })
    }

    /// Fetch the raw rows of one worksheet tab.
    ///
    /// Transient errors are retried up to [`MAX_FETCH_ATTEMPTS`] times with
    /// exponential backoff; exhausting retries fails this cycle only.
    pub async fn fetch_rows(&self, tab: &str) -> Result<Vec<Vec<String>>, SheetError> {
        let url = self.values_url(tab)?;

        let mut attempt = 1;
        let mut backoff_ms = INITIAL_BACKOFF_MS;

        loop {
            match self.try_fetch(&url).await {
                Ok(rows) => {
                    debug!(tab = tab, rows = rows.len(), "Fetched sheet values");
                    return Ok(rows);
                }
                Err(e) if e.is_retryable() && attempt < MAX_FETCH_ATTEMPTS => {
                    warn!(
                        tab = tab,
                        attempt = attempt,
                        backoff_ms = backoff_ms,
                        error = %e,
                        "Transient fetch error, backing off"
                    );
                    tokio::time::sleep(Duration::from_millis(backoff_ms)).await;
                    backoff_ms *= 2;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// One attempt: token grant plus the values request. Both stages sit
    /// inside the retry loop, so a network outage that hits the token
    /// round-trip first is retried like any other transient failure.
    async fn try_fetch(&self, url: &Url) -> Result<Vec<Vec<String>>, SheetError> {
        let token = self.access_token().await?;

        let response = self
            .client
            .get(url.clone())
            .bearer_auth(token)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SheetError::from_status(status, &body));
        }

        let parsed: ValuesResponse = response
            .json()
            .await
            .map_err(|e| SheetError::InvalidResponse(format!("bad values payload: {}", e)))?;

        Ok(parsed
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_to_string).collect())
            .collect())
    }

    /// Obtain a bearer token from the service-account key.
    ///
    /// The authenticator is built per attempt; the token grant is a couple
    /// of round trips a minute, which keeps the client free of oauth
    /// client state.
    async fn access_token(&self) -> Result<String, SheetError> {
        #[cfg(test)]
        if let Some(token) = &self.test_token {
            return Ok(token.clone());
        }

        let key = yup_oauth2::read_service_account_key(&self.credentials_file)
            .await
            .map_err(|e| {
                SheetError::Auth(format!(
                    "cannot read service account key {}: {}",
                    self.credentials_file.display(),
                    e
                ))
            })?;

        let auth = yup_oauth2::ServiceAccountAuthenticator::builder(key)
            .build()
            .await
            .map_err(|e| SheetError::Auth(format!("authenticator setup failed: {}", e)))?;

        let token = auth
            .token(&[SHEETS_SCOPE])
            .await
            .map_err(classify_token_error)?;

        token
            .token()
            .map(str::to_string)
            .ok_or_else(|| SheetError::Auth("token response contained no access token".to_string()))
    }

    fn values_url(&self, tab: &str) -> Result<Url, SheetError> {
        let mut url = self.base_url.clone();
        // Url::path_segments_mut percent-encodes the Cyrillic tab name.
        url.path_segments_mut()
            .map_err(|_| SheetError::InvalidResponse("base url cannot be a base".to_string()))?
            .extend(["v4", "spreadsheets", self.spreadsheet_id.as_str(), "values", tab]);
        Ok(url)
    }

    #[cfg(test)]
    fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = Url::parse(base_url).unwrap();
        self
    }

    #[cfg(test)]
    fn with_static_token(mut self, token: &str) -> Self {
        self.test_token = Some(token.to_string());
        self
    }
}

/// Map a token-grant failure onto the fetch taxonomy: a rejected grant or
/// a grant without an access token is a credentials problem; transport
/// and decoding failures on the token round-trip are transient.
fn classify_token_error(e: yup_oauth2::Error) -> SheetError {
    match &e {
        yup_oauth2::Error::AuthError(_) | yup_oauth2::Error::MissingAccessToken => {
            SheetError::Auth(format!("token grant rejected: {}", e))
        }
        _ => SheetError::Transient(format!("token grant failed: {}", e)),
    }
}

/// Extract the spreadsheet id from a full sheet URL
/// (`https://docs.google.com/spreadsheets/d/{id}/edit#...`).
pub fn spreadsheet_id_from_url(sheet_url: &str) -> Result<String, SheetError> {
    let rest = sheet_url
        .split_once("/d/")
        .map(|(_, rest)| rest)
        .ok_or_else(|| {
            SheetError::NotFound(format!("no spreadsheet id in url: {}", sheet_url))
        })?;

    let id: String = rest
        .chars()
        .take_while(|c| c.is_ascii_alphanumeric() || *c == '-' || *c == '_')
        .collect();

    if id.is_empty() {
        return Err(SheetError::NotFound(format!(
            "no spreadsheet id in url: {}",
            sheet_url
        )));
    }
    Ok(id)
}

fn cell_to_string(cell: Value) -> String {
    match cell {
        Value::String(s) => s,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
