use crate::sheets_types::{SheetData, SheetExport, ValueRange};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

const API_BASE_URL: &str = "https://sheets.googleapis.com/v4";

#[derive(Error, Debug)]
pub enum SourceError {
    #[error("Authentication failed: {0}")]
    AuthError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Spreadsheet not found: {0}")]
    SheetNotFound(String),

    #[error("API error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Could not read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed sheet export: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// Where the task rows come from.
#[async_trait]
pub trait SheetSource: Send + Sync {
    async fn fetch(&self) -> Result<SheetData, SourceError>;

    fn describe(&self) -> String;
}

#[derive(Debug, Clone)]
pub enum SheetsAuth {
    BearerToken(String),
    ApiKey(String),
}

pub struct GoogleSheetsClient {
    client: Client,
    auth: SheetsAuth,
    spreadsheet_id: String,
    range: String,
    base_url: String,
}

impl GoogleSheetsClient {
    pub fn new(auth: SheetsAuth, spreadsheet_id: String, range: String) -> Result<Self, SourceError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(GoogleSheetsClient {
            client,
            auth,
            spreadsheet_id,
            range,
            base_url: API_BASE_URL.to_string(),
        })
    }

    #[cfg(test)]
    fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn values_url(&self) -> String {
        format!(
            "{}/spreadsheets/{}/values/{}",
            self.base_url, self.spreadsheet_id, self.range
        )
    }

    async fn get_values(&self) -> Result<ValueRange, SourceError> {
        let mut request = self
            .client
            .get(self.values_url())
            .query(&[("valueRenderOption", "FORMATTED_VALUE"), ("majorDimension", "ROWS")]);

        request = match &self.auth {
            SheetsAuth::BearerToken(token) => request.header("Authorization", format!("Bearer {}", token)),
            SheetsAuth::ApiKey(key) => request.query(&[("key", key.as_str())]),
        };

        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response.json::<ValueRange>().await?);
        }
        let body = response.text().await.unwrap_or_default();
        Err(error_for_status(status, &self.spreadsheet_id, body))
    }
}

fn error_for_status(status: StatusCode, spreadsheet_id: &str, body: String) -> SourceError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => SourceError::AuthError(format!(
            "Sheets API rejected the credentials ({})",
            status
        )),
        StatusCode::NOT_FOUND => SourceError::SheetNotFound(spreadsheet_id.to_string()),
        _ => SourceError::ApiError {
            status: status.as_u16(),
            message: body,
        },
    }
}

#[async_trait]
impl SheetSource for GoogleSheetsClient {
    async fn fetch(&self) -> Result<SheetData, SourceError> {
        let values = self.get_values().await?;
        Ok(SheetData::Rows(values.into_rows()))
    }

    fn describe(&self) -> String {
        format!("Google Sheets {} ({})", self.spreadsheet_id, self.range)
    }
}

/// Reads a JSON export of the sheet from disk.
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        JsonFileSource { path: path.into() }
    }
}

#[async_trait]
impl SheetSource for JsonFileSource {
    async fn fetch(&self) -> Result<SheetData, SourceError> {
        let content = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| SourceError::Io {
                path: self.path.clone(),
                source,
            })?;
        let export: SheetExport = serde_json::from_str(&content)?;
        Ok(export.into())
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}
