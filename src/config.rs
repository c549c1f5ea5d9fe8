use crate::composer::{ComposeOptions, Persona};
use crate::email::DEFAULT_SUBJECT;
use crate::formatter::DEFAULT_DATE_FORMAT;
use crate::openai_client::{DEFAULT_MODEL, DEFAULT_TEMPERATURE};
use crate::sheets_client::SheetsAuth;
use chrono::format::{Item, StrftimeItems};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "pixel_digest.toml";

pub const ENV_SHEETS_TOKEN: &str = "GOOGLE_SHEETS_TOKEN";
pub const ENV_SHEETS_API_KEY: &str = "GOOGLE_SHEETS_API_KEY";
pub const ENV_OPENAI_API_KEY: &str = "OPENAI_API_KEY";
pub const ENV_SMTP_PASSWORD: &str = "SMTP_PASSWORD";
pub const ENV_GMAIL_APP_PASSWORD: &str = "GMAIL_APP_PASSWORD";
pub const ENV_RECIPIENT: &str = "DIGEST_RECIPIENT";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Config file {0} not found. Run with --setup first.")]
    NotFound(PathBuf),

    #[error("Could not access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Could not write config: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("Missing {0}: set it in the config file or the environment")]
    MissingCredential(&'static str),

    #[error("Invalid date format {0:?}")]
    InvalidDateFormat(String),
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct SheetConfig {
    pub spreadsheet_id: String,
    pub range: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for SheetConfig {
    fn default() -> Self {
        SheetConfig {
            spreadsheet_id: "your_spreadsheet_id".to_string(),
            range: "Sheet1".to_string(),
            access_token: None,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub model: String,
    pub temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        GenerationConfig {
            api_key: None,
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            base_url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct EmailConfig {
    pub smtp_server: String,
    pub smtp_port: u16,
    pub username: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    pub from_email: String,
    pub to_email: String,
    pub subject: String,
}

impl Default for EmailConfig {
    fn default() -> Self {
        EmailConfig {
            smtp_server: "smtp.gmail.com".to_string(),
            smtp_port: 587,
            username: "your_email@gmail.com".to_string(),
            password: None,
            from_email: "your_email@gmail.com".to_string(),
            to_email: "your_email@gmail.com".to_string(),
            subject: DEFAULT_SUBJECT.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DigestConfig {
    pub date_format: String,
    #[serde(flatten)]
    pub persona: Persona,
    #[serde(flatten)]
    pub compose: ComposeOptions,
}

impl Default for DigestConfig {
    fn default() -> Self {
        DigestConfig {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            persona: Persona::default(),
            compose: ComposeOptions::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    pub sheet: SheetConfig,
    pub generation: GenerationConfig,
    pub email: EmailConfig,
    pub digest: DigestConfig,
}

impl AppConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: AppConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Writes a template config and refuses to clobber an existing one.
    pub fn write_default(path: &Path) -> Result<(), ConfigError> {
        if path.exists() {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::AlreadyExists, "config file already exists"),
            });
        }

        let toml_content = toml::to_string_pretty(&AppConfig::default())?;
        fs::write(path, toml_content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let bad_format = StrftimeItems::new(&self.digest.date_format).any(|item| matches!(item, Item::Error));
        if bad_format {
            return Err(ConfigError::InvalidDateFormat(self.digest.date_format.clone()));
        }
        Ok(())
    }

    /// Overlays credentials and the recipient from the environment. Values
    /// that are set but blank are ignored.
    pub fn apply_env<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(token) = get(ENV_SHEETS_TOKEN) {
            self.sheet.access_token = Some(token);
        }
        if let Some(key) = get(ENV_SHEETS_API_KEY) {
            self.sheet.api_key = Some(key);
        }
        if let Some(key) = get(ENV_OPENAI_API_KEY) {
            self.generation.api_key = Some(key);
        }
        if let Some(password) = get(ENV_SMTP_PASSWORD).or_else(|| get(ENV_GMAIL_APP_PASSWORD)) {
            self.email.password = Some(password);
        }
        if let Some(recipient) = get(ENV_RECIPIENT) {
            self.email.to_email = recipient;
        }
    }

    pub fn apply_process_env(&mut self) {
        self.apply_env(|key| std::env::var(key).ok());
    }

    /// A bearer token wins over an API key when both are present.
    pub fn sheets_auth(&self) -> Result<SheetsAuth, ConfigError> {
        match (&self.sheet.access_token, &self.sheet.api_key) {
            (Some(token), _) => Ok(SheetsAuth::BearerToken(token.clone())),
            (None, Some(key)) => Ok(SheetsAuth::ApiKey(key.clone())),
            (None, None) => Err(ConfigError::MissingCredential("spreadsheet access token or API key")),
        }
    }

    pub fn generation_api_key(&self) -> Result<&str, ConfigError> {
        self.generation
            .api_key
            .as_deref()
            .ok_or(ConfigError::MissingCredential("OpenAI API key"))
    }

    pub fn smtp_password(&self) -> Result<&str, ConfigError> {
        self.email
            .password
            .as_deref()
            .ok_or(ConfigError::MissingCredential("SMTP password"))
    }
}

pub fn default_config_path(working_dir: &Path) -> PathBuf {
    working_dir.join(DEFAULT_CONFIG_FILE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatter::Rendering;
    use std::collections::HashMap;

    #[test]
    fn test_default_round_trips_through_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join(DEFAULT_CONFIG_FILE);

        AppConfig::write_default(&path).unwrap();
        let loaded = AppConfig::load(&path).unwrap();
        assert_eq!(loaded, AppConfig::default());

        assert!(AppConfig::write_default(&path).is_err());
    }

    #[test]
    fn test_partial_config_fills_defaults() {
        let config: AppConfig = toml::from_str(
            r#"
            [sheet]
            spreadsheet_id = "abc123"

            [email]
            to_email = "amy@example.com"

            [digest]
            include_later = false
            upcoming = "summary"
            assistant_name = "Byte"
            "#,
        )
        .unwrap();

        assert_eq!(config.sheet.spreadsheet_id, "abc123");
        assert_eq!(config.sheet.range, "Sheet1");
        assert_eq!(config.email.smtp_port, 587);
        assert_eq!(config.email.to_email, "amy@example.com");
        assert!(!config.digest.compose.include_later);
        assert_eq!(config.digest.compose.upcoming, Rendering::Summary);
        assert_eq!(config.digest.compose.overdue, Rendering::Itemized);
        assert_eq!(config.digest.persona.assistant_name, "Byte");
        assert_eq!(config.digest.persona.owner_name, "Amy");
        assert_eq!(config.generation.model, "gpt-4o");
    }

    #[test]
    fn test_missing_file() {
        let err = AppConfig::load(Path::new("/nonexistent/pixel_digest.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn test_invalid_date_format_rejected() {
        let mut config = AppConfig::default();
        config.digest.date_format = "%Q".to_string();
        assert!(matches!(config.validate(), Err(ConfigError::InvalidDateFormat(_))));
    }

    #[test]
    fn test_env_overrides() {
        let env: HashMap<&str, &str> = HashMap::from([
            (ENV_SHEETS_API_KEY, "sheet-key"),
            (ENV_OPENAI_API_KEY, "sk-test"),
            (ENV_GMAIL_APP_PASSWORD, "app-password"),
            (ENV_RECIPIENT, "amy@example.com"),
            (ENV_SHEETS_TOKEN, "  "),
        ]);

        let mut config = AppConfig::default();
        assert!(config.sheets_auth().is_err());
        assert!(config.generation_api_key().is_err());
        assert!(config.smtp_password().is_err());

        config.apply_env(|key| env.get(key).map(|v| v.to_string()));

        assert!(matches!(config.sheets_auth().unwrap(), SheetsAuth::ApiKey(k) if k == "sheet-key"));
        assert_eq!(config.generation_api_key().unwrap(), "sk-test");
        assert_eq!(config.smtp_password().unwrap(), "app-password");
        assert_eq!(config.email.to_email, "amy@example.com");
    }

    #[test]
    fn test_bearer_token_preferred() {
        let mut config = AppConfig::default();
        config.sheet.api_key = Some("key".to_string());
        config.sheet.access_token = Some("token".to_string());
        assert!(matches!(config.sheets_auth().unwrap(), SheetsAuth::BearerToken(t) if t == "token"));
    }
}
