//! Credential loading and validation

use crate::error::ConfigError;
use serde::Deserialize;
use std::fmt;
use std::path::Path;
use zeroize::Zeroizing;

/// Response format requested from the REST server
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RestFormat {
    /// `moodlewsrestformat=json`
    #[default]
    Json,
    /// Moodle's default XML format
    Xml,
}

impl RestFormat {
    /// Interpret a configured format value. Anything other than `xml` is JSON.
    pub fn from_config(value: &str) -> Self {
        if value == "xml" {
            RestFormat::Xml
        } else {
            RestFormat::Json
        }
    }

    /// The name used in configuration files
    pub fn as_str(self) -> &'static str {
        match self {
            RestFormat::Json => "json",
            RestFormat::Xml => "xml",
        }
    }
}

/// Site URL, webservice token and response format for a Moodle site
///
/// Immutable once built. The token is zeroized on drop and never shown by
/// the `Debug` implementation.
#[derive(Clone)]
pub struct Credentials {
    url: reqwest::Url,
    token: Zeroizing<String>,
    format: RestFormat,
}

#[derive(Deserialize)]
struct CredentialsFile {
    moodle_api: Option<Section>,
}

#[derive(Deserialize, Default)]
struct Section {
    url: Option<String>,
    token: Option<String>,
    rest_format: Option<String>,
}

impl Credentials {
    /// Build credentials from a site URL and a webservice token
    ///
    /// # Errors
    ///
    /// * `ConfigError::EmptyField` - `url` or `token` is empty
    /// * `ConfigError::InvalidUrl` - `url` is not an absolute http(s) URL
    ///
    /// # Example
    ///
    /// ```
    /// use moodle_ws_client::{Credentials, RestFormat};
    ///
    /// let credentials = Credentials::new("https://moodle.example.com", "abc123")
    ///     .unwrap()
    ///     .with_format(RestFormat::Xml);
    /// assert_eq!(credentials.format(), RestFormat::Xml);
    /// ```
    pub fn new(url: &str, token: &str) -> Result<Self, ConfigError> {
        let url = url.trim();
        if url.is_empty() {
            return Err(ConfigError::EmptyField("url"));
        }
        if token.is_empty() {
            return Err(ConfigError::EmptyField("token"));
        }

        let parsed = reqwest::Url::parse(url).map_err(|e| ConfigError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?;
        if parsed.cannot_be_a_base() || !matches!(parsed.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidUrl {
                url: url.to_string(),
                reason: "expected an http or https site address".to_string(),
            });
        }

        Ok(Self {
            url: parsed,
            token: Zeroizing::new(token.to_string()),
            format: RestFormat::Json,
        })
    }

    /// Replace the response format
    pub fn with_format(mut self, format: RestFormat) -> Self {
        self.format = format;
        self
    }

    /// Load credentials from a file containing a `[moodle_api]` table
    ///
    /// ```toml
    /// [moodle_api]
    /// url = "https://moodle.example.com"
    /// token = "0123456789abcdef"
    /// rest_format = "json"
    /// ```
    ///
    /// # Errors
    ///
    /// * `ConfigError::NotFound` - the file does not exist
    /// * `ConfigError::Io` - the file could not be read
    /// * any error from [`Credentials::from_toml_str`]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::NotFound {
                path: path.to_path_buf(),
            });
        }

        let contents = Zeroizing::new(std::fs::read_to_string(path)?);
        let credentials = Self::from_toml_str(&contents)?;
        tracing::debug!(
            path = %path.display(),
            url = %credentials.url,
            format = credentials.format.as_str(),
            "Loaded Moodle credentials"
        );
        Ok(credentials)
    }

    /// Parse credentials from the contents of a credentials file
    ///
    /// # Errors
    ///
    /// * `ConfigError::Parse` - the text is not valid TOML
    /// * `ConfigError::MissingSection` - no non-empty `moodle_api` table
    /// * `ConfigError::EmptyField` - `url` or `token` missing or empty
    /// * `ConfigError::InvalidUrl` - `url` is not usable as a site address
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        let file: CredentialsFile = toml::from_str(contents)?;
        let section = file.moodle_api.ok_or(ConfigError::MissingSection)?;

        if section.url.is_none() && section.token.is_none() && section.rest_format.is_none() {
            return Err(ConfigError::MissingSection);
        }

        let url = section.url.unwrap_or_default();
        let token = Zeroizing::new(section.token.unwrap_or_default());
        let format = section
            .rest_format
            .as_deref()
            .map(RestFormat::from_config)
            .unwrap_or_default();

        Ok(Self::new(&url, &token)?.with_format(format))
    }

    /// The site base URL
    pub fn url(&self) -> &reqwest::Url {
        &self.url
    }

    /// The webservice token
    pub fn token(&self) -> &str {
        &self.token
    }

    /// The requested response format
    pub fn format(&self) -> RestFormat {
        self.format
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("url", &self.url.as_str())
            .field("token", &"<redacted>")
            .field("format", &self.format)
            .finish()
    }
}
