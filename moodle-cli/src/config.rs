//! Configuration resolution from CLI args

use crate::cli::Args;
use crate::error::CliError;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable naming the credentials file
pub const CREDENTIALS_ENV: &str = "MOODLE_CREDENTIALS";

/// Resolved runtime configuration
#[derive(Debug)]
pub struct Config {
    /// Credentials file to load
    pub credentials_path: PathBuf,
    /// Request timeout
    pub timeout: Duration,
    /// Whether to skip TLS certificate verification
    pub insecure: bool,
}

impl Config {
    /// Build config from CLI args, resolving the credentials location
    pub fn from_args(args: &Args) -> Result<Self, CliError> {
        let credentials_path = resolve_credentials_path(
            args.credentials.as_deref(),
            std::env::var(CREDENTIALS_ENV).ok(),
        )?;

        Ok(Config {
            credentials_path,
            timeout: Duration::from_secs(args.timeout),
            insecure: args.insecure,
        })
    }
}

/// Pick the credentials file: explicit flag, then environment, then
/// `<config dir>/moodle/credentials.toml`
fn resolve_credentials_path(
    explicit: Option<&Path>,
    from_env: Option<String>,
) -> Result<PathBuf, CliError> {
    if let Some(path) = explicit {
        return Ok(expand_tilde(path));
    }
    if let Some(path) = from_env.filter(|p| !p.is_empty()) {
        return Ok(expand_tilde(Path::new(&path)));
    }
    dirs::config_dir()
        .map(|dir| dir.join("moodle").join("credentials.toml"))
        .ok_or_else(|| {
            CliError::Config(format!(
                "No credentials file given; pass --credentials or set {}",
                CREDENTIALS_ENV
            ))
        })
}

/// Expand ~ to home directory
fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(path_str) = path.to_str()
        && (path_str.starts_with("~/") || path_str == "~")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(path_str.trim_start_matches('~').trim_start_matches('/'));
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_explicit_path_wins() {
        let path = resolve_credentials_path(
            Some(Path::new("/etc/moodle.toml")),
            Some("/other.toml".to_string()),
        )
        .unwrap();
        assert_eq!(path, PathBuf::from("/etc/moodle.toml"));
    }

    #[test]
    fn test_env_path_used_when_no_flag() {
        let path = resolve_credentials_path(None, Some("/srv/creds.toml".to_string())).unwrap();
        assert_eq!(path, PathBuf::from("/srv/creds.toml"));
    }

    #[test]
    fn test_default_path() {
        if let Some(dir) = dirs::config_dir() {
            let path = resolve_credentials_path(None, Some(String::new())).unwrap();
            assert_eq!(path, dir.join("moodle").join("credentials.toml"));
        }
    }

    #[test]
    fn test_expand_tilde() {
        assert_eq!(expand_tilde(Path::new("/abs/path")), PathBuf::from("/abs/path"));
        assert_eq!(expand_tilde(Path::new("rel/path")), PathBuf::from("rel/path"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(
                expand_tilde(Path::new("~/moodle/creds.toml")),
                home.join("moodle/creds.toml")
            );
            assert_eq!(expand_tilde(Path::new("~")), home);
        }
    }

    #[test]
    fn test_from_args() {
        let args = Args::try_parse_from([
            "moodle",
            "--credentials",
            "/tmp/c.toml",
            "--timeout",
            "7",
            "--insecure",
            "functions",
        ])
        .unwrap();
        let config = Config::from_args(&args).unwrap();

        assert_eq!(config.credentials_path, PathBuf::from("/tmp/c.toml"));
        assert_eq!(config.timeout, Duration::from_secs(7));
        assert!(config.insecure);
    }
}
