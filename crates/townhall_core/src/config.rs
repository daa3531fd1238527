use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
pub const API_URL_ENV: &str = "TOWNHALL_API_URL";
pub const CONFIG_PATH_ENV: &str = "TOWNHALL_CONFIG";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    /// `None` leaves the HTTP client's own default in place.
    pub timeout: Option<Duration>,
    pub session_path: PathBuf,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    api: ApiSection,
    #[serde(default)]
    session: SessionSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct ApiSection {
    base_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct SessionSection {
    path: Option<PathBuf>,
}

impl ClientConfig {
    /// Loads `townhall.toml`. An explicit path must exist; the default
    /// location may be absent, in which case defaults apply.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let home = env::var_os("HOME").map(PathBuf::from);
        let from_env = env::var_os(CONFIG_PATH_ENV).map(PathBuf::from);

        let file = match explicit.map(Path::to_path_buf).or(from_env) {
            Some(path) => read_config(&path)?,
            None => match home.as_deref().map(default_config_path) {
                Some(path) if path.exists() => read_config(&path)?,
                _ => ConfigFile::default(),
            },
        };

        resolve(file, env::var(API_URL_ENV).ok(), home.as_deref())
    }

    pub fn from_toml_str(raw: &str, home: Option<&Path>) -> Result<Self> {
        let file: ConfigFile = toml::from_str(raw)?;
        resolve(file, None, home)
    }
}

pub fn default_config_path(home: &Path) -> PathBuf {
    home.join(".townhall").join("townhall.toml")
}

pub fn default_session_path(home: Option<&Path>) -> PathBuf {
    home.map(Path::to_path_buf)
        .unwrap_or_default()
        .join(".townhall")
        .join("session.db")
}

fn read_config(path: &Path) -> Result<ConfigFile> {
    let raw = fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
}

fn resolve(file: ConfigFile, env_url: Option<String>, home: Option<&Path>) -> Result<ClientConfig> {
    let base_url = env_url
        .filter(|url| !url.trim().is_empty())
        .or(file.api.base_url)
        .unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
    let base_url = base_url.trim().trim_end_matches('/').to_string();
    if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
        return Err(anyhow!("api base_url must be an http(s) URL, got `{base_url}`"));
    }

    Ok(ClientConfig {
        base_url,
        timeout: file.api.timeout_secs.map(Duration::from_secs),
        session_path: file
            .session
            .path
            .unwrap_or_else(|| default_session_path(home)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_file_gives_defaults() {
        let config = ClientConfig::from_toml_str("", Some(Path::new("/home/ana"))).unwrap();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, None);
        assert_eq!(
            config.session_path,
            PathBuf::from("/home/ana/.townhall/session.db")
        );
    }

    #[test]
    fn file_values_are_used_and_trailing_slash_dropped() {
        let raw = r#"
            [api]
            base_url = "https://townhall.example.org/api/"
            timeout_secs = 15

            [session]
            path = "/tmp/th.db"
        "#;
        let config = ClientConfig::from_toml_str(raw, None).unwrap();
        assert_eq!(config.base_url, "https://townhall.example.org/api");
        assert_eq!(config.timeout, Some(Duration::from_secs(15)));
        assert_eq!(config.session_path, PathBuf::from("/tmp/th.db"));
    }

    #[test]
    fn env_url_beats_file() {
        let file: ConfigFile =
            toml::from_str("[api]\nbase_url = \"http://file:8000/api\"").unwrap();
        let config = resolve(file, Some("http://env:9000/api".into()), None).unwrap();
        assert_eq!(config.base_url, "http://env:9000/api");
    }

    #[test]
    fn non_http_url_is_rejected() {
        let err = ClientConfig::from_toml_str("[api]\nbase_url = \"ftp://x\"", None).unwrap_err();
        assert!(err.to_string().contains("http(s)"));
    }

    #[test]
    fn explicit_config_file_is_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("townhall.toml");
        fs::write(&path, "[api]\ntimeout_secs = 3\n").unwrap();
        let file = read_config(&path).unwrap();
        assert_eq!(file.api.timeout_secs, Some(3));
        assert!(read_config(&dir.path().join("missing.toml")).is_err());
    }
}
