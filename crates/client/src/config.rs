use std::path::PathBuf;

/// Default backend base URL for local development.
pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Default directory holding the persisted session.
pub const DEFAULT_STATE_DIR: &str = ".platformops";

/// Client configuration loaded from environment variables.
///
/// All fields have defaults suitable for a backend running locally.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientConfig {
    /// Backend base URL; every API path is joined onto it.
    pub api_url: String,
    /// Directory of the session file (the local storage analogue).
    pub state_dir: PathBuf,
    /// Components shown in the analytics health section.
    pub health_components: Vec<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.into(),
            state_dir: PathBuf::from(DEFAULT_STATE_DIR),
            health_components: vec!["C1".into(), "C6".into()],
        }
    }
}

impl ClientConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                         | Default                 |
    /// |---------------------------------|-------------------------|
    /// | `PLATFORMOPS_API_URL`           | `http://localhost:8000` |
    /// | `PLATFORMOPS_STATE_DIR`         | `.platformops`          |
    /// | `PLATFORMOPS_HEALTH_COMPONENTS` | `C1,C6`                 |
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let api_url = std::env::var("PLATFORMOPS_API_URL").unwrap_or(defaults.api_url);

        let state_dir = std::env::var("PLATFORMOPS_STATE_DIR")
            .map(PathBuf::from)
            .unwrap_or(defaults.state_dir);

        let health_components = std::env::var("PLATFORMOPS_HEALTH_COMPONENTS")
            .ok()
            .map(|raw| parse_list(&raw))
            .filter(|list| !list.is_empty())
            .unwrap_or(defaults.health_components);

        Self {
            api_url,
            state_dir,
            health_components,
        }
    }

    /// Path of the session file inside [`state_dir`](Self::state_dir).
    pub fn session_path(&self) -> PathBuf {
        self.state_dir.join("session.json")
    }
}

/// Split a comma-separated list, trimming entries and dropping empty ones.
pub fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
