use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};

/// Intake server address used when none is configured.
pub const DEFAULT_INTAKE_URL: &str = "http://localhost:5000";

/// Per-user settings read from `config.toml`.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UserConfig {
    #[serde(default)]
    pub vault_dir: Option<PathBuf>,
    #[serde(default)]
    pub intake_url: Option<String>,
    #[serde(default)]
    pub output: Option<String>,
}

/// Command-line values that take precedence over env and file settings.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub vault_dir: Option<PathBuf>,
    pub intake_url: Option<String>,
    pub json: bool,
}

/// Fully resolved settings, built once at startup and passed by reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Config {
    pub vault_dir: PathBuf,
    pub intake_url: String,
    pub resolved_output: String,
}

impl Config {
    /// A config rooted at `vault_dir` with default everything else.
    pub fn for_vault(vault_dir: impl Into<PathBuf>) -> Self {
        Self {
            vault_dir: vault_dir.into(),
            intake_url: DEFAULT_INTAKE_URL.to_string(),
            resolved_output: "text".to_string(),
        }
    }

    pub fn todo_dir(&self) -> PathBuf {
        self.vault_dir.join("todos")
    }

    pub fn done_dir(&self) -> PathBuf {
        self.vault_dir.join("done")
    }

    pub fn projects_dir(&self) -> PathBuf {
        self.vault_dir.join("projects")
    }

    pub fn ref_dir(&self) -> PathBuf {
        self.vault_dir.join("ref")
    }

    pub fn files_dir(&self) -> PathBuf {
        self.vault_dir.join("files")
    }

    pub fn inbox_dir(&self) -> PathBuf {
        self.vault_dir.join("inbox")
    }

    /// Every subdirectory a vault is expected to have.
    pub fn required_dirs(&self) -> [PathBuf; 6] {
        [
            self.todo_dir(),
            self.done_dir(),
            self.projects_dir(),
            self.ref_dir(),
            self.files_dir(),
            self.inbox_dir(),
        ]
    }
}

/// `$TED_CONFIG`, else `<config_dir>/ted/config.toml`.
pub fn user_config_path() -> Option<PathBuf> {
    if let Some(path) = env::var_os("TED_CONFIG") {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join("ted/config.toml"))
}

/// Load the user config. A missing file yields defaults.
///
/// # Errors
///
/// Fails if the file exists but cannot be read or is not valid TOML.
pub fn load_user_config(path: Option<&Path>) -> Result<UserConfig> {
    let Some(path) = path else {
        return Ok(UserConfig::default());
    };
    if !path.exists() {
        return Ok(UserConfig::default());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    toml::from_str::<UserConfig>(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))
}

/// Resolve the effective config from flags, environment and the user file.
///
/// # Errors
///
/// Fails if the user config file is present but malformed.
pub fn resolve_config(overrides: Overrides) -> Result<Config> {
    let user = load_user_config(user_config_path().as_deref())?;

    let vault_dir = resolve_vault_dir(
        overrides.vault_dir,
        env::var_os("TED_VAULT").map(PathBuf::from),
        user.vault_dir.clone(),
        dirs::home_dir(),
    );
    let intake_url = overrides
        .intake_url
        .or_else(|| env::var("TED_INTAKE_URL").ok())
        .or(user.intake_url)
        .unwrap_or_else(|| DEFAULT_INTAKE_URL.to_string());
    let resolved_output = resolve_output(overrides.json, user.output, env::var("FORMAT").ok());

    Ok(Config {
        vault_dir,
        intake_url,
        resolved_output,
    })
}

/// `--vault` > `TED_VAULT` > config `vault_dir` > `~/.ted`.
fn resolve_vault_dir(
    cli: Option<PathBuf>,
    env_value: Option<PathBuf>,
    user: Option<PathBuf>,
    home: Option<PathBuf>,
) -> PathBuf {
    let chosen = cli
        .or(env_value)
        .or(user)
        .unwrap_or_else(|| PathBuf::from("~/.ted"));
    expand_tilde(&chosen, home.as_deref())
}

fn expand_tilde(path: &Path, home: Option<&Path>) -> PathBuf {
    match (path.strip_prefix("~"), home) {
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

fn resolve_output(cli_json: bool, user_output: Option<String>, env_format: Option<String>) -> String {
    fn normalize_output_mode(raw: &str) -> Option<&'static str> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "pretty" | "human" => Some("pretty"),
            "text" | "plain" => Some("text"),
            "json" => Some("json"),
            _ => None,
        }
    }

    if cli_json {
        return "json".to_string();
    }

    if let Some(mode) = env_format.as_deref().and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if let Some(mode) = user_output.as_deref().and_then(normalize_output_mode) {
        return mode.to_string();
    }

    if std::io::stdout().is_terminal() {
        "pretty".to_string()
    } else {
        "text".to_string()
    }
}
