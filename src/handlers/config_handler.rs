use crate::{
    GrabberError, Result,
    config::{Config, PROJECT_CONFIG_FILE, default_config_path},
    output,
};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Debug, Serialize)]
pub struct ConfigInfo {
    pub path: PathBuf,
    pub exists: bool,
    pub project_path: PathBuf,
    pub project_exists: bool,
}

#[derive(Debug, Serialize)]
pub struct ConfigShowResult {
    pub config: Config,
}

impl output::OutputFormatter for ConfigInfo {
    fn format_text(&self) -> String {
        use crate::output::text;
        format!(
            "{}\n{}\n{}\n{}",
            text::key_value("Config Path", &self.path.display().to_string()),
            text::key_value("Exists", &self.exists.to_string()),
            text::key_value("Project Config", &self.project_path.display().to_string()),
            text::key_value("Project Exists", &self.project_exists.to_string())
        )
    }

    fn format_json(&self, pretty: bool) -> Result<String> {
        output::to_json(self, pretty)
    }
}

impl output::OutputFormatter for ConfigShowResult {
    fn format_text(&self) -> String {
        self.config.show_masked()
    }

    fn format_json(&self, pretty: bool) -> Result<String> {
        output::to_json(&self.config, pretty)
    }
}

fn config_info(path: PathBuf) -> ConfigInfo {
    let project_path = PathBuf::from(PROJECT_CONFIG_FILE);
    ConfigInfo {
        exists: path.exists(),
        path,
        project_exists: project_path.exists(),
        project_path,
    }
}

pub fn handle_config_init() -> Result<ConfigInfo> {
    init_at(default_config_path()?)
}

fn init_at(config_path: PathBuf) -> Result<ConfigInfo> {
    let config_dir = config_path
        .parent()
        .ok_or_else(|| GrabberError::ConfigError("Invalid config path".into()))?;

    std::fs::create_dir_all(config_dir)?;

    if config_path.exists() {
        return Err(GrabberError::ConfigError(format!(
            "Config file already exists at {}",
            config_path.display()
        )));
    }

    let toml_content = toml::to_string_pretty(&Config::default())?;
    std::fs::write(&config_path, toml_content)?;

    Ok(config_info(config_path))
}

/// Shows the effective configuration, after every layer and CLI flag.
pub fn handle_config_show(config: &Config) -> Result<ConfigShowResult> {
    Ok(ConfigShowResult {
        config: config.clone(),
    })
}

pub fn handle_config_edit() -> Result<ConfigInfo> {
    let config_path = default_config_path()?;

    if !config_path.exists() {
        return Err(GrabberError::ConfigError(
            "Config file not found. Run 'config init' first.".to_string(),
        ));
    }

    let editor = std::env::var("EDITOR")
        .or_else(|_| std::env::var("VISUAL"))
        .unwrap_or_else(|_| {
            if cfg!(target_os = "macos") {
                "open".to_string()
            } else if cfg!(target_os = "windows") {
                "notepad".to_string()
            } else {
                "nano".to_string()
            }
        });

    std::process::Command::new(&editor)
        .arg(&config_path)
        .status()
        .map_err(|e| GrabberError::ConfigError(format!("Failed to open editor: {}", e)))?;

    Ok(config_info(config_path))
}

pub fn handle_config_path() -> Result<ConfigInfo> {
    Ok(config_info(default_config_path()?))
}
