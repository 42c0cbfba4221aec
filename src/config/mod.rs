use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

const APP_DOMAIN: &str = "io";
const APP_ORG: &str = "Redator";
const APP_NAME: &str = "redator";

/// File name holding the full essay collection inside the data directory.
pub const STORE_FILE: &str = "redacoes.json";

pub struct ConfigLoader {
    paths: ConfigPaths,
}

impl ConfigLoader {
    pub fn discover() -> Result<Self> {
        let paths = ConfigPaths::discover()?;
        Ok(Self { paths })
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    pub fn load_or_init(&self) -> Result<AppConfig> {
        self.paths.ensure_directories()?;
        if !self.paths.config_file.exists() {
            let mut default_cfg = AppConfig::default();
            default_cfg.post_load(&self.paths)?;
            self.write_default_config(&default_cfg)?;
            return Ok(default_cfg);
        }

        self.load()
    }

    pub fn load(&self) -> Result<AppConfig> {
        let raw = fs::read_to_string(&self.paths.config_file)
            .with_context(|| format!("reading config {}", self.paths.config_file.display()))?;
        let mut cfg: AppConfig = toml::from_str(&raw).context("parsing config toml")?;
        cfg.post_load(&self.paths)?;
        Ok(cfg)
    }

    fn write_default_config(&self, cfg: &AppConfig) -> Result<()> {
        let toml = toml::to_string_pretty(cfg).context("serializing default config")?;
        if let Some(parent) = self.paths.config_file.parent() {
            fs::create_dir_all(parent).with_context(|| format!("creating {}", parent.display()))?;
        }
        let mut file = fs::File::create(&self.paths.config_file)
            .with_context(|| format!("creating config {}", self.paths.config_file.display()))?;
        file.write_all(toml.as_bytes())
            .context("writing default config")?;
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_dir: PathBuf,
    pub config_file: PathBuf,
    pub data_dir: PathBuf,
    pub store_path: PathBuf,
    pub export_dir: PathBuf,
    pub log_dir: PathBuf,
    pub state_dir: PathBuf,
}

impl ConfigPaths {
    pub fn discover() -> Result<Self> {
        let override_config = env::var("REDATOR_CONFIG").ok().map(PathBuf::from);
        let override_data = env::var("REDATOR_DATA").ok().map(PathBuf::from);

        let project_dirs = ProjectDirs::from(APP_DOMAIN, APP_ORG, APP_NAME)
            .context("resolving XDG project directories")?;

        let config_dir = override_config
            .clone()
            .map(|p| {
                if p.is_dir() {
                    p
                } else {
                    p.parent().map(Path::to_path_buf).unwrap_or(p)
                }
            })
            .unwrap_or_else(|| project_dirs.config_dir().to_path_buf());

        let config_file = override_config
            .filter(|p| p.is_file() || p.extension().is_some())
            .unwrap_or_else(|| config_dir.join("config.toml"));

        let data_root = override_data.unwrap_or_else(|| project_dirs.data_dir().to_path_buf());
        let store_path = data_root.join(STORE_FILE);

        let state_dir = project_dirs
            .state_dir()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| data_root.join("state"));
        let log_dir = state_dir.join("logs");
        let export_dir = data_root.join("exports");

        Ok(Self {
            config_dir,
            config_file,
            data_dir: data_root,
            store_path,
            export_dir,
            log_dir,
            state_dir,
        })
    }

    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [
            &self.config_dir,
            &self.data_dir,
            &self.export_dir,
            &self.log_dir,
            &self.state_dir,
        ] {
            fs::create_dir_all(dir)
                .with_context(|| format!("creating application directory {}", dir.display()))?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageOptions,
    pub remote: RemoteOptions,
    pub export: ExportOptions,
}

impl AppConfig {
    fn post_load(&mut self, paths: &ConfigPaths) -> Result<()> {
        self.storage
            .resolve(paths)
            .context("resolving storage paths")?;
        self.export
            .resolve(paths)
            .context("resolving export paths")?;
        if self.remote.base_url.trim().is_empty() {
            tracing::warn!("empty remote base url in config, falling back to default");
            self.remote.base_url = RemoteOptions::default().base_url;
        }
        while self.remote.base_url.ends_with('/') {
            self.remote.base_url.pop();
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageOptions {
    #[serde(skip)]
    pub store_path: PathBuf,
}

impl StorageOptions {
    fn resolve(&mut self, paths: &ConfigPaths) -> Result<()> {
        if self.store_path.as_os_str().is_empty() {
            self.store_path = paths.store_path.clone();
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RemoteOptions {
    pub base_url: String,
    pub timeout_secs: u64,
}

impl Default for RemoteOptions {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportOptions {
    #[serde(skip)]
    pub export_dir: PathBuf,
}

impl ExportOptions {
    fn resolve(&mut self, paths: &ConfigPaths) -> Result<()> {
        if self.export_dir.as_os_str().is_empty() {
            self.export_dir = paths.export_dir.clone();
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn temp_paths(root: &TempDir) -> ConfigPaths {
        let base = root.path();
        let config_dir = base.join("config");
        let data_dir = base.join("data");
        ConfigPaths {
            config_dir: config_dir.clone(),
            config_file: config_dir.join("config.toml"),
            data_dir: data_dir.clone(),
            store_path: data_dir.join(STORE_FILE),
            export_dir: data_dir.join("exports"),
            log_dir: base.join("logs"),
            state_dir: base.join("state"),
        }
    }

    #[test]
    fn default_config_resolves_skipped_paths() -> Result<()> {
        let temp = TempDir::new()?;
        let paths = temp_paths(&temp);
        let mut cfg = AppConfig::default();
        cfg.post_load(&paths)?;
        assert_eq!(cfg.storage.store_path, paths.store_path);
        assert_eq!(cfg.export.export_dir, paths.export_dir);
        Ok(())
    }

    #[test]
    fn post_load_trims_trailing_slash_and_restores_empty_base_url() -> Result<()> {
        let temp = TempDir::new()?;
        let paths = temp_paths(&temp);

        let mut cfg = AppConfig::default();
        cfg.remote.base_url = "http://example.test:3000/".into();
        cfg.post_load(&paths)?;
        assert_eq!(cfg.remote.base_url, "http://example.test:3000");

        let mut cfg = AppConfig::default();
        cfg.remote.base_url = "   ".into();
        cfg.post_load(&paths)?;
        assert_eq!(cfg.remote.base_url, RemoteOptions::default().base_url);
        Ok(())
    }

    #[test]
    fn load_or_init_writes_default_config_once() -> Result<()> {
        let temp = TempDir::new()?;
        let paths = temp_paths(&temp);
        let loader = ConfigLoader {
            paths: paths.clone(),
        };

        let cfg = loader.load_or_init()?;
        assert!(paths.config_file.exists());
        assert_eq!(cfg.remote.timeout_secs, 30);

        // Second load parses the file written on first run.
        let cfg = loader.load_or_init()?;
        assert_eq!(cfg.remote.base_url, RemoteOptions::default().base_url);
        Ok(())
    }
}
