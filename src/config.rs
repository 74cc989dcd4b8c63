use crate::services::MergeKey;
use crate::utils::paths;
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub logging: LoggingConfig,
    pub backend: BackendConfig,
    pub history: HistoryConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BackendConfig {
    pub kind: BackendKind,
    pub wmctrl_path: String,
    #[serde(default)]
    pub file_path: Option<PathBuf>,
    /// Файловый бэкенд передаёт switch/kill в wmctrl
    #[serde(default)]
    pub file_delegate: bool,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct HistoryConfig {
    #[serde(default)]
    pub path: Option<PathBuf>,
    pub merge_key: MergeKey,
}

/// Способ доступа к оконной системе
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// X11 напрямую, при неудаче wmctrl
    Auto,
    /// Прямые запросы к X11
    X11,
    /// EWMH через хелперы x11rb
    Ewmh,
    /// Внешняя утилита wmctrl
    Wmctrl,
    /// Статический файл со списком окон
    File,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendKind::Auto => "auto",
            BackendKind::X11 => "x11",
            BackendKind::Ewmh => "ewmh",
            BackendKind::Wmctrl => "wmctrl",
            BackendKind::File => "file",
        };
        f.write_str(name)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            logging: LoggingConfig {
                level: "warn".to_string(),
                format: "pretty".to_string(),
            },
            backend: BackendConfig {
                kind: BackendKind::Auto,
                wmctrl_path: "wmctrl".to_string(),
                file_path: None,
                file_delegate: false,
            },
            history: HistoryConfig {
                path: None,
                merge_key: MergeKey::Full,
            },
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(config_path: P) -> Result<Self> {
        let config_path = config_path.as_ref();

        let figment = Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            .merge(Env::prefixed("TASK_SWITCHER_").split("__"));

        let config: Config = figment
            .extract()
            .with_context(|| format!("Не удалось загрузить конфигурацию из {:?}", config_path))?;

        // проверка после переопределений из командной строки, см. validate()
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => anyhow::bail!("Неверный уровень логирования: {}", self.logging.level),
        }

        match self.logging.format.as_str() {
            "pretty" | "json" => {}
            _ => anyhow::bail!("Неверный формат логирования: {}", self.logging.format),
        }

        if self.backend.wmctrl_path.trim().is_empty() {
            anyhow::bail!("wmctrl_path не может быть пустым");
        }

        if self.backend.kind == BackendKind::File && self.backend.file_path.is_none() {
            anyhow::bail!("Для бэкенда 'file' нужно указать backend.file_path");
        }

        Ok(())
    }

    /// Путь к файлу истории: из конфигурации или в домашнем каталоге
    pub fn history_path(&self) -> Result<PathBuf> {
        match &self.history.path {
            Some(path) => Ok(path.clone()),
            None => paths::default_history_path()
                .context("Не удалось определить домашний каталог для файла истории"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config_validation() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.backend.kind, BackendKind::Auto);
        assert_eq!(config.history.merge_key, MergeKey::Full);
    }

    #[test]
    fn test_file_backend_requires_path() {
        let mut config = Config::default();
        config.backend.kind = BackendKind::File;
        assert!(config.validate().is_err());

        config.backend.file_path = Some(PathBuf::from("wmctrl_sample.txt"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_invalid_logging_rejected() {
        let mut config = Config::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_merges_toml_over_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[backend]\nkind = \"file\"\nfile_path = \"/tmp/windows.txt\"\n\n[history]\nmerge_key = \"id\""
        )
        .unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.backend.kind, BackendKind::File);
        assert_eq!(config.backend.file_path, Some(PathBuf::from("/tmp/windows.txt")));
        assert_eq!(config.backend.wmctrl_path, "wmctrl");
        assert_eq!(config.history.merge_key, MergeKey::Id);
        assert_eq!(config.logging.level, "warn");
    }

    #[test]
    fn test_incomplete_file_backend_can_be_overridden() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[backend]\nkind = \"file\"").unwrap();

        let mut config = Config::load(file.path()).unwrap();
        assert!(config.validate().is_err());

        config.backend.kind = BackendKind::Wmctrl;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_missing_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(dir.path().join("absent.toml")).unwrap();
        assert_eq!(config.backend.kind, BackendKind::Auto);
    }

    #[test]
    fn test_explicit_history_path_wins() {
        let mut config = Config::default();
        config.history.path = Some(PathBuf::from("/tmp/history.json"));
        assert_eq!(config.history_path().unwrap(), PathBuf::from("/tmp/history.json"));
    }
}
