use crate::config::{BackendConfig, BackendKind};
use crate::error::{Result, SwitcherError};
use tracing::{info, warn};

use super::dry_run::DryRunSource;
use super::ewmh::EwmhSource;
use super::file::FileSource;
use super::wmctrl::WmctrlSource;
use super::x11::X11Source;

/// Источник окон: перечисление, активация и закрытие.
///
/// Каждый вызов `list_windows` заново опрашивает оконную систему и возвращает
/// записи вида `<id> <desktop> <program.class> <user> <title>`.
#[async_trait::async_trait]
pub trait WindowSource: Send + Sync {
    /// Короткое имя бэкенда для логов
    fn name(&self) -> &'static str;

    async fn list_windows(&self) -> Result<Vec<String>>;

    /// Поднять и сфокусировать окно. Оконный менеджер может проигнорировать запрос.
    async fn switch_to(&self, id: &str) -> Result<()>;

    /// Попросить окно закрыться
    async fn kill(&self, id: &str) -> Result<()>;
}

/// Factory function to create the backend selected in the configuration
pub async fn create_window_source(
    config: &BackendConfig,
    dry_run: bool,
) -> Result<Box<dyn WindowSource>> {
    let source: Box<dyn WindowSource> = match config.kind {
        BackendKind::X11 => Box::new(X11Source::connect()?),
        BackendKind::Ewmh => Box::new(EwmhSource::connect()?),
        BackendKind::Wmctrl => Box::new(WmctrlSource::new(&config.wmctrl_path)),
        BackendKind::File => {
            let path = config.file_path.clone().ok_or_else(|| {
                SwitcherError::Internal("не указан backend.file_path".to_string())
            })?;
            let delegate = config
                .file_delegate
                .then(|| WmctrlSource::new(&config.wmctrl_path));
            Box::new(FileSource::new(path, delegate))
        }
        BackendKind::Auto => detect_working_source(config).await?,
    };

    info!("Используем бэкенд: {}", source.name());

    if dry_run {
        Ok(Box::new(DryRunSource::new(source)))
    } else {
        Ok(source)
    }
}

async fn detect_working_source(config: &BackendConfig) -> Result<Box<dyn WindowSource>> {
    info!("Определяем рабочий способ доступа к окнам...");

    match X11Source::connect() {
        Ok(source) => return Ok(Box::new(source)),
        Err(e) => warn!("Прямой доступ к X11 недоступен: {}", e),
    }

    let wmctrl = WmctrlSource::new(&config.wmctrl_path);
    match wmctrl.test().await {
        Ok(()) => return Ok(Box::new(wmctrl)),
        Err(e) => warn!("wmctrl недоступен: {}", e),
    }

    Err(SwitcherError::BackendUnavailable(
        "ни X11, ни wmctrl не работают".to_string(),
    ))
}
