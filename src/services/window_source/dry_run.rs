use crate::error::Result;
use parking_lot::Mutex;
use tracing::info;

use super::r#trait::WindowSource;

/// Действие, которое в dry-run режиме не было отправлено оконной системе
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkippedAction {
    SwitchTo(String),
    Kill(String),
}

/// Обёртка над бэкендом: окна читаются по-настоящему, активация и закрытие только логируются.
pub struct DryRunSource {
    inner: Box<dyn WindowSource>,
    skipped: Mutex<Vec<SkippedAction>>,
}

impl DryRunSource {
    pub fn new(inner: Box<dyn WindowSource>) -> Self {
        info!("Dry-run режим - действия над окнами ({}) отключены", inner.name());
        Self {
            inner,
            skipped: Mutex::new(Vec::new()),
        }
    }

    #[cfg(test)]
    pub fn skipped(&self) -> Vec<SkippedAction> {
        self.skipped.lock().clone()
    }
}

impl Drop for DryRunSource {
    fn drop(&mut self) {
        let skipped = self.skipped.get_mut();
        if !skipped.is_empty() {
            info!("Dry-run: пропущено действий над окнами: {}", skipped.len());
        }
    }
}

#[async_trait::async_trait]
impl WindowSource for DryRunSource {
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn list_windows(&self) -> Result<Vec<String>> {
        self.inner.list_windows().await
    }

    async fn switch_to(&self, id: &str) -> Result<()> {
        info!("Dry-run: эмулируем активацию окна {}", id);
        self.skipped.lock().push(SkippedAction::SwitchTo(id.to_string()));
        Ok(())
    }

    async fn kill(&self, id: &str) -> Result<()> {
        info!("Dry-run: эмулируем закрытие окна {}", id);
        self.skipped.lock().push(SkippedAction::Kill(id.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::file::FileSource;
    use super::super::wmctrl::WmctrlSource;
    use std::io::Write;

    #[tokio::test]
    async fn lists_through_and_records_skipped_actions() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "0x01 0 xterm.XTerm host shell").unwrap();

        // делегат указывает на несуществующий wmctrl: реальный вызов упал бы
        let inner = FileSource::new(
            file.path().to_path_buf(),
            Some(WmctrlSource::new("/nonexistent/wmctrl-for-tests")),
        );
        let source = DryRunSource::new(Box::new(inner));

        assert_eq!(source.list_windows().await.unwrap(), vec!["0x01 0 xterm.XTerm host shell"]);
        source.switch_to("0x01").await.unwrap();
        source.kill("0x01").await.unwrap();

        assert_eq!(
            source.skipped(),
            vec![
                SkippedAction::SwitchTo("0x01".to_string()),
                SkippedAction::Kill("0x01".to_string()),
            ]
        );
    }
}
