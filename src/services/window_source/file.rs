use crate::error::{Result, SwitcherError};
use std::path::PathBuf;
use tracing::info;

use super::records::records_from_source;
use super::r#trait::WindowSource;
use super::wmctrl::WmctrlSource;

/// Список окон из статического файла (вывод `wmctrl -x -l`), для отладки и тестов.
pub struct FileSource {
    path: PathBuf,
    delegate: Option<WmctrlSource>,
}

impl FileSource {
    pub fn new(path: PathBuf, delegate: Option<WmctrlSource>) -> Self {
        Self { path, delegate }
    }
}

#[async_trait::async_trait]
impl WindowSource for FileSource {
    fn name(&self) -> &'static str {
        "file"
    }

    async fn list_windows(&self) -> Result<Vec<String>> {
        let content = tokio::fs::read_to_string(&self.path).await.map_err(|e| {
            SwitcherError::BackendUnavailable(format!("не удалось прочитать {:?}: {}", self.path, e))
        })?;
        Ok(records_from_source(&content))
    }

    async fn switch_to(&self, id: &str) -> Result<()> {
        match &self.delegate {
            Some(wmctrl) => wmctrl.switch_to(id).await,
            None => {
                info!("file: активация {} пропущена", id);
                Ok(())
            }
        }
    }

    async fn kill(&self, id: &str) -> Result<()> {
        match &self.delegate {
            Some(wmctrl) => wmctrl.kill(id).await,
            None => {
                info!("file: закрытие {} пропущено", id);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn reads_records_and_skips_blank_lines() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "0x0160008e  0 Navigator.Firefox-esr  user Mail - Mozilla Firefox").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "0x02000007  1 gnome-terminal-server.Gnome-terminal  user ~/src   ").unwrap();

        let source = FileSource::new(file.path().to_path_buf(), None);
        let records = source.list_windows().await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[1], "0x02000007  1 gnome-terminal-server.Gnome-terminal  user ~/src");
    }

    #[tokio::test]
    async fn missing_file_is_backend_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let source = FileSource::new(dir.path().join("absent.txt"), None);

        assert!(matches!(
            source.list_windows().await,
            Err(SwitcherError::BackendUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn actions_without_delegate_are_noops() {
        let source = FileSource::new(PathBuf::from("unused.txt"), None);
        assert!(source.switch_to("0x01").await.is_ok());
        assert!(source.kill("0x01").await.is_ok());
    }
}
