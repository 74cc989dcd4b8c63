use crate::error::{Result, SwitcherError};
use tokio::process::Command;
use tracing::debug;

use super::records::records_from_source;
use super::r#trait::WindowSource;

/// Окна через внешнюю утилиту wmctrl
pub struct WmctrlSource {
    executable: String,
}

impl WmctrlSource {
    pub fn new(executable: impl Into<String>) -> Self {
        Self {
            executable: executable.into(),
        }
    }

    pub async fn test(&self) -> Result<()> {
        let output = self.command(&["-l"]).output().await.map_err(|e| self.unavailable(e))?;
        if output.status.success() {
            Ok(())
        } else {
            Err(SwitcherError::BackendUnavailable(format!(
                "{} -l завершился с ошибкой: {}",
                self.executable,
                String::from_utf8_lossy(&output.stderr).trim()
            )))
        }
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.executable);
        cmd.args(args);
        cmd.kill_on_drop(true);
        cmd
    }

    fn unavailable(&self, err: std::io::Error) -> SwitcherError {
        debug!("{} не найден или не запускается: {}", self.executable, err);
        SwitcherError::BackendUnavailable(format!("{} не найден: {}", self.executable, err))
    }

    /// -a и -c возвращают ненулевой код, если окна с таким id нет
    async fn window_action(&self, flag: &str, id: &str) -> Result<()> {
        let status = self
            .command(&["-i", flag, id])
            .status()
            .await
            .map_err(|e| self.unavailable(e))?;

        if status.success() {
            Ok(())
        } else {
            debug!("{} {} {} вернул {}", self.executable, flag, id, status);
            Err(SwitcherError::InvalidId(id.to_string()))
        }
    }
}

#[async_trait::async_trait]
impl WindowSource for WmctrlSource {
    fn name(&self) -> &'static str {
        "wmctrl"
    }

    async fn list_windows(&self) -> Result<Vec<String>> {
        let output = self
            .command(&["-x", "-l"])
            .output()
            .await
            .map_err(|e| self.unavailable(e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SwitcherError::BackendUnavailable(format!(
                "{} -x -l вернул ошибку: {}",
                self.executable,
                stderr.trim()
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Ok(records_from_source(&stdout))
    }

    async fn switch_to(&self, id: &str) -> Result<()> {
        self.window_action("-a", id).await
    }

    async fn kill(&self, id: &str) -> Result<()> {
        self.window_action("-c", id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_executable_is_backend_unavailable() {
        let source = WmctrlSource::new("/nonexistent/wmctrl-for-tests");

        assert!(matches!(
            source.list_windows().await,
            Err(SwitcherError::BackendUnavailable(_))
        ));
        assert!(matches!(source.test().await, Err(SwitcherError::BackendUnavailable(_))));
        assert!(matches!(
            source.switch_to("0x01").await,
            Err(SwitcherError::BackendUnavailable(_))
        ));
    }
}
