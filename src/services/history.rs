//! Persistent most-recently-used history.
//!
//! The history is a versioned JSON document holding the ordered task list.
//! It is rewritten wholesale after every committed selection.

use crate::error::{Result, SwitcherError};
use crate::model::Task;
use crate::utils::paths::temp_sibling;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Current history format version.
const HISTORY_VERSION: u32 = 1;

#[derive(Serialize, Deserialize)]
struct HistoryFile {
    version: u32,
    tasks: Vec<Task>,
}

#[derive(Serialize)]
struct HistoryFileRef<'a> {
    version: u32,
    tasks: &'a [Task],
}

/// Единственный читатель и писатель файла истории
#[derive(Debug, Clone)]
pub struct HistoryStore {
    path: PathBuf,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Отсутствующий файл означает пустую историю.
    pub fn load(&self) -> Result<Vec<Task>> {
        let data = match fs::read_to_string(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("Файл истории {:?} отсутствует", self.path);
                return Ok(Vec::new());
            }
            Err(e) => return Err(self.corrupt(e.to_string())),
        };

        let file: HistoryFile =
            serde_json::from_str(&data).map_err(|e| self.corrupt(e.to_string()))?;

        if file.version != HISTORY_VERSION {
            return Err(self.corrupt(format!(
                "версия {} вместо {}",
                file.version, HISTORY_VERSION
            )));
        }

        debug!("Загружено {} задач из истории", file.tasks.len());
        Ok(file.tasks)
    }

    /// Записать историю целиком: временный файл рядом, затем rename поверх старого.
    pub fn save(&self, tasks: &[Task]) -> Result<()> {
        let data = serde_json::to_string_pretty(&HistoryFileRef {
            version: HISTORY_VERSION,
            tasks,
        })
        .map_err(|e| SwitcherError::Internal(format!("сериализация истории: {}", e)))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.persist_failure(e))?;
        }

        let temp = temp_sibling(&self.path);
        if let Err(e) = fs::write(&temp, data).and_then(|_| fs::rename(&temp, &self.path)) {
            let _ = fs::remove_file(&temp);
            return Err(self.persist_failure(e));
        }

        debug!("Сохранено {} задач в {:?}", tasks.len(), self.path);
        Ok(())
    }

    fn corrupt(&self, reason: String) -> SwitcherError {
        SwitcherError::CorruptHistory {
            path: self.path.clone(),
            reason,
        }
    }

    fn persist_failure(&self, source: std::io::Error) -> SwitcherError {
        SwitcherError::PersistFailure {
            path: self.path.clone(),
            source,
        }
    }
}
