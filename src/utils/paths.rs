use std::path::{Path, PathBuf};

/// Имя файла истории в домашнем каталоге пользователя
pub const HISTORY_FILE_NAME: &str = ".task_switcher.json";

pub fn default_history_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(HISTORY_FILE_NAME))
}

/// Соседний временный файл для атомарной замены
pub fn temp_sibling(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(format!(".{}.tmp", std::process::id()));
    path.with_file_name(name)
}
