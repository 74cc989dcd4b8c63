use std::path::PathBuf;
use thiserror::Error;
use x11rb::errors::{ConnectError, ConnectionError, ReplyError};
use x11rb::protocol::ErrorKind;

#[derive(Error, Debug)]
pub enum SwitcherError {
    #[error("Некорректная запись окна ({fields} полей из 5): {record:?}")]
    MalformedRecord { record: String, fields: usize },

    #[error("Оконная система недоступна: {0}")]
    BackendUnavailable(String),

    #[error("Бэкенд не знает окно с id {0}")]
    InvalidId(String),

    #[error("Задача с id {0} отсутствует в списке")]
    UnknownId(String),

    #[error("Повреждённый файл истории {path:?}: {reason}")]
    CorruptHistory { path: PathBuf, reason: String },

    #[error("Не удалось сохранить историю в {path:?}: {source}")]
    PersistFailure {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Ошибка конфигурации: {0}")]
    Config(#[from] anyhow::Error),

    #[error("Ошибка ввода-вывода: {0}")]
    Io(#[from] std::io::Error),

    #[error("Внутренняя ошибка: {0}")]
    Internal(String),
}

impl SwitcherError {
    pub fn malformed(record: impl Into<String>, fields: usize) -> Self {
        SwitcherError::MalformedRecord {
            record: record.into(),
            fields,
        }
    }

    /// Окно закрылось между перечислением и выбором.
    pub fn is_stale_selection(&self) -> bool {
        matches!(self, SwitcherError::InvalidId(_) | SwitcherError::UnknownId(_))
    }
}

impl From<ConnectError> for SwitcherError {
    fn from(err: ConnectError) -> Self {
        SwitcherError::BackendUnavailable(format!("подключение к X-серверу: {}", err))
    }
}

impl From<ConnectionError> for SwitcherError {
    fn from(err: ConnectionError) -> Self {
        SwitcherError::BackendUnavailable(format!("соединение с X-сервером: {}", err))
    }
}

impl From<ReplyError> for SwitcherError {
    fn from(err: ReplyError) -> Self {
        match err {
            ReplyError::ConnectionError(e) => e.into(),
            ReplyError::X11Error(e) if matches!(e.error_kind, ErrorKind::Window) => {
                SwitcherError::InvalidId(format!("0x{:08x}", e.bad_value))
            }
            ReplyError::X11Error(e) => {
                SwitcherError::Internal(format!("ошибка X11: {:?}", e.error_kind))
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, SwitcherError>;

// Удобные макросы для создания ошибок
#[macro_export]
macro_rules! switcher_error {
    (backend_unavailable, $($arg:tt)*) => {
        $crate::error::SwitcherError::BackendUnavailable(format!($($arg)*))
    };
    (invalid_id, $($arg:tt)*) => {
        $crate::error::SwitcherError::InvalidId(format!($($arg)*))
    };
    (unknown_id, $($arg:tt)*) => {
        $crate::error::SwitcherError::UnknownId(format!($($arg)*))
    };
    (internal, $($arg:tt)*) => {
        $crate::error::SwitcherError::Internal(format!($($arg)*))
    };
}
