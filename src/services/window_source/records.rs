use crate::error::{Result, SwitcherError};

/// Заглушка для отсутствующих свойств окна
pub const UNKNOWN_FIELD: &str = "N/A";

/// Разбить вывод бэкенда на записи: хвостовые пробелы срезаются, пустые строки пропускаются.
pub fn records_from_source(source: &str) -> Vec<String> {
    source
        .lines()
        .map(str::trim_end)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Идентификатор окна в формате wmctrl: `0x` и восемь hex-цифр
pub fn format_window_id(window: u32) -> String {
    format!("0x{:08x}", window)
}

pub fn parse_window_id(id: &str) -> Result<u32> {
    let digits = id
        .strip_prefix("0x")
        .or_else(|| id.strip_prefix("0X"))
        .ok_or_else(|| SwitcherError::InvalidId(id.to_string()))?;

    u32::from_str_radix(digits, 16).map_err(|_| SwitcherError::InvalidId(id.to_string()))
}

/// Собрать запись `<id> <desktop> <program> <user> <title>`.
///
/// Переводы строк в заголовке заменяются пробелами, иначе запись распадётся при построчном чтении.
/// Окно без заголовка получает `N/A`, чтобы запись оставалась из пяти полей.
pub fn format_record(window: u32, desktop: &str, program: &str, machine: &str, title: &str) -> String {
    let title: String = if title.trim().is_empty() {
        UNKNOWN_FIELD.to_string()
    } else {
        title
            .chars()
            .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
            .collect()
    };
    format!(
        "{} {} {} {} {}",
        format_window_id(window),
        token(desktop),
        token(program),
        token(machine),
        title
    )
}

/// Поле записи не может быть пустым или содержать пробелы
fn token(value: &str) -> String {
    if value.trim().is_empty() {
        return UNKNOWN_FIELD.to_string();
    }
    value
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect()
}

/// WM_CLASS хранит `instance\0class\0`; склеиваем через точку.
pub fn join_wm_class(raw: &[u8]) -> String {
    let text = String::from_utf8_lossy(raw);
    text.trim_end_matches('\0')
        .split('\0')
        .collect::<Vec<_>>()
        .join(".")
}

/// Декодирование STRING-свойств (ISO 8859-1)
pub fn decode_latin1(raw: &[u8]) -> String {
    raw.iter().map(|&b| b as char).collect()
}
