use crate::error::{Result, SwitcherError};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use std::fmt;
use std::str::FromStr;

/// Количество полей в записи окна: `id desktop program user title`
pub const RECORD_FIELDS: usize = 5;

/// Одно открытое окно, разобранное из текстовой записи бэкенда.
///
/// Равенство сравнивает все поля, включая заголовок.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub desktop: String,
    pub program: String,
    pub program_class: String,
    pub program_name: String,
    pub user: String,
    pub title: String,
}

impl Task {
    /// Разобрать запись `<id> <desktop> <program.class> <user> <title>`.
    ///
    /// Поля разделяются любыми пробельными символами, заголовок берётся
    /// от начала пятого токена до конца строки без изменений.
    pub fn parse(record: &str) -> Result<Self> {
        let mut fields: SmallVec<[&str; RECORD_FIELDS]> = SmallVec::new();
        let mut rest = record;

        while fields.len() < RECORD_FIELDS - 1 {
            rest = rest.trim_start();
            if rest.is_empty() {
                return Err(SwitcherError::malformed(record, fields.len()));
            }
            let end = rest.find(char::is_whitespace).unwrap_or(rest.len());
            fields.push(&rest[..end]);
            rest = &rest[end..];
        }

        let title = rest.trim_start();
        if title.is_empty() {
            return Err(SwitcherError::malformed(record, fields.len()));
        }

        let (program_class, program_name) = split_program(fields[2]);

        Ok(Self {
            id: fields[0].to_string(),
            desktop: fields[1].to_string(),
            program: fields[2].to_string(),
            program_class: program_class.to_string(),
            program_name: program_name.to_string(),
            user: fields[3].to_string(),
            title: title.to_string(),
        })
    }

    /// Колонки для списка: id, имя программы, заголовок
    pub fn columns(&self) -> (&str, &str, &str) {
        (&self.id, &self.program_name, &self.title)
    }

    /// Совпадает ли задача с окном по идентификатору
    pub fn has_id(&self, id: &str) -> bool {
        self.id == id
    }
}

/// `instance.Class` делится по первой точке; без точки класс пустой.
fn split_program(program: &str) -> (&str, &str) {
    match program.split_once('.') {
        Some((class, name)) => (class, name),
        None => ("", program),
    }
}

impl FromStr for Task {
    type Err = SwitcherError;

    fn from_str(s: &str) -> Result<Self> {
        Task::parse(s)
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{}] \"{}\"", self.id, self.program_name, self.title)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIREFOX: &str =
        "0x0160008e  0 Navigator.Firefox-esr  user iso timezone converter - Google Search";

    #[test]
    fn test_parse_full_record() {
        let task = Task::parse(FIREFOX).unwrap();

        assert_eq!(task.id, "0x0160008e");
        assert_eq!(task.desktop, "0");
        assert_eq!(task.program, "Navigator.Firefox-esr");
        assert_eq!(task.program_class, "Navigator");
        assert_eq!(task.program_name, "Firefox-esr");
        assert_eq!(task.user, "user");
        assert_eq!(task.title, "iso timezone converter - Google Search");
    }

    #[test]
    fn test_title_keeps_internal_whitespace() {
        let task = Task::parse("0x1 0 a.B host   spaced\ttitle  with  gaps  ").unwrap();
        assert_eq!(task.title, "spaced\ttitle  with  gaps  ");
    }

    #[test]
    fn test_single_word_title() {
        let task = Task::parse("0x1 0 xterm.XTerm host bash").unwrap();
        assert_eq!(task.title, "bash");
    }

    #[test]
    fn test_four_tokens_is_malformed() {
        let err = Task::parse("0x1 0 xterm.XTerm host").unwrap_err();
        assert!(matches!(err, SwitcherError::MalformedRecord { fields: 4, .. }));

        let err = Task::parse("0x1 0 xterm.XTerm host   ").unwrap_err();
        assert!(matches!(err, SwitcherError::MalformedRecord { fields: 4, .. }));
    }

    #[test]
    fn test_short_record_is_malformed() {
        let err = Task::parse("0x1").unwrap_err();
        assert!(matches!(err, SwitcherError::MalformedRecord { fields: 1, .. }));
    }

    #[test]
    fn test_program_without_dot() {
        let task = Task::parse("0x2 1 geany host main.rs - Geany").unwrap();
        assert_eq!(task.program_class, "");
        assert_eq!(task.program_name, "geany");
    }

    #[test]
    fn test_program_splits_on_first_dot_only() {
        let task = Task::parse("0x2 1 a.b.c host title").unwrap();
        assert_eq!(task.program_class, "a");
        assert_eq!(task.program_name, "b.c");
    }

    #[test]
    fn test_equality_compares_every_field() {
        let a = Task::parse("0x3 0 xterm.XTerm host one").unwrap();
        let b = Task::parse("0x3 0 xterm.XTerm host two").unwrap();
        let c: Task = "0x3 0 xterm.XTerm host one".parse().unwrap();

        assert_ne!(a, b);
        assert_eq!(a, c);
        assert!(a.has_id("0x3") && b.has_id("0x3"));
    }
}
