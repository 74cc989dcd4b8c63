use crate::model::Task;
use std::io::{self, Write};

/// Максимальная ширина колонки с именем программы
const PROGRAM_WIDTH_LIMIT: usize = 24;

/// Нумерованный список: `N  id  программа  заголовок`
pub fn render_tasks<W: Write>(out: &mut W, tasks: &[Task]) -> io::Result<()> {
    let index_width = tasks.len().to_string().len();
    let program_width = tasks
        .iter()
        .map(|task| task.program_name.chars().count())
        .max()
        .unwrap_or(0)
        .min(PROGRAM_WIDTH_LIMIT);

    for (i, task) in tasks.iter().enumerate() {
        let (id, program, title) = task.columns();
        let program: String = program.chars().take(PROGRAM_WIDTH_LIMIT).collect();
        writeln!(
            out,
            "{:>iw$}  {}  {:<pw$}  {}",
            i + 1,
            id,
            program,
            title,
            iw = index_width,
            pw = program_width
        )?;
    }

    Ok(())
}

pub fn render_json<W: Write>(out: &mut W, tasks: &[Task]) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, tasks)?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tasks() -> Vec<Task> {
        vec![
            Task::parse("0x01 0 mail.Thunderbird host Inbox - Mail").unwrap(),
            Task::parse("0x02 0 xterm host shell").unwrap(),
        ]
    }

    #[test]
    fn renders_numbered_aligned_rows() {
        let mut out = Vec::new();
        render_tasks(&mut out, &tasks()).unwrap();
        let text = String::from_utf8(out).unwrap();

        assert_eq!(
            text,
            "1  0x01  Thunderbird  Inbox - Mail\n2  0x02  xterm        shell\n"
        );
    }

    #[test]
    fn renders_nothing_for_empty_list() {
        let mut out = Vec::new();
        render_tasks(&mut out, &[]).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn json_output_parses_back() {
        let mut out = Vec::new();
        render_json(&mut out, &tasks()).unwrap();

        let parsed: Vec<Task> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed, tasks());
    }
}
