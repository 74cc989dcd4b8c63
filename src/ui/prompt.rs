use crate::error::Result;
use crate::services::{Selection, Switcher};
use std::future::Future;
use std::io::{BufRead, Write};
use tokio::sync::mpsc;
use tracing::{info, warn};

use super::list::render_tasks;

/// Команда, введённая в ответ на приглашение
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Choice {
    /// Индекс задачи (с нуля) для активации
    Select(usize),
    /// Индекс задачи (с нуля) для закрытия
    Delete(usize),
    Cancel,
    Invalid(String),
}

/// `N` выбрать, `dN` закрыть, пустая строка или `q` отмена. Номера с единицы.
pub fn parse_choice(line: &str, len: usize) -> Choice {
    let line = line.trim();
    if line.is_empty() || line.eq_ignore_ascii_case("q") {
        return Choice::Cancel;
    }

    let (delete, number) = match line.strip_prefix(['d', 'D']) {
        Some(rest) => (true, rest.trim()),
        None => (false, line),
    };

    match number.parse::<usize>() {
        Ok(n) if (1..=len).contains(&n) => {
            if delete {
                Choice::Delete(n - 1)
            } else {
                Choice::Select(n - 1)
            }
        }
        Ok(n) => Choice::Invalid(format!("Нет задачи с номером {} (всего {})", n, len)),
        Err(_) => Choice::Invalid(format!("Не понял ввод: {:?}", line)),
    }
}

/// Строки stdin из отдельного потока.
///
/// Блокирующее чтение живёт вне рантайма, поэтому выход по Ctrl+C не ждёт Enter.
pub fn stdin_lines() -> Result<mpsc::Receiver<String>> {
    let (tx, rx) = mpsc::channel(1);
    std::thread::Builder::new()
        .name("stdin".to_string())
        .spawn(move || {
            for line in std::io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.blocking_send(line).is_err() {
                    break;
                }
            }
        })?;
    Ok(rx)
}

/// Интерактивный выбор в терминале. `None` означает отмену: история не менялась.
pub async fn pick(switcher: &mut Switcher) -> Result<Option<Selection>> {
    let interrupted = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Ctrl+C недоступен: {}", e);
            std::future::pending::<()>().await;
        }
    };
    pick_from(switcher, stdin_lines()?, interrupted).await
}

/// Цикл выбора над любым потоком строк; `interrupted` завершает его без изменений.
pub async fn pick_from(
    switcher: &mut Switcher,
    mut lines: mpsc::Receiver<String>,
    interrupted: impl Future<Output = ()>,
) -> Result<Option<Selection>> {
    tokio::pin!(interrupted);

    loop {
        if switcher.tasks().is_empty() {
            println!("Нет открытых окон");
            return Ok(None);
        }

        {
            let stdout = std::io::stdout();
            let mut out = stdout.lock();
            render_tasks(&mut out, switcher.tasks())?;
            write!(out, "Номер (dN - закрыть, q - выход): ")?;
            out.flush()?;
        }

        let line = tokio::select! {
            line = lines.recv() => line,
            _ = &mut interrupted => {
                info!("Выбор отменён (Ctrl+C)");
                return Ok(None);
            }
        };

        let Some(line) = line else {
            info!("stdin закрыт, выбор отменён");
            return Ok(None);
        };

        // после первого перечисления ошибки бэкенда не завершают выбор
        match parse_choice(&line, switcher.tasks().len()) {
            Choice::Cancel => return Ok(None),
            Choice::Select(index) => {
                let id = switcher.tasks()[index].id.clone();
                match switcher.select(&id).await {
                    Ok(selection) if selection.stale => {
                        eprintln!("Окно {} уже закрыто", id);
                    }
                    Ok(selection) => return Ok(Some(selection)),
                    Err(e) if e.is_stale_selection() => eprintln!("{}", e),
                    Err(e) => {
                        warn!("Не удалось активировать окно {}: {}", id, e);
                        eprintln!("Ошибка: {}", e);
                    }
                }
            }
            Choice::Delete(index) => {
                let id = switcher.tasks()[index].id.clone();
                match switcher.delete(&id).await {
                    Ok(removed) => println!("Закрыто: {}", removed),
                    Err(e) => {
                        warn!("Не удалось закрыть окно {}: {}", id, e);
                        eprintln!("Ошибка: {}", e);
                    }
                }
            }
            Choice::Invalid(message) => eprintln!("{}", message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_by_number() {
        assert_eq!(parse_choice("2", 3), Choice::Select(1));
        assert_eq!(parse_choice("  1 \n", 3), Choice::Select(0));
    }

    #[test]
    fn test_delete_by_number() {
        assert_eq!(parse_choice("d3", 3), Choice::Delete(2));
        assert_eq!(parse_choice("D 1", 3), Choice::Delete(0));
    }

    #[test]
    fn test_cancel() {
        assert_eq!(parse_choice("", 3), Choice::Cancel);
        assert_eq!(parse_choice("q", 3), Choice::Cancel);
        assert_eq!(parse_choice("Q", 0), Choice::Cancel);
    }

    #[test]
    fn test_out_of_range_and_garbage() {
        assert!(matches!(parse_choice("0", 3), Choice::Invalid(_)));
        assert!(matches!(parse_choice("4", 3), Choice::Invalid(_)));
        assert!(matches!(parse_choice("d", 3), Choice::Invalid(_)));
        assert!(matches!(parse_choice("firefox", 3), Choice::Invalid(_)));
    }

    mod session {
        use super::super::*;
        use crate::error::SwitcherError;
        use crate::services::{HistoryStore, MergeKey, TaskOrdering, WindowSource};
        use std::time::Duration;

        /// Окна перечисляются, но wmctrl для закрытия недоступен
        struct NoWmctrl;

        #[async_trait::async_trait]
        impl WindowSource for NoWmctrl {
            fn name(&self) -> &'static str {
                "no-wmctrl"
            }

            async fn list_windows(&self) -> Result<Vec<String>> {
                Ok(vec![
                    "0x01 0 xterm.XTerm host shell".to_string(),
                    "0x02 0 Navigator.Firefox host Browser".to_string(),
                ])
            }

            async fn switch_to(&self, _id: &str) -> Result<()> {
                Ok(())
            }

            async fn kill(&self, _id: &str) -> Result<()> {
                Err(SwitcherError::BackendUnavailable(
                    "/nonexistent/wmctrl не найден".to_string(),
                ))
            }
        }

        async fn switcher(dir: &tempfile::TempDir) -> Switcher {
            let ordering = TaskOrdering::new(
                HistoryStore::new(dir.path().join("history.json")),
                MergeKey::Full,
            );
            Switcher::open(Box::new(NoWmctrl), ordering).await.unwrap()
        }

        #[tokio::test]
        async fn backend_error_keeps_prompt_running() {
            let dir = tempfile::tempdir().unwrap();
            let mut switcher = switcher(&dir).await;

            let (tx, rx) = mpsc::channel(4);
            tx.send("d1".to_string()).await.unwrap();
            tx.send("2".to_string()).await.unwrap();

            let selection = pick_from(&mut switcher, rx, std::future::pending())
                .await
                .unwrap()
                .unwrap();

            assert_eq!(selection.task.id, "0x02");
            assert_eq!(switcher.tasks().len(), 2);
        }

        #[tokio::test]
        async fn interrupt_does_not_wait_for_input() {
            let dir = tempfile::tempdir().unwrap();
            let mut switcher = switcher(&dir).await;

            // отправитель жив, но ничего не пишет: как терминал без ввода
            let (_tx, rx) = mpsc::channel::<String>(1);
            let result = tokio::time::timeout(
                Duration::from_secs(2),
                pick_from(&mut switcher, rx, async {}),
            )
            .await
            .expect("interrupt must end the prompt");

            assert!(result.unwrap().is_none());
            assert!(!dir.path().join("history.json").exists());
        }

        #[tokio::test]
        async fn closed_input_cancels() {
            let dir = tempfile::tempdir().unwrap();
            let mut switcher = switcher(&dir).await;

            let (tx, rx) = mpsc::channel::<String>(1);
            drop(tx);

            assert!(pick_from(&mut switcher, rx, std::future::pending())
                .await
                .unwrap()
                .is_none());
            assert!(!dir.path().join("history.json").exists());
        }
    }
}
