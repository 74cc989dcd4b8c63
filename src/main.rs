use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, warn};
mod config;
mod error;
mod model;
mod services;
mod ui;
mod utils;

use config::{BackendKind, Config, LoggingConfig};
use services::{create_window_source, HistoryStore, Selection, Switcher, TaskOrdering};

#[derive(Parser, Debug)]
#[command(name = "task-switcher")]
#[command(about = "Переключатель окон с историей недавно использованных задач")]
struct Args {
    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = "task-switcher.toml")]
    config: String,

    /// Бэкенд оконной системы (перекрывает конфигурацию)
    #[arg(short, long, value_enum)]
    backend: Option<BackendKind>,

    /// Режим сухого запуска (окна не активируются и не закрываются)
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования
    #[arg(long)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Выбрать окно из списка (по умолчанию)
    Pick,
    /// Показать окна в порядке недавнего использования
    List {
        #[arg(long)]
        json: bool,
    },
    /// Активировать окно по id и запомнить выбор
    Switch { id: String },
    /// Закрыть окно по id
    Kill { id: String },
    /// Показать сохранённую историю
    History {
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Загрузка конфигурации и переопределения из командной строки
    let mut config = Config::load(&args.config)?;
    if let Some(kind) = args.backend {
        config.backend.kind = kind;
    }
    if let Some(level) = &args.log_level {
        config.logging.level = level.clone();
    }
    config.validate()?;

    init_tracing(&config.logging)?;

    info!("Запуск task-switcher v{}", env!("CARGO_PKG_VERSION"));
    if args.dry_run {
        warn!("Режим сухого запуска - окна не будут активироваться и закрываться");
    }

    let ordering = TaskOrdering::new(
        HistoryStore::new(config.history_path()?),
        config.history.merge_key,
    );

    match args.command.unwrap_or(Command::Pick) {
        Command::Pick => {
            let mut switcher = open_switcher(&config, args.dry_run, ordering).await?;
            match ui::pick(&mut switcher).await? {
                Some(selection) => report(&selection),
                None => info!("Выбор отменён, история не изменена"),
            }
        }
        Command::List { json } => {
            let switcher = open_switcher(&config, args.dry_run, ordering).await?;
            print_tasks(switcher.tasks(), json)?;
        }
        Command::Switch { id } => {
            let mut switcher = open_switcher(&config, args.dry_run, ordering).await?;
            match switcher.select(&id).await {
                Ok(selection) => report(&selection),
                Err(e) if e.is_stale_selection() => warn!("Ничего не сделано: {}", e),
                Err(e) => return Err(e.into()),
            }
        }
        Command::Kill { id } => {
            let mut switcher = open_switcher(&config, args.dry_run, ordering).await?;
            match switcher.delete(&id).await {
                Ok(task) => println!("Закрыто: {}", task),
                Err(e) if e.is_stale_selection() => warn!("Ничего не сделано: {}", e),
                Err(e) => return Err(e.into()),
            }
        }
        Command::History { json } => {
            let history = ordering.load_history();
            info!("История: {:?}", ordering.store().path());
            print_tasks(&history, json)?;
        }
    }

    Ok(())
}

async fn open_switcher(config: &Config, dry_run: bool, ordering: TaskOrdering) -> Result<Switcher> {
    let source = create_window_source(&config.backend, dry_run).await?;
    Ok(Switcher::open(source, ordering).await?)
}

fn print_tasks(tasks: &[model::Task], json: bool) -> Result<()> {
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    if json {
        ui::render_json(&mut out, tasks)?;
    } else {
        ui::render_tasks(&mut out, tasks)?;
    }
    Ok(())
}

fn report(selection: &Selection) {
    let stdout = std::io::stdout();
    let stderr = std::io::stderr();
    if let Err(e) = write_report(selection, &mut stdout.lock(), &mut stderr.lock()) {
        warn!("Не удалось вывести результат: {}", e);
    }
}

/// Ошибка записи истории выводится всегда, даже если окно успело закрыться.
fn write_report(
    selection: &Selection,
    out: &mut impl std::io::Write,
    err: &mut impl std::io::Write,
) -> std::io::Result<()> {
    if let Some(e) = &selection.persist_error {
        writeln!(err, "Внимание: история не сохранена: {}", e)?;
    }
    if selection.stale {
        warn!("Окно {} закрылось до активации", selection.task.id);
        return Ok(());
    }
    writeln!(out, "{}", selection.task)
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))?;

    let registry = tracing_subscriber::registry().with(filter);
    if logging.format == "json" {
        registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().compact().with_writer(std::io::stderr))
            .init();
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use error::SwitcherError;
    use model::Task;

    fn selection(stale: bool) -> Selection {
        Selection {
            task: Task::parse("0x01 0 xterm.XTerm host shell").unwrap(),
            stale,
            persist_error: Some(SwitcherError::PersistFailure {
                path: "/ro/history.json".into(),
                source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
            }),
        }
    }

    #[test]
    fn test_persist_error_reported_for_stale_selection() {
        let (mut out, mut err) = (Vec::new(), Vec::new());
        write_report(&selection(true), &mut out, &mut err).unwrap();

        assert!(out.is_empty());
        assert!(String::from_utf8(err).unwrap().contains("история не сохранена"));
    }

    #[test]
    fn test_selected_task_printed_after_persist_warning() {
        let (mut out, mut err) = (Vec::new(), Vec::new());
        write_report(&selection(false), &mut out, &mut err).unwrap();

        assert!(String::from_utf8(out).unwrap().contains("0x01"));
        assert!(!err.is_empty());
    }
}
