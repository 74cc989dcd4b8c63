use crate::debug_if_enabled;
use crate::error::{Result, SwitcherError};
use crate::model::Task;
use crate::services::ordering::TaskOrdering;
use crate::services::window_source::WindowSource;
use tracing::{error, info, warn};

/// Результат выбора задачи пользователем
#[derive(Debug)]
pub struct Selection {
    pub task: Task,
    /// Окно исчезло до активации; выбор ничего не изменил
    pub stale: bool,
    /// История не записалась, но окно всё равно активировано
    pub persist_error: Option<SwitcherError>,
}

/// Один запуск переключателя: перечисление, слияние с историей, выбор или закрытие.
///
/// История меняется только в `select`; отмена взаимодействия ничего не записывает.
pub struct Switcher {
    source: Box<dyn WindowSource>,
    ordering: TaskOrdering,
    tasks: Vec<Task>,
}

impl Switcher {
    /// Недоступный бэкенд здесь фатален, битые записи и история нет.
    pub async fn open(source: Box<dyn WindowSource>, ordering: TaskOrdering) -> Result<Self> {
        let current = enumerate(source.as_ref()).await?;
        let tasks = ordering.arrange(&current);
        info!("Открыто окон: {}", tasks.len());

        Ok(Self {
            source,
            ordering,
            tasks,
        })
    }

    /// Задачи в порядке показа
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Поднять выбранную задачу, записать историю и активировать окно.
    pub async fn select(&mut self, id: &str) -> Result<Selection> {
        let committed = self
            .ordering
            .commit(self.tasks.clone(), id)
            .map_err(|e| {
                if e.is_stale_selection() {
                    warn!("Выбрана неизвестная задача {}: {}", id, e);
                }
                e
            })?;

        if let Some(e) = &committed.persist_error {
            error!("{}", e);
        }

        self.tasks = committed.tasks;
        let task = self.tasks[0].clone();

        let stale = match self.source.switch_to(id).await {
            Ok(()) => {
                info!("Активировано окно {}", task);
                false
            }
            Err(e) if e.is_stale_selection() => {
                warn!("Окно {} уже закрыто: {}", id, e);
                self.tasks.retain(|t| !t.has_id(id));
                true
            }
            Err(e) => return Err(e),
        };

        Ok(Selection {
            task,
            stale,
            persist_error: committed.persist_error,
        })
    }

    /// Закрыть окно и убрать его из списка. История не меняется.
    pub async fn delete(&mut self, id: &str) -> Result<Task> {
        let index = self
            .tasks
            .iter()
            .position(|task| task.has_id(id))
            .ok_or_else(|| SwitcherError::UnknownId(id.to_string()))?;

        match self.source.kill(id).await {
            Ok(()) => info!("Закрыто окно {}", self.tasks[index]),
            Err(e) if e.is_stale_selection() => warn!("Окно {} уже закрыто: {}", id, e),
            Err(e) => return Err(e),
        }

        Ok(self.tasks.remove(index))
    }
}

/// Перечислить окна и разобрать записи; некорректные строки пропускаются.
pub async fn enumerate(source: &dyn WindowSource) -> Result<Vec<Task>> {
    let records = source.list_windows().await?;
    let mut tasks = Vec::with_capacity(records.len());

    for record in &records {
        match Task::parse(record) {
            Ok(task) => {
                debug_if_enabled!("Задача: {}", task);
                tasks.push(task);
            }
            Err(e) => warn!("{} ({}), запись пропущена", e, source.name()),
        }
    }

    Ok(tasks)
}
