use crate::error::{Result, SwitcherError};
use crate::model::Task;
use crate::services::history::HistoryStore;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// По какому ключу живое окно считается той же задачей, что и запись истории
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MergeKey {
    /// Все поля, включая заголовок: сменившийся заголовок поднимает окно наверх
    #[default]
    Full,
    /// Только id; в результат попадает свежая версия задачи
    Id,
}

/// Новые окна (нет в истории) впереди в порядке `current`, затем ещё открытые окна из истории
/// в порядке `history`. Закрытые окна из истории отбрасываются.
pub fn merge(current: &[Task], history: &[Task], key: MergeKey) -> Vec<Task> {
    match key {
        MergeKey::Full => merge_full(current, history),
        MergeKey::Id => merge_by_id(current, history),
    }
}

fn merge_full(current: &[Task], history: &[Task]) -> Vec<Task> {
    let known: HashSet<&Task> = history.iter().collect();
    let open: HashSet<&Task> = current.iter().collect();
    let mut emitted: HashSet<&Task> = HashSet::with_capacity(current.len());

    let new = current.iter().filter(|task| !known.contains(task));
    let old = history.iter().filter(|task| open.contains(task));

    new.chain(old)
        .filter(|task| emitted.insert(*task))
        .cloned()
        .collect()
}

fn merge_by_id(current: &[Task], history: &[Task]) -> Vec<Task> {
    let known: HashSet<&str> = history.iter().map(|t| t.id.as_str()).collect();
    let open: HashMap<&str, &Task> = current.iter().map(|t| (t.id.as_str(), t)).collect();
    let mut emitted: HashSet<&str> = HashSet::with_capacity(current.len());

    let new = current.iter().filter(|task| !known.contains(task.id.as_str()));
    let old = history
        .iter()
        .filter_map(|task| open.get(task.id.as_str()).copied());

    new.chain(old)
        .filter(|task| emitted.insert(task.id.as_str()))
        .cloned()
        .collect()
}

/// Переместить задачу с `id` в начало, сохранив порядок остальных.
pub fn promote(mut tasks: Vec<Task>, id: &str) -> Result<Vec<Task>> {
    let index = tasks
        .iter()
        .position(|task| task.has_id(id))
        .ok_or_else(|| SwitcherError::UnknownId(id.to_string()))?;

    let selected = tasks.remove(index);
    tasks.insert(0, selected);
    Ok(tasks)
}

/// Итог фиксации выбора: новый порядок и, возможно, ошибка записи истории
#[derive(Debug)]
pub struct Committed {
    pub tasks: Vec<Task>,
    pub persist_error: Option<SwitcherError>,
}

/// Сводит живые окна с историей и сохраняет порядок после выбора пользователя.
pub struct TaskOrdering {
    store: HistoryStore,
    key: MergeKey,
}

impl TaskOrdering {
    pub fn new(store: HistoryStore, key: MergeKey) -> Self {
        Self { store, key }
    }

    pub fn store(&self) -> &HistoryStore {
        &self.store
    }

    /// Повреждённая история не фатальна: считаем её пустой.
    pub fn load_history(&self) -> Vec<Task> {
        match self.store.load() {
            Ok(history) => history,
            Err(e) => {
                warn!("{}; история будет начата заново", e);
                Vec::new()
            }
        }
    }

    pub fn arrange(&self, current: &[Task]) -> Vec<Task> {
        let history = self.load_history();
        let ordered = merge(current, &history, self.key);
        debug!(
            "Порядок задач: {} открыто, {} в истории, ключ {:?}",
            current.len(),
            history.len(),
            self.key
        );
        ordered
    }

    /// Единственный путь записи истории. Неудачная запись возвращается в `persist_error`,
    /// а не как ошибка: действие пользователя всё равно должно выполниться.
    pub fn commit(&self, tasks: Vec<Task>, id: &str) -> Result<Committed> {
        let tasks = promote(tasks, id)?;
        let persist_error = self.store.save(&tasks).err();
        Ok(Committed {
            tasks,
            persist_error,
        })
    }
}
