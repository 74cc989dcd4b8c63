pub mod history;
pub mod ordering;
pub mod switcher;
pub mod window_source;

pub use history::HistoryStore;
pub use ordering::{MergeKey, TaskOrdering};
pub use switcher::{Selection, Switcher};
pub use window_source::{create_window_source, WindowSource};
