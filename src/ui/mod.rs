//! Terminal presentation: renders the ordered tasks and turns user input
//! into selections or deletions on the `Switcher`.

pub mod list;
pub mod prompt;

pub use list::{render_json, render_tasks};
pub use prompt::pick;
