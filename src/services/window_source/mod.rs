//! WindowSource: responsibility and boundaries
//!
//! This module and its submodules are responsible ONLY for talking to the window system:
//! enumerating open windows as text records, activating and closing them.
//! It MUST NOT parse records into tasks, touch the history file or decide ordering.
//! Records are turned into `Task`s and merged with history by the ordering engine.

mod dry_run;
mod ewmh;
mod file;
pub mod records;
mod wmctrl;
mod x11;
mod r#trait;

pub use self::r#trait::{create_window_source, WindowSource};
