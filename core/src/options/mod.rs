mod list;
mod logs;

pub use list::{ListOptions, ListOptionsJson};
pub use logs::{LogOptions, LogOptionsJson};
