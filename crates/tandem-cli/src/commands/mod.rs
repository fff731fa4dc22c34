pub mod add;
pub mod common;
pub mod completions;
pub mod delete;
pub mod list;
pub mod lock;
pub mod merge;
pub mod replay;
pub mod show;
