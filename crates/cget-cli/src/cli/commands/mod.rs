//! CLI command handlers. Each command is in its own file.

mod check;
mod get;
mod tag;

pub use check::run_check;
pub use get::{run_get, GetOptions};
pub use tag::{run_forget, run_tag};
