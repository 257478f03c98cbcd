//! CLI command implementations

pub mod context;
mod create;
mod list;
mod merge;
mod rebase;
mod show;
pub mod style;

pub use create::run_create;
pub use list::run_list;
pub use merge::{MergeCommandOptions, run_merge};
pub use rebase::{RebaseOptions, run_rebase};
pub use show::run_show;
