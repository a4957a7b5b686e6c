//! tracker - log activities, browse them by week and report what got done.
//!
//! Tasks live in a single SQLite file with two collections: open tasks (no
//! end yet) and finished tasks. Finished tasks are also indexed by the weeks
//! they overlap, so a week can be shown without scanning everything.

pub mod db;
pub mod error;
pub mod export;
pub mod lookup;
pub mod report;
pub mod service;
pub mod store;
pub mod task;
pub mod week;

pub use db::Database;
pub use error::{Collection, Error, Result};
pub use export::Snapshot;
pub use service::TaskService;
pub use task::Task;
pub use week::{week_keys, Week, WeekKey};
