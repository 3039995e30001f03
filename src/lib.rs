pub mod calc;
pub mod config;
pub mod db;
pub mod error;
pub mod model;
pub mod service;
pub mod utils;

pub use config::Config;
pub use db::init_db;
pub use error::{Result, WorktimeError};
pub use service::reconcile::reconcile_month;
pub use service::worklog::project_worklogs;
