pub mod month_locks;
pub mod write_lock;
