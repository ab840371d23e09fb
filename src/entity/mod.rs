pub mod complaint;
pub mod reopen_log;
pub mod setting;
pub mod zone;
