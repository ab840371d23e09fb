pub mod complaint;
pub mod global_error;
pub mod zone;

pub use global_error::{AppError, ErrorCode, ErrorKind, ValidationFieldError};
