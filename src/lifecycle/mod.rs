pub mod engine;
pub mod transition;
pub mod validate;

pub use engine::{ComplaintEngine, Transition};
