pub mod image_store;
pub mod line;
pub mod telegram;
