pub mod api;
pub mod auth;
pub mod configuration;
pub mod db;
pub mod entity;
pub mod geo;
pub mod lifecycle;
pub mod migration;
pub mod model;
pub mod notify;
pub mod repository;
pub mod telemetry;
pub mod util;

#[cfg(test)]
pub(crate) mod testing;
