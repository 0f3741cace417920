pub mod admin;
pub mod api;
pub mod backend;
pub mod config;
pub mod error;
pub mod listings;
pub mod platform;
pub mod telemetry;
